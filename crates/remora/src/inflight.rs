//! Deduplication of concurrent fetches for one resource.

use std::collections::HashMap;
use std::ops::Range;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;

use crate::error::ReaderError;

pub(crate) type SharedFetch = Shared<BoxFuture<'static, Result<(), ReaderError>>>;

/// In-flight fetches keyed by their coalesced interval.
///
/// Concurrent readers missing the same interval join one shared future
/// instead of issuing duplicate requests. The fetch itself runs as a
/// spawned task behind the future, so a caller that stops waiting does
/// not cancel it for the others; its bytes still land in the cache.
#[derive(Default)]
pub(crate) struct InflightFetches {
    map: Mutex<HashMap<(u64, u64), SharedFetch>>,
}

impl InflightFetches {
    /// Join an in-flight fetch covering `range`, or register a new one.
    ///
    /// Returns the interval actually joined, which may be wider than the
    /// one asked for.
    pub(crate) fn join_or_spawn<F>(&self, range: &Range<u64>, make: F) -> (Range<u64>, SharedFetch)
    where
        F: FnOnce() -> BoxFuture<'static, Result<(), ReaderError>>,
    {
        let mut map = self.map.lock();
        let covering = map
            .iter()
            .find(|((start, end), _)| *start <= range.start && range.end <= *end)
            .map(|((start, end), fut)| (*start..*end, fut.clone()));
        if let Some(found) = covering {
            return found;
        }

        let shared = make().shared();
        map.insert((range.start, range.end), shared.clone());
        (range.clone(), shared)
    }

    /// Drop the entry for a finished interval.
    pub(crate) fn complete(&self, range: &Range<u64>) {
        self.map.lock().remove(&(range.start, range.end));
    }
}
