//! In-memory counting fetcher.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use remora_net::{FetchError, FetchResult, Fetcher};
use url::Url;

/// [`Fetcher`] serving a byte buffer, with instrumentation.
///
/// Records every range request so tests can assert exact fetch behavior
/// (counts, coalescing, no duplicates). Supports injecting transient
/// failures and a per-fetch delay to widen concurrency windows.
pub struct MemoryFetcher {
    data: Bytes,
    fetches: AtomicUsize,
    ranges: Mutex<Vec<Range<u64>>>,
    fail_next: AtomicU64,
    delay: Mutex<Option<Duration>>,
}

impl MemoryFetcher {
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            fetches: AtomicUsize::new(0),
            ranges: Mutex::new(Vec::new()),
            fail_next: AtomicU64::new(0),
            delay: Mutex::new(None),
        }
    }

    /// Number of `fetch_range` calls so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Every range requested so far, in call order.
    #[must_use]
    pub fn fetched_ranges(&self) -> Vec<Range<u64>> {
        self.ranges.lock().clone()
    }

    /// Fail the next `n` range fetches with a transient error.
    pub fn fail_next(&self, n: u64) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Sleep this long inside every fetch.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn length(&self, _url: &Url) -> FetchResult<u64> {
        Ok(self.data.len() as u64)
    }

    async fn fetch_range(&self, url: &Url, range: Range<u64>) -> FetchResult<Bytes> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.ranges.lock().push(range.clone());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(FetchError::Transient("injected failure".into()));
        }

        let len = self.data.len() as u64;
        if range.end > len {
            return Err(FetchError::RangeUnsatisfiable {
                url: url.to_string(),
                start: range.start,
                end: range.end,
            });
        }
        Ok(self.data.slice(range.start as usize..range.end as usize))
    }
}
