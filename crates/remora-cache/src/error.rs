use thiserror::Error;

/// Internal invariant violations in the caches.
///
/// These are caller defects, never silently ignored: `read` before
/// `insert`, or an insert whose buffer does not match its range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("range {start}..{end} not cached")]
    NotCached { start: u64, end: u64 },

    #[error("buffer length {actual} does not match range length {expected}")]
    LengthMismatch { expected: u64, actual: u64 },
}

pub type CacheResult<T> = Result<T, CacheError>;
