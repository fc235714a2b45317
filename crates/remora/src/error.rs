use remora_cache::CacheError;
use remora_decode::DecodeError;
use remora_net::FetchError;
use thiserror::Error;

/// Top-level error for reader sessions.
///
/// Clone so one failed shared fetch can fail every caller joined on it.
#[derive(Debug, Error, Clone)]
pub enum ReaderError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Read starting at or past the end of the resource.
    #[error("read at {offset} (len {len}) is beyond resource length {resource_len}")]
    RangeUnsatisfiable {
        offset: u64,
        len: u64,
        resource_len: u64,
    },

    #[error("reader session is closed")]
    Closed,
}

pub type ReaderResult<T> = Result<T, ReaderError>;
