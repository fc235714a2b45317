use thiserror::Error;

/// Failure of a single decode unit of work.
///
/// Clone so the error can cross the result channel; a failed job affects
/// only the caller that submitted it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("decode failed: {0}")]
    Failed(String),

    #[error("decode job panicked")]
    Panicked,

    #[error("decode pool is shut down")]
    PoolClosed,
}

pub type DecodeResult<T> = Result<T, DecodeError>;
