use thiserror::Error;

/// Centralized error type for remora-net.
///
/// Clone so a single failed fetch can be delivered to every caller joined
/// on it.
#[derive(Debug, Error, Clone)]
pub enum FetchError {
    /// Requested range lies beyond the resource length (HTTP 416).
    /// Never retried.
    #[error("range {start}..{end} unsatisfiable for {url}")]
    RangeUnsatisfiable { url: String, start: u64, end: u64 },

    /// Network-level or server-side failure (5xx, 429, 408, timeouts,
    /// connection errors). Eligible for bounded retry.
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// Non-retryable transport error (4xx other than range issues).
    #[error("HTTP {status} for {url}")]
    Fatal { status: u16, url: String },

    /// The response body did not match the requested range length.
    #[error("short body: expected {expected} bytes, got {actual}")]
    ShortBody { expected: u64, actual: u64 },

    /// The resource reported no usable length.
    #[error("missing or invalid Content-Length for {url}")]
    UnknownLength { url: String },

    #[error("fetch failed after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Classify an HTTP status for a range request against `url`.
    pub fn from_status(status: u16, url: &url::Url, range: std::ops::Range<u64>) -> Self {
        match status {
            416 => Self::RangeUnsatisfiable {
                url: url.to_string(),
                start: range.start,
                end: range.end,
            },
            429 | 408 => Self::Transient(format!("HTTP {status} for {url}")),
            s if s >= 500 => Self::Transient(format!("HTTP {s} for {url}")),
            s => Self::Fatal {
                status: s,
                url: url.to_string(),
            },
        }
    }

    /// Whether a bounded retry may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// HTTP status code, if this error carries one.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Fatal { status, .. } => Some(*status),
            Self::RangeUnsatisfiable { .. } => Some(416),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        // reqwest-level failures are connection/timeout shaped; server
        // status classification happens in from_status.
        Self::Transient(error.to_string())
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
