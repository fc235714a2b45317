use std::{cmp::min, ops::Range, time::Duration};

/// Bounded exponential backoff for transient fetch failures.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponential = self.base_delay * 2_u32.saturating_pow(attempt.saturating_sub(1));
        min(exponential, self.max_delay)
    }
}

/// Transport configuration for [`HttpFetcher`](crate::HttpFetcher).
#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub request_timeout: Duration,
    pub retry_policy: RetryPolicy,
    /// Max idle connections per host. 0 disables pooling.
    pub pool_max_idle_per_host: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
            pool_max_idle_per_host: 4,
        }
    }
}

/// Render a half-open byte range as an HTTP `Range` header value.
///
/// HTTP ranges are inclusive on both ends, so `[start, end)` becomes
/// `bytes=start-(end-1)`.
#[must_use]
pub fn range_header_value(range: &Range<u64>) -> String {
    format!("bytes={}-{}", range.start, range.end.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::first_hundred(0..100, "bytes=0-99")]
    #[case::interior(50..150, "bytes=50-149")]
    #[case::single_byte(10..11, "bytes=10-10")]
    fn test_range_header_value(#[case] range: Range<u64>, #[case] expected: &str) {
        assert_eq!(range_header_value(&range), expected);
    }

    #[rstest]
    #[case(0, Duration::ZERO)]
    #[case(1, Duration::from_millis(100))]
    #[case(2, Duration::from_millis(200))]
    #[case(3, Duration::from_millis(400))]
    #[case(10, Duration::from_secs(5))] // capped at max_delay
    fn test_delay_for_attempt(#[case] attempt: u32, #[case] expected: Duration) {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(attempt), expected);
    }

    #[test]
    fn delay_never_exceeds_max_for_large_attempts() {
        let policy = RetryPolicy::default();
        for attempt in 0..64 {
            assert!(policy.delay_for_attempt(attempt) <= policy.max_delay);
        }
    }
}
