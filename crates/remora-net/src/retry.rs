use std::ops::Range;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::sleep;
use tracing::warn;
use url::Url;

use crate::{
    error::{FetchError, FetchResult},
    fetcher::Fetcher,
    types::RetryPolicy,
};

/// Retry decorator for [`Fetcher`] implementations.
///
/// Only transient errors are retried; `RangeUnsatisfiable`, `Fatal` and
/// contract violations surface immediately. Exhausting the budget wraps
/// the last error in [`FetchError::RetryExhausted`].
pub struct RetryFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: Fetcher> RetryFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run<T, Fut>(&self, mut op: impl FnMut(u32) -> Fut) -> FetchResult<T>
    where
        Fut: std::future::Future<Output = FetchResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(out) => return Ok(out),
                Err(error) if error.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for_attempt(attempt + 1);
                    warn!(attempt, ?delay, %error, "transient fetch failure, retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) if error.is_retryable() => {
                    return Err(FetchError::RetryExhausted {
                        attempts: attempt + 1,
                        source: Box::new(error),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for RetryFetcher<F> {
    async fn length(&self, url: &Url) -> FetchResult<u64> {
        self.run(|_| self.inner.length(url)).await
    }

    async fn fetch_range(&self, url: &Url, range: Range<u64>) -> FetchResult<Bytes> {
        self.run(|_| self.inner.fetch_range(url, range.clone()))
            .await
    }
}
