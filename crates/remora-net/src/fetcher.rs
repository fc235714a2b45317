use std::{ops::Range, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tracing::trace;
use url::Url;

use crate::{
    error::{FetchError, FetchResult},
    types::{range_header_value, FetchOptions},
};

/// Object-store boundary: one range request per call.
///
/// `fetch_range` must return exactly `range.end - range.start` bytes or
/// fail; partial responses are a contract violation
/// ([`FetchError::ShortBody`]).
#[cfg_attr(test, unimock::unimock(api = FetcherMock))]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Total length of the resource, discovered once at open.
    async fn length(&self, url: &Url) -> FetchResult<u64>;

    /// Fetch the half-open byte range `[start, end)`.
    async fn fetch_range(&self, url: &Url, range: Range<u64>) -> FetchResult<Bytes>;
}

/// Shared fetchers are fetchers too, so decorators can wrap an `Arc`
/// the caller keeps a handle on.
#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn length(&self, url: &Url) -> FetchResult<u64> {
        self.as_ref().length(url).await
    }

    async fn fetch_range(&self, url: &Url, range: Range<u64>) -> FetchResult<Bytes> {
        self.as_ref().fetch_range(url, range).await
    }
}

/// reqwest-backed [`Fetcher`] for HTTP/S3-style object stores.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    inner: Client,
    options: FetchOptions,
}

impl HttpFetcher {
    /// # Panics
    ///
    /// Panics if the `reqwest::Client` builder fails to build.
    #[must_use]
    pub fn new(options: FetchOptions) -> Self {
        let inner = Client::builder()
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .build()
            .expect("failed to build reqwest client");
        Self { inner, options }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(FetchOptions::default())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn length(&self, url: &Url) -> FetchResult<u64> {
        let resp = self
            .inner
            .head(url.clone())
            .timeout(self.options.request_timeout)
            .send()
            .await
            .map_err(FetchError::from)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16(), url, 0..0));
        }

        resp.headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| FetchError::UnknownLength {
                url: url.to_string(),
            })
    }

    async fn fetch_range(&self, url: &Url, range: Range<u64>) -> FetchResult<Bytes> {
        let expected = range.end - range.start;
        let resp = self
            .inner
            .get(url.clone())
            .header(reqwest::header::RANGE, range_header_value(&range))
            .timeout(self.options.request_timeout)
            .send()
            .await
            .map_err(FetchError::from)?;

        let status = resp.status();
        if !(status == StatusCode::PARTIAL_CONTENT || status == StatusCode::OK) {
            return Err(FetchError::from_status(status.as_u16(), url, range));
        }

        // "bytes start-end/total" — total tells short responses apart from
        // truncated ones.
        let total_len = resp
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|v| v.parse::<u64>().ok());

        let body = resp.bytes().await.map_err(FetchError::from)?;
        trace!(
            start = range.start,
            end = range.end,
            got = body.len(),
            "range fetched"
        );

        if status == StatusCode::OK {
            // Server ignored the Range header and sent the whole object;
            // slice out the span we asked for.
            let start = usize::try_from(range.start).map_err(|_| FetchError::ShortBody {
                expected,
                actual: body.len() as u64,
            })?;
            let end = start + expected as usize;
            if body.len() < end {
                return Err(FetchError::RangeUnsatisfiable {
                    url: url.to_string(),
                    start: range.start,
                    end: range.end,
                });
            }
            return Ok(body.slice(start..end));
        }

        if body.len() as u64 != expected {
            // The resource ran out before the requested end.
            if total_len.is_some_and(|total| range.end > total) {
                return Err(FetchError::RangeUnsatisfiable {
                    url: url.to_string(),
                    start: range.start,
                    end: range.end,
                });
            }
            return Err(FetchError::ShortBody {
                expected,
                actual: body.len() as u64,
            });
        }
        Ok(body)
    }
}

/// Decorator helpers for any [`Fetcher`].
pub trait FetcherExt: Fetcher + Sized {
    /// Wrap with bounded retry of transient failures.
    fn with_retry(self, policy: crate::types::RetryPolicy) -> crate::retry::RetryFetcher<Self> {
        crate::retry::RetryFetcher::new(self, policy)
    }
}

impl<T: Fetcher> FetcherExt for T {}
