#![forbid(unsafe_code)]

//! `remora-net`
//!
//! Object-store transport boundary for remora.
//!
//! The core consumes the [`Fetcher`] trait: one exact-length range request
//! per call plus length discovery. [`HttpFetcher`] is the reqwest-backed
//! implementation; [`RetryFetcher`] layers bounded retry with exponential
//! backoff over any fetcher.

mod error;
mod fetcher;
mod retry;
mod types;

pub use error::{FetchError, FetchResult};
pub use fetcher::{Fetcher, FetcherExt, HttpFetcher};
pub use retry::RetryFetcher;
pub use types::{range_header_value, FetchOptions, RetryPolicy};

#[cfg(test)]
pub use fetcher::FetcherMock;
