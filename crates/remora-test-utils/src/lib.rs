#![forbid(unsafe_code)]

//! Shared test helpers for remora.
//!
//! [`MemoryFetcher`] serves an in-memory object through the `Fetcher`
//! trait while counting every range request, which is how the no-duplicate
//! -fetch properties are asserted. [`TestHttpServer`] plus
//! [`object_router`] run a real range-request server for `HttpFetcher`
//! integration tests.

mod http_server;
mod memory_fetcher;

pub use http_server::{object_router, TestHttpServer};
pub use memory_fetcher::MemoryFetcher;
