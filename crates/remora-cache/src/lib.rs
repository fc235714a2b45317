#![forbid(unsafe_code)]

//! `remora-cache`
//!
//! Caching layers for remora.
//!
//! [`RangeCache`] holds fetched raw byte ranges for one resource, with
//! gap-fill inserts and whole-entry LRU eviction under a byte budget.
//! [`BlockCache`] is a count-bounded LRU for decoded blocks, used when
//! decode is expensive and blocks are reread.

mod block_cache;
mod error;
mod range_cache;

pub use block_cache::{BlockCache, BlockCacheOptions};
pub use error::{CacheError, CacheResult};
pub use range_cache::{Capacity, RangeCache};
