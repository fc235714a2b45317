#![forbid(unsafe_code)]

//! `remora`
//!
//! Random-access reads over remote objects (HTTP and S3-style stores)
//! with range caching, request coalescing, shared in-flight fetches, and
//! background decode.
//!
//! [`RemoteReader`] builds sessions over a shared transport and decode
//! pool. [`ReaderSession::read`] serves windowed byte reads;
//! [`ReaderSession::read_block`] serves decoded blocks through a
//! pluggable [`BlockDecoder`]. Every delivered window carries a [`Mask`]
//! recording which bytes were actually backed by fetched data.

mod config;
mod error;
mod inflight;
mod session;

pub use config::{ReaderOptions, DEFAULT_PREFETCH_BYTES};
pub use error::{ReaderError, ReaderResult};
pub use session::{ReadOutput, ReaderSession, RemoteReader};

pub use remora_cache::{BlockCacheOptions, CacheError, Capacity};
pub use remora_decode::{
    Block, BlockDecoder, DecodeError, FnDecoder, IdentityDecoder, Mask,
};
pub use remora_net::{
    FetchError, FetchOptions, Fetcher, FetcherExt, HttpFetcher, RetryFetcher, RetryPolicy,
};
pub use remora_range::DEFAULT_MERGE_GAP;
