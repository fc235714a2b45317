#![forbid(unsafe_code)]

//! `remora-decode`
//!
//! CPU-bound post-processing for remora.
//!
//! [`DecodePool`] runs decode closures on background OS threads so the
//! I/O path never blocks on CPU work. [`Block`] is the immutable decoded
//! unit, [`Mask`] its per-sample validity, and [`BlockDecoder`] the seam
//! where the format parser plugs in decompression.

mod block;
mod decoder;
mod error;
mod mask;
mod pool;

pub use block::Block;
pub use decoder::{BlockDecoder, FnDecoder, IdentityDecoder};
pub use error::{DecodeError, DecodeResult};
pub use mask::Mask;
pub use pool::{DecodeHandle, DecodePool};
