//! Decode seam between the reader and the format parser.

use bytes::Bytes;

use crate::error::{DecodeError, DecodeResult};

/// Transforms a block's raw bytes into its decoded payload.
///
/// Implemented by the format-aware caller (decompression, unmasking,
/// sample-format conversion); the reader only schedules the work. Runs on
/// the decode pool, so implementations may be CPU-heavy but must not
/// block on I/O.
pub trait BlockDecoder: Send + Sync + 'static {
    fn decode(&self, raw: &[u8]) -> DecodeResult<Bytes>;

    /// Bytes per decoded sample, used for mask granularity.
    fn sample_size(&self) -> usize {
        1
    }
}

/// Pass-through decoder for formats whose blocks are stored raw.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityDecoder;

impl BlockDecoder for IdentityDecoder {
    fn decode(&self, raw: &[u8]) -> DecodeResult<Bytes> {
        Ok(Bytes::copy_from_slice(raw))
    }
}

/// Decoder wrapping a plain function, mostly for tests and simple codecs.
pub struct FnDecoder<F> {
    f: F,
    sample_size: usize,
}

impl<F> FnDecoder<F>
where
    F: Fn(&[u8]) -> DecodeResult<Bytes> + Send + Sync + 'static,
{
    pub fn new(sample_size: usize, f: F) -> Self {
        Self { f, sample_size }
    }
}

impl<F> BlockDecoder for FnDecoder<F>
where
    F: Fn(&[u8]) -> DecodeResult<Bytes> + Send + Sync + 'static,
{
    fn decode(&self, raw: &[u8]) -> DecodeResult<Bytes> {
        (self.f)(raw)
    }

    fn sample_size(&self) -> usize {
        self.sample_size
    }
}

impl DecodeError {
    /// Convenience for decoder implementations.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_round_trips() {
        let out = IdentityDecoder.decode(b"raw tile bytes").unwrap();
        assert_eq!(out, Bytes::from_static(b"raw tile bytes"));
        assert_eq!(IdentityDecoder.sample_size(), 1);
    }

    #[test]
    fn fn_decoder_applies_transform() {
        let dec = FnDecoder::new(2, |raw: &[u8]| {
            Ok(Bytes::from(raw.iter().map(|b| b ^ 0xFF).collect::<Vec<_>>()))
        });
        let out = dec.decode(&[0x00, 0x0F]).unwrap();
        assert_eq!(&out[..], &[0xFF, 0xF0]);
        assert_eq!(dec.sample_size(), 2);
    }

    #[test]
    fn fn_decoder_propagates_failure() {
        let dec = FnDecoder::new(1, |_: &[u8]| Err(DecodeError::failed("bad magic")));
        assert_eq!(
            dec.decode(b"x").unwrap_err(),
            DecodeError::Failed("bad magic".into())
        );
    }
}
