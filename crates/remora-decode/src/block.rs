//! Decoded logical blocks.

use std::ops::Range;

use bytes::Bytes;

use crate::mask::Mask;

/// One decoded logical unit (e.g. a tile) of the underlying format.
///
/// Immutable after creation; re-decoding on newly fetched data produces a
/// new `Block`. A block may outlive the raw bytes that produced it (the
/// block cache holds blocks independently of the range cache).
#[derive(Clone, Debug)]
pub struct Block {
    index: u64,
    byte_range: Range<u64>,
    data: Bytes,
    mask: Mask,
}

impl Block {
    #[must_use]
    pub fn new(index: u64, byte_range: Range<u64>, data: Bytes, mask: Mask) -> Self {
        Self {
            index,
            byte_range,
            data,
            mask,
        }
    }

    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Raw byte span of this block within the resource.
    #[must_use]
    pub fn byte_range(&self) -> &Range<u64> {
        &self.byte_range
    }

    /// Decoded payload.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Validity of each sample, as of decode time.
    #[must_use]
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Whether every sample is backed by fetched data.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.mask.all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_accessors() {
        let block = Block::new(7, 100..116, Bytes::from_static(&[0u8; 16]), Mask::all_valid(4));
        assert_eq!(block.index(), 7);
        assert_eq!(*block.byte_range(), 100..116);
        assert_eq!(block.data().len(), 16);
        assert!(block.is_complete());
    }

    #[test]
    fn incomplete_block_reports_it() {
        let block = Block::new(0, 0..8, Bytes::from_static(&[0u8; 8]), Mask::none_valid(2));
        assert!(!block.is_complete());
    }
}
