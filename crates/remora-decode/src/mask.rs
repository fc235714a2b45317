//! Per-sample validity masks.

use std::ops::Range;

use remora_range::ByteRangeSet;

/// Validity mask aligned to a decoded window.
///
/// Sample `i` is valid only if every byte contributing to it was present
/// in the range cache when the mask was computed. Masks are never upgraded
/// after delivery; new data produces a new mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    bits: Vec<bool>,
}

impl Mask {
    /// Mask with every sample valid.
    #[must_use]
    pub fn all_valid(samples: usize) -> Self {
        Self {
            bits: vec![true; samples],
        }
    }

    /// Mask with every sample invalid.
    #[must_use]
    pub fn none_valid(samples: usize) -> Self {
        Self {
            bits: vec![false; samples],
        }
    }

    /// Compute validity of `window` against a coverage snapshot.
    ///
    /// The window is split into samples of `sample_size` bytes; a sample
    /// whose byte span is not fully covered (including a trailing partial
    /// sample, whose span extends past the window) is invalid.
    ///
    /// # Panics
    ///
    /// Panics if `sample_size` is zero.
    #[must_use]
    pub fn from_coverage(window: &Range<u64>, coverage: &ByteRangeSet, sample_size: usize) -> Self {
        assert!(sample_size > 0, "sample_size must be nonzero");
        let size = sample_size as u64;
        let len = window.end.saturating_sub(window.start);
        let samples = len.div_ceil(size) as usize;

        let bits = (0..samples as u64)
            .map(|i| {
                let start = window.start + i * size;
                coverage.covers(&(start..start + size))
            })
            .collect();
        Self { bits }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Validity of one sample. Out-of-range indices are invalid.
    #[must_use]
    pub fn is_valid(&self, sample: usize) -> bool {
        self.bits.get(sample).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.bits.iter().filter(|v| **v).count()
    }

    /// Whether every sample is valid.
    #[must_use]
    pub fn all(&self) -> bool {
        self.bits.iter().all(|v| *v)
    }

    /// Whether any sample is valid.
    #[must_use]
    pub fn any(&self) -> bool {
        self.bits.iter().any(|v| *v)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    fn coverage(ranges: &[Range<u64>]) -> ByteRangeSet {
        ranges.iter().cloned().collect()
    }

    #[test]
    fn full_coverage_all_valid() {
        let mask = Mask::from_coverage(&(0..16), &coverage(&[0..16]), 4);
        assert_eq!(mask.len(), 4);
        assert!(mask.all());
    }

    #[test]
    fn empty_coverage_none_valid() {
        let mask = Mask::from_coverage(&(0..16), &coverage(&[]), 4);
        assert_eq!(mask.valid_count(), 0);
        assert!(!mask.any());
    }

    #[rstest]
    #[case::head_missing(&[4..16], vec![false, true, true, true])]
    #[case::tail_missing(&[0..12], vec![true, true, true, false])]
    #[case::interior_missing(&[0..4, 8..16], vec![true, false, true, true])]
    fn truncation_flips_exactly_missing_samples(
        #[case] present: &[Range<u64>],
        #[case] expected: Vec<bool>,
    ) {
        let mask = Mask::from_coverage(&(0..16), &coverage(present), 4);
        assert_eq!(mask.as_slice(), expected.as_slice());
    }

    #[test]
    fn partial_byte_of_sample_invalidates_it() {
        // Sample 1 covers bytes 4..8; only 4..7 present.
        let mask = Mask::from_coverage(&(0..8), &coverage(&[0..7]), 4);
        assert_eq!(mask.as_slice(), &[true, false]);
    }

    #[test]
    fn trailing_partial_sample_is_invalid() {
        // 10-byte window, 4-byte samples: sample 2 spans 8..12, but the
        // window (and coverage) end at 10.
        let mask = Mask::from_coverage(&(0..10), &coverage(&[0..10]), 4);
        assert_eq!(mask.as_slice(), &[true, true, false]);
    }

    #[test]
    fn window_offset_respected() {
        let mask = Mask::from_coverage(&(100..108), &coverage(&[100..104]), 4);
        assert_eq!(mask.as_slice(), &[true, false]);
    }

    #[test]
    fn out_of_range_sample_invalid() {
        let mask = Mask::all_valid(2);
        assert!(mask.is_valid(1));
        assert!(!mask.is_valid(2));
    }

    #[test]
    fn byte_granularity_mask() {
        let mask = Mask::from_coverage(&(0..5), &coverage(&[0..2, 3..5]), 1);
        assert_eq!(mask.as_slice(), &[true, true, false, true, true]);
    }
}
