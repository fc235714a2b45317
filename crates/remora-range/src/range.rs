//! Helpers over half-open `Range<u64>` byte intervals.

use std::ops::Range;

/// Whether two ranges share at least one byte.
#[must_use]
pub fn overlaps(a: &Range<u64>, b: &Range<u64>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Whether two ranges overlap or are directly adjacent.
#[must_use]
pub fn touches(a: &Range<u64>, b: &Range<u64>) -> bool {
    a.start <= b.end && b.start <= a.end
}

/// Common subrange of two ranges. `None` if they do not overlap.
#[must_use]
pub fn intersect(a: &Range<u64>, b: &Range<u64>) -> Option<Range<u64>> {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    (start < end).then_some(start..end)
}

/// Bytes between the end of `a` and the start of `b`.
///
/// Zero for overlapping or adjacent ranges. `b` must not start before `a`.
#[must_use]
pub fn gap_between(a: &Range<u64>, b: &Range<u64>) -> u64 {
    b.start.saturating_sub(a.end)
}
