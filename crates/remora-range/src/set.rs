//! Disjoint sorted set of byte ranges.

use std::ops::Range;

use rangemap::RangeSet;

/// Ordered set of disjoint half-open byte intervals over one resource.
///
/// Backed by `rangemap::RangeSet`, so adjacent and overlapping inserts are
/// merged automatically; no two stored ranges overlap or touch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ByteRangeSet {
    inner: RangeSet<u64>,
}

impl ByteRangeSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RangeSet::new(),
        }
    }

    /// Add a range to the set, merging with neighbours. Empty ranges are ignored.
    pub fn insert(&mut self, range: Range<u64>) {
        if !range.is_empty() {
            self.inner.insert(range);
        }
    }

    /// Union with another set.
    pub fn union_with(&mut self, other: &ByteRangeSet) {
        for r in other.iter() {
            self.inner.insert(r);
        }
    }

    /// Whether every byte of `range` is covered. Empty ranges are covered.
    #[must_use]
    pub fn covers(&self, range: &Range<u64>) -> bool {
        if range.is_empty() {
            return true;
        }
        !self.inner.gaps(range).any(|_| true)
    }

    /// Whether any byte of `range` is covered.
    #[must_use]
    pub fn overlaps(&self, range: &Range<u64>) -> bool {
        if range.is_empty() {
            return false;
        }
        self.inner.overlaps(range)
    }

    /// Subranges of `range` that are not covered, in ascending order.
    #[must_use]
    pub fn gaps_within(&self, range: &Range<u64>) -> Vec<Range<u64>> {
        if range.is_empty() {
            return Vec::new();
        }
        self.inner.gaps(range).collect()
    }

    /// Subranges of `range` that are covered, in ascending order.
    #[must_use]
    pub fn intersection_with(&self, range: &Range<u64>) -> Vec<Range<u64>> {
        if range.is_empty() {
            return Vec::new();
        }
        self.inner
            .overlapping(range)
            .map(|r| r.start.max(range.start)..r.end.min(range.end))
            .collect()
    }

    /// Iterate over the stored disjoint ranges, ascending.
    pub fn iter(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        self.inner.iter().cloned()
    }

    /// Number of disjoint ranges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.iter().count()
    }

    /// Total number of covered bytes.
    #[must_use]
    pub fn byte_len(&self) -> u64 {
        self.inner.iter().map(|r| r.end - r.start).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Remove a range from the set. Stored ranges overlapping it are trimmed.
    pub fn remove(&mut self, range: Range<u64>) {
        if !range.is_empty() {
            self.inner.remove(range);
        }
    }
}

impl FromIterator<Range<u64>> for ByteRangeSet {
    fn from_iter<T: IntoIterator<Item = Range<u64>>>(iter: T) -> Self {
        let mut set = Self::new();
        for r in iter {
            set.insert(r);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_merges_adjacent() {
        let mut set = ByteRangeSet::new();
        set.insert(0..50);
        set.insert(50..100);
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next(), Some(0..100));
    }

    #[test]
    fn insert_merges_overlapping() {
        let mut set = ByteRangeSet::new();
        set.insert(0..60);
        set.insert(40..100);
        assert_eq!(set.len(), 1);
        assert_eq!(set.byte_len(), 100);
    }

    #[test]
    fn insert_ignores_empty() {
        let mut set = ByteRangeSet::new();
        set.insert(10..10);
        assert!(set.is_empty());
    }

    #[test]
    fn covers_full_and_partial() {
        let set: ByteRangeSet = [0..30, 70..100].into_iter().collect();
        assert!(set.covers(&(0..30)));
        assert!(set.covers(&(10..20)));
        assert!(!set.covers(&(0..40)));
        assert!(!set.covers(&(30..70)));
        assert!(set.covers(&(5..5)));
    }

    #[test]
    fn gaps_within_reports_missing() {
        let set: ByteRangeSet = [0..20, 40..60, 80..100].into_iter().collect();
        let gaps = set.gaps_within(&(0..100));
        assert_eq!(gaps, vec![20..40, 60..80]);
    }

    #[test]
    fn intersection_clips_to_request() {
        let set: ByteRangeSet = [0..20, 40..60].into_iter().collect();
        let hits = set.intersection_with(&(10..50));
        assert_eq!(hits, vec![10..20, 40..50]);
    }

    #[test]
    fn partition_reconstructs_request() {
        // cached ∪ missing == requested, cached ∩ missing == ∅
        let set: ByteRangeSet = [5..15, 25..35, 50..55].into_iter().collect();
        let request = 0..60;

        let cached = set.intersection_with(&request);
        let missing = set.gaps_within(&request);

        let mut rebuilt = ByteRangeSet::new();
        for r in cached.iter().chain(missing.iter()) {
            rebuilt.insert(r.clone());
        }
        assert!(rebuilt.covers(&request));
        assert_eq!(rebuilt.byte_len(), request.end - request.start);

        for c in &cached {
            for m in &missing {
                assert!(!crate::overlaps(c, m), "{c:?} overlaps {m:?}");
            }
        }
    }

    #[test]
    fn union_with_merges_sets() {
        let mut a: ByteRangeSet = [0..10].into_iter().collect();
        let b: ByteRangeSet = [10..20, 30..40].into_iter().collect();
        a.union_with(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![0..20, 30..40]);
    }

    #[test]
    fn remove_trims_overlaps() {
        let mut set: ByteRangeSet = [0..100].into_iter().collect();
        set.remove(20..40);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0..20, 40..100]);
    }

    #[test]
    fn byte_len_sums_disjoint_ranges() {
        let set: ByteRangeSet = [0..10, 20..25].into_iter().collect();
        assert_eq!(set.byte_len(), 15);
        assert_eq!(set.len(), 2);
    }
}
