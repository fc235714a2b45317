//! Merging missing byte ranges into a minimal list of fetch requests.
//!
//! Network round-trip latency typically dominates the cost of a few extra
//! payload bytes, so intervals separated by at most `gap` bytes are fetched
//! as one request. `gap == 0` merges only touching intervals, which for a
//! disjoint input means one request per missing interval.

use std::ops::Range;

use crate::range::gap_between;

/// Nonzero gap a boolean "merge enabled" toggle maps to.
pub const DEFAULT_MERGE_GAP: u64 = 16 * 1024;

/// One coalesced fetch request.
///
/// `fetch` is the span to request from the remote; `wanted` is the span the
/// caller actually needs. Bytes in `fetch` but outside `wanted` are
/// intentional over-fetch: they are cached but trimmed before being exposed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedFetch {
    pub fetch: Range<u64>,
    pub wanted: Range<u64>,
}

impl PlannedFetch {
    fn single(range: Range<u64>) -> Self {
        Self {
            fetch: range.clone(),
            wanted: range,
        }
    }

    /// Bytes the request spans that no subsumed interval asked for.
    ///
    /// Merged gaps land in the cache but are trimmed before bytes are
    /// exposed to the caller.
    #[must_use]
    pub fn merged_gap_bytes(&self, missing: &[Range<u64>]) -> u64 {
        let wanted: u64 = missing
            .iter()
            .filter(|m| m.start >= self.fetch.start && m.end <= self.fetch.end)
            .map(|m| m.end - m.start)
            .sum();
        (self.fetch.end - self.fetch.start).saturating_sub(wanted)
    }
}

/// Merge sorted disjoint `missing` intervals whose gap is at most `gap`.
///
/// Input must be ascending and pairwise disjoint (the shape produced by
/// [`ByteRangeSet::gaps_within`](crate::ByteRangeSet::gaps_within)). Output
/// intervals are pairwise separated by more than `gap` bytes and their union
/// covers the input. Empty input intervals are skipped.
#[must_use]
pub fn coalesce(missing: &[Range<u64>], gap: u64) -> Vec<PlannedFetch> {
    let mut out: Vec<PlannedFetch> = Vec::new();

    for range in missing {
        if range.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(acc) if gap_between(&acc.fetch, range) <= gap => {
                acc.fetch.end = range.end;
                acc.wanted.end = range.end;
            }
            _ => out.push(PlannedFetch::single(range.clone())),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    fn fetches(plan: &[PlannedFetch]) -> Vec<Range<u64>> {
        plan.iter().map(|p| p.fetch.clone()).collect()
    }

    #[rstest]
    #[case::gap_within_threshold(vec![0..5, 12..20], 10, vec![0..20])]
    #[case::gap_disables_merge(vec![0..5, 12..20], 0, vec![0..5, 12..20])]
    #[case::touching_merges_at_zero(vec![0..5, 5..10], 0, vec![0..10])]
    #[case::gap_exactly_threshold(vec![0..5, 15..20], 10, vec![0..20])]
    #[case::gap_above_threshold(vec![0..5, 16..20], 10, vec![0..5, 16..20])]
    #[case::chain_of_merges(vec![0..5, 8..12, 15..20], 5, vec![0..20])]
    #[case::single_interval(vec![3..9], 100, vec![3..9])]
    #[case::empty_input(vec![], 10, vec![])]
    fn test_coalesce(
        #[case] missing: Vec<Range<u64>>,
        #[case] gap: u64,
        #[case] expected: Vec<Range<u64>>,
    ) {
        assert_eq!(fetches(&coalesce(&missing, gap)), expected);
    }

    #[test]
    fn output_gaps_exceed_threshold() {
        let missing = vec![0..5, 12..20, 100..110, 115..130, 500..510];
        let gap = 10;
        let plan = coalesce(&missing, gap);

        for pair in plan.windows(2) {
            let spacing = pair[1].fetch.start - pair[0].fetch.end;
            assert!(spacing > gap, "plan intervals closer than gap: {pair:?}");
        }
    }

    #[test]
    fn union_covers_input() {
        let missing = vec![0..5, 12..20, 40..60];
        let plan = coalesce(&missing, 10);

        for m in &missing {
            assert!(
                plan.iter().any(|p| p.fetch.start <= m.start && m.end <= p.fetch.end),
                "{m:?} not covered"
            );
        }
    }

    #[test]
    fn wanted_brackets_subsumed_intervals() {
        let missing = vec![0..5, 12..20];
        let plan = coalesce(&missing, 10);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].wanted, 0..20);
        // The 7-byte gap [5,12) is fetched but not wanted.
        assert_eq!(plan[0].merged_gap_bytes(&missing), 7);
    }

    #[test]
    fn skips_empty_intervals() {
        let plan = coalesce(&[0..5, 7..7, 12..20], 10);
        assert_eq!(fetches(&plan), vec![0..20]);
    }
}
