//! Cache of fetched byte ranges for one remote resource.
//!
//! Fetched spans are stored as maximal contiguous segments: an insert that
//! overlaps or touches existing segments merges them into one buffer, with
//! the new bytes winning any overlap (gap-fill semantics). A
//! [`ByteRangeSet`] mirror answers coverage queries without walking
//! segments. All state sits behind a `parking_lot::Mutex`; each resource
//! gets its own cache, so there is no cross-resource locking.

use std::{collections::BTreeMap, ops::Range};

use bytes::Bytes;
use parking_lot::Mutex;
use remora_range::ByteRangeSet;
use tracing::{debug, trace};

use crate::error::{CacheError, CacheResult};

/// Byte budget for a [`RangeCache`].
///
/// Bounded by default; `Unbounded` opts into cache-until-drop growth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capacity {
    Bounded(u64),
    Unbounded,
}

impl Capacity {
    pub const DEFAULT_BYTES: u64 = 256 * 1024 * 1024;
}

impl Default for Capacity {
    fn default() -> Self {
        Self::Bounded(Self::DEFAULT_BYTES)
    }
}

struct Segment {
    bytes: Vec<u8>,
    last_access: u64,
}

impl Segment {
    fn end(&self, start: u64) -> u64 {
        start + self.bytes.len() as u64
    }
}

#[derive(Default)]
struct CacheState {
    /// Disjoint, non-touching segments keyed by start offset.
    segments: BTreeMap<u64, Segment>,
    /// Mirror of the segment spans.
    coverage: ByteRangeSet,
    /// Monotonic access counter for LRU ordering.
    tick: u64,
    total_bytes: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Starts of segments overlapping or touching `range`, ascending.
    fn touching_keys(&self, range: &Range<u64>) -> Vec<u64> {
        let mut keys: Vec<u64> = self
            .segments
            .range(..=range.end)
            .rev()
            .take_while(|(start, seg)| seg.end(**start) >= range.start)
            .map(|(start, _)| *start)
            .collect();
        keys.reverse();
        keys
    }

    /// Segment containing `offset`, if any.
    fn segment_at(&self, offset: u64) -> Option<(u64, &Segment)> {
        self.segments
            .range(..=offset)
            .next_back()
            .filter(|(start, seg)| seg.end(**start) > offset)
            .map(|(start, seg)| (*start, seg))
    }
}

/// Cache of previously fetched byte ranges and their bytes.
pub struct RangeCache {
    state: Mutex<CacheState>,
    capacity: Capacity,
}

impl RangeCache {
    #[must_use]
    pub fn new(capacity: Capacity) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity,
        }
    }

    /// Partition `range` into the cached and missing subsets.
    ///
    /// Pure query: no recency updates, no side effects. The union of the
    /// two outputs reconstructs `range`; their intersection is empty.
    #[must_use]
    pub fn lookup(&self, range: &Range<u64>) -> (Vec<Range<u64>>, Vec<Range<u64>>) {
        let state = self.state.lock();
        (
            state.coverage.intersection_with(range),
            state.coverage.gaps_within(range),
        )
    }

    /// Record a fetched interval.
    ///
    /// Overlapping inserts are accepted; the new bytes win for the
    /// overlapping portion. Touching or overlapping segments merge into
    /// one, so a fully covered request is always served by one segment.
    pub fn insert(&self, range: Range<u64>, bytes: &[u8]) -> CacheResult<()> {
        let expected = range.end.saturating_sub(range.start);
        if bytes.len() as u64 != expected {
            return Err(CacheError::LengthMismatch {
                expected,
                actual: bytes.len() as u64,
            });
        }
        if range.is_empty() {
            return Ok(());
        }

        let mut state = self.state.lock();
        let keys = state.touching_keys(&range);

        let merged_start = keys.first().copied().unwrap_or(range.start).min(range.start);
        let merged_end = keys
            .last()
            .map(|k| {
                let seg = &state.segments[k];
                seg.end(*k)
            })
            .unwrap_or(range.end)
            .max(range.end);

        let mut buf = vec![0u8; (merged_end - merged_start) as usize];
        for key in keys {
            let seg = state.segments.remove(&key).expect("touching key present");
            state.total_bytes -= seg.bytes.len() as u64;
            let at = (key - merged_start) as usize;
            buf[at..at + seg.bytes.len()].copy_from_slice(&seg.bytes);
        }
        // New bytes take precedence for any overlap.
        let at = (range.start - merged_start) as usize;
        buf[at..at + bytes.len()].copy_from_slice(bytes);

        state.total_bytes += buf.len() as u64;
        let tick = state.next_tick();
        state.segments.insert(
            merged_start,
            Segment {
                bytes: buf,
                last_access: tick,
            },
        );
        state.coverage.insert(range.clone());
        trace!(start = range.start, end = range.end, "range cached");

        self.evict_to_capacity(&mut state);
        Ok(())
    }

    /// Read a fully cached range.
    ///
    /// Fails with [`CacheError::NotCached`] naming the first missing
    /// subrange if any byte is absent. Bumps recency of the serving
    /// segment.
    pub fn read(&self, range: &Range<u64>) -> CacheResult<Bytes> {
        if range.is_empty() {
            return Ok(Bytes::new());
        }

        let mut state = self.state.lock();
        if let Some(gap) = state.coverage.gaps_within(range).first() {
            return Err(CacheError::NotCached {
                start: gap.start,
                end: gap.end,
            });
        }

        let tick = state.next_tick();
        let (seg_start, _) = state.segment_at(range.start).ok_or(CacheError::NotCached {
            start: range.start,
            end: range.end,
        })?;
        let seg = state
            .segments
            .get_mut(&seg_start)
            .expect("segment_at key present");
        seg.last_access = tick;

        let at = (range.start - seg_start) as usize;
        let len = (range.end - range.start) as usize;
        Ok(Bytes::copy_from_slice(&seg.bytes[at..at + len]))
    }

    /// Read whatever subset of `range` is present, zero-filling the rest.
    ///
    /// Returns the assembled buffer and the set of offsets actually backed
    /// by cached bytes — the input for validity-mask reconciliation.
    pub fn read_available(&self, range: &Range<u64>) -> (Bytes, ByteRangeSet) {
        if range.is_empty() {
            return (Bytes::new(), ByteRangeSet::new());
        }

        let mut state = self.state.lock();
        let present: ByteRangeSet = state.coverage.intersection_with(range).into_iter().collect();

        let mut buf = vec![0u8; (range.end - range.start) as usize];
        let tick = state.next_tick();
        for covered in present.iter() {
            let (seg_start, _) = match state.segment_at(covered.start) {
                Some(found) => found,
                None => continue,
            };
            let seg = state
                .segments
                .get_mut(&seg_start)
                .expect("segment_at key present");
            seg.last_access = tick;

            let src = (covered.start - seg_start) as usize;
            let len = (covered.end - covered.start) as usize;
            let dst = (covered.start - range.start) as usize;
            buf[dst..dst + len].copy_from_slice(&seg.bytes[src..src + len]);
        }

        (Bytes::from(buf), present)
    }

    /// Snapshot of all cached offsets.
    #[must_use]
    pub fn coverage(&self) -> ByteRangeSet {
        self.state.lock().coverage.clone()
    }

    /// Total cached bytes.
    #[must_use]
    pub fn byte_len(&self) -> u64 {
        self.state.lock().total_bytes
    }

    /// Drop all cached data.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        *state = CacheState::default();
    }

    /// Evict least-recently-read segments whole until under budget.
    ///
    /// The newest segment survives even when it alone exceeds the budget:
    /// once nothing else is left to evict, eviction stops.
    fn evict_to_capacity(&self, state: &mut CacheState) {
        let Capacity::Bounded(budget) = self.capacity else {
            return;
        };

        while state.total_bytes > budget && state.segments.len() > 1 {
            let lru_key = state
                .segments
                .iter()
                .min_by_key(|(_, seg)| seg.last_access)
                .map(|(start, _)| *start)
                .expect("non-empty segment map");
            let seg = state.segments.remove(&lru_key).expect("lru key present");
            let end = seg.end(lru_key);
            state.total_bytes -= seg.bytes.len() as u64;
            state.coverage.remove(lru_key..end);
            debug!(start = lru_key, end, "evicted cached range");
        }
    }
}
