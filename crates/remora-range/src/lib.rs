#![forbid(unsafe_code)]

//! `remora-range`
//!
//! Byte range primitives for remora.
//!
//! Provides [`ByteRangeSet`] (disjoint sorted set of half-open byte
//! intervals, backed by `rangemap::RangeSet`) and [`coalesce`], which
//! merges nearby missing intervals into a minimal list of fetch requests.

mod coalesce;
mod range;
mod set;

pub use coalesce::{coalesce, PlannedFetch, DEFAULT_MERGE_GAP};
pub use range::{gap_between, intersect, overlaps, touches};
pub use set::ByteRangeSet;
