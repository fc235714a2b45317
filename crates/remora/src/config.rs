//! Reader configuration.

use remora_cache::{BlockCacheOptions, Capacity};
use remora_net::FetchOptions;
use remora_range::DEFAULT_MERGE_GAP;

/// Bytes prefetched from offset zero when a session opens.
///
/// Most container formats keep their index structures in the first few
/// kilobytes, so this usually saves the first round trip of a read.
pub const DEFAULT_PREFETCH_BYTES: u64 = 16 * 1024;

/// Configuration for [`RemoteReader`](crate::RemoteReader).
#[derive(Clone, Debug)]
pub struct ReaderOptions {
    /// Head span fetched at open; clamped to the resource length.
    pub prefetch_bytes: u64,
    /// Max gap between missing intervals merged into one request.
    /// Zero merges only touching intervals.
    pub merge_gap: u64,
    /// Byte budget of the per-session range cache.
    pub capacity: Capacity,
    /// Decoded-block cache; `None` (the default) decodes on every block
    /// read, trading recomputation for memory.
    pub block_cache: Option<BlockCacheOptions>,
    /// Decode worker threads. Zero sizes the pool to the machine.
    pub decode_workers: usize,
    /// Decode queue depth. Zero derives it from the worker count.
    pub decode_queue_depth: usize,
    pub fetch: FetchOptions,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            prefetch_bytes: DEFAULT_PREFETCH_BYTES,
            merge_gap: 0,
            capacity: Capacity::default(),
            block_cache: None,
            decode_workers: 0,
            decode_queue_depth: 0,
            fetch: FetchOptions::default(),
        }
    }
}

impl ReaderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_prefetch_bytes(mut self, bytes: u64) -> Self {
        self.prefetch_bytes = bytes;
        self
    }

    #[must_use]
    pub fn with_merge_gap(mut self, gap: u64) -> Self {
        self.merge_gap = gap;
        self
    }

    /// Toggle request merging with the stock gap.
    #[must_use]
    pub fn with_merge_enabled(mut self, enabled: bool) -> Self {
        self.merge_gap = if enabled { DEFAULT_MERGE_GAP } else { 0 };
        self
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_cache_bytes(mut self, bytes: u64) -> Self {
        self.capacity = Capacity::Bounded(bytes);
        self
    }

    #[must_use]
    pub fn with_unbounded_cache(mut self) -> Self {
        self.capacity = Capacity::Unbounded;
        self
    }

    #[must_use]
    pub fn with_block_cache(mut self, options: BlockCacheOptions) -> Self {
        self.block_cache = Some(options);
        self
    }

    #[must_use]
    pub fn without_block_cache(mut self) -> Self {
        self.block_cache = None;
        self
    }

    #[must_use]
    pub fn with_decode_workers(mut self, workers: usize) -> Self {
        self.decode_workers = workers;
        self
    }

    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_bounded_and_unmerged() {
        let options = ReaderOptions::default();
        assert_eq!(options.prefetch_bytes, DEFAULT_PREFETCH_BYTES);
        assert_eq!(options.merge_gap, 0);
        assert_eq!(options.capacity, Capacity::Bounded(Capacity::DEFAULT_BYTES));
        assert!(options.block_cache.is_none());
    }

    #[test]
    fn merge_toggle_maps_to_gap() {
        assert_eq!(
            ReaderOptions::new().with_merge_enabled(true).merge_gap,
            DEFAULT_MERGE_GAP
        );
        assert_eq!(
            ReaderOptions::new()
                .with_merge_gap(64)
                .with_merge_enabled(false)
                .merge_gap,
            0
        );
    }

    #[test]
    fn builder_chains() {
        let options = ReaderOptions::new()
            .with_prefetch_bytes(0)
            .with_cache_bytes(1024)
            .without_block_cache()
            .with_decode_workers(2);
        assert_eq!(options.prefetch_bytes, 0);
        assert_eq!(options.capacity, Capacity::Bounded(1024));
        assert!(options.block_cache.is_none());
        assert_eq!(options.decode_workers, 2);
    }
}
