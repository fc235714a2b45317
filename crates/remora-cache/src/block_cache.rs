//! Count-bounded LRU cache for decoded blocks.
//!
//! Second-level cache keyed by block index. Values are whatever the
//! consumer decodes (the façade stores `Arc<Block>`); this crate only
//! handles recency and eviction, mirroring the byte-range cache's LRU
//! discipline.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::trace;

/// Configuration for [`BlockCache`].
#[derive(Clone, Copy, Debug)]
pub struct BlockCacheOptions {
    /// Max resident blocks before LRU eviction.
    pub max_blocks: usize,
}

impl Default for BlockCacheOptions {
    fn default() -> Self {
        Self { max_blocks: 256 }
    }
}

struct LruState<V> {
    entries: HashMap<u64, (V, u64)>,
    tick: u64,
}

/// LRU cache of decoded blocks, keyed by block index.
pub struct BlockCache<V> {
    state: Mutex<LruState<V>>,
    max_blocks: usize,
}

impl<V: Clone> BlockCache<V> {
    #[must_use]
    pub fn new(options: BlockCacheOptions) -> Self {
        Self {
            state: Mutex::new(LruState {
                entries: HashMap::new(),
                tick: 0,
            }),
            max_blocks: options.max_blocks.max(1),
        }
    }

    /// Fetch a block, bumping its recency.
    #[must_use]
    pub fn get(&self, index: u64) -> Option<V> {
        let mut state = self.state.lock();
        state.tick += 1;
        let tick = state.tick;
        let (value, last_access) = state.entries.get_mut(&index)?;
        *last_access = tick;
        Some(value.clone())
    }

    /// Store a block, evicting least-recently-used entries beyond capacity.
    pub fn put(&self, index: u64, value: V) {
        let mut state = self.state.lock();
        state.tick += 1;
        let tick = state.tick;
        state.entries.insert(index, (value, tick));

        while state.entries.len() > self.max_blocks {
            let lru = state
                .entries
                .iter()
                .min_by_key(|(_, (_, last_access))| *last_access)
                .map(|(index, _)| *index)
                .expect("non-empty entry map");
            state.entries.remove(&lru);
            trace!(index = lru, "evicted decoded block");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}
