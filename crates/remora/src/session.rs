//! Reader sessions over one remote resource.
//!
//! [`RemoteReader`] is the factory: it owns the transport and the decode
//! pool, shared across every session it opens. A [`ReaderSession`] serves
//! random-access reads over one resource, fetching missing byte ranges
//! (coalesced per the configured gap), caching them, and assembling each
//! requested window off the I/O threads.

use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::try_join_all;
use futures::FutureExt;
use remora_cache::{BlockCache, RangeCache};
use remora_decode::{Block, BlockDecoder, DecodePool, IdentityDecoder, Mask};
use remora_net::{FetchError, Fetcher, FetcherExt, HttpFetcher};
use remora_range::coalesce;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::{
    config::ReaderOptions,
    error::{ReaderError, ReaderResult},
    inflight::InflightFetches,
};

/// Factory for reader sessions sharing one transport and decode pool.
pub struct RemoteReader {
    fetcher: Arc<dyn Fetcher>,
    pool: Arc<DecodePool>,
    options: ReaderOptions,
}

impl RemoteReader {
    /// Reader backed by HTTP range requests with bounded retry.
    #[must_use]
    pub fn new(options: ReaderOptions) -> Self {
        let retry_policy = options.fetch.retry_policy.clone();
        let fetcher = Arc::new(HttpFetcher::new(options.fetch.clone()).with_retry(retry_policy));
        Self::with_fetcher(options, fetcher)
    }

    /// Reader over a caller-supplied transport.
    #[must_use]
    pub fn with_fetcher(options: ReaderOptions, fetcher: Arc<dyn Fetcher>) -> Self {
        let pool = if options.decode_workers == 0 {
            DecodePool::with_default_size()
        } else {
            let depth = match options.decode_queue_depth {
                0 => options.decode_workers * 2,
                depth => depth,
            };
            DecodePool::new(options.decode_workers, depth)
        };
        Self {
            fetcher,
            pool: Arc::new(pool),
            options,
        }
    }

    /// Open a session with the pass-through decoder.
    pub async fn open(&self, url: Url) -> ReaderResult<ReaderSession> {
        self.open_with_decoder(url, Arc::new(IdentityDecoder)).await
    }

    /// Open a session: discover the resource length, then prefetch the
    /// configured head span.
    ///
    /// Length discovery failures fail the open. Prefetch failures do not;
    /// the bytes are fetched again on the first read that needs them.
    pub async fn open_with_decoder(
        &self,
        url: Url,
        decoder: Arc<dyn BlockDecoder>,
    ) -> ReaderResult<ReaderSession> {
        let len = self.fetcher.length(&url).await?;
        debug!(%url, len, "session opened");

        let session = ReaderSession {
            inner: Arc::new(SessionInner {
                url,
                len,
                fetcher: Arc::clone(&self.fetcher),
                pool: Arc::clone(&self.pool),
                cache: Arc::new(RangeCache::new(self.options.capacity)),
                blocks: self.options.block_cache.map(BlockCache::new),
                decoder,
                inflight: InflightFetches::default(),
                merge_gap: self.options.merge_gap,
                cancel: CancellationToken::new(),
            }),
        };

        let head = self.options.prefetch_bytes.min(len);
        if head > 0 {
            if let Err(err) = session.ensure_fetched(0..head).await {
                warn!(%err, "head prefetch failed");
            }
        }
        Ok(session)
    }
}

/// Result of one windowed read: the assembled bytes and the per-byte
/// validity of what backed them at assembly time.
#[derive(Clone, Debug)]
pub struct ReadOutput {
    pub bytes: Bytes,
    pub mask: Mask,
}

struct SessionInner {
    url: Url,
    len: u64,
    fetcher: Arc<dyn Fetcher>,
    pool: Arc<DecodePool>,
    cache: Arc<RangeCache>,
    blocks: Option<BlockCache<Arc<Block>>>,
    decoder: Arc<dyn BlockDecoder>,
    inflight: InflightFetches,
    merge_gap: u64,
    cancel: CancellationToken,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Random-access reads over one remote resource.
///
/// Cheap to clone; clones share the cache, in-flight fetch table, and
/// close state.
#[derive(Clone)]
pub struct ReaderSession {
    inner: Arc<SessionInner>,
}

impl ReaderSession {
    /// Total length of the resource, discovered at open.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Bytes currently held by the range cache.
    #[must_use]
    pub fn cached_bytes(&self) -> u64 {
        self.inner.cache.byte_len()
    }

    /// Read `len` bytes at `offset`.
    ///
    /// Missing subranges are fetched first (merged per the configured gap,
    /// deduplicated against fetches already in flight); the window is then
    /// assembled on the decode pool. A window overhanging the end of the
    /// resource is clamped for fetching, but the returned buffer still has
    /// `len` bytes: the overhang is zero-filled and invalid in the mask.
    ///
    /// A read starting at or past the end fails with
    /// [`ReaderError::RangeUnsatisfiable`]; so does any fetch failure after
    /// retries. Partial results are never silently returned.
    pub async fn read(&self, offset: u64, len: u64) -> ReaderResult<ReadOutput> {
        if self.inner.cancel.is_cancelled() {
            return Err(ReaderError::Closed);
        }
        if len == 0 {
            return Ok(ReadOutput {
                bytes: Bytes::new(),
                mask: Mask::all_valid(0),
            });
        }
        let out_of_bounds = ReaderError::RangeUnsatisfiable {
            offset,
            len,
            resource_len: self.inner.len,
        };
        if offset >= self.inner.len {
            return Err(out_of_bounds);
        }
        let end = offset.checked_add(len).ok_or(out_of_bounds)?;

        self.ensure_fetched(offset..end.min(self.inner.len)).await?;

        let window = offset..end;
        let cache = Arc::clone(&self.inner.cache);
        let handle = self
            .inner
            .pool
            .submit(move || {
                let (bytes, present) = cache.read_available(&window);
                let mask = Mask::from_coverage(&window, &present, 1);
                Ok(ReadOutput { bytes, mask })
            })
            .await;
        Ok(handle.join().await?)
    }

    /// Read and decode the block at `index` spanning `byte_range`.
    ///
    /// Complete blocks are served from and stored in the block cache.
    /// The mask is computed at the decoder's sample granularity from
    /// coverage at decode time and never upgraded afterwards; re-reading
    /// an incomplete block after more data arrives decodes a fresh one.
    pub async fn read_block(&self, index: u64, byte_range: Range<u64>) -> ReaderResult<Arc<Block>> {
        if self.inner.cancel.is_cancelled() {
            return Err(ReaderError::Closed);
        }
        if let Some(blocks) = &self.inner.blocks {
            if let Some(block) = blocks.get(index) {
                trace!(index, "block cache hit");
                return Ok(block);
            }
        }
        if byte_range.is_empty() || byte_range.start >= self.inner.len {
            return Err(ReaderError::RangeUnsatisfiable {
                offset: byte_range.start,
                len: byte_range.end.saturating_sub(byte_range.start),
                resource_len: self.inner.len,
            });
        }

        self.ensure_fetched(byte_range.start..byte_range.end.min(self.inner.len))
            .await?;

        let cache = Arc::clone(&self.inner.cache);
        let decoder = Arc::clone(&self.inner.decoder);
        let range = byte_range.clone();
        let handle = self
            .inner
            .pool
            .submit(move || {
                let (raw, present) = cache.read_available(&range);
                let data = decoder.decode(&raw)?;
                let mask = Mask::from_coverage(&range, &present, decoder.sample_size());
                Ok(Block::new(index, range, data, mask))
            })
            .await;
        let block = Arc::new(handle.join().await?);

        if let Some(blocks) = &self.inner.blocks {
            // Only complete blocks are cached, so a later read can still
            // produce a complete decode of the same index.
            if block.is_complete() {
                blocks.put(index, Arc::clone(&block));
            }
        }
        Ok(block)
    }

    /// Warm the cache for `range` without returning bytes.
    ///
    /// Clamped to the resource length; a fully out-of-bounds range is a
    /// no-op.
    pub async fn prefetch(&self, range: Range<u64>) -> ReaderResult<()> {
        if self.inner.cancel.is_cancelled() {
            return Err(ReaderError::Closed);
        }
        let clamped = range.start.min(self.inner.len)..range.end.min(self.inner.len);
        self.ensure_fetched(clamped).await
    }

    /// Close the session.
    ///
    /// Subsequent reads fail with [`ReaderError::Closed`]. Fetches already
    /// in flight are left to finish; their bytes land in the cache and are
    /// freed when the last session clone drops.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Fetch every missing subrange of `range` into the cache.
    async fn ensure_fetched(&self, range: Range<u64>) -> ReaderResult<()> {
        if range.is_empty() {
            return Ok(());
        }
        let (_, missing) = self.inner.cache.lookup(&range);
        if missing.is_empty() {
            trace!(start = range.start, end = range.end, "window fully cached");
            return Ok(());
        }

        let plan = coalesce(&missing, self.inner.merge_gap);
        debug!(
            start = range.start,
            end = range.end,
            requests = plan.len(),
            "fetch plan"
        );

        let mut joined = Vec::with_capacity(plan.len());
        for planned in &plan {
            let entry = self.inner.inflight.join_or_spawn(&planned.fetch, || {
                let fetcher = Arc::clone(&self.inner.fetcher);
                let cache = Arc::clone(&self.inner.cache);
                let url = self.inner.url.clone();
                let fetch = planned.fetch.clone();
                // Spawned so an abandoned caller does not cancel the fetch
                // for everyone else joined on it.
                let task = tokio::spawn(async move {
                    let bytes = fetcher.fetch_range(&url, fetch.clone()).await?;
                    cache.insert(fetch, &bytes)?;
                    Ok::<(), ReaderError>(())
                });
                async move {
                    match task.await {
                        Ok(result) => result,
                        Err(_) => Err(ReaderError::Fetch(FetchError::Transient(
                            "fetch task aborted".into(),
                        ))),
                    }
                }
                .boxed()
            });
            joined.push(entry);
        }

        let result = try_join_all(joined.iter().map(|(_, fut)| fut.clone())).await;
        for (key, _) in &joined {
            self.inner.inflight.complete(key);
        }
        result?;
        Ok(())
    }
}
