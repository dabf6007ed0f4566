//! Paginated sequence over a cursor-paginated feed
//!
//! Resolves a global item index to `(page, offset)`, discovers page cursors
//! in order, and caches fetched batches:
//!
//! 1. Page 0 is kept for the lifetime of the feed
//! 2. Other pages live in a bounded LRU ([`PageCache`])
//! 3. Each fetch records (or re-validates) the cursor of the following page
//!
//! A page is resolved without fetching iff it is cached or its cursor slot
//! is terminal ([`CursorSlot::Terminal`] or [`CursorSlot::Exhausted`]).

mod iter;

pub use iter::FeedIter;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, trace, warn};

use crate::cache::PageCache;
use crate::config::FeedConfig;
use crate::cursor::{CursorSlot, CursorTable};
use crate::fetch::{FeedPage, FetchCapability, FetchError, FetchRequest};
use crate::filter::FeedFilter;
use crate::{FeedError, PAGE_SIZE};

/// Fetch and cache counters for one feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Calls issued to the fetch capability
    pub fetches: u64,
    /// Lookups served from the retained page 0
    pub page0_hits: u64,
    /// Lookups served from the LRU cache
    pub cache_hits: u64,
    /// Lookups of non-zero pages missing from the LRU cache
    pub cache_misses: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    fetches: AtomicU64,
    page0_hits: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl StatsCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> FeedStats {
        FeedStats {
            fetches: self.fetches.load(Ordering::Relaxed),
            page0_hits: self.page0_hits.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

/// Zero-based, random-access view of a cursor-paginated feed
///
/// Safe to share between threads; concurrent callers may fetch the same page
/// twice, but only one successor cursor is ever committed per page.
pub struct PaginatedFeed<F: FetchCapability> {
    capability: F,
    filter: FeedFilter,
    config: FeedConfig,
    cursors: CursorTable,
    page0: RwLock<Option<Arc<[F::Item]>>>,
    cache: PageCache<F::Item>,
    stats: StatsCounters,
}

impl<F: FetchCapability> fmt::Debug for PaginatedFeed<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedFeed")
            .field("filter", &self.filter)
            .field("config", &self.config)
            .field("known_pages", &self.cursors.len())
            .field("page0_loaded", &self.page0.read().is_some())
            .field("cached_pages", &self.cache.len())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl<F: FetchCapability> PaginatedFeed<F> {
    /// Create a feed view; nothing is fetched until an item is requested.
    pub fn new(capability: F, filter: impl Into<FeedFilter>, config: FeedConfig) -> Self {
        let cache = PageCache::new(config.cache_pages);
        Self {
            capability,
            filter: filter.into(),
            config,
            cursors: CursorTable::new(),
            page0: RwLock::new(None),
            cache,
            stats: StatsCounters::default(),
        }
    }

    /// Validate `config` and create a feed view.
    ///
    /// With `eager_first_page` set, page 0 is fetched immediately; an empty
    /// feed is not an error.
    pub fn open(
        capability: F,
        filter: impl Into<FeedFilter>,
        config: FeedConfig,
    ) -> Result<Self, FeedError> {
        config.validate()?;
        let feed = Self::new(capability, filter, config);
        if feed.config.eager_first_page {
            match feed.resolve_page(0) {
                Ok(_) => {}
                Err(err) if err.is_out_of_range() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(feed)
    }

    /// Discard all discovered state and start over with the same capability.
    ///
    /// The way to continue after a fatal error: stale cursors cannot be reused.
    pub fn restart(self) -> Self {
        Self::new(self.capability, self.filter, self.config)
    }

    /// Filter parameters passed with every fetch
    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    /// Configuration of this feed
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Underlying fetch capability
    pub fn capability(&self) -> &F {
        &self.capability
    }

    /// Cursor slots discovered so far, in page order
    pub fn cursor_slots(&self) -> Vec<CursorSlot> {
        self.cursors.snapshot()
    }

    /// Fetch and cache counters
    pub fn stats(&self) -> FeedStats {
        self.stats.snapshot()
    }

    /// Item at zero-based `index`.
    ///
    /// Returns [`FeedError::OutOfRange`] past the end of the feed, including
    /// offsets beyond a short final page.
    pub fn item_at(&self, index: usize) -> Result<F::Item, FeedError> {
        trace!(index, "getting item");
        let page = index / PAGE_SIZE;
        let offset = index % PAGE_SIZE;

        let batch = self.resolve_page(page)?;
        batch
            .get(offset)
            .cloned()
            .ok_or(FeedError::OutOfRange { page })
    }

    /// Like [`item_at`](Self::item_at), with the end of the feed mapped to `None`.
    pub fn get(&self, index: usize) -> Result<Option<F::Item>, FeedError> {
        match self.item_at(index) {
            Ok(item) => Ok(Some(item)),
            Err(err) if err.is_out_of_range() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Items of page `page`, fetching it (and any unseen predecessors) if needed.
    pub fn resolve_page(&self, page: usize) -> Result<Arc<[F::Item]>, FeedError> {
        if let Some(batch) = self.cached(page) {
            return Ok(batch);
        }

        // A page's cursor is only learned by fetching its predecessor, so walk
        // forward from the first page whose successor is still unknown.
        while self.cursors.len() <= page {
            let frontier = self.cursors.frontier();
            match self.cursors.slot(frontier) {
                Some(slot) if !slot.is_terminal() => match self.fetch_page(frontier, slot) {
                    Ok(_) => {}
                    Err(err) if err.is_out_of_range() => {
                        return Err(FeedError::OutOfRange { page });
                    }
                    Err(err) => return Err(err),
                },
                _ => return Err(FeedError::OutOfRange { page }),
            }
        }

        match self.cursors.slot(page) {
            Some(slot) if !slot.is_terminal() => self.fetch_page(page, slot),
            _ => {
                trace!(page, "page is past the end");
                Err(FeedError::OutOfRange { page })
            }
        }
    }

    /// Number of items, by scanning the whole feed.
    ///
    /// The upstream API offers no count, so this costs one fetch per
    /// uncached page.
    pub fn size(&self) -> Result<usize, FeedError> {
        let mut total = 0;
        for page in 0.. {
            match self.resolve_page(page) {
                Ok(batch) => total += batch.len(),
                Err(err) if err.is_out_of_range() => break,
                Err(err) => return Err(err),
            }
        }
        Ok(total)
    }

    /// Whether the feed has no items (resolves page 0 only).
    pub fn is_empty(&self) -> Result<bool, FeedError> {
        match self.resolve_page(0) {
            Ok(batch) => Ok(batch.is_empty()),
            Err(err) if err.is_out_of_range() => Ok(true),
            Err(err) => Err(err),
        }
    }

    /// Iterate items from index 0.
    pub fn iter(&self) -> FeedIter<'_, F> {
        FeedIter::new(self, 0)
    }

    /// Iterate items starting at `start`.
    pub fn iter_from(&self, start: usize) -> FeedIter<'_, F> {
        FeedIter::new(self, start)
    }

    fn cached(&self, page: usize) -> Option<Arc<[F::Item]>> {
        if page == 0 {
            let batch = self.page0.read().clone()?;
            StatsCounters::bump(&self.stats.page0_hits);
            return Some(batch);
        }

        match self.cache.get(page) {
            Some(batch) => {
                StatsCounters::bump(&self.stats.cache_hits);
                debug!(page, "page cache hit");
                Some(batch)
            }
            None => {
                StatsCounters::bump(&self.stats.cache_misses);
                None
            }
        }
    }

    fn fetch_page(&self, page: usize, slot: CursorSlot) -> Result<Arc<[F::Item]>, FeedError> {
        debug!(page, cursor = %slot, "loading page");
        let request = FetchRequest {
            cursor: slot.as_cursor(),
            filter: &self.filter,
            format: self.config.format,
        };

        StatsCounters::bump(&self.stats.fetches);
        let response = self
            .capability
            .fetch(&request)
            .map_err(|source| FeedError::Fetch { page, source })?;
        let (items, next) = Self::validate_response(page, &slot, response)?;

        if let Err(err) = self.cursors.commit_next(page, next) {
            warn!(page, error = %err, "upstream feed changed between observations");
            return Err(err);
        }

        if items.is_empty() {
            info!(page, "empty page, marking end of feed");
            self.cursors.mark_exhausted(page);
            return Err(FeedError::OutOfRange { page });
        }

        let batch: Arc<[F::Item]> = items.into();
        if page == 0 {
            *self.page0.write() = Some(Arc::clone(&batch));
        } else if let Some(evicted) = self.cache.insert(page, Arc::clone(&batch)) {
            debug!(page, evicted, "evicted page from cache");
        }
        Ok(batch)
    }

    /// Check a response and derive the cursor slot of the following page.
    fn validate_response(
        page: usize,
        used: &CursorSlot,
        response: FeedPage<F::Item>,
    ) -> Result<(Vec<F::Item>, CursorSlot), FeedError> {
        let fail = |source: FetchError| FeedError::Fetch { page, source };

        let FeedPage {
            success,
            items,
            metadata,
        } = response;
        if !success {
            return Err(fail(FetchError::Unsuccessful(format!(
                "request for {} was rejected",
                used
            ))));
        }
        if items.len() > PAGE_SIZE {
            return Err(fail(FetchError::Malformed(format!(
                "batch of {} items exceeds page size {}",
                items.len(),
                PAGE_SIZE
            ))));
        }
        let metadata =
            metadata.ok_or_else(|| fail(FetchError::Malformed("missing metadata".to_string())))?;

        let next = match metadata.next_cursor {
            _ if items.len() < PAGE_SIZE => CursorSlot::Terminal,
            Some(next) if used.as_cursor() == Some(next.as_str()) => CursorSlot::Terminal,
            Some(next) => CursorSlot::Token(next),
            None => {
                return Err(fail(FetchError::Malformed(
                    "full page without a next cursor".to_string(),
                )))
            }
        };

        if next.is_terminal() {
            info!(page, items = items.len(), "reached last page of feed");
        }
        Ok((items, next))
    }
}

impl<'a, F: FetchCapability> IntoIterator for &'a PaginatedFeed<F> {
    type Item = Result<F::Item, FeedError>;
    type IntoIter = FeedIter<'a, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
