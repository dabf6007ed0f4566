//! Bounded page cache
//!
//! Least-recently-used store of page index → batch. Page 0 never enters it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

/// One cached batch with the tick of its last use
#[derive(Debug)]
struct Entry<T> {
    batch: Arc<[T]>,
    last_used: u64,
}

/// LRU bookkeeping, guarded by the cache mutex
#[derive(Debug)]
struct LruState<T> {
    entries: HashMap<usize, Entry<T>>,
    /// Last-use tick → page, least recent first
    recency: BTreeMap<u64, usize>,
    tick: u64,
}

impl<T> LruState<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Mark `page` most recently used; no-op if it is not cached
    fn touch(&mut self, page: usize) {
        let tick = self.next_tick();
        if let Some(entry) = self.entries.get_mut(&page) {
            self.recency.remove(&entry.last_used);
            entry.last_used = tick;
            self.recency.insert(tick, page);
        }
    }

    fn pop_least_recent(&mut self) -> Option<usize> {
        let (_, page) = self.recency.pop_first()?;
        self.entries.remove(&page);
        Some(page)
    }
}

/// Thread-safe LRU of fetched page batches
///
/// Recency is an ordered index of last-use ticks, so lookups and evictions
/// stay logarithmic for large capacities.
#[derive(Debug)]
pub struct PageCache<T> {
    state: Mutex<LruState<T>>,
    capacity: usize,
}

impl<T> PageCache<T> {
    /// Create a cache holding at most `capacity` pages (0 disables caching)
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(LruState::new()),
            capacity,
        }
    }

    /// Maximum number of pages retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pages currently retained
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether no pages are retained
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a page, marking it most recently used
    pub fn get(&self, page: usize) -> Option<Arc<[T]>> {
        let mut state = self.state.lock();
        let batch = Arc::clone(&state.entries.get(&page)?.batch);
        state.touch(page);
        Some(batch)
    }

    /// Whether a page is retained, without touching recency
    pub fn contains(&self, page: usize) -> bool {
        self.state.lock().entries.contains_key(&page)
    }

    /// Store a page, evicting the least recently used one on overflow
    ///
    /// Returns the evicted page index, if any.
    pub fn insert(&self, page: usize, batch: Arc<[T]>) -> Option<usize> {
        if self.capacity == 0 {
            return None;
        }

        let mut state = self.state.lock();
        let tick = state.next_tick();
        if let Some(old) = state.entries.insert(
            page,
            Entry {
                batch,
                last_used: tick,
            },
        ) {
            state.recency.remove(&old.last_used);
        }
        state.recency.insert(tick, page);

        if state.entries.len() > self.capacity {
            return state.pop_least_recent();
        }
        None
    }

    /// Drop a page from the cache
    pub fn remove(&self, page: usize) -> Option<Arc<[T]>> {
        let mut state = self.state.lock();
        let entry = state.entries.remove(&page)?;
        state.recency.remove(&entry.last_used);
        Some(entry.batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(values: &[u32]) -> Arc<[u32]> {
        Arc::from(values.to_vec())
    }

    #[test]
    fn test_get_after_insert() {
        let cache = PageCache::new(2);
        cache.insert(1, batch(&[1, 2]));
        assert_eq!(cache.get(1).as_deref(), Some(&[1, 2][..]));
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = PageCache::new(2);
        cache.insert(1, batch(&[1]));
        cache.insert(2, batch(&[2]));
        // Touch page 1 so page 2 becomes the victim
        cache.get(1);
        assert_eq!(cache.insert(3, batch(&[3])), Some(2));
        assert!(cache.contains(1));
        assert!(!cache.contains(2));
        assert!(cache.contains(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reinsert_does_not_evict() {
        let cache = PageCache::new(1);
        cache.insert(4, batch(&[1]));
        assert_eq!(cache.insert(4, batch(&[2])), None);
        assert_eq!(cache.get(4).as_deref(), Some(&[2][..]));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = PageCache::new(0);
        assert_eq!(cache.insert(1, batch(&[1])), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove() {
        let cache = PageCache::new(3);
        cache.insert(1, batch(&[1]));
        assert!(cache.remove(1).is_some());
        assert!(cache.remove(1).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_large_capacity_keeps_lru_order() {
        let cache = PageCache::new(1_000);
        for page in 1..=1_000usize {
            cache.insert(page, batch(&[page as u32]));
        }
        // Touch every odd page, so the even ones become the oldest.
        for page in (1..=1_000usize).step_by(2) {
            assert!(cache.get(page).is_some());
        }
        for (n, page) in (1_001..=1_010usize).enumerate() {
            assert_eq!(cache.insert(page, batch(&[0])), Some(2 * (n + 1)));
        }
        assert_eq!(cache.len(), 1_000);
        assert!(cache.contains(1));
        assert!(!cache.contains(2));
    }

    #[test]
    fn test_remove_then_evict_skips_removed_page() {
        let cache = PageCache::new(2);
        cache.insert(1, batch(&[1]));
        cache.insert(2, batch(&[2]));
        cache.remove(1);
        assert_eq!(cache.insert(3, batch(&[3])), None);
        assert_eq!(cache.insert(4, batch(&[4])), Some(2));
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(PageCache::new(4));
        std::thread::scope(|scope| {
            for t in 0..4usize {
                let cache = Arc::clone(&cache);
                scope.spawn(move || {
                    for page in 1..50usize {
                        cache.insert(page, batch(&[t as u32]));
                        cache.get(page);
                    }
                });
            }
        });
        assert!(cache.len() <= 4);
    }
}
