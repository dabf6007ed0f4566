use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::fetch::{FeedPage, FetchCapability, FetchError, FetchRequest};
use crate::filter::FeedFilter;
use crate::PAGE_SIZE;

type Matcher<T> = Arc<dyn Fn(&FeedFilter, &T) -> bool + Send + Sync>;

/// In-memory feed that pages a fixed list of items the way the upstream API does.
///
/// Cursors are opaque strings of the form `c<offset>`. Once the list is
/// exhausted the response repeats the cursor it was asked for, which is how
/// the remote API signals its last page. Every call is counted, so tests can
/// assert exactly how many fetches a feed issued.
pub struct MemoryFeed<T> {
    items: Vec<T>,
    batch_size: usize,
    matcher: Option<Matcher<T>>,
    fetches: AtomicUsize,
    requested: Mutex<Vec<Option<String>>>,
}

impl<T> fmt::Debug for MemoryFeed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFeed")
            .field("items", &self.items.len())
            .field("batch_size", &self.batch_size)
            .field("filtered", &self.matcher.is_some())
            .field("fetches", &self.fetches.load(Ordering::SeqCst))
            .finish()
    }
}

impl<T: Clone + Send + Sync> MemoryFeed<T> {
    /// Serve `items` in batches of [`PAGE_SIZE`].
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            batch_size: PAGE_SIZE,
            matcher: None,
            fetches: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Override the batch size (to simulate an API that disagrees with [`PAGE_SIZE`]).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Only serve items accepted by `matcher` for the request's filter.
    pub fn with_matcher<M>(mut self, matcher: M) -> Self
    where
        M: Fn(&FeedFilter, &T) -> bool + Send + Sync + 'static,
    {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    /// Number of fetches served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Cursors requested so far, in call order
    pub fn requested_cursors(&self) -> Vec<Option<String>> {
        self.requested.lock().clone()
    }

    fn parse_cursor(cursor: Option<&str>) -> Result<usize, FetchError> {
        match cursor {
            None => Ok(0),
            Some(token) => token
                .strip_prefix('c')
                .and_then(|offset| offset.parse().ok())
                .ok_or_else(|| FetchError::Malformed(format!("unknown cursor '{}'", token))),
        }
    }
}

impl<T: Clone + Send + Sync> FetchCapability for MemoryFeed<T> {
    type Item = T;

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FeedPage<T>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .push(request.cursor.map(str::to_string));

        let offset = Self::parse_cursor(request.cursor)?;
        let visible: Vec<&T> = match &self.matcher {
            Some(matcher) => self
                .items
                .iter()
                .filter(|item| matcher(request.filter, item))
                .collect(),
            None => self.items.iter().collect(),
        };

        let start = offset.min(visible.len());
        let end = (start + self.batch_size).min(visible.len());
        let items = visible[start..end].iter().map(|&item| item.clone()).collect();

        let next_cursor = match request.cursor {
            Some(cursor) if end == visible.len() => cursor.to_string(),
            _ => format!("c{}", end),
        };

        Ok(FeedPage::new(items, next_cursor))
    }
}
