//! Sequential iteration over a paginated feed

use std::iter::FusedIterator;

use crate::fetch::FetchCapability;
use crate::sequence::PaginatedFeed;
use crate::FeedError;

/// Index-increasing traversal of a [`PaginatedFeed`].
///
/// Ends at the end of the feed. A fatal error is yielded once, after which
/// the iterator is exhausted.
#[derive(Debug)]
pub struct FeedIter<'a, F: FetchCapability> {
    feed: &'a PaginatedFeed<F>,
    next: usize,
    done: bool,
}

impl<'a, F: FetchCapability> FeedIter<'a, F> {
    pub(crate) fn new(feed: &'a PaginatedFeed<F>, start: usize) -> Self {
        Self {
            feed,
            next: start,
            done: false,
        }
    }

    /// Index of the item the next call to `next` will return
    pub fn position(&self) -> usize {
        self.next
    }
}

impl<F: FetchCapability> Iterator for FeedIter<'_, F> {
    type Item = Result<F::Item, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.feed.item_at(self.next) {
            Ok(item) => {
                self.next += 1;
                Some(Ok(item))
            }
            Err(err) if err.is_out_of_range() => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<F: FetchCapability> FusedIterator for FeedIter<'_, F> {}
