//! # Random-access sequences over cursor-paginated feeds
//!
//! Remote feeds that only expose "give me the batch after this cursor" are
//! forward-only. This crate turns such a feed into a zero-based sequence that
//! supports both sequential scans and arbitrary index lookups.
//!
//! ## Core Algorithm
//!
//! 1. **Index resolution**: item `i` lives on page `i / PAGE_SIZE` at offset `i % PAGE_SIZE`
//! 2. **Cursor table**: every page ever fetched records the cursor of its successor
//! 3. **Page cache**: page 0 is kept forever, other pages live in a small LRU
//! 4. **Consistency check**: re-fetching a page must reproduce the recorded successor cursor
//!
//! Result: at most one fetch per distinct cached page, and upstream drift is
//! reported instead of silently producing a different sequence.
//!
//! ## Usage Example
//!
//! ```
//! use cursorfeed::{FeedConfig, FeedFilter, MemoryFeed, PaginatedFeed};
//!
//! let capability = MemoryFeed::new((0..45).collect::<Vec<u32>>());
//! let feed = PaginatedFeed::new(capability, FeedFilter::default(), FeedConfig::default());
//!
//! assert_eq!(feed.item_at(44).unwrap(), 44);
//! assert!(feed.item_at(45).unwrap_err().is_out_of_range());
//! assert_eq!(feed.size().unwrap(), 45);
//! ```

#![warn(missing_docs, missing_debug_implementations)]

// Core modules
pub mod cache;    // Bounded LRU for non-zero pages
pub mod config;   // Feed configuration
pub mod cursor;   // Page cursor table
pub mod factory;  // Feed variant construction
pub mod fetch;    // Fetch capability contract
pub mod filter;   // Feed filter parameters and variants
pub mod sequence; // Paginated sequence

// Re-exports for convenience
pub use cache::PageCache;
pub use config::FeedConfig;
pub use cursor::{CursorSlot, CursorTable};
pub use factory::FeedFactory;
pub use fetch::{
    FeedPage, FetchCapability, FetchError, FetchRequest, MemoryFeed, PageMetadata, ResponseFormat,
};
pub use filter::{FeedCategory, FeedFilter, FeedKind};
pub use sequence::{FeedIter, FeedStats, PaginatedFeed};

use thiserror::Error;

/// Number of items the upstream API returns per batch.
///
/// Fixed by the remote API; a short batch means the feed has ended.
pub const PAGE_SIZE: usize = 20;

/// Errors raised while resolving items or pages of a feed
#[derive(Error, Debug)]
pub enum FeedError {
    /// The page (or the item within it) lies past the end of the feed.
    ///
    /// This is the normal end-of-sequence signal, not a failure.
    #[error("page {page} is past the end of the feed")]
    OutOfRange {
        /// Page index that could not be resolved
        page: usize,
    },

    /// The fetch capability failed or returned an unusable response
    #[error("fetching page {page} failed: {source}")]
    Fetch {
        /// Page index being fetched
        page: usize,
        /// Underlying capability error
        #[source]
        source: FetchError,
    },

    /// A re-fetched page disagrees with the successor cursor recorded earlier
    #[error(
        "cursor for page {page} changed since it was recorded: recorded {recorded}, observed {observed}"
    )]
    ConsistencyViolation {
        /// Page index whose cursor slot disagrees
        page: usize,
        /// Slot value committed by an earlier fetch
        recorded: CursorSlot,
        /// Slot value computed from the latest fetch
        observed: CursorSlot,
    },

    /// Invalid feed configuration
    #[error("invalid feed configuration: {0}")]
    InvalidConfiguration(String),
}

impl FeedError {
    /// True for the end-of-sequence signal.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, FeedError::OutOfRange { .. })
    }

    /// True for errors that require abandoning the sequence instance.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FeedError::Fetch { .. } | FeedError::ConsistencyViolation { .. }
        )
    }
}
