//! Fetch capability contract
//!
//! The network transport lives outside this crate. A paginated feed only
//! needs something that, given a cursor and the feed's filter, returns one
//! batch of items plus the cursor of the next batch.

mod memory;

pub use memory::MemoryFeed;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::FeedFilter;

/// Errors reported by a fetch capability
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response (network, auth, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream API answered but flagged the request as failed.
    #[error("upstream reported failure: {0}")]
    Unsuccessful(String),

    /// The response could not be interpreted as a feed page.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Helper for constructing transport errors.
    pub fn transport(msg: impl Into<String>) -> Self {
        FetchError::Transport(msg.into())
    }
}

/// Response encoding requested from the upstream API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseFormat {
    /// JSON payloads
    #[default]
    Json,
    /// XML payloads
    Xml,
}

/// One request issued by a paginated feed.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    /// Cursor of the requested batch; `None` asks for the first batch.
    pub cursor: Option<&'a str>,
    /// Fixed filter parameters of the feed.
    pub filter: &'a FeedFilter,
    /// Requested response format.
    pub format: ResponseFormat,
}

/// Metadata attached to a page response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Cursor to request the following batch with.
    pub next_cursor: Option<String>,
}

/// One batch as returned by the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage<T> {
    /// Whether the upstream API reported success.
    pub success: bool,
    /// Items of the batch, in feed order.
    pub items: Vec<T>,
    /// Response metadata; absent on malformed responses.
    pub metadata: Option<PageMetadata>,
}

impl<T> FeedPage<T> {
    /// Successful page with a successor cursor.
    pub fn new(items: Vec<T>, next_cursor: impl Into<String>) -> Self {
        Self {
            success: true,
            items,
            metadata: Some(PageMetadata {
                next_cursor: Some(next_cursor.into()),
            }),
        }
    }

    /// Successful page that carries no successor cursor.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            success: true,
            items,
            metadata: Some(PageMetadata { next_cursor: None }),
        }
    }

    /// Page flagged as failed by the upstream API.
    pub fn failed() -> Self {
        Self {
            success: false,
            items: Vec::new(),
            metadata: None,
        }
    }

    /// Successor cursor, if the response carried one.
    pub fn next_cursor(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.next_cursor.as_deref())
    }
}

/// Capability that performs the remote call for one batch.
///
/// Must be idempotent per cursor: the same cursor yields the same items and
/// the same next cursor. Paginated feeds rely on this to detect upstream
/// changes. Timeouts, if any, are the capability's responsibility.
pub trait FetchCapability: Send + Sync {
    /// Item type carried by the feed.
    type Item: Clone + Send + Sync;

    /// Fetch the batch identified by `request.cursor`.
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FeedPage<Self::Item>, FetchError>;
}

impl<F: FetchCapability + ?Sized> FetchCapability for Arc<F> {
    type Item = F::Item;

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FeedPage<Self::Item>, FetchError> {
        (**self).fetch(request)
    }
}

impl<F: FetchCapability + ?Sized> FetchCapability for &F {
    type Item = F::Item;

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FeedPage<Self::Item>, FetchError> {
        (**self).fetch(request)
    }
}
