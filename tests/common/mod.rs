#![allow(dead_code)]

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use cursorfeed::{
    FeedConfig, FeedFilter, FeedPage, FetchCapability, FetchError, FetchRequest, MemoryFeed,
    PaginatedFeed, PageMetadata,
};
use parking_lot::Mutex;

/// Feed of the integers `0..len` with the default config.
pub fn numbered_feed(len: u32) -> PaginatedFeed<MemoryFeed<u32>> {
    numbered_feed_with(len, FeedConfig::default())
}

/// Feed of the integers `0..len` with an explicit config.
pub fn numbered_feed_with(len: u32, config: FeedConfig) -> PaginatedFeed<MemoryFeed<u32>> {
    PaginatedFeed::new(
        MemoryFeed::new((0..len).collect()),
        FeedFilter::default(),
        config,
    )
}

/// Capability that returns a different next cursor the second time a given
/// cursor is requested, as if the upstream feed changed underneath us.
pub struct DriftingFeed {
    inner: MemoryFeed<u32>,
    drift_cursor: String,
    seen: Mutex<HashMap<Option<String>, usize>>,
}

impl DriftingFeed {
    pub fn new(len: u32, drift_cursor: &str) -> Self {
        Self {
            inner: MemoryFeed::new((0..len).collect()),
            drift_cursor: drift_cursor.to_string(),
            seen: Mutex::new(HashMap::new()),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.fetch_count()
    }
}

impl FetchCapability for DriftingFeed {
    type Item = u32;

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FeedPage<u32>, FetchError> {
        let mut page = self.inner.fetch(request)?;
        let calls = {
            let mut seen = self.seen.lock();
            let count = seen.entry(request.cursor.map(str::to_string)).or_insert(0);
            *count += 1;
            *count
        };

        if calls > 1 && request.cursor == Some(self.drift_cursor.as_str()) {
            page.metadata = Some(PageMetadata {
                next_cursor: Some("drifted".to_string()),
            });
        }
        Ok(page)
    }
}

/// Capability that replays a fixed script of responses keyed by cursor.
pub struct ScriptedFeed {
    responses: HashMap<Option<String>, Result<FeedPage<u32>, FetchError>>,
    calls: Mutex<usize>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: Mutex::new(0),
        }
    }

    pub fn respond(
        mut self,
        cursor: Option<&str>,
        response: Result<FeedPage<u32>, FetchError>,
    ) -> Self {
        self.responses
            .insert(cursor.map(str::to_string), response);
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl FetchCapability for ScriptedFeed {
    type Item = u32;

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FeedPage<u32>, FetchError> {
        *self.calls.lock() += 1;
        self.responses
            .get(&request.cursor.map(str::to_string))
            .cloned()
            .unwrap_or_else(|| Err(FetchError::transport("no scripted response")))
    }
}

/// Capability that sleeps before every fetch so concurrent callers overlap.
pub struct SlowFeed {
    pub inner: MemoryFeed<u32>,
    pub delay: Duration,
}

impl FetchCapability for SlowFeed {
    type Item = u32;

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FeedPage<u32>, FetchError> {
        thread::sleep(self.delay);
        self.inner.fetch(request)
    }
}

/// Page of `len` consecutive integers starting at `start`.
pub fn run_of(start: u32, len: u32) -> Vec<u32> {
    (start..start + len).collect()
}
