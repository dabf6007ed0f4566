//! Page cursor table
//!
//! Maps page index → cursor needed to fetch that page.
//! Append-only: one slot per page ever reached, plus one for its successor.

use std::fmt;

use parking_lot::Mutex;

use crate::FeedError;

/// State of one cursor-table slot
///
/// An absent slot (table shorter than the page index) means the cursor is not
/// known yet; it is learned only by fetching the predecessor page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorSlot {
    /// First page: fetched without any cursor
    FirstPage,
    /// Opaque token returned by the upstream API
    Token(String),
    /// The feed ends before this page
    Terminal,
    /// The page was fetched with this cursor and came back empty
    ///
    /// Resolves like [`Terminal`](CursorSlot::Terminal), but keeps the cursor
    /// so a re-fetch of the predecessor can still be checked against it.
    Exhausted(Option<String>),
}

impl CursorSlot {
    /// Cursor to send upstream, `None` for the first page.
    ///
    /// Terminal and exhausted slots are never fetched, so they also map to `None`.
    pub fn as_cursor(&self) -> Option<&str> {
        match self {
            CursorSlot::Token(token) => Some(token.as_str()),
            CursorSlot::FirstPage | CursorSlot::Terminal | CursorSlot::Exhausted(_) => None,
        }
    }

    /// Whether this slot marks the end of the feed
    pub fn is_terminal(&self) -> bool {
        matches!(self, CursorSlot::Terminal | CursorSlot::Exhausted(_))
    }

    /// Whether a freshly observed successor agrees with this recorded slot
    ///
    /// An exhausted slot agrees with the cursor it was fetched with.
    pub fn agrees_with(&self, observed: &CursorSlot) -> bool {
        match (self, observed) {
            (CursorSlot::Exhausted(Some(recorded)), CursorSlot::Token(observed)) => {
                recorded == observed
            }
            (recorded, observed) => recorded == observed,
        }
    }

    fn exhausted(&self) -> CursorSlot {
        match self {
            CursorSlot::FirstPage => CursorSlot::Exhausted(None),
            CursorSlot::Token(token) => CursorSlot::Exhausted(Some(token.clone())),
            CursorSlot::Terminal | CursorSlot::Exhausted(_) => self.clone(),
        }
    }
}

impl fmt::Display for CursorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorSlot::FirstPage => f.write_str("first page"),
            CursorSlot::Token(token) => write!(f, "token `{}`", token),
            CursorSlot::Terminal => f.write_str("end of feed"),
            CursorSlot::Exhausted(Some(token)) => write!(f, "empty page at token `{}`", token),
            CursorSlot::Exhausted(None) => f.write_str("empty first page"),
        }
    }
}

/// Ordered record of the cursors discovered so far
///
/// Invariant: `slots[0] == FirstPage` until page 0 is found empty, and the
/// table holds one entry past the highest fetched page. Recorded cursors are
/// never lost: an empty page keeps its cursor inside [`CursorSlot::Exhausted`].
#[derive(Debug)]
pub struct CursorTable {
    slots: Mutex<Vec<CursorSlot>>,
}

impl CursorTable {
    /// Create a table that only knows how to fetch the first page
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(vec![CursorSlot::FirstPage]),
        }
    }

    /// Number of known slots
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Always false: slot 0 is present from construction
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Slot for `page`, if it has been discovered
    pub fn slot(&self, page: usize) -> Option<CursorSlot> {
        self.slots.lock().get(page).cloned()
    }

    /// Record the successor of `page`
    ///
    /// If slot `page + 1` already exists, `next` must agree with it (see
    /// [`CursorSlot::agrees_with`]); otherwise it is appended. Check and append happen under one lock so
    /// concurrent discoverers of the same page commit a single entry.
    pub fn commit_next(&self, page: usize, next: CursorSlot) -> Result<(), FeedError> {
        let mut slots = self.slots.lock();
        let successor = page + 1;

        match slots.get(successor) {
            Some(recorded) if recorded.agrees_with(&next) => Ok(()),
            Some(recorded) => Err(FeedError::ConsistencyViolation {
                page: successor,
                recorded: recorded.clone(),
                observed: next,
            }),
            None => {
                // The fetched page's own slot must exist, so the table is
                // exactly one short of the successor here.
                debug_assert_eq!(slots.len(), successor);
                slots.push(next);
                Ok(())
            }
        }
    }

    /// Mark `page` itself as past the end (it was fetched and came back empty)
    ///
    /// The cursor it was fetched with is kept for later comparisons.
    pub fn mark_exhausted(&self, page: usize) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(page) {
            *slot = slot.exhausted();
        }
    }

    /// Index of the last slot, i.e. the lowest page whose successor is unknown
    pub fn frontier(&self) -> usize {
        self.slots.lock().len().saturating_sub(1)
    }

    /// Copy of all slots, in page order
    pub fn snapshot(&self) -> Vec<CursorSlot> {
        self.slots.lock().clone()
    }
}

impl Default for CursorTable {
    fn default() -> Self {
        Self::new()
    }
}
