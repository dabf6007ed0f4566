//! Feed filter parameters
//!
//! Every feed variant is the same paginated sequence with a different
//! [`FeedFilter`]; [`FeedKind`] names the variants callers ask for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of feed items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedCategory {
    /// Email activity
    Email,
    /// Notes
    Note,
    /// Phone calls
    Call,
    /// Tasks
    Task,
}

impl FeedCategory {
    /// Name used by the upstream API
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedCategory::Email => "Email",
            FeedCategory::Note => "Note",
            FeedCategory::Call => "Call",
            FeedCategory::Task => "Task",
        }
    }
}

impl fmt::Display for FeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "email" => Ok(FeedCategory::Email),
            "note" => Ok(FeedCategory::Note),
            "call" => Ok(FeedCategory::Call),
            "task" => Ok(FeedCategory::Task),
            other => Err(format!("unknown feed category '{}'", other)),
        }
    }
}

/// Fixed parameters identifying which slice of the feed a sequence reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedFilter {
    /// Restrict to one item category
    pub category: Option<FeedCategory>,
    /// Restrict to items owned by one entity (contact id)
    pub owner_id: Option<u64>,
}

impl FeedFilter {
    /// Filter for one category across all owners
    pub fn category(category: FeedCategory) -> Self {
        Self {
            category: Some(category),
            owner_id: None,
        }
    }

    /// Filter for every item of one owner
    pub fn owner(owner_id: u64) -> Self {
        Self {
            category: None,
            owner_id: Some(owner_id),
        }
    }

    /// Narrow an existing filter to a category
    pub fn with_category(mut self, category: FeedCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// Feed variants offered by the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// The account-wide feed, optionally limited to a category
    All(Option<FeedCategory>),
    /// Everything attached to one contact
    Contact(u64),
    /// Emails of one contact
    ContactEmail(u64),
    /// Notes of one contact
    ContactNote(u64),
    /// Calls of one contact
    ContactCall(u64),
    /// Tasks of one contact
    ContactTask(u64),
}

impl From<FeedKind> for FeedFilter {
    fn from(kind: FeedKind) -> Self {
        match kind {
            FeedKind::All(category) => FeedFilter {
                category,
                owner_id: None,
            },
            FeedKind::Contact(id) => FeedFilter::owner(id),
            FeedKind::ContactEmail(id) => FeedFilter::owner(id).with_category(FeedCategory::Email),
            FeedKind::ContactNote(id) => FeedFilter::owner(id).with_category(FeedCategory::Note),
            FeedKind::ContactCall(id) => FeedFilter::owner(id).with_category(FeedCategory::Call),
            FeedKind::ContactTask(id) => FeedFilter::owner(id).with_category(FeedCategory::Task),
        }
    }
}
