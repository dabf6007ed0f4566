//! Feed variant construction
//!
//! Holds one shared capability handle and hands out feeds with fixed
//! filters, so call sites never repeat filter parameters.

use std::sync::Arc;

use crate::config::FeedConfig;
use crate::fetch::FetchCapability;
use crate::filter::{FeedCategory, FeedKind};
use crate::sequence::PaginatedFeed;
use crate::FeedError;

/// Builds [`PaginatedFeed`]s that share one capability.
#[derive(Debug)]
pub struct FeedFactory<F: FetchCapability> {
    capability: Arc<F>,
    config: FeedConfig,
}

impl<F: FetchCapability> Clone for FeedFactory<F> {
    fn clone(&self) -> Self {
        Self {
            capability: Arc::clone(&self.capability),
            config: self.config.clone(),
        }
    }
}

impl<F: FetchCapability> FeedFactory<F> {
    /// Create a factory around `capability`, validating the default feed config.
    pub fn new(capability: F, config: FeedConfig) -> Result<Self, FeedError> {
        Self::from_shared(Arc::new(capability), config)
    }

    /// Create a factory around an already shared capability.
    pub fn from_shared(capability: Arc<F>, config: FeedConfig) -> Result<Self, FeedError> {
        config.validate()?;
        Ok(Self { capability, config })
    }

    /// Config applied to every feed built by this factory
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Shared capability handle
    pub fn capability(&self) -> &Arc<F> {
        &self.capability
    }

    /// Feed for any variant.
    pub fn feed(&self, kind: FeedKind) -> Result<PaginatedFeed<Arc<F>>, FeedError> {
        PaginatedFeed::open(Arc::clone(&self.capability), kind, self.config.clone())
    }

    /// Account-wide feed, optionally limited to one category.
    pub fn account_feed(
        &self,
        category: Option<FeedCategory>,
    ) -> Result<PaginatedFeed<Arc<F>>, FeedError> {
        self.feed(FeedKind::All(category))
    }

    /// Everything attached to one contact.
    pub fn contact_feed(&self, contact_id: u64) -> Result<PaginatedFeed<Arc<F>>, FeedError> {
        self.feed(FeedKind::Contact(contact_id))
    }

    /// Emails of one contact.
    pub fn contact_emails(&self, contact_id: u64) -> Result<PaginatedFeed<Arc<F>>, FeedError> {
        self.feed(FeedKind::ContactEmail(contact_id))
    }

    /// Notes of one contact.
    pub fn contact_notes(&self, contact_id: u64) -> Result<PaginatedFeed<Arc<F>>, FeedError> {
        self.feed(FeedKind::ContactNote(contact_id))
    }

    /// Calls of one contact.
    pub fn contact_calls(&self, contact_id: u64) -> Result<PaginatedFeed<Arc<F>>, FeedError> {
        self.feed(FeedKind::ContactCall(contact_id))
    }

    /// Tasks of one contact.
    pub fn contact_tasks(&self, contact_id: u64) -> Result<PaginatedFeed<Arc<F>>, FeedError> {
        self.feed(FeedKind::ContactTask(contact_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FeedFilter;
    use crate::MemoryFeed;

    #[derive(Debug, Clone, PartialEq)]
    struct Activity {
        contact: u64,
        category: FeedCategory,
    }

    fn activities() -> Vec<Activity> {
        let categories = [
            FeedCategory::Email,
            FeedCategory::Note,
            FeedCategory::Call,
            FeedCategory::Task,
        ];
        (0..80)
            .map(|i| Activity {
                contact: i % 2,
                category: categories[(i / 2) as usize % 4],
            })
            .collect()
    }

    fn matches(filter: &FeedFilter, activity: &Activity) -> bool {
        filter.owner_id.map_or(true, |id| id == activity.contact)
            && filter.category.map_or(true, |c| c == activity.category)
    }

    #[test]
    fn test_variants_pass_their_filters() {
        let factory = FeedFactory::new(
            MemoryFeed::new(activities()).with_matcher(matches),
            FeedConfig::default(),
        )
        .unwrap();

        let emails = factory.contact_emails(1).unwrap();
        assert_eq!(
            emails.filter(),
            &FeedFilter::owner(1).with_category(FeedCategory::Email)
        );
        for item in &emails {
            let item = item.unwrap();
            assert_eq!(item.contact, 1);
            assert_eq!(item.category, FeedCategory::Email);
        }
        assert_eq!(emails.size().unwrap(), 10);
        assert_eq!(factory.contact_feed(0).unwrap().size().unwrap(), 40);
        assert_eq!(factory.account_feed(None).unwrap().size().unwrap(), 80);
    }

    #[test]
    fn test_feeds_share_capability() {
        let factory = FeedFactory::new(MemoryFeed::new(activities()), FeedConfig::default()).unwrap();
        factory.contact_notes(0).unwrap().item_at(0).unwrap();
        factory.contact_calls(0).unwrap().item_at(0).unwrap();
        factory.contact_tasks(0).unwrap().item_at(0).unwrap();
        assert_eq!(factory.capability().fetch_count(), 3);
    }

    #[test]
    fn test_eager_factory_fetches_on_open() {
        let factory = FeedFactory::new(
            MemoryFeed::new(activities()),
            FeedConfig::default().with_eager_first_page(true),
        )
        .unwrap();
        let feed = factory.account_feed(Some(FeedCategory::Email)).unwrap();
        assert_eq!(factory.capability().fetch_count(), 1);
        feed.item_at(5).unwrap();
        assert_eq!(factory.capability().fetch_count(), 1);
    }
}
