//! Feed configuration

use crate::fetch::ResponseFormat;
use crate::FeedError;

/// Default number of non-zero pages kept in the LRU cache.
pub const DEFAULT_CACHE_PAGES: usize = 1;

/// Configuration parameters for a paginated feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Pages retained in the LRU cache besides page 0
    pub cache_pages: usize,

    /// Response format requested from the fetch capability
    pub format: ResponseFormat,

    /// Resolve page 0 when the feed is opened
    pub eager_first_page: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_pages: DEFAULT_CACHE_PAGES,
            format: ResponseFormat::default(),
            eager_first_page: false,
        }
    }
}

impl FeedConfig {
    /// Set the LRU capacity (0 keeps only page 0 cached).
    pub fn with_cache_pages(mut self, cache_pages: usize) -> Self {
        self.cache_pages = cache_pages;
        self
    }

    /// Set the response format.
    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    /// Fetch page 0 while opening the feed.
    pub fn with_eager_first_page(mut self, enabled: bool) -> Self {
        self.eager_first_page = enabled;
        self
    }

    /// Reject cache sizes that could not possibly be intended.
    ///
    /// Each cached page holds up to `PAGE_SIZE` items; a million pages is
    /// already more than any feed scan needs.
    pub fn validate(&self) -> Result<(), FeedError> {
        const MAX_CACHE_PAGES: usize = 1 << 20;
        if self.cache_pages > MAX_CACHE_PAGES {
            return Err(FeedError::InvalidConfiguration(format!(
                "cache_pages {} exceeds maximum {}",
                self.cache_pages, MAX_CACHE_PAGES
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_caches_one_page() {
        let config = FeedConfig::default();
        assert_eq!(config.cache_pages, 1);
        assert_eq!(config.format, ResponseFormat::Json);
        assert!(!config.eager_first_page);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = FeedConfig::default()
            .with_cache_pages(4)
            .with_format(ResponseFormat::Xml)
            .with_eager_first_page(true);
        assert_eq!(config.cache_pages, 4);
        assert_eq!(config.format, ResponseFormat::Xml);
        assert!(config.eager_first_page);
    }

    #[test]
    fn test_oversized_cache_rejected() {
        let config = FeedConfig::default().with_cache_pages(usize::MAX);
        assert!(matches!(
            config.validate(),
            Err(FeedError::InvalidConfiguration(_))
        ));
    }
}
