use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::{FeedItem, FetchedFeed};

/// Most recent fetch result per source index.
///
/// Transient: rebuilt by the poller after every restart. A poisoned lock is
/// recovered rather than reported since nothing here is durable.
#[derive(Default)]
pub struct FeedCache {
    feeds: RwLock<HashMap<usize, Arc<FetchedFeed>>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `feed` as the latest result for `source`, replacing the previous one
    pub fn replace(&self, source: usize, feed: FetchedFeed) {
        let mut feeds = self.feeds.write().unwrap_or_else(|e| e.into_inner());
        feeds.insert(source, Arc::new(feed));
    }

    pub fn get(&self, source: usize) -> Option<Arc<FetchedFeed>> {
        let feeds = self.feeds.read().unwrap_or_else(|e| e.into_inner());
        feeds.get(&source).cloned()
    }

    /// Look up one item by (source index, item index)
    pub fn item(&self, source: usize, item: usize) -> Option<(Arc<FetchedFeed>, FeedItem)> {
        let feed = self.get(source)?;
        let item = feed.item(item)?.clone();
        Some((feed, item))
    }
}
