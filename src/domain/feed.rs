use super::FeedItem;

/// Result of fetching one subscribed source during a tick.
///
/// Items keep the order the feed lists them in, which is usually newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFeed {
    pub url: String,
    pub title: String,
    pub items: Vec<FeedItem>,
}

impl FetchedFeed {
    pub fn new(url: String, title: String, items: Vec<FeedItem>) -> Self {
        Self { url, title, items }
    }

    pub fn item(&self, index: usize) -> Option<&FeedItem> {
        self.items.get(index)
    }

    /// Items from oldest to newest.
    pub fn chronological(&self) -> impl Iterator<Item = &FeedItem> {
        self.items.iter().rev()
    }
}
