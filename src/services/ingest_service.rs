use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{fingerprint, FetchedFeed, Notification};
use crate::errors::RelayResult;
use crate::services::{FeedCache, Messenger};
use crate::sources::FeedFetcher;
use crate::storage::StateStore;

/// Counters for one poll of every source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub sources: usize,
    pub failed_sources: usize,
    pub new_items: usize,
    pub deliveries: usize,
    pub failed_deliveries: usize,
}

pub struct IngestService {
    store: Arc<StateStore>,
    cache: Arc<FeedCache>,
    fetcher: Arc<dyn FeedFetcher>,
    messenger: Arc<dyn Messenger>,
}

impl IngestService {
    pub fn new(
        store: Arc<StateStore>,
        cache: Arc<FeedCache>,
        fetcher: Arc<dyn FeedFetcher>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            store,
            cache,
            fetcher,
            messenger,
        }
    }

    /// Fetch every subscribed source and deliver its unseen items.
    ///
    /// A source that fails to fetch is logged and skipped. Only errors that
    /// leave the durable state unusable are returned.
    pub fn tick(&self) -> RelayResult<TickReport> {
        let sources = self.store.sources()?;
        let mut report = TickReport {
            sources: sources.len(),
            ..TickReport::default()
        };

        for (index, url) in sources.iter().enumerate() {
            match self.fetcher.fetch(url) {
                Ok(feed) => self.ingest(index, feed, &mut report)?,
                Err(e) => {
                    warn!(source = index, url = %url, error = %e, "Error fetching feed");
                    report.failed_sources += 1;
                }
            }
        }

        info!(
            sources = report.sources,
            failed_sources = report.failed_sources,
            new_items = report.new_items,
            deliveries = report.deliveries,
            failed_deliveries = report.failed_deliveries,
            "Tick finished"
        );
        Ok(report)
    }

    /// Deliver the unseen items of one fetched source, oldest first, then
    /// cache the fetch for on-demand lookups.
    pub fn ingest(&self, source: usize, feed: FetchedFeed, report: &mut TickReport) -> RelayResult<()> {
        for item in feed.chronological() {
            // Claiming the fingerprint is durable before any delivery is attempted
            if !self.store.mark_seen(fingerprint(&item.link))? {
                continue;
            }
            report.new_items += 1;
            debug!(source, link = %item.link, "New item");

            let message = Notification::from_item(&feed, item).format();
            for chat_id in self.store.recipients()? {
                match self.messenger.send_html(chat_id, &message) {
                    Ok(_) => report.deliveries += 1,
                    Err(e) => {
                        // Not retried: the item is already marked seen
                        warn!(chat_id, link = %item.link, error = %e, "Delivery failed");
                        report.failed_deliveries += 1;
                    }
                }
            }
        }

        self.cache.replace(source, feed);
        Ok(())
    }
}
