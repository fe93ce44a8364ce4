use std::time::Duration;

use feed_rs::parser;
use reqwest::blocking::Client;
use reqwest::Proxy;

use crate::domain::{FeedItem, FetchedFeed};
use crate::errors::{RelayError, RelayResult};
use crate::sources::traits::FeedFetcher;

/// Fetches RSS, Atom and JSON feeds over HTTP.
pub struct RssAtomFetcher {
    client: Client,
}

impl RssAtomFetcher {
    /// Every request is bounded by `timeout`; `proxy` routes all traffic when set.
    pub fn new(proxy: Option<&str>, timeout: Duration) -> RelayResult<Self> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(proxy) = proxy {
            builder = builder.proxy(Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Relative item links are resolved against the feed's own `url`.
    fn parse_bytes(url: &str, bytes: &[u8]) -> RelayResult<FetchedFeed> {
        let parsed = parser::Builder::new()
            .base_uri(Some(url))
            .build()
            .parse(bytes)
            .map_err(|e| RelayError::FeedParse(e.to_string()))?;

        let title = parsed
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| url.to_string());

        let items = parsed
            .entries
            .into_iter()
            .map(|entry| {
                let link = Self::item_link(&entry.links).unwrap_or_else(|| entry.id.clone());
                let title = entry
                    .title
                    .map(|t| t.content)
                    .unwrap_or_else(|| "Untitled".to_string());
                let categories = entry
                    .categories
                    .into_iter()
                    .map(|c| c.label.unwrap_or(c.term))
                    .filter(|c| !c.trim().is_empty())
                    .collect();

                FeedItem::new(link, title).with_categories(categories)
            })
            .collect();

        Ok(FetchedFeed::new(url.to_string(), title, items))
    }

    /// The item's own page: the alternate link if there is one, else the first link
    fn item_link(links: &[feed_rs::model::Link]) -> Option<String> {
        links
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
            .or_else(|| links.first())
            .map(|l| l.href.clone())
    }
}

impl FeedFetcher for RssAtomFetcher {
    fn fetch(&self, url: &str) -> RelayResult<FetchedFeed> {
        let response = self.client.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;

        Self::parse_bytes(url, &bytes)
    }
}
