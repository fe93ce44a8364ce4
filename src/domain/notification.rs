use std::collections::BTreeSet;

use super::{FeedItem, FetchedFeed};

#[derive(Debug, Clone)]
pub struct Notification {
    pub feed_title: String,
    pub item_title: String,
    pub categories: Vec<String>,
    pub link: String,
}

impl Notification {
    pub fn from_item(feed: &FetchedFeed, item: &FeedItem) -> Self {
        Self {
            feed_title: feed.title.clone(),
            item_title: item.title.clone(),
            categories: item.categories.clone(),
            link: item.link.clone(),
        }
    }

    /// Space separated, sorted and deduplicated hashtags for the categories
    pub fn hashtags(&self) -> String {
        let tags: BTreeSet<String> = self.categories.iter().map(|c| to_hashtag(c)).collect();
        tags.into_iter().collect::<Vec<_>>().join(" ")
    }

    /// Format as bot HTML:
    /// "[{feedTitle}]\n<b>{itemTitle}</b>\n{hashtags}\n\n<a href=\"{link}\">Read</a>"
    pub fn format(&self) -> String {
        format!(
            "[{}]\n<b>{}</b>\n{}\n\n<a href=\"{}\">Read</a>",
            escape_html(&self.feed_title),
            escape_html(&self.item_title),
            escape_html(&self.hashtags()),
            escape_html(&self.link),
        )
    }
}

/// Escape text for the bot's HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Turn a free-form category label into a hashtag, e.g. "C++ & Rust" -> "#cpp_rust"
pub fn to_hashtag(category: &str) -> String {
    let category = category
        .to_lowercase()
        .replace("*nix", "unix")
        .replace("c++", "cpp");

    let mut tag = String::from("#");
    for c in category.chars() {
        match c {
            '\u{2012}'..='\u{2015}' | '\u{2E3A}' | '\u{2E3B}' | '-' | ' ' | '&' | '+' => {
                if !tag.ends_with('_') {
                    tag.push('_');
                }
            }
            '!' | '?' | '(' | ')' | '\'' | '"' | '«' | '»' => {}
            '#' => tag.push_str("sharp"),
            '.' => tag.push_str("dot"),
            _ => tag.push(c),
        }
    }
    tag
}
