//! Shared fixtures for unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::domain::{FeedItem, FetchedFeed};
use crate::errors::{RelayError, RelayResult};
use crate::services::Messenger;

pub fn item(link: &str, title: &str) -> FeedItem {
    FeedItem::new(link.to_string(), title.to_string())
}

pub fn fetched(url: &str, title: &str, items: Vec<FeedItem>) -> FetchedFeed {
    FetchedFeed::new(url.to_string(), title.to_string(), items)
}

/// Messenger that records every call in order.
///
/// Chats listed in `unreachable` fail every send.
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<(i64, String)>>,
    pub deleted: Mutex<Vec<(i64, i64)>>,
    pub unreachable: HashSet<i64>,
}

impl RecordingMessenger {
    pub fn unreachable(chats: &[i64]) -> Self {
        Self {
            unreachable: chats.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(chat, _)| *chat == chat_id)
            .map(|(_, text)| text)
            .collect()
    }

    pub fn deleted(&self) -> Vec<(i64, i64)> {
        self.deleted.lock().unwrap().clone()
    }
}

impl Messenger for RecordingMessenger {
    fn send_html(&self, chat_id: i64, html: &str) -> RelayResult<i64> {
        if self.unreachable.contains(&chat_id) {
            return Err(RelayError::Transport(format!("chat {} not found", chat_id)));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push((chat_id, html.to_string()));
        Ok(sent.len() as i64)
    }

    fn delete(&self, chat_id: i64, message_id: i64) -> RelayResult<()> {
        self.deleted.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }
}
