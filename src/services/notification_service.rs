use std::time::Duration;

use telegram::BotClient;

use crate::config::Config;
use crate::errors::RelayResult;

/// Outbound delivery to chats.
#[cfg_attr(test, mockall::automock)]
pub trait Messenger: Send + Sync {
    /// Send an HTML message, returning the id of the sent message
    fn send_html(&self, chat_id: i64, html: &str) -> RelayResult<i64>;

    /// Delete a message previously sent by this messenger
    fn delete(&self, chat_id: i64, message_id: i64) -> RelayResult<()>;
}

/// Bot API backed messenger
pub struct NotificationService {
    client: BotClient,
}

impl NotificationService {
    pub fn new(config: &Config) -> RelayResult<Self> {
        let client = BotClient::new(&config.token, Some(&config.proxy_url), config.send_timeout)?;
        Ok(Self { client })
    }

    /// Long poll for inbound updates
    pub fn updates(&self, offset: i64, wait: Duration) -> RelayResult<Vec<telegram::Update>> {
        Ok(self.client.get_updates(offset, wait)?)
    }
}

impl Messenger for NotificationService {
    fn send_html(&self, chat_id: i64, html: &str) -> RelayResult<i64> {
        let message = self.client.send_message(chat_id, html)?;
        Ok(message.message_id)
    }

    fn delete(&self, chat_id: i64, message_id: i64) -> RelayResult<()> {
        self.client.delete_message(chat_id, message_id)?;
        Ok(())
    }
}
