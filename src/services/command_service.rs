use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::domain::notification::escape_html;
use crate::domain::{Command, Notification};
use crate::errors::RelayResult;
use crate::services::{FeedCache, Messenger};
use crate::sources::FeedFetcher;
use crate::storage::StateStore;

const PROBE_TEXT: &str = "Test";

/// Answer sent back to the chat a command came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain text, escaped before sending
    Text(String),
    /// Already formatted HTML
    Html(String),
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    fn into_html(self) -> String {
        match self {
            Reply::Text(text) => escape_html(&text),
            Reply::Html(html) => html,
        }
    }
}

pub struct CommandService {
    store: Arc<StateStore>,
    cache: Arc<FeedCache>,
    fetcher: Arc<dyn FeedFetcher>,
    messenger: Arc<dyn Messenger>,
}

impl CommandService {
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

    /// Run `command` for `chat_id` and send the reply.
    ///
    /// Bad arguments and unreachable targets become replies; only errors that
    /// leave the durable state unusable are returned.
    pub fn handle(&self, chat_id: i64, command: &Command) -> RelayResult<()> {
        let reply = self.execute(command)?;

        if let Err(e) = self.messenger.send_html(chat_id, &reply.into_html()) {
            warn!(chat_id, command = command.name(), error = %e, "Could not send reply");
        }
        Ok(())
    }

    pub fn execute(&self, command: &Command) -> RelayResult<Reply> {
        match command {
            Command::RegisterRecipient(args) => self.register_recipient(args),
            Command::Greet => Ok(Reply::text("Hi!")),
            Command::GetItem(args) => Ok(self.get_item(args)),
            Command::AddSource(args) => self.add_source(args),
        }
    }

    /// Probe the target with a message, retract it, then register the target.
    fn register_recipient(&self, args: &str) -> RelayResult<Reply> {
        let Ok(chat_id) = args.trim().parse::<i64>() else {
            return Ok(Reply::text("Not a number"));
        };

        let probe = match self.messenger.send_html(chat_id, PROBE_TEXT) {
            Ok(message_id) => message_id,
            Err(e) => {
                warn!(chat_id, error = %e, "Recipient access check failed");
                return Ok(Reply::text("Check that bot has access to this chat"));
            }
        };
        if let Err(e) = self.messenger.delete(chat_id, probe) {
            warn!(chat_id, error = %e, "Could not delete probe message");
        }

        if self.store.add_recipient(chat_id)? {
            info!(chat_id, "Recipient registered");
        }
        Ok(Reply::text("Done!"))
    }

    fn get_item(&self, args: &str) -> Reply {
        let indices: Vec<&str> = args.split_whitespace().collect();
        let (Some(source), Some(item)) = (indices.first(), indices.get(1)) else {
            return Reply::text("Not a number");
        };
        let (Ok(source), Ok(item)) = (source.parse::<usize>(), item.parse::<usize>()) else {
            return Reply::text("Not a number");
        };

        match self.cache.item(source, item) {
            Some((feed, item)) => Reply::Html(Notification::from_item(&feed, &item).format()),
            None => Reply::text("Check arguments"),
        }
    }

    /// Subscribe only after the source has been fetched successfully once.
    fn add_source(&self, args: &str) -> RelayResult<Reply> {
        let url = match Url::parse(args.trim()) {
            Ok(url) => url,
            Err(_) => return Ok(Reply::text("Please send me an URL")),
        };

        let feed = match self.fetcher.fetch(url.as_str()) {
            Ok(feed) => feed,
            Err(e) => {
                warn!(url = %url, error = %e, "Rejected new source");
                return Ok(Reply::text(format!("Could not fetch feed: {}", e)));
            }
        };

        let index = self.store.add_source(url.as_str())?;
        self.cache.replace(index, feed);
        info!(index, url = %url, "Source added");

        Ok(Reply::text(format!("Done! New feed index: {}", index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RelayError;
    use crate::services::MockMessenger;
    use crate::sources::MockFeedFetcher;
    use crate::test_utils::{fetched, item, RecordingMessenger};
    use tempfile::{tempdir, TempDir};

    const REQUESTER: i64 = 500;

    struct Harness {
        _dir: TempDir,
        store: Arc<StateStore>,
        cache: Arc<FeedCache>,
        messenger: Arc<RecordingMessenger>,
        service: CommandService,
    }

    fn harness(fetcher: MockFeedFetcher, messenger: RecordingMessenger) -> Harness {
        let dir = tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path()).unwrap());
        let cache = Arc::new(FeedCache::new());
        let messenger = Arc::new(messenger);
        let service = CommandService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::new(fetcher),
            messenger.clone(),
        );

        Harness {
            _dir: dir,
            store,
            cache,
            messenger,
            service,
        }
    }

    fn idle_fetcher() -> MockFeedFetcher {
        let mut fetcher = MockFeedFetcher::new();
        fetcher.expect_fetch().never();
        fetcher
    }

    #[test]
    fn test_greet() {
        let h = harness(idle_fetcher(), RecordingMessenger::default());

        h.service.handle(REQUESTER, &Command::Greet).unwrap();

        assert_eq!(h.messenger.sent_to(REQUESTER), vec!["Hi!"]);
    }

    #[test]
    fn test_register_recipient_probes_then_registers() {
        let h = harness(idle_fetcher(), RecordingMessenger::default());

        h.service
            .handle(REQUESTER, &Command::RegisterRecipient("-1001".to_string()))
            .unwrap();

        assert_eq!(h.messenger.sent_to(-1001), vec!["Test"]);
        assert_eq!(h.messenger.deleted(), vec![(-1001, 1)]);
        assert_eq!(h.store.recipients().unwrap(), vec![-1001]);
        assert_eq!(h.messenger.sent_to(REQUESTER), vec!["Done!"]);
    }

    #[test]
    fn test_register_unreachable_recipient_changes_nothing() {
        let h = harness(idle_fetcher(), RecordingMessenger::unreachable(&[77]));

        let reply = h
            .service
            .execute(&Command::RegisterRecipient("77".to_string()))
            .unwrap();

        assert_eq!(reply, Reply::text("Check that bot has access to this chat"));
        assert!(h.store.recipients().unwrap().is_empty());
    }

    #[test]
    fn test_register_non_numeric_recipient() {
        let h = harness(idle_fetcher(), RecordingMessenger::default());

        let reply = h
            .service
            .execute(&Command::RegisterRecipient("@channel".to_string()))
            .unwrap();

        assert_eq!(reply, Reply::text("Not a number"));
        assert!(h.messenger.sent().is_empty());
    }

    #[test]
    fn test_register_twice_keeps_one_entry() {
        let h = harness(idle_fetcher(), RecordingMessenger::default());
        let command = Command::RegisterRecipient("9".to_string());

        h.service.execute(&command).unwrap();
        let reply = h.service.execute(&command).unwrap();

        assert_eq!(reply, Reply::text("Done!"));
        assert_eq!(h.store.recipients().unwrap(), vec![9]);
    }

    #[test]
    fn test_register_survives_failed_probe_cleanup() {
        let dir = tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path()).unwrap());

        let mut messenger = MockMessenger::new();
        messenger.expect_send_html().times(1).returning(|_, _| Ok(31));
        messenger
            .expect_delete()
            .times(1)
            .returning(|_, _| Err(RelayError::Transport("message can't be deleted".to_string())));

        let service = CommandService::new(
            Arc::clone(&store),
            Arc::new(FeedCache::new()),
            Arc::new(idle_fetcher()),
            Arc::new(messenger),
        );

        let reply = service
            .execute(&Command::RegisterRecipient("12".to_string()))
            .unwrap();

        assert_eq!(reply, Reply::text("Done!"));
        assert_eq!(store.recipients().unwrap(), vec![12]);
    }

    #[test]
    fn test_add_source_fetches_then_subscribes() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|url| Ok(fetched(url, "Blog", vec![item("https://blog.example/1", "First")])));
        let h = harness(fetcher, RecordingMessenger::default());

        h.service
            .handle(REQUESTER, &Command::AddSource("https://blog.example/feed".to_string()))
            .unwrap();

        assert_eq!(h.store.sources().unwrap(), vec!["https://blog.example/feed"]);
        assert_eq!(h.messenger.sent_to(REQUESTER), vec!["Done! New feed index: 0"]);
        assert_eq!(h.cache.item(0, 0).unwrap().1.title, "First");
    }

    #[test]
    fn test_add_source_rejects_non_url() {
        let h = harness(idle_fetcher(), RecordingMessenger::default());

        let reply = h
            .service
            .execute(&Command::AddSource("not a url".to_string()))
            .unwrap();

        assert_eq!(reply, Reply::text("Please send me an URL"));
        assert!(h.store.sources().unwrap().is_empty());
    }

    #[test]
    fn test_add_source_reports_fetch_failure() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(RelayError::FeedParse("unsupported format".to_string())));
        let h = harness(fetcher, RecordingMessenger::default());

        let reply = h
            .service
            .execute(&Command::AddSource("https://example.com/".to_string()))
            .unwrap();

        assert_eq!(
            reply,
            Reply::text("Could not fetch feed: Feed parsing failed: unsupported format")
        );
        assert!(h.store.sources().unwrap().is_empty());
        assert!(h.cache.get(0).is_none());
    }

    #[test]
    fn test_get_item_sends_cached_item() {
        let h = harness(idle_fetcher(), RecordingMessenger::default());
        h.cache.replace(
            0,
            fetched("https://blog.example/feed", "Blog", vec![item("https://blog.example/1", "First")]),
        );

        h.service
            .handle(REQUESTER, &Command::GetItem("0 0".to_string()))
            .unwrap();

        let sent = h.messenger.sent_to(REQUESTER);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("[Blog]\n<b>First</b>"));
    }

    #[test]
    fn test_get_item_out_of_range() {
        let h = harness(idle_fetcher(), RecordingMessenger::default());
        h.cache.replace(
            0,
            fetched("https://blog.example/feed", "Blog", vec![item("https://blog.example/1", "First")]),
        );

        assert_eq!(
            h.service.execute(&Command::GetItem("0 1".to_string())).unwrap(),
            Reply::text("Check arguments")
        );
        assert_eq!(
            h.service.execute(&Command::GetItem("4 0".to_string())).unwrap(),
            Reply::text("Check arguments")
        );
    }

    #[test]
    fn test_get_item_bad_arguments() {
        let h = harness(idle_fetcher(), RecordingMessenger::default());

        for args in ["", "1", "a b", "-1 0"] {
            assert_eq!(
                h.service.execute(&Command::GetItem(args.to_string())).unwrap(),
                Reply::text("Not a number"),
                "args {:?}",
                args
            );
        }
    }

    #[test]
    fn test_text_replies_are_escaped() {
        assert_eq!(
            Reply::text("Could not fetch feed: <html>").into_html(),
            "Could not fetch feed: &lt;html&gt;"
        );
    }
}
