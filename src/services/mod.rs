pub mod command_service;
pub mod export_service;
pub mod feed_cache;
pub mod ingest_service;
pub mod notification_service;
pub mod scheduler;

pub use command_service::{CommandService, Reply};
pub use export_service::export_opml;
pub use feed_cache::FeedCache;
pub use ingest_service::{IngestService, TickReport};
pub use notification_service::{Messenger, NotificationService};

#[cfg(test)]
pub use notification_service::MockMessenger;
