pub mod command;
pub mod feed;
pub mod fingerprint;
pub mod item;
pub mod notification;

pub use command::Command;
pub use feed::FetchedFeed;
pub use fingerprint::{canonicalize, fingerprint, Fingerprint};
pub use item::FeedItem;
pub use notification::Notification;
