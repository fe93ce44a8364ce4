use crate::domain::FetchedFeed;
use crate::errors::RelayResult;

/// Turns a feed URL into its current list of items.
///
/// Implementations must bound every network call with a timeout; a timeout is
/// reported as an ordinary error.
#[cfg_attr(test, mockall::automock)]
pub trait FeedFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> RelayResult<FetchedFeed>;
}
