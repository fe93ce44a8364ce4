use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Please set the {0} environment variable")]
    MissingEnvVar(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    #[error("OPML export failed: {0}")]
    Opml(String),

    // Transport errors from the bot library
    #[error("Bot API error: {0}")]
    Transport(String),

    // Persistence errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("State lock poisoned")]
    LockPoisoned,
}

impl RelayError {
    /// Errors after which the durable state can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RelayError::Io(_) | RelayError::Snapshot(_) | RelayError::LockPoisoned
        )
    }
}

impl From<telegram::BotError> for RelayError {
    fn from(err: telegram::BotError) -> Self {
        RelayError::Transport(err.to_string())
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
