use thiserror::Error;

/// Failure while retrieving or decoding one ICS feed.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Transport failure or non-2xx response
    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Body could not be decoded as an iCalendar document
    #[error("parse failed: {0}")]
    Parse(String),
}

impl FeedError {
    pub fn fetch(url: impl Into<String>, message: impl ToString) -> Self {
        FeedError::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// A feed occurrence references a property or platform the ledger does not know.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigResolutionError {
    #[error("unknown property '{0}'")]
    UnknownProperty(String),

    #[error("no platform configured for role '{0}'")]
    UnknownPlatform(String),
}

/// Booking ledger read/write failure.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("ledger connection lock poisoned")]
    LockPoisoned,

    #[error("seed file error: {0}")]
    Seed(String),
}

/// Fatal sync failure; no partial result is produced.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("cannot read property configuration: {0}")]
    Configuration(#[source] PersistError),
}

/// Invalid environment configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: String, value: String },
}
