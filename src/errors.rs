// errors.rs
use crate::event::Category;
use thiserror::Error;

/// A single remote source failed. The aggregator recovers from this by
/// substituting an empty list, so it only ever reaches the logs.
#[derive(Error, Debug)]
pub enum SourceFetchError {
    #[error("Network error while querying {category}: {source}")]
    NetworkError {
        category: Category,
        #[source]
        source: reqwest::Error,
    },

    #[error("Query for {category} failed with status: {status}")]
    BadStatus { category: Category, status: reqwest::StatusCode },

    #[error("Malformed response from {category}: {reason}")]
    MalformedResponse { category: Category, reason: String },

    #[error("Invalid endpoint for {category}: {endpoint}")]
    InvalidEndpoint { category: Category, endpoint: String },
}

impl SourceFetchError {
    pub fn category(&self) -> Category {
        match self {
            SourceFetchError::NetworkError { category, .. }
            | SourceFetchError::BadStatus { category, .. }
            | SourceFetchError::MalformedResponse { category, .. }
            | SourceFetchError::InvalidEndpoint { category, .. } => *category,
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access event store: {0}")]
    Io(#[from] std::io::Error),

    // Only raised on write; reads treat unparseable data as "no events".
    #[error("Failed to serialize events: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Only personal events can be stored, got {0}")]
    NotPersonal(Category),

    #[error("Event store is poisoned")]
    Poisoned,
}

/// Form input that cannot become an event.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExportError {
    #[error("Event '{id}' has an unreadable date: {date}")]
    UnreadableDate { id: String, date: String },

    #[error("Failed to build export link: {0}")]
    Url(#[from] url::ParseError),
}
