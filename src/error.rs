use thiserror::Error;
use uuid::Uuid;

/// Errors returned synchronously by the reminder store. The collection is
/// left untouched whenever one of these is produced.
#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("no plant with id {0}")]
    NotFound(Uuid),
}

/// Persistence layer failures.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The slot exists but does not hold a valid plant collection.
    #[error("failed to decode saved plants: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database worker failure.
    #[error("storage backend error: {0:#}")]
    Backend(#[from] anyhow::Error),
}

/// Notification platform failures. Logged and swallowed by the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("invalid reminder time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("notification platform error: {0}")]
    Platform(String),
}
