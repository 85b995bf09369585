//! Error taxonomy for the storage core.
//!
//! Every public operation returns `Result<T, StoreError>`. Expected domain
//! failures (missing document, validation, capacity) are variants here, not
//! panics; nothing in this crate throws across the public boundary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A required field was missing or malformed; no write was performed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The document does not exist, or exists but is soft-deleted.
    #[error("not found: {0}")]
    NotFound(String),

    /// The global or per-type document ceiling was reached before the write.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// The requested sort field does not exist on the records being sorted.
    #[error("invalid sort key: {0}")]
    InvalidSortKey(String),

    /// Force deletion was attempted on a task that is not a generated
    /// instance of a repeating task.
    #[error("not a task instance: {0}")]
    NotAnInstance(String),

    /// The underlying key-value store failed.
    #[error("storage error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Io(format!("serialization failed: {err}"))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}
