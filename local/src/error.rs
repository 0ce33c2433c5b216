//! Error type for the local database.

use crud_store_core::error::AdapterError;
use crud_store_core::record::RecordId;
use thiserror::Error;

/// Errors raised by [`LocalDatabase`](crate::LocalDatabase) operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocalError {
    /// A `where` clause could not be understood
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// The document has no string or integer `id`
    #[error("Document has no usable id")]
    MissingId,

    /// A document with this id is already stored
    #[error("Document {0} already exists")]
    DuplicateId(RecordId),

    /// No document has this id
    #[error("Document {0} not found")]
    NotFound(RecordId),

    /// A writer panicked while holding the collection lock
    #[error("Collection {0:?} is poisoned")]
    Poisoned(String),
}

impl From<LocalError> for AdapterError {
    fn from(error: LocalError) -> Self {
        match error {
            LocalError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other.to_string()),
        }
    }
}
