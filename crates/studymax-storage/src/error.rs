//! Error types for studymax-storage

use std::fmt::Display;

use studymax_core::RecordId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to open database '{name}': {reason}")]
    Connection { name: String, reason: String },

    #[error("Collection not found: {0}")]
    UnknownCollection(String),

    #[error("Failed to read from '{collection}': {reason}")]
    Read { collection: String, reason: String },

    #[error("Constraint violated in '{collection}': {reason}")]
    Constraint { collection: String, reason: String },

    #[error("Transaction on '{collection}' failed: {reason}")]
    Transaction { collection: String, reason: String },

    #[error("Record {id} not found in '{collection}'")]
    NotFound { collection: String, id: RecordId },

    #[error("Invalid record for '{collection}': {reason}")]
    InvalidRecord { collection: String, reason: String },

    #[error("Invalid schema: {0}")]
    Schema(String),

    #[error("File is {size} bytes, over the {limit} byte limit")]
    BlobTooLarge { size: u64, limit: u64 },

    #[error("Invalid attachment: {0}")]
    Blob(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification that collaborators switch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Read,
    Constraint,
    Transaction,
    NotFound,
    Blob,
    Schema,
    Other,
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Connection { .. } => ErrorKind::Connection,
            StorageError::UnknownCollection(_) | StorageError::Read { .. } => ErrorKind::Read,
            StorageError::Constraint { .. } => ErrorKind::Constraint,
            StorageError::Transaction { .. } => ErrorKind::Transaction,
            StorageError::NotFound { .. } => ErrorKind::NotFound,
            StorageError::BlobTooLarge { .. } | StorageError::Blob(_) => ErrorKind::Blob,
            StorageError::Schema(_) => ErrorKind::Schema,
            StorageError::InvalidRecord { .. }
            | StorageError::Serialization(_)
            | StorageError::Database(_)
            | StorageError::Io(_)
            | StorageError::Other(_) => ErrorKind::Other,
        }
    }

    pub(crate) fn connection(name: &str, reason: impl Display) -> Self {
        StorageError::Connection {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn read(collection: &str, err: sqlx::Error) -> Self {
        StorageError::Read {
            collection: collection.to_string(),
            reason: err.to_string(),
        }
    }

    /// Classify a failed write: unique-index collisions become `Constraint`
    pub(crate) fn write(collection: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StorageError::Constraint {
                    collection: collection.to_string(),
                    reason: db_err.message().to_string(),
                };
            }
        }
        StorageError::Transaction {
            collection: collection.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn invalid_record(collection: &str, reason: impl Display) -> Self {
        StorageError::InvalidRecord {
            collection: collection.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            StorageError::UnknownCollection("Grades".to_string()).kind(),
            ErrorKind::Read
        );
        assert_eq!(
            StorageError::NotFound {
                collection: "Tasks".to_string(),
                id: 4
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            StorageError::BlobTooLarge { size: 11, limit: 10 }.kind(),
            ErrorKind::Blob
        );
    }

    #[test]
    fn test_non_database_write_error_is_transaction() {
        let err = StorageError::write("Tasks", sqlx::Error::PoolClosed);
        assert_eq!(err.kind(), ErrorKind::Transaction);
    }
}
