//! Error types for the in-memory store.

use crate::record::RecordId;
use thiserror::Error;

/// Errors that can occur in store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Record is not a parent: {0}")]
    NotAParent(RecordId),

    #[error("Record is not a child: {0}")]
    NotAChild(RecordId),

    #[error("Unknown relationship: {0}")]
    UnknownRelationship(String),

    #[error("Store unavailable")]
    Unavailable,
}

pub type Result<T> = std::result::Result<T, StoreError>;
