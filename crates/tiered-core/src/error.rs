//! Error types for the core data model.

use thiserror::Error;

/// Errors raised while configuring sections and snapshots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Sort key must contain at least one descriptor")]
    EmptySortKey,

    #[error("Sort descriptor has an empty field key")]
    EmptyFieldKey,
}

pub type Result<T> = std::result::Result<T, CoreError>;
