//! Error types for the controller.

use thiserror::Error;
use tiered_core::CoreError;

/// Errors surfaced by controller setup and reconciliation passes.
///
/// Out-of-range lookups are not errors; they return `None`.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Invalid or missing configuration. Raised at construction, never retried.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The data source failed during a pass. The current snapshot is unchanged.
    #[error("Data source failure: {0}")]
    DataSource(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ControllerError {
    pub(crate) fn data_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ControllerError::DataSource(Box::new(err))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ControllerError::Configuration(_))
    }

    pub fn is_data_source(&self) -> bool {
        matches!(self, ControllerError::DataSource(_))
    }
}

impl From<CoreError> for ControllerError {
    fn from(err: CoreError) -> Self {
        ControllerError::Configuration(err.to_string())
    }
}

impl From<serde_json::Error> for ControllerError {
    fn from(err: serde_json::Error) -> Self {
        ControllerError::Configuration(err.to_string())
    }
}

/// Result type for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;
