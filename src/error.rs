//! Error types for the store
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Unified error type for the store.
///
/// The first four variants are policy failures and can be silenced with
/// [`Store::errors_off`](crate::Store::errors_off). I/O and snapshot errors
/// always propagate.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Key not found in the store
    #[error("The '{0}' key doesn't exist")]
    NotFound(String),

    /// Key was present but its expiry has passed
    #[error("The '{0}' key expired and got omitted")]
    Expired(String),

    /// Value collides with an existing entry under a unique write
    #[error("The value for '{0}' is not unique as requested")]
    UniqueValueViolation(String),

    /// An option carries a value of the wrong type or shape
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Reading or writing the snapshot file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot file is not valid JSON or has the wrong shape
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl StoreError {
    // == Error Code ==
    /// Returns a stable, machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "CLARA_EXISTENCE_ERROR",
            StoreError::Expired(_) => "CLARA_KEY_EXPIRED",
            StoreError::UniqueValueViolation(_) => "CLARA_UNIQUE_VALUE_ERROR",
            StoreError::Configuration(_) => "CLARA_CONFIGURATION_ERROR",
            StoreError::Io(_) => "CLARA_IO_ERROR",
            StoreError::Snapshot(_) => "CLARA_SNAPSHOT_ERROR",
        }
    }

    // == Suppressible ==
    /// Returns true if the error is silenced when errors are turned off.
    pub fn is_suppressible(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_)
                | StoreError::Expired(_)
                | StoreError::UniqueValueViolation(_)
                | StoreError::Configuration(_)
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for the store.
pub type Result<T> = std::result::Result<T, StoreError>;
