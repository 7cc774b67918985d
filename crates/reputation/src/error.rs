//! Error types for the reputation crate.

use thiserror::Error;

/// Reputation engine error type.
#[derive(Error, Debug)]
pub enum ReputationError {
    /// The backing store could not be read.
    #[error("data access failed: {0}")]
    DataAccess(#[from] anyhow::Error),
}

/// Result type alias for ReputationError.
pub type Result<T> = std::result::Result<T, ReputationError>;
