// crates/canopy-core/src/error.rs

use thiserror::Error;

/// Result type for governance engine operations.
pub type Result<T> = std::result::Result<T, CanopyError>;

/// Engine-wide error taxonomy.
///
/// Disputes and revocations are ordinary lifecycle data and never surface
/// here; these variants cover rejected inputs and rejected mutations only.
/// Every mutation is all-or-nothing, so an error always means nothing was
/// committed.
#[derive(Debug, Error)]
pub enum CanopyError {
    /// Malformed input (ratio outside [0, 1], empty identifier, illegal status transition).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The write would break the stewardship sum-to-one invariant.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Unknown content, allocation, attestation, or flag id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A concurrent mutation already holds the writer slot for this content id.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Repository backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for CanopyError {
    fn from(e: serde_json::Error) -> Self {
        CanopyError::Serialization(e.to_string())
    }
}
