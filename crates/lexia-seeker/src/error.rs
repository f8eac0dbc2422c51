//! Error types for the seeker crate.

use thiserror::Error;

/// Errors that can occur when building records or filters from external input.
#[derive(Debug, Error)]
pub enum SeekerError {
    /// The JSON document is not an object and cannot become a record.
    #[error("expected a JSON object for a record, got {0}")]
    NotAnObject(&'static str),

    /// A filter description could not be interpreted.
    #[error("invalid filter for '{field}': {reason}")]
    InvalidFilter { field: String, reason: String },
}

impl SeekerError {
    pub fn invalid_filter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SeekerError::InvalidFilter {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for seeker operations.
pub type Result<T> = std::result::Result<T, SeekerError>;
