//! Error types for building validation rules.
//!
//! Validation *failures* are not errors: they are messages carried by
//! [`Outcome`](crate::Outcome). These variants cover rules that cannot be
//! built at all.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidateError {
    /// A `pattern` rule did not compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// No preset rule set exists under this name.
    #[error("unknown preset '{0}' (expected one of: {1})")]
    UnknownPreset(String, String),
}

/// Result type for rule construction.
pub type Result<T> = std::result::Result<T, ValidateError>;
