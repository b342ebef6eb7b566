/// Error types for the WISE core library
use thiserror::Error;

/// Main error type for building and validating WISE jobs
#[derive(Error, Debug)]
pub enum WiseError {
    /// A duration string did not match the ISO-8601 grammar
    #[error("Invalid duration '{input}': {reason}")]
    DurationFormat { input: String, reason: String },

    /// A setter rejected a value while the inline policy is active
    #[error("Invalid value for {property}: {message}")]
    Invalid { property: String, message: String },

    /// An identifier is already used by a sibling entity
    #[error("Duplicate identifier: {0}")]
    DuplicateId(String),

    /// No entity with the given identifier exists
    #[error("Unknown identifier: {0}")]
    UnknownId(String),

    /// Failed to read or write a JSON job file
    #[error("Failed to process job file: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to access a job file on disk
    #[error("Failed to access job file: {0}")]
    Io(#[from] std::io::Error),
}

impl WiseError {
    pub(crate) fn invalid(property: impl Into<String>, message: impl Into<String>) -> Self {
        WiseError::Invalid {
            property: property.into(),
            message: message.into(),
        }
    }
}

/// Type alias for Results using WiseError
pub type Result<T> = std::result::Result<T, WiseError>;
