/// Error types for the WISE client
use thiserror::Error;
use wise_core::ValidationError;

#[derive(Error, Debug)]
pub enum ClientError {
    /// `send` was called while this client still had a request in flight
    #[error("A request is already in flight on this client")]
    ConcurrentRequest,

    /// Connecting to or talking with the Builder failed
    #[error("Builder connection failed: {0}")]
    Io(#[from] std::io::Error),

    /// The job was not submitted because it failed validation
    #[error("Job has {} validation errors", .0.len())]
    InvalidJob(Vec<ValidationError>),

    /// The endpoint configuration could not be loaded
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
