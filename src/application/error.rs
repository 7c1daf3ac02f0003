//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add rendering and output concerns.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("failed to serialize {format} document: {source}")]
    Serialization {
        format: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to render page template: {message}")]
    Template { message: String },

    #[error("failed to write {artifact}: {source}")]
    SinkWrite {
        artifact: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
