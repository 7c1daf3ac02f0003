//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use crate::exitcode;

        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(InfraError::Application(e)) => match e {
                ApplicationError::Domain(d) => match d {
                    DomainError::DirectoryNotFound(_) | DomainError::NotADirectory(_) => {
                        exitcode::NOINPUT
                    }
                    DomainError::DirectoryScan { .. } | DomainError::FileReadError { .. } => {
                        exitcode::IOERR
                    }
                    DomainError::MultipleParents { .. } => exitcode::DATAERR,
                },
                ApplicationError::SinkWrite { .. } => exitcode::CANTCREAT,
                ApplicationError::Config { .. } => exitcode::CONFIG,
                ApplicationError::OperationFailed { .. } => exitcode::IOERR,
                ApplicationError::Serialization { .. } | ApplicationError::Template { .. } => {
                    exitcode::SOFTWARE
                }
            },
        }
    }
}
