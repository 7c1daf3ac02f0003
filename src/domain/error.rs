//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::category::CategoryName;

/// Domain errors raised while scanning a dataset and building the forest.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("directory scan failed in {path}: {message}")]
    DirectoryScan { path: PathBuf, message: String },

    #[error("failed to read category file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("category {child} included by both {first} and {second}")]
    MultipleParents {
        child: CategoryName,
        first: CategoryName,
        second: CategoryName,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
