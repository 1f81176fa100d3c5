//! Application-level errors (wraps domain and storage errors)

use thiserror::Error;

use crate::domain::{DomainError, NodeId};
use crate::infrastructure::StoreError;

/// Application errors wrap domain errors and add use-case-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("program tree not found: {0}")]
    TreeNotFound(NodeId),

    #[error("program tree version not found: {0}")]
    VersionNotFound(String),

    #[error("no record for {code} in {year}")]
    RecordNotFound { code: String, year: i32 },

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
