//! CLI-level errors (wraps application and storage errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::StoreError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::Application(ApplicationError::Domain(e))
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Application(ApplicationError::Store(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Application(e) => match e {
                ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                ApplicationError::Store(store) => match store {
                    StoreError::TreeNotFound(_)
                    | StoreError::VersionNotFound(_)
                    | StoreError::NodeNotFound(_) => crate::exitcode::NOINPUT,
                    StoreError::Io { .. } => crate::exitcode::IOERR,
                    StoreError::Format { .. } => crate::exitcode::DATAERR,
                    StoreError::ConcurrentModification(_) => crate::exitcode::SOFTWARE,
                },
                ApplicationError::TreeNotFound(_)
                | ApplicationError::VersionNotFound(_)
                | ApplicationError::RecordNotFound { .. } => crate::exitcode::NOINPUT,
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                ApplicationError::OperationFailed { .. } => crate::exitcode::SOFTWARE,
            },
        }
    }
}
