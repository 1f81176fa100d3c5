//! Storage-level errors

use thiserror::Error;

use crate::domain::NodeId;

/// Errors raised by tree, version and record stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("program tree not found: {0}")]
    TreeNotFound(NodeId),

    #[error("program tree version not found: {0}")]
    VersionNotFound(String),

    #[error("node not found in catalog: {0}")]
    NodeNotFound(NodeId),

    #[error("tree was modified since it was loaded: {0}")]
    ConcurrentModification(NodeId),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid stored data: {context}: {message}")]
    Format { context: String, message: String },
}

impl StoreError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn format(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Format {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
