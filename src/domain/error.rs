//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::node::{NodeId, NodeType};
use crate::domain::tree::TreePath;

/// Domain errors represent business rule violations.
/// They are raised before any mutation takes place, so a failed operation
/// never leaves a tree partially modified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("no node at path: {0}")]
    NodeNotFound(TreePath),

    #[error("cycle detected: {0} is an ancestor of the attach point")]
    CycleDetected(NodeId),

    #[error("node already attached in this tree: {0}")]
    AlreadyAttached(NodeId),

    #[error("learning unit {0} cannot hold children")]
    ChildrenNotAllowed(NodeId),

    #[error("relationship not authorized: {child_type} under {parent_type}")]
    UnauthorizedRelationship {
        parent_type: NodeType,
        child_type: NodeType,
    },

    #[error("{parent} already holds {count} children of type {child_type} (max {max})")]
    CardinalityExceeded {
        parent: NodeId,
        child_type: NodeType,
        count: u32,
        max: u32,
    },

    #[error("the root node cannot be detached: {0}")]
    CannotDetachRoot(NodeId),

    #[error("the root of a program tree must be a group: {0}")]
    RootMustBeGroup(NodeId),

    #[error("a learning unit cannot be prerequisite to itself: {0}")]
    SelfPrerequisite(NodeId),

    #[error("prerequisite of {owner} references {referenced}, which is not a learning unit of this tree")]
    DanglingPrerequisite { owner: NodeId, referenced: NodeId },

    #[error("prerequisites can only be set on learning units: {0}")]
    PrerequisiteOnGroup(NodeId),

    #[error("copied program differs from its source on: {}", fields.join(", "))]
    CopyConsistency { fields: Vec<String> },

    #[error("authorized relationship list must not be empty")]
    EmptyRelationshipList,

    #[error("invalid tree path: {0}")]
    InvalidPath(String),

    #[error("invalid block specification: {0}")]
    InvalidBlock(String),

    #[error("invalid prerequisite expression: {0}")]
    InvalidExpression(String),

    #[error("program tree version is not the standard version: {0}")]
    NotStandardVersion(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
