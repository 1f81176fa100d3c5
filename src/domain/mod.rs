//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod academic_year;
pub mod error;
pub mod fields;
pub mod link;
pub mod node;
pub mod prerequisite;
pub mod proposal;
pub mod relationship;
pub mod tree;
pub mod version;

pub use academic_year::{academic_year_of, current_academic_year};
pub use error::{DomainError, DomainResult};
pub use fields::{diff_fields, FieldDifference, FieldMap, FieldValue, YearRecord, YearSnapshot};
pub use link::{
    Block, DetachedLink, Link, LinkAttributes, LinkIdentity, LinkType, QuadrimesterDerogation,
};
pub use node::{
    ActiveStatus, CreditConstraint, ElementType, GroupCategory, GroupKind, Node, NodeId, NodeKind,
    NodeType, Periodicity,
};
pub use prerequisite::{Operator, Prerequisite, PrerequisiteItem, PrerequisiteItemGroup};
pub use proposal::{
    LearningUnitProposal, ProposalSnapshot, ProposalState, ProposalType,
};
pub use relationship::{default_rules, AuthorizedRelationship, AuthorizedRelationshipList};
pub use tree::{ChangedLink, PendingChanges, ProgramTree, TreePath};
pub use version::{
    check_copy_consistency, ProgramTreeVersion, ProgramTreeVersionBuilder,
    ProgramTreeVersionIdentity, VersionSpec, STANDARD_VERSION_NAME,
};
