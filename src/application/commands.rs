//! Use-case commands: plain data handed to the services.

use crate::domain::{ElementType, LinkAttributes, NodeId, TreePath, YearSnapshot};

/// Attach a catalog node under a node of the tree.
#[derive(Debug, Clone)]
pub struct AttachNodeCommand {
    pub root: NodeId,
    pub node_to_attach: NodeId,
    pub path_where_to_attach: TreePath,
    pub attributes: LinkAttributes,
    pub commit: bool,
}

/// Detach the link addressed by a path.
#[derive(Debug, Clone)]
pub struct DetachNodeCommand {
    pub root: NodeId,
    pub path_to_detach: TreePath,
    pub commit: bool,
}

/// Paste a node somewhere in the tree.
///
/// With `path_where_to_detach` set this is a cut: the node is detached
/// from there first and the very same subtree is re-attached. Without it
/// the node is loaded fresh from the element catalog (copy).
#[derive(Debug, Clone)]
pub struct PasteElementCommand {
    pub root: NodeId,
    pub node_to_paste: NodeId,
    pub element_type: ElementType,
    pub path_where_to_detach: Option<TreePath>,
    pub path_where_to_paste: TreePath,
    pub attributes: LinkAttributes,
    pub commit: bool,
}

/// Copy a yearly record forward over a range of years.
///
/// `initial_snapshot` is the baseline the conflict detection compares
/// stored years against.
#[derive(Debug, Clone)]
pub struct PostponeCommand {
    pub code: String,
    pub from_year: i32,
    /// Override of the entity's own end year, when known.
    pub end_year: Option<i32>,
    pub initial_snapshot: YearSnapshot,
}

/// Create a specific version of an offer, derived from its standard
/// version, for every year from `from_year` through the postponement
/// horizon.
#[derive(Debug, Clone)]
pub struct CreateProgramTreeVersionCommand {
    pub offer_acronym: String,
    pub from_year: i32,
    pub version_name: String,
    pub is_transition: bool,
    pub title_fr: Option<String>,
    pub title_en: Option<String>,
    pub end_year: Option<i32>,
}
