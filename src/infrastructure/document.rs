//! Serialized form of a program tree.
//!
//! A tree is stored as a flat document: node records plus link records
//! referencing nodes by element id. The TOML rendering of a document is
//! also the input to the fingerprint used for optimistic concurrency.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{
    ActiveStatus, AuthorizedRelationshipList, CreditConstraint, GroupKind, LinkAttributes, Node,
    NodeId, NodeKind, Periodicity, Prerequisite, ProgramTree,
};
use crate::infrastructure::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDocument {
    /// Element id of the root node.
    pub root: u64,
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub element: u64,
    pub code: String,
    pub year: i32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    #[serde(flatten)]
    pub kind: NodeRecordKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeRecordKind {
    Group {
        group_type: GroupKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constraint: Option<CreditConstraint>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remark_fr: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remark_en: Option<String>,
    },
    LearningUnit {
        status: ActiveStatus,
        periodicity: Periodicity,
        /// Canonical prerequisite expression, e.g. "LDROI1001 ET LPSP1002".
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prerequisite: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRecord {
    pub parent: u64,
    pub child: u64,
    pub order: u32,
    pub attributes: LinkAttributes,
}

/// Detached element catalog, the source of nodes pasted by copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub nodes: Vec<NodeRecord>,
}

impl NodeRecord {
    pub fn from_node(node: &Node) -> Self {
        let kind = match &node.kind {
            NodeKind::Group {
                group_type,
                constraint,
                remark_fr,
                remark_en,
            } => NodeRecordKind::Group {
                group_type: *group_type,
                constraint: *constraint,
                remark_fr: remark_fr.clone(),
                remark_en: remark_en.clone(),
            },
            NodeKind::LearningUnit {
                status,
                periodicity,
                prerequisite,
            } => NodeRecordKind::LearningUnit {
                status: *status,
                periodicity: *periodicity,
                prerequisite: prerequisite.as_ref().map(|p| p.to_string()),
            },
        };
        Self {
            element: node.node_id,
            code: node.id.code.clone(),
            year: node.id.year,
            title: node.title.clone(),
            credits: node.credits,
            kind,
        }
    }

    pub fn to_node(&self) -> StoreResult<Node> {
        let kind = match &self.kind {
            NodeRecordKind::Group {
                group_type,
                constraint,
                remark_fr,
                remark_en,
            } => NodeKind::Group {
                group_type: *group_type,
                constraint: *constraint,
                remark_fr: remark_fr.clone(),
                remark_en: remark_en.clone(),
            },
            NodeRecordKind::LearningUnit {
                status,
                periodicity,
                prerequisite,
            } => {
                let prerequisite = prerequisite
                    .as_ref()
                    .map(|expr| Prerequisite::parse(expr, self.year))
                    .transpose()
                    .map_err(|e| {
                        StoreError::format(format!("node {} ({})", self.code, self.year), e)
                    })?;
                NodeKind::LearningUnit {
                    status: *status,
                    periodicity: *periodicity,
                    prerequisite,
                }
            }
        };
        Ok(Node {
            node_id: self.element,
            id: NodeId::new(self.code.clone(), self.year),
            title: self.title.clone(),
            credits: self.credits,
            kind,
            children: Vec::new(),
        })
    }
}

/// Flatten a tree into its stored form. Shared nodes appear once.
pub fn to_document(tree: &ProgramTree) -> TreeDocument {
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    let mut seen = std::collections::HashSet::new();

    let mut indices = vec![tree.root_index()];
    indices.extend(tree.get_all_children(tree.root_index()));
    for index in indices {
        let node = tree.node(index).expect("walk yields live indices");
        if !seen.insert(node.node_id) {
            continue;
        }
        nodes.push(NodeRecord::from_node(node));
        for link in &node.children {
            if let Some(child) = tree.node(link.child) {
                links.push(LinkRecord {
                    parent: node.node_id,
                    child: child.node_id,
                    order: link.order,
                    attributes: link.attributes.clone(),
                });
            }
        }
    }
    TreeDocument {
        root: tree.root().node_id,
        nodes,
        links,
    }
}

/// Rebuild a tree from its stored form. The result carries no pending
/// changes and the fingerprint it was loaded with.
pub fn from_document(
    document: &TreeDocument,
    relationships: AuthorizedRelationshipList,
    fingerprint: Option<String>,
) -> StoreResult<ProgramTree> {
    let root_record = document
        .nodes
        .iter()
        .find(|n| n.element == document.root)
        .ok_or_else(|| {
            StoreError::format("tree document", format!("missing root element {}", document.root))
        })?;
    let mut tree = ProgramTree::new(root_record.to_node()?, relationships)
        .map_err(|e| StoreError::format("tree document", e))?;
    for record in &document.nodes {
        if record.element == document.root {
            continue;
        }
        tree.restore_node(record.to_node()?);
    }
    for link in &document.links {
        let parent = tree.index_of_element(link.parent).ok_or_else(|| {
            StoreError::format("tree document", format!("unknown parent element {}", link.parent))
        })?;
        let child = tree.index_of_element(link.child).ok_or_else(|| {
            StoreError::format("tree document", format!("unknown child element {}", link.child))
        })?;
        tree.restore_link(parent, child, link.attributes.clone(), link.order);
    }
    tree.set_loaded_fingerprint(fingerprint);
    Ok(tree)
}

pub fn to_toml(document: &TreeDocument) -> StoreResult<String> {
    toml::to_string_pretty(document).map_err(|e| StoreError::format("tree document", e))
}

pub fn from_toml(content: &str) -> StoreResult<TreeDocument> {
    toml::from_str(content).map_err(|e| StoreError::format("tree document", e))
}

/// Content fingerprint of a stored document, compared on update to catch
/// concurrent writers.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
