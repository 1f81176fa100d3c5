//! Link: the attributed edge between a parent group and a child node.

use std::fmt;
use std::str::FromStr;

use generational_arena::Index;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::node::NodeId;

/// A REFERENCE link exposes the child's own children to the grandparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkType {
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadrimesterDerogation {
    Q1,
    Q2,
    Q1And2,
    Q1Or2,
}

/// Set of block numbers a child is offered in, e.g. blocks 1 and 2.
/// Stored and displayed as concatenated digits ("12").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block(Vec<u8>);

impl Block {
    pub fn new(blocks: impl IntoIterator<Item = u8>) -> Self {
        let mut values: Vec<u8> = blocks.into_iter().filter(|b| (1..=6).contains(b)).collect();
        values.sort_unstable();
        values.dedup();
        Self(values)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, block: u8) -> bool {
        self.0.contains(&block)
    }

    pub fn values(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{}", b)?;
        }
        Ok(())
    }
}

impl FromStr for Block {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut values = Vec::new();
        for c in s.trim().chars() {
            match c.to_digit(10) {
                Some(d) if (1..=6).contains(&d) => values.push(d as u8),
                _ => return Err(DomainError::InvalidBlock(s.to_string())),
            }
        }
        Ok(Block::new(values))
    }
}

/// Editable attributes carried by a link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkAttributes {
    /// Override of the child's credits in this parent's context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_credits: Option<i32>,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default, skip_serializing_if = "Block::is_empty")]
    pub block: Block,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<LinkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_english: Option<String>,
    #[serde(default)]
    pub access_condition: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quadrimester_derogation: Option<QuadrimesterDerogation>,
}

/// Directed edge from a parent node to one of its children.
///
/// `has_changed` is transient bookkeeping for the persist step and is not
/// part of the persisted shape.
#[derive(Debug, Clone)]
pub struct Link {
    pub child: Index,
    pub order: u32,
    pub attributes: LinkAttributes,
    pub has_changed: bool,
}

impl Link {
    pub fn is_reference(&self) -> bool {
        self.attributes.link_type == Some(LinkType::Reference)
    }
}

/// Persist-level identity of a link: the (parent, child) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkIdentity {
    pub parent: NodeId,
    pub child: NodeId,
}

impl LinkIdentity {
    pub fn new(parent: NodeId, child: NodeId) -> Self {
        Self { parent, child }
    }
}

impl fmt::Display for LinkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.parent, self.child)
    }
}

/// A link removed from its parent. The child subtree stays alive in the
/// tree's arena so it can be re-attached (cut/paste).
#[derive(Debug, Clone)]
pub struct DetachedLink {
    pub identity: LinkIdentity,
    /// Element id of the detached child, usable with `attach_existing`.
    pub child_element: u64,
    pub attributes: LinkAttributes,
    pub order: u32,
}
