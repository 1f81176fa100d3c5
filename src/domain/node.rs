//! Tree node model: group nodes (trainings, mini-trainings, groups) and
//! learning-unit leaves.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::link::Link;
use crate::domain::prerequisite::Prerequisite;

/// Identity of a curriculum element: unique per (code, academic year).
/// Each academic year has its own node sharing the same code lineage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub code: String,
    pub year: i32,
}

impl NodeId {
    pub fn new(code: impl Into<String>, year: i32) -> Self {
        Self {
            code: code.into(),
            year,
        }
    }

    /// Same code, next academic year.
    pub fn next_year(&self) -> Self {
        Self {
            code: self.code.clone(),
            year: self.year + 1,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.year)
    }
}

/// Category of a group node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupCategory {
    Training,
    MiniTraining,
    Group,
}

impl GroupCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupCategory::Training => "TRAINING",
            GroupCategory::MiniTraining => "MINI_TRAINING",
            GroupCategory::Group => "GROUP",
        }
    }
}

impl fmt::Display for GroupCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete kind of a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupKind {
    // trainings
    Bachelor,
    Master120,
    Phd,
    Certificate,
    AccessContest,
    // mini-trainings
    Deepening,
    AccessMinor,
    OpenMinor,
    OptionMiniTraining,
    // plain groups
    CommonCore,
    SubGroup,
    OptionListChoice,
    Finality120ListChoice,
    ComplementaryModule,
}

impl GroupKind {
    pub fn category(&self) -> GroupCategory {
        match self {
            GroupKind::Bachelor
            | GroupKind::Master120
            | GroupKind::Phd
            | GroupKind::Certificate
            | GroupKind::AccessContest => GroupCategory::Training,
            GroupKind::Deepening
            | GroupKind::AccessMinor
            | GroupKind::OpenMinor
            | GroupKind::OptionMiniTraining => GroupCategory::MiniTraining,
            GroupKind::CommonCore
            | GroupKind::SubGroup
            | GroupKind::OptionListChoice
            | GroupKind::Finality120ListChoice
            | GroupKind::ComplementaryModule => GroupCategory::Group,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Bachelor => "BACHELOR",
            GroupKind::Master120 => "MASTER_120",
            GroupKind::Phd => "PHD",
            GroupKind::Certificate => "CERTIFICATE",
            GroupKind::AccessContest => "ACCESS_CONTEST",
            GroupKind::Deepening => "DEEPENING",
            GroupKind::AccessMinor => "ACCESS_MINOR",
            GroupKind::OpenMinor => "OPEN_MINOR",
            GroupKind::OptionMiniTraining => "OPTION",
            GroupKind::CommonCore => "COMMON_CORE",
            GroupKind::SubGroup => "SUB_GROUP",
            GroupKind::OptionListChoice => "OPTION_LIST_CHOICE",
            GroupKind::Finality120ListChoice => "FINALITY_120_LIST_CHOICE",
            GroupKind::ComplementaryModule => "COMPLEMENTARY_MODULE",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type discriminant used by authorized-relationship rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    Group(GroupKind),
    LearningUnit,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Group(kind) => write!(f, "{}", kind),
            NodeType::LearningUnit => f.write_str("LEARNING_UNIT"),
        }
    }
}

/// Storage-level discriminant: which table a node is loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    EducationGroup,
    LearningUnit,
}

/// Credit range constraint on a group's descendants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditConstraint {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

/// Whether a learning unit is still offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveStatus {
    Active,
    Inactive,
}

/// Offering periodicity of a learning unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Periodicity {
    Annual,
    BiennialEven,
    BiennialOdd,
}

/// Type-specific payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group {
        group_type: GroupKind,
        constraint: Option<CreditConstraint>,
        remark_fr: Option<String>,
        remark_en: Option<String>,
    },
    LearningUnit {
        status: ActiveStatus,
        periodicity: Periodicity,
        prerequisite: Option<Prerequisite>,
    },
}

/// A curriculum element within one program tree.
///
/// `node_id` is the opaque per-tree element id used in tree paths; it is
/// assigned by the tree (or the loader) and never reused. Identity across
/// trees and years is `id` (code, year).
#[derive(Debug, Clone)]
pub struct Node {
    pub node_id: u64,
    pub id: NodeId,
    pub title: String,
    pub credits: Option<f64>,
    pub kind: NodeKind,
    pub children: Vec<Link>,
}

impl Node {
    pub fn new_group(id: NodeId, title: impl Into<String>, group_type: GroupKind) -> Self {
        Self {
            node_id: 0,
            id,
            title: title.into(),
            credits: None,
            kind: NodeKind::Group {
                group_type,
                constraint: None,
                remark_fr: None,
                remark_en: None,
            },
            children: Vec::new(),
        }
    }

    pub fn new_learning_unit(id: NodeId, title: impl Into<String>, credits: f64) -> Self {
        Self {
            node_id: 0,
            id,
            title: title.into(),
            credits: Some(credits),
            kind: NodeKind::LearningUnit {
                status: ActiveStatus::Active,
                periodicity: Periodicity::Annual,
                prerequisite: None,
            },
            children: Vec::new(),
        }
    }

    pub fn with_credits(mut self, credits: f64) -> Self {
        self.credits = Some(credits);
        self
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::LearningUnit { .. })
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Group { group_type, .. } => NodeType::Group(*group_type),
            NodeKind::LearningUnit { .. } => NodeType::LearningUnit,
        }
    }

    pub fn group_type(&self) -> Option<GroupKind> {
        match &self.kind {
            NodeKind::Group { group_type, .. } => Some(*group_type),
            NodeKind::LearningUnit { .. } => None,
        }
    }

    pub fn prerequisite(&self) -> Option<&Prerequisite> {
        match &self.kind {
            NodeKind::LearningUnit { prerequisite, .. } => prerequisite.as_ref(),
            NodeKind::Group { .. } => None,
        }
    }
}
