//! Program tree versions: the standard version and the specific/transition
//! versions derived from it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{NodeId, NodeKind};
use crate::domain::tree::ProgramTree;

/// The standard version carries an empty version name.
pub const STANDARD_VERSION_NAME: &str = "";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramTreeVersionIdentity {
    pub offer_acronym: String,
    pub year: i32,
    pub version_name: String,
    pub is_transition: bool,
}

impl ProgramTreeVersionIdentity {
    pub fn new(
        offer_acronym: impl Into<String>,
        year: i32,
        version_name: impl Into<String>,
        is_transition: bool,
    ) -> Self {
        Self {
            offer_acronym: offer_acronym.into(),
            year,
            version_name: version_name.into(),
            is_transition,
        }
    }

    pub fn standard(offer_acronym: impl Into<String>, year: i32) -> Self {
        Self::new(offer_acronym, year, STANDARD_VERSION_NAME, false)
    }

    pub fn is_standard(&self) -> bool {
        self.version_name == STANDARD_VERSION_NAME && !self.is_transition
    }

    pub fn with_year(&self, year: i32) -> Self {
        Self {
            year,
            ..self.clone()
        }
    }
}

impl fmt::Display for ProgramTreeVersionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.offer_acronym)?;
        if !self.version_name.is_empty() {
            write!(f, "[{}]", self.version_name)?;
        }
        if self.is_transition {
            f.write_str("[transition]")?;
        }
        write!(f, " ({})", self.year)
    }
}

/// Version metadata plus the identity of the tree it points to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramTreeVersion {
    pub identity: ProgramTreeVersionIdentity,
    pub tree_identity: NodeId,
    pub title_fr: Option<String>,
    pub title_en: Option<String>,
    pub end_year_of_existence: Option<i32>,
}

/// User-provided content of a new specific version.
#[derive(Debug, Clone)]
pub struct VersionSpec {
    pub version_name: String,
    pub is_transition: bool,
    pub title_fr: Option<String>,
    pub title_en: Option<String>,
    pub end_year: Option<i32>,
}

/// Fields of the root node that must match between a tree and its
/// next-year copy.
pub fn check_copy_consistency(source: &ProgramTree, copy: &ProgramTree) -> DomainResult<()> {
    let a = source.root();
    let b = copy.root();
    let mut differing: Vec<String> = Vec::new();
    if a.title != b.title {
        differing.push("title".to_string());
    }
    if a.credits != b.credits {
        differing.push("credits".to_string());
    }
    if let (
        NodeKind::Group {
            group_type: type_a,
            constraint: constraint_a,
            remark_fr: fr_a,
            remark_en: en_a,
        },
        NodeKind::Group {
            group_type: type_b,
            constraint: constraint_b,
            remark_fr: fr_b,
            remark_en: en_b,
        },
    ) = (&a.kind, &b.kind)
    {
        if type_a != type_b {
            differing.push("group_type".to_string());
        }
        if constraint_a != constraint_b {
            differing.push("constraint".to_string());
        }
        if fr_a != fr_b {
            differing.push("remark_fr".to_string());
        }
        if en_a != en_b {
            differing.push("remark_en".to_string());
        }
    }
    if differing.is_empty() {
        Ok(())
    } else {
        Err(DomainError::CopyConsistency { fields: differing })
    }
}

/// Builds a specific version from the standard version of the same
/// offer and year, duplicating the standard tree under a derived code.
pub struct ProgramTreeVersionBuilder;

impl ProgramTreeVersionBuilder {
    pub fn build_from(
        standard: &ProgramTreeVersion,
        standard_tree: &ProgramTree,
        spec: &VersionSpec,
    ) -> DomainResult<(ProgramTreeVersion, ProgramTree)> {
        if !standard.identity.is_standard() {
            return Err(DomainError::NotStandardVersion(
                standard.identity.to_string(),
            ));
        }
        let root_code = format!("{}{}", standard_tree.root().id.code, spec.version_name);
        let tree = standard_tree.duplicate_as(&root_code)?;
        let version = ProgramTreeVersion {
            identity: ProgramTreeVersionIdentity::new(
                standard.identity.offer_acronym.clone(),
                standard.identity.year,
                spec.version_name.clone(),
                spec.is_transition,
            ),
            tree_identity: tree.identity(),
            title_fr: spec.title_fr.clone(),
            title_en: spec.title_en.clone(),
            end_year_of_existence: spec.end_year,
        };
        Ok((version, tree))
    }
}
