//! Authorized relationships: which child types may attach under which
//! parent types, with cardinality bounds.

use std::collections::BTreeSet;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{GroupKind, NodeType};

/// One rule: `child_type` may attach under `parent_type`, at most
/// `max_count` times per parent instance (`None` = unbounded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedRelationship {
    pub parent_type: NodeType,
    pub child_type: NodeType,
    pub min_count: u32,
    pub max_count: Option<u32>,
}

impl AuthorizedRelationship {
    pub fn new(parent_type: NodeType, child_type: NodeType) -> Self {
        Self {
            parent_type,
            child_type,
            min_count: 0,
            max_count: None,
        }
    }

    pub fn with_cardinality(mut self, min_count: u32, max_count: Option<u32>) -> Self {
        self.min_count = min_count;
        self.max_count = max_count;
        self
    }
}

/// The rule table consulted at attach time.
///
/// A child type that no rule mentions at all is an open type and may attach
/// anywhere (e.g. a learning unit under any group, unless rules say
/// otherwise). A child type that appears in at least one rule may only
/// attach under the parents those rules name.
#[derive(Debug, Clone)]
pub struct AuthorizedRelationshipList {
    rules: Vec<AuthorizedRelationship>,
}

impl AuthorizedRelationshipList {
    pub fn new(rules: Vec<AuthorizedRelationship>) -> DomainResult<Self> {
        if rules.is_empty() {
            return Err(DomainError::EmptyRelationshipList);
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[AuthorizedRelationship] {
        &self.rules
    }

    fn get(&self, parent_type: NodeType, child_type: NodeType) -> Option<&AuthorizedRelationship> {
        self.rules
            .iter()
            .find(|r| r.parent_type == parent_type && r.child_type == child_type)
    }

    fn is_open_type(&self, child_type: NodeType) -> bool {
        !self.rules.iter().any(|r| r.child_type == child_type)
    }

    pub fn is_authorized(&self, parent_type: NodeType, child_type: NodeType) -> bool {
        self.is_open_type(child_type) || self.get(parent_type, child_type).is_some()
    }

    /// Child types an explicit rule permits under `parent_type`.
    /// Drives "what can I attach here" validation.
    pub fn get_authorized_children_types(&self, parent_type: NodeType) -> BTreeSet<NodeType> {
        self.rules
            .iter()
            .filter(|r| r.parent_type == parent_type)
            .map(|r| r.child_type)
            .collect()
    }

    /// Cardinality bounds for the pair, `(0, unbounded)` when unspecified.
    pub fn cardinality(&self, parent_type: NodeType, child_type: NodeType) -> (u32, Option<u32>) {
        self.get(parent_type, child_type)
            .map(|r| (r.min_count, r.max_count))
            .unwrap_or((0, None))
    }
}

/// Baseline rule table used by the CLI and as a test fixture.
/// Learning units carry no rule on purpose: they are an open type.
pub fn default_rules() -> Vec<AuthorizedRelationship> {
    use GroupKind::*;
    let g = NodeType::Group;
    vec![
        AuthorizedRelationship::new(g(Bachelor), g(CommonCore)).with_cardinality(1, Some(1)),
        AuthorizedRelationship::new(g(Bachelor), g(OptionListChoice)).with_cardinality(0, Some(1)),
        AuthorizedRelationship::new(g(Bachelor), g(AccessMinor)),
        AuthorizedRelationship::new(g(Master120), g(CommonCore)).with_cardinality(1, Some(1)),
        AuthorizedRelationship::new(g(Master120), g(Finality120ListChoice))
            .with_cardinality(0, Some(1)),
        AuthorizedRelationship::new(g(Master120), g(OptionListChoice)),
        AuthorizedRelationship::new(g(CommonCore), g(SubGroup)),
        AuthorizedRelationship::new(g(OptionListChoice), g(OptionMiniTraining)),
        AuthorizedRelationship::new(g(SubGroup), g(SubGroup)),
        AuthorizedRelationship::new(g(Deepening), g(SubGroup)),
        AuthorizedRelationship::new(g(Certificate), g(CommonCore)).with_cardinality(1, Some(1)),
        AuthorizedRelationship::new(g(ComplementaryModule), g(SubGroup)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rule_list_is_rejected() {
        assert_eq!(
            AuthorizedRelationshipList::new(vec![]).unwrap_err(),
            DomainError::EmptyRelationshipList
        );
    }

    #[test]
    fn unmentioned_child_type_is_open() {
        let rules = AuthorizedRelationshipList::new(default_rules()).unwrap();
        // No rule names LearningUnit as a child type anywhere.
        assert!(rules.is_authorized(
            NodeType::Group(GroupKind::SubGroup),
            NodeType::LearningUnit
        ));
    }

    #[test]
    fn mentioned_child_type_is_restricted_to_its_parents() {
        let rules = AuthorizedRelationshipList::new(default_rules()).unwrap();
        let common_core = NodeType::Group(GroupKind::CommonCore);
        assert!(rules.is_authorized(NodeType::Group(GroupKind::Bachelor), common_core));
        assert!(!rules.is_authorized(NodeType::Group(GroupKind::SubGroup), common_core));
    }

    #[test]
    fn authorized_children_listed_per_parent_type() {
        let rules = AuthorizedRelationshipList::new(default_rules()).unwrap();

        let under_bachelor = rules.get_authorized_children_types(NodeType::Group(GroupKind::Bachelor));
        let expected: BTreeSet<NodeType> = [
            NodeType::Group(GroupKind::CommonCore),
            NodeType::Group(GroupKind::OptionListChoice),
            NodeType::Group(GroupKind::AccessMinor),
        ]
        .into_iter()
        .collect();
        assert_eq!(under_bachelor, expected);

        // Leaves never appear as a parent in the rule table.
        assert!(rules
            .get_authorized_children_types(NodeType::LearningUnit)
            .is_empty());
    }

    #[test]
    fn cardinality_defaults_to_unbounded() {
        let rules = AuthorizedRelationshipList::new(default_rules()).unwrap();
        assert_eq!(
            rules.cardinality(
                NodeType::Group(GroupKind::SubGroup),
                NodeType::LearningUnit
            ),
            (0, None)
        );
        assert_eq!(
            rules.cardinality(
                NodeType::Group(GroupKind::Bachelor),
                NodeType::Group(GroupKind::CommonCore)
            ),
            (1, Some(1))
        );
    }
}
