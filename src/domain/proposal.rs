//! Learning unit modification proposals and the classification of their
//! changes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::fields::{FieldMap, FieldValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalType {
    Creation,
    Modification,
    Transformation,
    TransformationAndModification,
    Suppression,
}

impl ProposalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalType::Creation => "CREATION",
            ProposalType::Modification => "MODIFICATION",
            ProposalType::Transformation => "TRANSFORMATION",
            ProposalType::TransformationAndModification => "TRANSFORMATION_AND_MODIFICATION",
            ProposalType::Suppression => "SUPPRESSION",
        }
    }
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    Faculty,
    Central,
    Accepted,
    Refused,
}

/// Snapshot of a learning unit's editable fields, split into the four
/// sub-maps the stored form uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalSnapshot {
    pub learning_unit: FieldMap,
    pub learning_unit_year: FieldMap,
    pub learning_container_year: FieldMap,
    pub entities: FieldMap,
}

impl ProposalSnapshot {
    fn sub_maps(&self) -> [&FieldMap; 4] {
        [
            &self.learning_unit,
            &self.learning_unit_year,
            &self.learning_container_year,
            &self.entities,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningUnitProposal {
    pub declared_type: ProposalType,
    pub state: ProposalState,
    /// Values captured when the proposal was opened.
    pub initial: ProposalSnapshot,
}

impl LearningUnitProposal {
    /// Initial values of the fields whose current value differs.
    ///
    /// Only keys present in the initial snapshot are compared; fields
    /// added since the snapshot never count as differences.
    pub fn get_difference_of_proposal(&self, current: &ProposalSnapshot) -> FieldMap {
        let mut differences = FieldMap::new();
        for (initial, current) in self.initial.sub_maps().iter().zip(current.sub_maps()) {
            for (key, initial_value) in initial.iter() {
                let current_value = current.get(key).cloned().unwrap_or(FieldValue::Null);
                if *initial_value != current_value {
                    differences.insert(key.clone(), initial_value.clone());
                }
            }
        }
        differences
    }

    /// Classify the proposal from its declared type and observed changes.
    ///
    /// Creation and suppression proposals keep their declared type.
    /// Otherwise an acronym change alone is a transformation, an acronym
    /// change among others is a transformation-and-modification, and
    /// anything else is a plain modification.
    pub fn compute_proposal_type(&self, current: &ProposalSnapshot) -> ProposalType {
        if matches!(
            self.declared_type,
            ProposalType::Creation | ProposalType::Suppression
        ) {
            return self.declared_type;
        }
        let differences = self.get_difference_of_proposal(current);
        let acronym_changed = differences.contains_key("acronym");
        let other_changed = differences.keys().any(|k| k != "acronym");
        match (acronym_changed, other_changed) {
            (true, false) => ProposalType::Transformation,
            (true, true) => ProposalType::TransformationAndModification,
            _ => ProposalType::Modification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> ProposalSnapshot {
        let mut snapshot = ProposalSnapshot::default();
        for (key, value) in pairs {
            snapshot
                .learning_unit_year
                .insert(key.to_string(), FieldValue::Text(value.to_string()));
        }
        snapshot
    }

    fn proposal(declared: ProposalType, initial: ProposalSnapshot) -> LearningUnitProposal {
        LearningUnitProposal {
            declared_type: declared,
            state: ProposalState::Faculty,
            initial,
        }
    }

    #[test]
    fn given_creation_proposal_when_computing_type_then_declared_type_wins() {
        let p = proposal(
            ProposalType::Creation,
            snapshot(&[("acronym", "LDROI1001")]),
        );
        let current = snapshot(&[("acronym", "LDROI9999")]);
        assert_eq!(p.compute_proposal_type(&current), ProposalType::Creation);
    }

    #[test]
    fn given_only_acronym_changed_when_computing_type_then_transformation() {
        let p = proposal(
            ProposalType::Modification,
            snapshot(&[("acronym", "LDROI1001"), ("title", "Droit")]),
        );
        let current = snapshot(&[("acronym", "LDROI2001"), ("title", "Droit")]);
        assert_eq!(
            p.compute_proposal_type(&current),
            ProposalType::Transformation
        );
    }

    #[test]
    fn given_acronym_and_title_changed_when_computing_type_then_transformation_and_modification() {
        let p = proposal(
            ProposalType::Modification,
            snapshot(&[("acronym", "LDROI1001"), ("title", "Droit")]),
        );
        let current = snapshot(&[("acronym", "LDROI2001"), ("title", "Droit civil")]);
        assert_eq!(
            p.compute_proposal_type(&current),
            ProposalType::TransformationAndModification
        );
    }

    #[test]
    fn given_title_changed_when_computing_type_then_modification() {
        let p = proposal(
            ProposalType::Modification,
            snapshot(&[("acronym", "LDROI1001"), ("title", "Droit")]),
        );
        let current = snapshot(&[("acronym", "LDROI1001"), ("title", "Droit civil")]);
        assert_eq!(
            p.compute_proposal_type(&current),
            ProposalType::Modification
        );
    }

    #[test]
    fn given_field_only_in_current_when_diffing_then_ignored() {
        let p = proposal(
            ProposalType::Modification,
            snapshot(&[("title", "Droit")]),
        );
        let current = snapshot(&[("title", "Droit"), ("credits", "5")]);
        assert!(p.get_difference_of_proposal(&current).is_empty());
    }

    #[test]
    fn given_field_missing_in_current_when_diffing_then_reported_as_difference() {
        let p = proposal(ProposalType::Modification, snapshot(&[("title", "Droit")]));
        let current = ProposalSnapshot::default();
        let diff = p.get_difference_of_proposal(&current);
        assert_eq!(
            diff.get("title"),
            Some(&FieldValue::Text("Droit".to_string()))
        );
    }
}
