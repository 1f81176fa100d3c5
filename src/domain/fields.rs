//! Field maps: the flat attribute dictionaries compared by proposal diffs
//! and postponement drift detection.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Null => f.write_str("-"),
        }
    }
}

/// Attribute name → value, ordered for stable diffs and serialization.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// One differing attribute between a snapshot and the stored state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDifference {
    /// Value captured in the snapshot.
    pub snapshot: FieldValue,
    /// Value currently stored.
    pub stored: FieldValue,
}

impl fmt::Display for FieldDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} != {}", self.stored, self.snapshot)
    }
}

/// Compare `current` against `initial`, restricted to the keys `initial`
/// knows about. Keys absent from `current` count as drifted to `Null`.
pub fn diff_fields(
    initial: &FieldMap,
    current: &FieldMap,
) -> BTreeMap<String, FieldDifference> {
    initial
        .iter()
        .filter_map(|(key, snapshot)| {
            let stored = current.get(key).cloned().unwrap_or(FieldValue::Null);
            if stored != *snapshot {
                Some((
                    key.clone(),
                    FieldDifference {
                        snapshot: snapshot.clone(),
                        stored,
                    },
                ))
            } else {
                None
            }
        })
        .collect()
}

/// The field state of one (code, year) record, as captured at an explicit
/// point in time. Carrying the capture timestamp makes the comparison
/// baseline of a postponement run unambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSnapshot {
    pub fields: FieldMap,
    pub captured_at: DateTime<Utc>,
}

impl YearSnapshot {
    pub fn capture(fields: FieldMap) -> Self {
        Self {
            fields,
            captured_at: Utc::now(),
        }
    }
}

/// The stored yearly state of a postponable entity: scalar fields plus
/// named collections (the many-to-many rows of the source schema).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub code: String,
    pub year: i32,
    pub fields: FieldMap,
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<FieldMap>>,
}
