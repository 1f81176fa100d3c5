//! Postponement service
//!
//! Copies the yearly state of an entity forward, year by year, up to the
//! postponement horizon. A future year whose stored state drifted from
//! the baseline snapshot is a conflict: it is reported and the run stops
//! there, leaving later years untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::commands::PostponeCommand;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{current_academic_year, FieldDifference, YearRecord};
use crate::infrastructure::traits::YearRecordStore;

/// Drift found in an already-existing future year.
#[derive(Debug, Clone)]
pub struct PostponementConflict {
    pub code: String,
    pub year: i32,
    pub differences: BTreeMap<String, FieldDifference>,
}

impl PostponementConflict {
    /// One-line report naming the drifted fields.
    pub fn message(&self) -> String {
        let fields = self
            .differences
            .iter()
            .map(|(key, diff)| format!("{}: {}", key, diff))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} already modified in {}: {}",
            self.code, self.year, fields
        )
    }
}

#[derive(Debug, Clone)]
pub struct PostponementReport {
    /// Years a record was written for, in order.
    pub postponed: Vec<i32>,
    pub conflict: Option<PostponementConflict>,
}

/// Service copying year records forward.
pub struct PostponementService {
    store: Arc<dyn YearRecordStore>,
    max_postpone_years: i32,
    reference_year: i32,
}

impl PostponementService {
    pub fn new(store: Arc<dyn YearRecordStore>, max_postpone_years: i32) -> Self {
        Self::with_reference_year(store, max_postpone_years, current_academic_year())
    }

    /// Same service with an explicit horizon base year.
    pub fn with_reference_year(
        store: Arc<dyn YearRecordStore>,
        max_postpone_years: i32,
        reference_year: i32,
    ) -> Self {
        Self {
            store,
            max_postpone_years,
            reference_year,
        }
    }

    /// Last year the run may write.
    ///
    /// The horizon is the reference year plus the configured maximum,
    /// capped by the entity's own end year, but never before a year that
    /// already exists in the store.
    pub fn compute_end_year(&self, code: &str, end_year: Option<i32>) -> ApplicationResult<i32> {
        let mut end = self.reference_year + self.max_postpone_years;
        if let Some(entity_end) = end_year {
            end = end.min(entity_end);
        }
        if let Some(latest) = self.store.latest_year(code)? {
            end = end.max(latest);
        }
        Ok(end)
    }

    /// Copy the `from_year` record into every later year up to the horizon.
    #[instrument(level = "debug", skip(self, command), fields(code = %command.code, from_year = command.from_year))]
    pub fn postpone(&self, command: &PostponeCommand) -> ApplicationResult<PostponementReport> {
        let source = self
            .store
            .get(&command.code, command.from_year)?
            .ok_or_else(|| ApplicationError::RecordNotFound {
                code: command.code.clone(),
                year: command.from_year,
            })?;
        let end_year = self.compute_end_year(&command.code, command.end_year)?;
        debug!(end_year, "postponement horizon computed");

        let mut postponed = Vec::new();
        for year in (command.from_year + 1)..=end_year {
            if let Some(existing) = self.store.get(&command.code, year)? {
                let differences =
                    crate::domain::diff_fields(&command.initial_snapshot.fields, &existing.fields);
                if !differences.is_empty() {
                    let conflict = PostponementConflict {
                        code: command.code.clone(),
                        year,
                        differences,
                    };
                    info!(message = %conflict.message(), "postponement stopped");
                    return Ok(PostponementReport {
                        postponed,
                        conflict: Some(conflict),
                    });
                }
            }
            let copy = YearRecord {
                code: source.code.clone(),
                year,
                fields: source.fields.clone(),
                collections: source.collections.clone(),
            };
            self.store.save(&copy)?;
            postponed.push(year);
        }
        info!(code = %command.code, years = postponed.len(), "postponement finished");
        Ok(PostponementReport {
            postponed,
            conflict: None,
        })
    }
}
