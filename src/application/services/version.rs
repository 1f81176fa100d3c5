//! Version service
//!
//! Creates specific program tree versions from the standard version and
//! copies trees forward to the next academic year.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::commands::CreateProgramTreeVersionCommand;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    check_copy_consistency, NodeId, ProgramTreeVersion, ProgramTreeVersionBuilder,
    ProgramTreeVersionIdentity, VersionSpec, STANDARD_VERSION_NAME,
};
use crate::infrastructure::traits::{ProgramTreeRepository, ProgramTreeVersionRepository};
use crate::infrastructure::StoreError;

/// Service managing program tree versions and year-to-year tree copies.
pub struct VersionService {
    trees: Arc<dyn ProgramTreeRepository>,
    versions: Arc<dyn ProgramTreeVersionRepository>,
}

impl VersionService {
    pub fn new(
        trees: Arc<dyn ProgramTreeRepository>,
        versions: Arc<dyn ProgramTreeVersionRepository>,
    ) -> Self {
        Self { trees, versions }
    }

    fn standard_version(
        &self,
        offer_acronym: &str,
        year: i32,
    ) -> ApplicationResult<Option<ProgramTreeVersion>> {
        match self
            .versions
            .get(offer_acronym, year, STANDARD_VERSION_NAME, false)
        {
            Ok(version) => Ok(Some(version)),
            Err(StoreError::VersionNotFound(_)) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    /// Create a specific version for every year the standard version
    /// exists, starting at `from_year` and honoring the command's end
    /// year. The loop stops at the first year without a standard version:
    /// a specific version never outlives its standard.
    #[instrument(level = "debug", skip(self, command), fields(offer = %command.offer_acronym, version = %command.version_name))]
    pub fn create_program_tree_version(
        &self,
        command: &CreateProgramTreeVersionCommand,
    ) -> ApplicationResult<Vec<ProgramTreeVersionIdentity>> {
        let spec = VersionSpec {
            version_name: command.version_name.clone(),
            is_transition: command.is_transition,
            title_fr: command.title_fr.clone(),
            title_en: command.title_en.clone(),
            end_year: command.end_year,
        };
        let mut created = Vec::new();
        let mut year = command.from_year;
        loop {
            if let Some(end) = command.end_year {
                if year > end {
                    break;
                }
            }
            let Some(standard) = self.standard_version(&command.offer_acronym, year)? else {
                break;
            };
            let standard_tree = self.trees.get(&standard.tree_identity)?;
            let (version, tree) =
                ProgramTreeVersionBuilder::build_from(&standard, &standard_tree, &spec)?;
            self.trees.create(&tree)?;
            self.versions.create(&version)?;
            debug!(identity = %version.identity, "version created");
            created.push(version.identity);
            year += 1;
        }
        if created.is_empty() {
            return Err(ApplicationError::VersionNotFound(format!(
                "{} ({})",
                command.offer_acronym, command.from_year
            )));
        }
        info!(offer = %command.offer_acronym, count = created.len(), "versions created");
        Ok(created)
    }

    /// Latest existing year of a version, strictly before `year`.
    pub fn last_version_in_past(
        &self,
        offer_acronym: &str,
        year: i32,
        version_name: &str,
        is_transition: bool,
    ) -> ApplicationResult<Option<ProgramTreeVersion>> {
        Ok(self
            .versions
            .get_last_in_past(offer_acronym, year, version_name, is_transition)?)
    }

    /// Copy a tree into the next academic year.
    ///
    /// When the next year already holds a tree, its root must match the
    /// copy field for field; any divergence is a copy-consistency error
    /// and nothing is written.
    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    pub fn copy_tree_to_next_year(&self, identity: &NodeId) -> ApplicationResult<NodeId> {
        let source = self.trees.get(identity).map_err(|e| match e {
            StoreError::TreeNotFound(id) => ApplicationError::TreeNotFound(id),
            other => other.into(),
        })?;
        let copy = source.copy_to_next_year()?;
        let copy_identity = copy.identity();
        match self.trees.get(&copy_identity) {
            Ok(existing) => {
                check_copy_consistency(&existing, &copy)?;
                debug!(identity = %copy_identity, "next-year tree already consistent");
            }
            Err(StoreError::TreeNotFound(_)) => {
                self.trees.create(&copy)?;
                info!(identity = %copy_identity, "tree copied to next year");
            }
            Err(other) => return Err(other.into()),
        }
        Ok(copy_identity)
    }
}
