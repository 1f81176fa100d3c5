//! Storage boundary traits for testability
//!
//! These traits abstract tree, version and record persistence, allowing
//! services to be tested with in-memory implementations.

use crate::domain::{Node, NodeId, ProgramTree, ProgramTreeVersion, YearRecord};
use crate::infrastructure::error::StoreResult;

/// Persistence boundary for program trees.
pub trait ProgramTreeRepository: Send + Sync {
    /// Load the tree rooted at the given identity.
    fn get(&self, identity: &NodeId) -> StoreResult<ProgramTree>;

    /// Identities of all trees for a code, any year.
    fn search(&self, code: &str) -> StoreResult<Vec<NodeId>>;

    /// Persist a new tree. Fails if a tree with the same identity exists.
    fn create(&self, tree: &ProgramTree) -> StoreResult<()>;

    /// Apply the tree's pending changes to the stored form.
    ///
    /// Fails with `ConcurrentModification` when the stored form no longer
    /// matches the fingerprint the tree was loaded with.
    fn update(&self, tree: &mut ProgramTree) -> StoreResult<()>;

    /// Delete the stored tree.
    fn delete(&self, identity: &NodeId) -> StoreResult<()>;

    /// Load a node from the element catalog, detached from any tree.
    fn load_node(&self, identity: &NodeId) -> StoreResult<Node>;

    /// Identities of every stored tree.
    fn list(&self) -> StoreResult<Vec<NodeId>>;
}

/// Persistence boundary for program tree versions.
pub trait ProgramTreeVersionRepository: Send + Sync {
    fn get(
        &self,
        offer_acronym: &str,
        year: i32,
        version_name: &str,
        is_transition: bool,
    ) -> StoreResult<ProgramTreeVersion>;

    /// Latest version with the same name strictly before the given year.
    fn get_last_in_past(
        &self,
        offer_acronym: &str,
        year: i32,
        version_name: &str,
        is_transition: bool,
    ) -> StoreResult<Option<ProgramTreeVersion>>;

    fn create(&self, version: &ProgramTreeVersion) -> StoreResult<()>;

    /// All versions of an offer for a year.
    fn search(&self, offer_acronym: &str, year: i32) -> StoreResult<Vec<ProgramTreeVersion>>;
}

/// Persistence boundary for per-year entity records.
pub trait YearRecordStore: Send + Sync {
    fn get(&self, code: &str, year: i32) -> StoreResult<Option<YearRecord>>;

    fn save(&self, record: &YearRecord) -> StoreResult<()>;

    /// Latest year a record exists for, if any.
    fn latest_year(&self, code: &str) -> StoreResult<Option<i32>>;
}
