//! In-memory store implementations, used by tests and as the reference
//! semantics for the file-backed stores.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::domain::{
    AuthorizedRelationshipList, Node, NodeId, ProgramTree, ProgramTreeVersion, YearRecord,
};
use crate::infrastructure::document::{self, NodeRecord, TreeDocument};
use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::traits::{
    ProgramTreeRepository, ProgramTreeVersionRepository, YearRecordStore,
};

struct StoredTree {
    document: TreeDocument,
    fingerprint: String,
}

/// Tree repository holding serialized documents behind a lock.
pub struct InMemoryTreeRepository {
    relationships: AuthorizedRelationshipList,
    trees: RwLock<BTreeMap<NodeId, StoredTree>>,
    catalog: RwLock<BTreeMap<NodeId, NodeRecord>>,
}

impl InMemoryTreeRepository {
    pub fn new(relationships: AuthorizedRelationshipList) -> Self {
        Self {
            relationships,
            trees: RwLock::new(BTreeMap::new()),
            catalog: RwLock::new(BTreeMap::new()),
        }
    }

    /// Make a detached node available to `load_node`.
    pub fn register_node(&self, node: &Node) {
        let mut catalog = self.catalog.write().expect("catalog lock poisoned");
        catalog.insert(node.id.clone(), NodeRecord::from_node(node));
    }

    fn store(&self, tree: &ProgramTree) -> StoreResult<String> {
        let doc = document::to_document(tree);
        let rendered = document::to_toml(&doc)?;
        let fingerprint = document::fingerprint(&rendered);
        let mut trees = self.trees.write().expect("tree lock poisoned");
        trees.insert(
            tree.identity(),
            StoredTree {
                document: doc,
                fingerprint: fingerprint.clone(),
            },
        );
        Ok(fingerprint)
    }
}

impl ProgramTreeRepository for InMemoryTreeRepository {
    fn get(&self, identity: &NodeId) -> StoreResult<ProgramTree> {
        let trees = self.trees.read().expect("tree lock poisoned");
        let stored = trees
            .get(identity)
            .ok_or_else(|| StoreError::TreeNotFound(identity.clone()))?;
        document::from_document(
            &stored.document,
            self.relationships.clone(),
            Some(stored.fingerprint.clone()),
        )
    }

    fn search(&self, code: &str) -> StoreResult<Vec<NodeId>> {
        let trees = self.trees.read().expect("tree lock poisoned");
        Ok(trees.keys().filter(|id| id.code == code).cloned().collect())
    }

    fn create(&self, tree: &ProgramTree) -> StoreResult<()> {
        {
            let trees = self.trees.read().expect("tree lock poisoned");
            if trees.contains_key(&tree.identity()) {
                return Err(StoreError::format(
                    "create",
                    format!("tree already exists: {}", tree.identity()),
                ));
            }
        }
        self.store(tree)?;
        Ok(())
    }

    fn update(&self, tree: &mut ProgramTree) -> StoreResult<()> {
        let identity = tree.identity();
        {
            let trees = self.trees.read().expect("tree lock poisoned");
            let stored = trees
                .get(&identity)
                .ok_or_else(|| StoreError::TreeNotFound(identity.clone()))?;
            match tree.loaded_fingerprint() {
                Some(loaded) if loaded == stored.fingerprint => {}
                _ => return Err(StoreError::ConcurrentModification(identity)),
            }
        }
        let fingerprint = self.store(tree)?;
        tree.clear_pending_changes();
        tree.set_loaded_fingerprint(Some(fingerprint));
        Ok(())
    }

    fn delete(&self, identity: &NodeId) -> StoreResult<()> {
        let mut trees = self.trees.write().expect("tree lock poisoned");
        trees
            .remove(identity)
            .map(|_| ())
            .ok_or_else(|| StoreError::TreeNotFound(identity.clone()))
    }

    fn load_node(&self, identity: &NodeId) -> StoreResult<Node> {
        let catalog = self.catalog.read().expect("catalog lock poisoned");
        let record = catalog
            .get(identity)
            .ok_or_else(|| StoreError::NodeNotFound(identity.clone()))?;
        let mut node = record.to_node()?;
        // Catalog nodes are detached: the element id belongs to a tree.
        node.node_id = 0;
        Ok(node)
    }

    fn list(&self) -> StoreResult<Vec<NodeId>> {
        let trees = self.trees.read().expect("tree lock poisoned");
        Ok(trees.keys().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryVersionRepository {
    versions: RwLock<Vec<ProgramTreeVersion>>,
}

impl InMemoryVersionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgramTreeVersionRepository for InMemoryVersionRepository {
    fn get(
        &self,
        offer_acronym: &str,
        year: i32,
        version_name: &str,
        is_transition: bool,
    ) -> StoreResult<ProgramTreeVersion> {
        let versions = self.versions.read().expect("version lock poisoned");
        versions
            .iter()
            .find(|v| {
                v.identity.offer_acronym == offer_acronym
                    && v.identity.year == year
                    && v.identity.version_name == version_name
                    && v.identity.is_transition == is_transition
            })
            .cloned()
            .ok_or_else(|| {
                StoreError::VersionNotFound(format!(
                    "{}[{}] ({})",
                    offer_acronym, version_name, year
                ))
            })
    }

    fn get_last_in_past(
        &self,
        offer_acronym: &str,
        year: i32,
        version_name: &str,
        is_transition: bool,
    ) -> StoreResult<Option<ProgramTreeVersion>> {
        let versions = self.versions.read().expect("version lock poisoned");
        Ok(versions
            .iter()
            .filter(|v| {
                v.identity.offer_acronym == offer_acronym
                    && v.identity.year < year
                    && v.identity.version_name == version_name
                    && v.identity.is_transition == is_transition
            })
            .max_by_key(|v| v.identity.year)
            .cloned())
    }

    fn create(&self, version: &ProgramTreeVersion) -> StoreResult<()> {
        let mut versions = self.versions.write().expect("version lock poisoned");
        if versions.iter().any(|v| v.identity == version.identity) {
            return Err(StoreError::format(
                "create",
                format!("version already exists: {}", version.identity),
            ));
        }
        versions.push(version.clone());
        Ok(())
    }

    fn search(&self, offer_acronym: &str, year: i32) -> StoreResult<Vec<ProgramTreeVersion>> {
        let versions = self.versions.read().expect("version lock poisoned");
        Ok(versions
            .iter()
            .filter(|v| v.identity.offer_acronym == offer_acronym && v.identity.year == year)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryYearRecordStore {
    records: RwLock<BTreeMap<(String, i32), YearRecord>>,
}

impl InMemoryYearRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl YearRecordStore for InMemoryYearRecordStore {
    fn get(&self, code: &str, year: i32) -> StoreResult<Option<YearRecord>> {
        let records = self.records.read().expect("record lock poisoned");
        Ok(records.get(&(code.to_string(), year)).cloned())
    }

    fn save(&self, record: &YearRecord) -> StoreResult<()> {
        let mut records = self.records.write().expect("record lock poisoned");
        records.insert((record.code.clone(), record.year), record.clone());
        Ok(())
    }

    fn latest_year(&self, code: &str) -> StoreResult<Option<i32>> {
        let records = self.records.read().expect("record lock poisoned");
        Ok(records
            .keys()
            .filter(|(c, _)| c == code)
            .map(|(_, y)| *y)
            .max())
    }
}
