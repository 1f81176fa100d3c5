//! File-backed stores: one TOML document per tree under the store
//! directory, plus a shared element catalog and per-code year records.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::domain::{
    AuthorizedRelationshipList, Node, NodeId, ProgramTree, ProgramTreeVersion, YearRecord,
};
use crate::infrastructure::document::{self, CatalogDocument, NodeRecord};
use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::traits::{
    ProgramTreeRepository, ProgramTreeVersionRepository, YearRecordStore,
};

const TREE_SUFFIX: &str = ".tree.toml";
const CATALOG_FILE: &str = "catalog.toml";
const VERSIONS_FILE: &str = "versions.toml";

/// Trees stored as `{CODE}-{YEAR}.tree.toml` files.
pub struct FileTreeRepository {
    store_dir: PathBuf,
    relationships: AuthorizedRelationshipList,
}

impl FileTreeRepository {
    pub fn new(
        store_dir: impl Into<PathBuf>,
        relationships: AuthorizedRelationshipList,
    ) -> StoreResult<Self> {
        let store_dir = store_dir.into();
        fs::create_dir_all(&store_dir)
            .map_err(|e| StoreError::io(format!("create {}", store_dir.display()), e))?;
        Ok(Self {
            store_dir,
            relationships,
        })
    }

    fn tree_path(&self, identity: &NodeId) -> PathBuf {
        self.store_dir
            .join(format!("{}-{}{}", identity.code, identity.year, TREE_SUFFIX))
    }

    fn catalog_path(&self) -> PathBuf {
        self.store_dir.join(CATALOG_FILE)
    }

    fn read_catalog(&self) -> StoreResult<CatalogDocument> {
        let path = self.catalog_path();
        if !path.exists() {
            return Ok(CatalogDocument::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| StoreError::io(format!("read {}", path.display()), e))?;
        toml::from_str(&content).map_err(|e| StoreError::format("catalog", e))
    }

    fn write_catalog(&self, catalog: &CatalogDocument) -> StoreResult<()> {
        let path = self.catalog_path();
        let rendered =
            toml::to_string_pretty(catalog).map_err(|e| StoreError::format("catalog", e))?;
        fs::write(&path, rendered)
            .map_err(|e| StoreError::io(format!("write {}", path.display()), e))
    }

    /// Make a detached node available to `load_node`.
    pub fn register_node(&self, node: &Node) -> StoreResult<()> {
        let mut catalog = self.read_catalog()?;
        let id = node.id.clone();
        catalog
            .nodes
            .retain(|r| !(r.code == id.code && r.year == id.year));
        catalog.nodes.push(NodeRecord::from_node(node));
        self.write_catalog(&catalog)
    }

    fn read_stored(&self, identity: &NodeId) -> StoreResult<(String, String)> {
        let path = self.tree_path(identity);
        if !path.exists() {
            return Err(StoreError::TreeNotFound(identity.clone()));
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| StoreError::io(format!("read {}", path.display()), e))?;
        let fingerprint = document::fingerprint(&content);
        Ok((content, fingerprint))
    }

    fn write_tree(&self, tree: &ProgramTree) -> StoreResult<String> {
        let rendered = document::to_toml(&document::to_document(tree))?;
        let path = self.tree_path(&tree.identity());
        fs::write(&path, &rendered)
            .map_err(|e| StoreError::io(format!("write {}", path.display()), e))?;
        Ok(document::fingerprint(&rendered))
    }

    /// Identities parseable from `{CODE}-{YEAR}.tree.toml` file names.
    fn identities_under(&self, dir: &Path) -> Vec<NodeId> {
        let mut identities = Vec::new();
        for entry in WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(stem) = name.strip_suffix(TREE_SUFFIX) else {
                continue;
            };
            let Some((code, year)) = stem.rsplit_once('-') else {
                continue;
            };
            if let Ok(year) = year.parse::<i32>() {
                identities.push(NodeId::new(code, year));
            }
        }
        identities.sort();
        identities
    }
}

impl ProgramTreeRepository for FileTreeRepository {
    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    fn get(&self, identity: &NodeId) -> StoreResult<ProgramTree> {
        let (content, fingerprint) = self.read_stored(identity)?;
        let doc = document::from_toml(&content)?;
        document::from_document(&doc, self.relationships.clone(), Some(fingerprint))
    }

    fn search(&self, code: &str) -> StoreResult<Vec<NodeId>> {
        Ok(self
            .identities_under(&self.store_dir)
            .into_iter()
            .filter(|id| id.code == code)
            .collect())
    }

    fn create(&self, tree: &ProgramTree) -> StoreResult<()> {
        let path = self.tree_path(&tree.identity());
        if path.exists() {
            return Err(StoreError::format(
                "create",
                format!("tree already exists: {}", tree.identity()),
            ));
        }
        self.write_tree(tree)?;
        debug!(identity = %tree.identity(), "tree created");
        Ok(())
    }

    #[instrument(level = "debug", skip(self, tree), fields(identity = %tree.identity()))]
    fn update(&self, tree: &mut ProgramTree) -> StoreResult<()> {
        let identity = tree.identity();
        let (_, stored_fingerprint) = self.read_stored(&identity)?;
        match tree.loaded_fingerprint() {
            Some(loaded) if loaded == stored_fingerprint => {}
            _ => return Err(StoreError::ConcurrentModification(identity)),
        }
        let changes = tree.pending_changes();
        for link in &changes.changed_links {
            debug!(link = %link.identity, order = link.order, "persisting link");
        }
        for link in &changes.deleted_links {
            debug!(link = %link, "deleting link");
        }
        let fingerprint = self.write_tree(tree)?;
        tree.clear_pending_changes();
        tree.set_loaded_fingerprint(Some(fingerprint));
        Ok(())
    }

    fn delete(&self, identity: &NodeId) -> StoreResult<()> {
        let path = self.tree_path(identity);
        if !path.exists() {
            return Err(StoreError::TreeNotFound(identity.clone()));
        }
        fs::remove_file(&path)
            .map_err(|e| StoreError::io(format!("remove {}", path.display()), e))
    }

    fn load_node(&self, identity: &NodeId) -> StoreResult<Node> {
        let catalog = self.read_catalog()?;
        let record = catalog
            .nodes
            .iter()
            .find(|r| r.code == identity.code && r.year == identity.year)
            .ok_or_else(|| StoreError::NodeNotFound(identity.clone()))?;
        let mut node = record.to_node()?;
        node.node_id = 0;
        Ok(node)
    }

    fn list(&self) -> StoreResult<Vec<NodeId>> {
        Ok(self.identities_under(&self.store_dir))
    }
}

/// Versions stored in a single `versions.toml` under the store directory.
pub struct FileVersionRepository {
    store_dir: PathBuf,
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct VersionDocument {
    versions: Vec<ProgramTreeVersion>,
}

impl FileVersionRepository {
    pub fn new(store_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let store_dir = store_dir.into();
        fs::create_dir_all(&store_dir)
            .map_err(|e| StoreError::io(format!("create {}", store_dir.display()), e))?;
        Ok(Self { store_dir })
    }

    fn versions_path(&self) -> PathBuf {
        self.store_dir.join(VERSIONS_FILE)
    }

    fn read_versions(&self) -> StoreResult<VersionDocument> {
        let path = self.versions_path();
        if !path.exists() {
            return Ok(VersionDocument::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| StoreError::io(format!("read {}", path.display()), e))?;
        toml::from_str(&content).map_err(|e| StoreError::format("versions", e))
    }

    fn write_versions(&self, doc: &VersionDocument) -> StoreResult<()> {
        let path = self.versions_path();
        let rendered =
            toml::to_string_pretty(doc).map_err(|e| StoreError::format("versions", e))?;
        fs::write(&path, rendered)
            .map_err(|e| StoreError::io(format!("write {}", path.display()), e))
    }
}

impl ProgramTreeVersionRepository for FileVersionRepository {
    fn get(
        &self,
        offer_acronym: &str,
        year: i32,
        version_name: &str,
        is_transition: bool,
    ) -> StoreResult<ProgramTreeVersion> {
        let doc = self.read_versions()?;
        doc.versions
            .into_iter()
            .find(|v| {
                v.identity.offer_acronym == offer_acronym
                    && v.identity.year == year
                    && v.identity.version_name == version_name
                    && v.identity.is_transition == is_transition
            })
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
        let doc = self.read_versions()?;
        Ok(doc
            .versions
            .into_iter()
            .filter(|v| {
                v.identity.offer_acronym == offer_acronym
                    && v.identity.year < year
                    && v.identity.version_name == version_name
                    && v.identity.is_transition == is_transition
            })
            .max_by_key(|v| v.identity.year))
    }

    fn create(&self, version: &ProgramTreeVersion) -> StoreResult<()> {
        let mut doc = self.read_versions()?;
        if doc.versions.iter().any(|v| v.identity == version.identity) {
            return Err(StoreError::format(
                "create",
                format!("version already exists: {}", version.identity),
            ));
        }
        doc.versions.push(version.clone());
        self.write_versions(&doc)
    }

    fn search(&self, offer_acronym: &str, year: i32) -> StoreResult<Vec<ProgramTreeVersion>> {
        let doc = self.read_versions()?;
        Ok(doc
            .versions
            .into_iter()
            .filter(|v| v.identity.offer_acronym == offer_acronym && v.identity.year == year)
            .collect())
    }
}

/// Year records stored as one `{CODE}.years.toml` file per code.
pub struct FileYearRecordStore {
    store_dir: PathBuf,
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct YearRecordDocument {
    records: Vec<YearRecord>,
}

impl FileYearRecordStore {
    pub fn new(store_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let store_dir = store_dir.into();
        fs::create_dir_all(&store_dir)
            .map_err(|e| StoreError::io(format!("create {}", store_dir.display()), e))?;
        Ok(Self { store_dir })
    }

    fn record_path(&self, code: &str) -> PathBuf {
        self.store_dir.join(format!("{}.years.toml", code))
    }

    fn read_records(&self, code: &str) -> StoreResult<YearRecordDocument> {
        let path = self.record_path(code);
        if !path.exists() {
            return Ok(YearRecordDocument::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| StoreError::io(format!("read {}", path.display()), e))?;
        toml::from_str(&content).map_err(|e| StoreError::format("year records", e))
    }

    fn write_records(&self, code: &str, doc: &YearRecordDocument) -> StoreResult<()> {
        let path = self.record_path(code);
        let rendered =
            toml::to_string_pretty(doc).map_err(|e| StoreError::format("year records", e))?;
        fs::write(&path, rendered)
            .map_err(|e| StoreError::io(format!("write {}", path.display()), e))
    }
}

impl YearRecordStore for FileYearRecordStore {
    fn get(&self, code: &str, year: i32) -> StoreResult<Option<YearRecord>> {
        let doc = self.read_records(code)?;
        Ok(doc.records.into_iter().find(|r| r.year == year))
    }

    fn save(&self, record: &YearRecord) -> StoreResult<()> {
        let mut doc = self.read_records(&record.code)?;
        doc.records.retain(|r| r.year != record.year);
        doc.records.push(record.clone());
        doc.records.sort_by_key(|r| r.year);
        self.write_records(&record.code, &doc)
    }

    fn latest_year(&self, code: &str) -> StoreResult<Option<i32>> {
        let doc = self.read_records(code)?;
        Ok(doc.records.iter().map(|r| r.year).max())
    }
}
