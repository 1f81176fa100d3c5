//! Infrastructure layer: storage implementations
//!
//! This layer implements the storage boundary traits over TOML files and
//! in-memory maps.

pub mod document;
pub mod error;
pub mod file_store;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file_store::{FileTreeRepository, FileVersionRepository, FileYearRecordStore};
pub use memory::{InMemoryTreeRepository, InMemoryVersionRepository, InMemoryYearRecordStore};
