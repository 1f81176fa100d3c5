//! Application services

pub mod paste;
pub mod postponement;
pub mod version;

pub use paste::TreeEditService;
pub use postponement::{PostponementConflict, PostponementReport, PostponementService};
pub use version::VersionService;
