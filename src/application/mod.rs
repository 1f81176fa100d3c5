//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on storage boundary traits.

pub mod commands;
pub mod error;
pub mod services;

pub use commands::{
    AttachNodeCommand, CreateProgramTreeVersionCommand, DetachNodeCommand, PasteElementCommand,
    PostponeCommand,
};
pub use error::{ApplicationError, ApplicationResult};
pub use services::{
    PostponementConflict, PostponementReport, PostponementService, TreeEditService, VersionService,
};
