//! Curriculum program-tree toolkit.
//!
//! Layered the usual way: `domain` holds the tree model and business
//! rules, `application` the use-case services, `infrastructure` the
//! TOML-backed stores, `cli` the binary surface.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
