//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/cursus/cursus.toml`
//! 3. Environment variables: `CURSUS_*` prefix

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Unified configuration for cursus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding tree documents and year records (default: ./cursus-store)
    pub store_dir: PathBuf,
    /// How many years past the current one a postponement may reach
    pub max_postpone_years: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("cursus-store"),
            max_postpone_years: 6,
        }
    }
}

/// Get the XDG config directory for cursus.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cursus").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("cursus.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    pub fn load() -> Result<Self, ApplicationError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default(
                "store_dir",
                defaults.store_dir.to_string_lossy().to_string(),
            )
            .map_err(config_err)?
            .set_default("max_postpone_years", i64::from(defaults.max_postpone_years))
            .map_err(config_err)?;

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        builder = builder.add_source(Environment::with_prefix("CURSUS").separator("__"));

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
