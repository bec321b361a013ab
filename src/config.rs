//! Configuration
//!
//! Layered with the `config` crate. Precedence: defaults (lowest) -> optional
//! config file -> `NODEDB_*` environment variables (highest, `__` separates
//! nested keys, e.g. `NODEDB_LOGGING__LEVEL=debug`).

use crate::lifecycle::StartOptions;
use crate::logging::LoggingConfig;
use ::config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Snapshot file; absent selects in-memory mode.
    #[serde(alias = "saveFile", alias = "savefile")]
    pub save_file: Option<PathBuf>,

    pub logging: LoggingConfig,
}

impl StoreConfig {
    /// Options consumed by `StoreSession::start`.
    pub fn start_options(&self) -> StartOptions {
        StartOptions {
            save_file: self.save_file.clone(),
        }
    }
}

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from defaults and environment only.
    pub fn load() -> Result<StoreConfig, ConfigError> {
        Self::build(None)
    }

    /// Load a specific file (TOML, JSON, ...) with the environment overlay.
    pub fn load_from_file(path: &Path) -> Result<StoreConfig, ConfigError> {
        Self::build(Some(path))
    }

    fn build(path: Option<&Path>) -> Result<StoreConfig, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let builder = builder.add_source(
            Environment::with_prefix("NODEDB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
