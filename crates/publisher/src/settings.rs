//! Layered configuration: defaults < config file < environment

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use marketplace_core::application::RetryConfig;
use marketplace_infra_storage::LocalStorageConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "marketplace";
pub const DEFAULT_DB_PATH: &str = "~/.marketplace/meta.db";
pub const ENV_PREFIX: &str = "MARKETPLACE";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub storage: LocalStorageConfig,
    pub retry: RetryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DB_PATH.to_string(),
            storage: LocalStorageConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (or an optional `marketplace.{toml,yaml,json}`
    /// in the working directory) overridden by `MARKETPLACE__*` variables,
    /// e.g. `MARKETPLACE__RETRY__MAX_ATTEMPTS=5`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("storage.external_resource_types"),
        );

        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        Ok(settings.expanded())
    }

    /// Expand `~` in filesystem paths
    fn expanded(mut self) -> Self {
        self.database_url = shellexpand::tilde(&self.database_url).into_owned();
        if let Some(root) = self.storage.root.take() {
            let expanded = shellexpand::tilde(&root.to_string_lossy()).into_owned();
            self.storage.root = Some(PathBuf::from(expanded));
        }
        self
    }
}
