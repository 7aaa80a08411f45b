//! Shared command context
//!
//! Resolves the configuration file and the tree store every command works on.

use anyhow::{Context, Result};
use ct_core::config::Config;
use ct_core::{ContentKey, ContentType, TreeManager};
use ct_storage::FileSystemStore;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl GlobalOpts {
    /// Configuration file in use: `--config`, else the project default
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(".comments-tree/config.toml"))
    }

    pub fn load_config(&self) -> Result<Config> {
        let path = self.config_path();
        Config::load_or_default(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    /// Store directory: `--data-dir`, then the configured one, then the
    /// platform data directory
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| config.storage.data_dir.clone())
            .unwrap_or_else(FileSystemStore::default_dir)
    }

    /// Open the store and build a manager configured from the config file
    pub fn manager(&self) -> Result<TreeManager> {
        let config = self.load_config()?;
        let data_dir = self.data_dir(&config);
        debug!("Using store in {}", data_dir.display());

        let store = open_store(&data_dir)?;
        Ok(TreeManager::from_config(Arc::new(store), &config))
    }
}

fn open_store(dir: &Path) -> Result<FileSystemStore> {
    FileSystemStore::new(dir)
        .with_context(|| format!("Failed to open tree store in {}", dir.display()))
}

/// Parse an `app.model` label and object id into a content key
pub fn content_key(label: &str, object_id: u64) -> Result<ContentKey> {
    let content_type = ContentType::from_str(label)
        .with_context(|| format!("Invalid content type '{}', expected app.model", label))?;
    Ok(ContentKey::new(content_type, object_id))
}
