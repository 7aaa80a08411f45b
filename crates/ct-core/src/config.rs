//! Configuration management for comments-tree

use crate::error::{Result, TreeError};
use crate::types::SiteId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Thread level settings
    pub threads: ThreadConfig,
    /// Site scope settings
    pub site: SiteConfig,
    /// Comment content settings
    pub comments: CommentConfig,
    /// Storage settings
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| TreeError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = self.to_toml()?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TreeError::Toml(e.to_string()))
    }

    /// Check override labels and limits
    pub fn validate(&self) -> Result<()> {
        for label in self.threads.max_thread_level_by_app_model.keys() {
            let valid = label
                .split_once('.')
                .map(|(app, model)| !app.is_empty() && !model.is_empty() && !model.contains('.'))
                .unwrap_or(false);
            if !valid {
                return Err(TreeError::Config(format!(
                    "thread level override '{}' is not of the form app.model",
                    label
                )));
            }
        }

        if self.comments.max_comment_length == 0 {
            return Err(TreeError::Config(
                "max_comment_length must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Thread depth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
    /// Global maximum thread level
    pub max_thread_level: usize,
    /// Per content type overrides, keyed by `app.model`
    pub max_thread_level_by_app_model: HashMap<String, usize>,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            max_thread_level: 3,
            max_thread_level_by_app_model: HashMap::new(),
        }
    }
}

/// Site scope configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site used when the caller passes none
    pub site_id: SiteId,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_id: SiteId::default(),
        }
    }
}

/// Comment content configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Maximum comment content length
    pub max_comment_length: usize,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            max_comment_length: crate::comment::validator::MAX_COMMENT_LENGTH,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the tree store; platform data dir when unset
    pub data_dir: Option<PathBuf>,
}
