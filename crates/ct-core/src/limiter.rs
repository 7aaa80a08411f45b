//! Thread level policy

use crate::config::ThreadConfig;
use crate::error::{Result, TreeError};
use crate::types::{ContentType, NodeId};
use std::collections::HashMap;

/// Maximum thread depth, globally and per content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadLevelPolicy {
    default_max: usize,
    overrides: HashMap<String, usize>,
}

impl ThreadLevelPolicy {
    pub fn new(default_max: usize) -> Self {
        Self {
            default_max,
            overrides: HashMap::new(),
        }
    }

    /// Add a per content type override
    pub fn with_override(mut self, content_type: &ContentType, max_level: usize) -> Self {
        self.overrides.insert(content_type.label(), max_level);
        self
    }

    /// The global limit
    pub fn global_max(&self) -> usize {
        self.default_max
    }

    /// Limit for a content type: its override, else the global limit
    pub fn max_level_for(&self, content_type: &ContentType) -> usize {
        self.overrides
            .get(&content_type.label())
            .copied()
            .unwrap_or(self.default_max)
    }

    /// Reject insertion under a parent deeper than the global limit
    pub fn check_global(&self, parent: NodeId, parent_depth: usize) -> Result<()> {
        Self::check_level(parent, parent_depth, self.default_max)
    }

    /// Reject insertion under a parent deeper than the content type's limit
    pub fn check(
        &self,
        parent: NodeId,
        parent_depth: usize,
        content_type: &ContentType,
    ) -> Result<()> {
        Self::check_level(parent, parent_depth, self.max_level_for(content_type))
    }

    /// Whether a node at `depth` still accepts replies
    pub fn allows_thread(&self, depth: usize, content_type: Option<&ContentType>) -> bool {
        let max_level = match content_type {
            Some(ct) => self.max_level_for(ct),
            None => self.default_max,
        };
        depth < max_level
    }

    fn check_level(parent: NodeId, parent_depth: usize, max_level: usize) -> Result<()> {
        if parent_depth > max_level {
            return Err(TreeError::MaxThreadLevelExceeded {
                node: parent,
                depth: parent_depth,
                max_level,
            });
        }
        Ok(())
    }
}

impl Default for ThreadLevelPolicy {
    fn default() -> Self {
        Self::from(&ThreadConfig::default())
    }
}

impl From<&ThreadConfig> for ThreadLevelPolicy {
    fn from(config: &ThreadConfig) -> Self {
        Self {
            default_max: config.max_thread_level,
            overrides: config
                .max_thread_level_by_app_model
                .iter()
                .map(|(label, level)| (label.to_lowercase(), *level))
                .collect(),
        }
    }
}
