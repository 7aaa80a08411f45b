//! Error types for comments-tree

use crate::types::NodeId;
use thiserror::Error;

/// Main error type for comments-tree
#[derive(Debug, Error)]
pub enum TreeError {
    /// Insertion below the configured thread level
    #[error("Max thread level reached for comment {node} (depth {depth}, max {max_level})")]
    MaxThreadLevelExceeded {
        node: NodeId,
        depth: usize,
        max_level: usize,
    },

    /// Path truncation outside the node's ancestry
    #[error("Invalid depth {target} for path of depth {depth}")]
    InvalidDepth { depth: usize, target: usize },

    /// Malformed materialized path or segment
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Sibling ordinal does not fit in one path segment
    #[error("Ordinal {0} does not fit in a path segment")]
    PathOverflow(u64),

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// No node stored at a well-formed path
    #[error("No node at path: {0}")]
    PathNotFound(String),

    /// A user raised the same flag on the same comment twice
    #[error("Flag already raised: {0}")]
    DuplicateFlag(String),

    /// No association exists where one is required
    #[error("Association not found: {0}")]
    AssociationNotFound(String),

    /// Uniqueness violation on (content type, object id, site)
    #[error("Association already exists: {0}")]
    AssociationConflict(String),

    /// Malformed `app.model` label
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(String),

    /// Unsupported schema version
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchemaVersion(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TreeError>,
    },
}

impl TreeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TreeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this is a thread-level rejection, looking through context wrappers
    pub fn is_max_thread_level(&self) -> bool {
        match self {
            TreeError::MaxThreadLevelExceeded { .. } => true,
            TreeError::WithContext { source, .. } => source.is_max_thread_level(),
            _ => false,
        }
    }
}

/// Result type alias for comments-tree
pub type Result<T> = std::result::Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TreeError::NodeNotFound(NodeId(7));
        assert_eq!(err.to_string(), "Node not found: 7");

        let err = TreeError::MaxThreadLevelExceeded {
            node: NodeId(3),
            depth: 4,
            max_level: 3,
        };
        assert_eq!(
            err.to_string(),
            "Max thread level reached for comment 3 (depth 4, max 3)"
        );
    }

    #[test]
    fn test_error_with_context() {
        let err = TreeError::MaxThreadLevelExceeded {
            node: NodeId(1),
            depth: 2,
            max_level: 1,
        };
        let err = err.with_context("Failed to post reply");
        assert!(err.to_string().contains("Failed to post reply"));
        assert!(err.is_max_thread_level());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TreeError = io_err.into();
        assert!(matches!(err, TreeError::Io(_)));
    }
}
