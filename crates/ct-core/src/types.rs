//! Core type definitions for comments-tree

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Surrogate key of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Get the raw value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(NodeId)
            .map_err(|_| TreeError::Validation(format!("Invalid node ID: {}", s)))
    }
}

/// Identifier of a site scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub u32);

impl Default for SiteId {
    fn default() -> Self {
        SiteId(1)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content type of a commented object, addressed as `app_label.model`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentType {
    pub app_label: String,
    pub model: String,
}

impl ContentType {
    /// Create a content type, lower-casing both parts
    pub fn new(app_label: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into().to_lowercase(),
            model: model.into().to_lowercase(),
        }
    }

    /// The `app_label.model` form used by policy overrides
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.model)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model)
    }
}

impl FromStr for ContentType {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('.') {
            Some((app, model))
                if !app.is_empty() && !model.is_empty() && !model.contains('.') =>
            {
                Ok(ContentType::new(app, model))
            }
            _ => Err(TreeError::InvalidContentType(s.to_string())),
        }
    }
}

/// External content object key: a content type plus the object's id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentKey {
    pub content_type: ContentType,
    pub object_id: u64,
}

impl ContentKey {
    pub fn new(content_type: ContentType, object_id: u64) -> Self {
        Self {
            content_type,
            object_id,
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.content_type, self.object_id)
    }
}

/// Half-open range over `updated_on` used to bound tree reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Inclusive lower bound
    pub start: chrono::DateTime<chrono::Utc>,
    /// Exclusive upper bound
    pub end: chrono::DateTime<chrono::Utc>,
}

impl TimeWindow {
    pub fn new(start: chrono::DateTime<chrono::Utc>, end: chrono::DateTime<chrono::Utc>) -> Self {
        Self { start, end }
    }

    /// Check whether a timestamp falls inside the window
    pub fn contains(&self, at: &chrono::DateTime<chrono::Utc>) -> bool {
        *at >= self.start && *at < self.end
    }
}

/// Free-form comment payload fields
/// Stores arbitrary JSON values for forward compatibility
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extensions {
    #[serde(flatten)]
    pub data: HashMap<String, serde_json::Value>,
}

impl Extensions {
    /// Create empty extensions
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if extensions is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Get a typed value by key
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value by key
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.data.insert(key.into(), v);
        }
    }

    /// Remove a value by key
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }
}
