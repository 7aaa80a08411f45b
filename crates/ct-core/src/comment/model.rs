//! Comment tree data models

use crate::path::NodePath;
use crate::types::{ContentKey, ContentType, Extensions, NodeId, SiteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A node of a comment tree: either a comment or the root placeholder of one
/// content object's thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Stable surrogate key
    pub id: NodeId,
    /// Materialized path, root-inclusive
    pub path: NodePath,
    /// Tree level (1 = root)
    pub depth: usize,
    /// Number of direct children, maintained on insert
    pub numchild: usize,
    /// Comment content and visibility
    pub payload: CommentPayload,
    /// Association of this node's tree, resolved on first use
    #[serde(skip)]
    association: OnceLock<Association>,
}

impl TreeNode {
    /// Create a node; stores use this when inserting
    pub fn new(id: NodeId, path: NodePath, payload: CommentPayload) -> Self {
        let depth = path.depth();
        Self {
            id,
            path,
            depth,
            numchild: 0,
            payload,
            association: OnceLock::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.depth == 1
    }

    pub fn is_public(&self) -> bool {
        self.payload.is_public
    }

    pub fn is_removed(&self) -> bool {
        self.payload.is_removed
    }

    pub fn submit_date(&self) -> DateTime<Utc> {
        self.payload.submit_date
    }

    pub fn comment(&self) -> &str {
        &self.payload.comment
    }

    /// Path of this node's parent, `None` for roots
    pub fn parent_path(&self) -> Option<NodePath> {
        self.path.parent()
    }

    /// Association cached on this instance, if it was resolved already
    pub fn cached_association(&self) -> Option<&Association> {
        self.association.get()
    }

    /// Cache the association for this instance; a second call is ignored
    pub(crate) fn cache_association(&self, association: Association) {
        let _ = self.association.set(association);
    }

    /// Content type, if the association has been resolved on this instance
    pub fn cached_content_type(&self) -> Option<&ContentType> {
        self.cached_association().map(|a| &a.content_key.content_type)
    }
}

/// Comment content, author details and visibility flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentPayload {
    /// Raw comment text
    pub comment: String,
    /// Output of the external rendering pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_comment: Option<String>,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Notify the author of follow-up comments
    #[serde(default)]
    pub followup: bool,
    pub is_public: bool,
    pub is_removed: bool,
    pub submit_date: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    /// Free-form payload fields
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl CommentPayload {
    /// Payload of a root placeholder: no text, public, stamped now
    pub fn placeholder() -> Self {
        let now = Utc::now();
        Self {
            comment: String::new(),
            rendered_comment: None,
            user_name: String::new(),
            user_email: String::new(),
            user_url: String::new(),
            ip_address: None,
            followup: false,
            is_public: true,
            is_removed: false,
            submit_date: now,
            updated_on: now,
            extensions: Extensions::new(),
        }
    }

    /// Replace the text and refresh `updated_on`
    pub fn update_comment(&mut self, comment: impl Into<String>, rendered: Option<String>) {
        self.comment = comment.into();
        self.rendered_comment = rendered;
        self.updated_on = Utc::now();
    }

    /// Visible in public listings
    pub fn is_visible(&self) -> bool {
        self.is_public && !self.is_removed
    }
}

impl Default for CommentPayload {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Binding between one content object within one site and its tree root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub content_key: ContentKey,
    pub site: SiteId,
    pub root: NodeId,
    pub created_at: DateTime<Utc>,
}

impl Association {
    pub fn new(content_key: ContentKey, site: SiteId, root: NodeId) -> Self {
        Self {
            content_key,
            site,
            root,
            created_at: Utc::now(),
        }
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_key.content_type
    }

    /// Whether this association binds the given object within the given site
    pub fn matches(&self, content_key: &ContentKey, site: SiteId) -> bool {
        self.site == site && &self.content_key == content_key
    }
}

/// Flags that can be raised on a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentFlag {
    /// A user suggests the comment for removal
    SuggestRemoval,
    /// A moderator removed the comment
    ModeratorDeletion,
    /// A moderator approved the comment
    ModeratorApproval,
    Like,
    Dislike,
}

impl CommentFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentFlag::SuggestRemoval => "removal suggestion",
            CommentFlag::ModeratorDeletion => "moderator deletion",
            CommentFlag::ModeratorApproval => "moderator approval",
            CommentFlag::Like => "I liked it",
            CommentFlag::Dislike => "I disliked it",
        }
    }

    /// Parse from the stored flag string or a short alias
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "removal suggestion" | "suggest-removal" => Some(CommentFlag::SuggestRemoval),
            "moderator deletion" | "delete" => Some(CommentFlag::ModeratorDeletion),
            "moderator approval" | "approve" => Some(CommentFlag::ModeratorApproval),
            "I liked it" | "like" => Some(CommentFlag::Like),
            "I disliked it" | "dislike" => Some(CommentFlag::Dislike),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommentFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A flag raised by one user on one comment
///
/// Unique per (node, user, flag).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagRecord {
    pub node: NodeId,
    pub user: String,
    pub flag: CommentFlag,
    pub flag_date: DateTime<Utc>,
}

impl FlagRecord {
    pub fn new(node: NodeId, user: impl Into<String>, flag: CommentFlag) -> Self {
        Self {
            node,
            user: user.into(),
            flag,
            flag_date: Utc::now(),
        }
    }

    /// Whether this record is the same (node, user, flag) triple as `other`
    pub fn same_as(&self, other: &FlagRecord) -> bool {
        self.node == other.node && self.flag == other.flag && self.user == other.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_node(path: &str) -> TreeNode {
        TreeNode::new(
            NodeId(1),
            NodePath::parse(path).unwrap(),
            CommentPayload::placeholder(),
        )
    }

    #[test]
    fn test_node_depth_follows_path() {
        let node = create_test_node("000100020003");
        assert_eq!(node.depth, 3);
        assert!(!node.is_root());
        assert_eq!(node.parent_path().unwrap().as_str(), "00010002");

        let root = create_test_node("0001");
        assert!(root.is_root());
        assert!(root.parent_path().is_none());
    }

    #[test]
    fn test_association_cache() {
        let node = create_test_node("0001");
        assert!(node.cached_association().is_none());

        let key = ContentKey::new(ContentType::new("blog", "article"), 42);
        node.cache_association(Association::new(key.clone(), SiteId(1), NodeId(1)));
        assert_eq!(node.cached_content_type(), Some(&key.content_type));

        // Only the first value sticks
        let other = ContentKey::new(ContentType::new("blog", "diary"), 1);
        node.cache_association(Association::new(other, SiteId(1), NodeId(1)));
        assert_eq!(node.cached_content_type(), Some(&key.content_type));
    }

    #[test]
    fn test_cache_not_serialized() {
        let node = create_test_node("0001");
        let key = ContentKey::new(ContentType::new("blog", "article"), 42);
        node.cache_association(Association::new(key, SiteId(1), NodeId(1)));

        let json = serde_json::to_string(&node).unwrap();
        let reloaded: TreeNode = serde_json::from_str(&json).unwrap();
        assert!(reloaded.cached_association().is_none());
        assert_eq!(reloaded.path, node.path);
    }

    #[test]
    fn test_payload_update() {
        let mut payload = CommentPayload::placeholder();
        let before = payload.updated_on;
        std::thread::sleep(std::time::Duration::from_millis(10));
        payload.update_comment("edited", Some("<p>edited</p>".to_string()));
        assert_eq!(payload.comment, "edited");
        assert!(payload.updated_on > before);
    }

    #[test]
    fn test_payload_visibility() {
        let mut payload = CommentPayload::placeholder();
        assert!(payload.is_visible());
        payload.is_removed = true;
        assert!(!payload.is_visible());
    }

    #[test]
    fn test_association_matches() {
        let key = ContentKey::new(ContentType::new("blog", "article"), 42);
        let assoc = Association::new(key.clone(), SiteId(1), NodeId(9));
        assert!(assoc.matches(&key, SiteId(1)));
        assert!(!assoc.matches(&key, SiteId(2)));
        assert_eq!(assoc.content_type().label(), "blog.article");
    }

    #[test]
    fn test_flag_strings() {
        assert_eq!(CommentFlag::ModeratorDeletion.as_str(), "moderator deletion");
        assert_eq!(
            CommentFlag::from_str_opt("delete"),
            Some(CommentFlag::ModeratorDeletion)
        );
        assert_eq!(CommentFlag::from_str_opt("I liked it"), Some(CommentFlag::Like));
        assert_eq!(CommentFlag::from_str_opt("nope"), None);
    }
}
