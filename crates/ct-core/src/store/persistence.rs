//! Tree storage trait

use super::state::TreeState;
use crate::comment::{Association, CommentFlag, CommentPayload, FlagRecord, TreeNode};
use crate::error::Result;
use crate::path::NodePath;
use crate::types::{ContentKey, ContentType, NodeId, SiteId};

/// Trait for tree storage implementations
///
/// Every method is one storage transaction. Implementations must serialize
/// writers so that ordinal allocation in `insert_child` and the uniqueness
/// check in `insert_association` cannot interleave with another writer.
pub trait TreeStore: Send + Sync {
    /// Load a node by ID
    fn get(&self, id: NodeId) -> Result<TreeNode>;

    /// Load a node by its materialized path
    fn get_by_path(&self, path: &NodePath) -> Result<TreeNode>;

    /// Create a top-level node with a fresh ordinal
    fn create_root(&self) -> Result<TreeNode>;

    /// Insert a child and bump the parent's child counter atomically
    fn insert_child(&self, parent: NodeId, payload: CommentPayload) -> Result<TreeNode>;

    /// Direct children ordered by submission time
    fn children(&self, path: &NodePath) -> Result<Vec<TreeNode>>;

    /// Strict descendants in path order
    fn descendants(&self, path: &NodePath) -> Result<Vec<TreeNode>>;

    fn descendant_count(&self, path: &NodePath) -> Result<usize>;

    fn children_count(&self, path: &NodePath) -> Result<usize>;

    /// Union of descendant ranges at `min_depth` or deeper
    fn nodes_under(&self, prefixes: &[NodePath], min_depth: usize) -> Result<Vec<TreeNode>>;

    /// All nodes matching a predicate
    fn scan(&self, filter: &dyn Fn(&TreeNode) -> bool) -> Result<Vec<TreeNode>>;

    fn find_association(&self, key: &ContentKey, site: SiteId) -> Result<Option<Association>>;

    fn association_for_root(&self, root: NodeId) -> Result<Option<Association>>;

    fn associations_matching(
        &self,
        types: &[ContentType],
        site: Option<SiteId>,
    ) -> Result<Vec<Association>>;

    /// Insert under the (content key, site) uniqueness constraint; fails with
    /// `AssociationConflict` when the key is taken
    fn insert_association(&self, association: Association) -> Result<()>;

    /// Drop a speculative root that lost a creation race
    fn discard_root(&self, id: NodeId) -> Result<()>;

    fn set_public(&self, id: NodeId, is_public: bool) -> Result<TreeNode>;

    fn set_removed(&self, id: NodeId, is_removed: bool) -> Result<TreeNode>;

    fn update_comment(
        &self,
        id: NodeId,
        comment: String,
        rendered: Option<String>,
    ) -> Result<TreeNode>;

    /// Bulk visibility update over the direct children of `parent`
    fn set_public_for_children(&self, parent: NodeId, is_public: bool) -> Result<usize>;

    /// Record a flag; fails with `DuplicateFlag` when the same user already
    /// raised it on the same node
    fn add_flag(&self, record: FlagRecord) -> Result<()>;

    fn flags_for(&self, node: NodeId, flag: CommentFlag) -> Result<Vec<FlagRecord>>;

    /// Copy of the full state
    fn snapshot(&self) -> Result<TreeState>;
}
