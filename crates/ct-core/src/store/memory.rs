//! In-memory tree storage

use super::persistence::TreeStore;
use super::state::TreeState;
use crate::comment::{Association, CommentFlag, CommentPayload, FlagRecord, TreeNode};
use crate::error::Result;
use crate::path::NodePath;
use crate::types::{ContentKey, ContentType, NodeId, SiteId};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Tree storage held in process memory
pub struct MemoryStore {
    state: RwLock<TreeState>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::from_state(TreeState::new())
    }

    /// Wrap an existing state
    pub fn from_state(state: TreeState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TreeState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, TreeState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore for MemoryStore {
    fn get(&self, id: NodeId) -> Result<TreeNode> {
        self.read().get(id)
    }

    fn get_by_path(&self, path: &NodePath) -> Result<TreeNode> {
        self.read().get_by_path(path)
    }

    fn create_root(&self) -> Result<TreeNode> {
        self.write().create_root()
    }

    fn insert_child(&self, parent: NodeId, payload: CommentPayload) -> Result<TreeNode> {
        self.write().insert_child(parent, payload)
    }

    fn children(&self, path: &NodePath) -> Result<Vec<TreeNode>> {
        Ok(self.read().children(path))
    }

    fn descendants(&self, path: &NodePath) -> Result<Vec<TreeNode>> {
        Ok(self.read().descendants(path))
    }

    fn descendant_count(&self, path: &NodePath) -> Result<usize> {
        Ok(self.read().descendant_count(path))
    }

    fn children_count(&self, path: &NodePath) -> Result<usize> {
        Ok(self.read().children_count(path))
    }

    fn nodes_under(&self, prefixes: &[NodePath], min_depth: usize) -> Result<Vec<TreeNode>> {
        Ok(self.read().nodes_under(prefixes, min_depth))
    }

    fn scan(&self, filter: &dyn Fn(&TreeNode) -> bool) -> Result<Vec<TreeNode>> {
        Ok(self.read().scan(filter))
    }

    fn find_association(&self, key: &ContentKey, site: SiteId) -> Result<Option<Association>> {
        Ok(self.read().find_association(key, site))
    }

    fn association_for_root(&self, root: NodeId) -> Result<Option<Association>> {
        Ok(self.read().association_for_root(root))
    }

    fn associations_matching(
        &self,
        types: &[ContentType],
        site: Option<SiteId>,
    ) -> Result<Vec<Association>> {
        Ok(self.read().associations_matching(types, site))
    }

    fn insert_association(&self, association: Association) -> Result<()> {
        self.write().insert_association(association)
    }

    fn discard_root(&self, id: NodeId) -> Result<()> {
        self.write().discard_root(id)
    }

    fn set_public(&self, id: NodeId, is_public: bool) -> Result<TreeNode> {
        self.write().set_public(id, is_public)
    }

    fn set_removed(&self, id: NodeId, is_removed: bool) -> Result<TreeNode> {
        self.write().set_removed(id, is_removed)
    }

    fn update_comment(
        &self,
        id: NodeId,
        comment: String,
        rendered: Option<String>,
    ) -> Result<TreeNode> {
        self.write().update_comment(id, comment, rendered)
    }

    fn set_public_for_children(&self, parent: NodeId, is_public: bool) -> Result<usize> {
        self.write().set_public_for_children(parent, is_public)
    }

    fn add_flag(&self, record: FlagRecord) -> Result<()> {
        self.write().add_flag(record)
    }

    fn flags_for(&self, node: NodeId, flag: CommentFlag) -> Result<Vec<FlagRecord>> {
        Ok(self.read().flags_for(node, flag))
    }

    fn snapshot(&self) -> Result<TreeState> {
        Ok(self.read().clone())
    }
}
