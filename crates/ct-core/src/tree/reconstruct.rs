//! Tree reconstruction
//!
//! Two shapes are produced from stored nodes: a nested structure built by
//! walking children level by level, and a flat list whose parent links are
//! derived from the materialized paths of a single descendant query.

use super::manager::TreeManager;
use crate::comment::TreeNode;
use crate::error::Result;
use crate::path::NodePath;
use crate::types::{ContentKey, NodeId, SiteId, TimeWindow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// A comment with its replies
#[derive(Debug, Clone, Serialize)]
pub struct NestedComment {
    pub comment: TreeNode,
    pub children: Vec<NestedComment>,
}

impl NestedComment {
    /// Number of comments in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(NestedComment::count).sum::<usize>()
    }
}

/// A comment in a flat reconstruction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconstructedNode {
    pub id: NodeId,
    pub comment: String,
    pub rendered_comment: Option<String>,
    pub user_name: String,
    pub submit_date: DateTime<Utc>,
    pub is_public: bool,
    pub is_removed: bool,
    /// Parent within the input set; `None` for top-level comments and for
    /// comments whose parent was filtered out
    pub parent_id: Option<NodeId>,
    /// Depth relative to the root
    pub level: usize,
    pub children: Vec<NodeId>,
}

/// Flat reconstruction result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatTree {
    pub comments: Vec<ReconstructedNode>,
}

impl FlatTree {
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn find(&self, id: NodeId) -> Option<&ReconstructedNode> {
        self.comments.iter().find(|c| c.id == id)
    }
}

/// Rebuild parent and children links of a flat node set from paths alone
///
/// Roots are left out. Output keeps input order, and children lists follow
/// input order too.
pub fn flat_structured_tree(nodes: &[TreeNode]) -> FlatTree {
    let index: HashMap<&NodePath, NodeId> = nodes
        .iter()
        .filter(|n| !n.is_root())
        .map(|n| (&n.path, n.id))
        .collect();

    let parent_of = |node: &TreeNode| -> Option<NodeId> {
        node.path
            .parent()
            .and_then(|parent| index.get(&parent).copied())
    };

    let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for node in nodes.iter().filter(|n| !n.is_root()) {
        if let Some(parent) = parent_of(node) {
            children.entry(parent).or_default().push(node.id);
        }
    }

    let comments = nodes
        .iter()
        .filter(|n| !n.is_root())
        .map(|node| ReconstructedNode {
            id: node.id,
            comment: node.payload.comment.clone(),
            rendered_comment: node.payload.rendered_comment.clone(),
            user_name: node.payload.user_name.clone(),
            submit_date: node.payload.submit_date,
            is_public: node.payload.is_public,
            is_removed: node.payload.is_removed,
            parent_id: parent_of(node),
            level: node.depth - 1,
            children: children.remove(&node.id).unwrap_or_default(),
        })
        .collect();

    FlatTree { comments }
}

impl TreeManager {
    /// Nested replies under `root`, one children query per node
    ///
    /// With `filter_public`, only visible comments are kept. With a time
    /// window, comments last updated outside it are dropped along with their
    /// replies.
    pub fn nested_tree(
        &self,
        root: &TreeNode,
        filter_public: bool,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<NestedComment>> {
        let mut out = Vec::new();
        for child in self.store.children(&root.path)? {
            if filter_public && !child.payload.is_visible() {
                continue;
            }
            if let Some(window) = window {
                if !window.contains(&child.payload.updated_on) {
                    continue;
                }
            }
            let children = self.nested_tree(&child, filter_public, window)?;
            out.push(NestedComment {
                comment: child,
                children,
            });
        }
        Ok(out)
    }

    /// Flat reconstruction of everything under `root`
    pub fn flat_tree_for(&self, root: &TreeNode, filter_public: bool) -> Result<FlatTree> {
        let nodes: Vec<TreeNode> = self
            .store
            .descendants(&root.path)?
            .into_iter()
            .filter(|n| !filter_public || n.payload.is_visible())
            .collect();
        Ok(flat_structured_tree(&nodes))
    }

    /// Public nested tree of a content object, creating its root on demand
    pub fn tree_for_object(
        &self,
        key: &ContentKey,
        site: Option<SiteId>,
    ) -> Result<Vec<NestedComment>> {
        let root = self.get_or_create_root(key, site)?;
        self.nested_tree(&root, true, None)
    }
}
