//! Tree state shared by store implementations
//!
//! `TreeState` owns every node and association plus the derived indexes
//! (path index, association key index). Each method is one transaction: it
//! either applies completely or returns an error before mutating anything.

use crate::comment::{Association, CommentFlag, CommentPayload, FlagRecord, TreeNode};
use crate::error::{Result, TreeError};
use crate::path::NodePath;
use crate::types::{ContentKey, ContentType, NodeId, SiteId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Nodes, associations and their indexes
#[derive(Debug, Clone, Default)]
pub struct TreeState {
    /// All nodes by ID
    nodes: HashMap<NodeId, TreeNode>,
    /// Sorted path index, the basis of all prefix range scans
    by_path: BTreeMap<NodePath, NodeId>,
    /// All associations
    associations: Vec<Association>,
    /// Unique index over (content key, site)
    by_key: HashMap<(ContentKey, SiteId), usize>,
    /// Index by root node
    by_root: HashMap<NodeId, usize>,
    /// Flags raised on comments, in the order they were raised
    flags: Vec<FlagRecord>,
    /// Next surrogate key
    next_id: u64,
    /// Next top-level ordinal; never decremented
    next_root_ordinal: u64,
}

impl TreeState {
    /// Create an empty state
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Result<TreeNode> {
        self.nodes.get(&id).cloned().ok_or(TreeError::NodeNotFound(id))
    }

    /// Get a node by path
    pub fn get_by_path(&self, path: &NodePath) -> Result<TreeNode> {
        self.by_path
            .get(path)
            .and_then(|id| self.nodes.get(id))
            .cloned()
            .ok_or_else(|| TreeError::PathNotFound(path.to_string()))
    }

    /// Create a top-level node with a fresh ordinal
    pub fn create_root(&mut self) -> Result<TreeNode> {
        let path = NodePath::root(self.next_root_ordinal)?;
        let node = TreeNode::new(self.allocate_id(), path, CommentPayload::placeholder());

        self.next_root_ordinal += 1;
        self.insert_node(node.clone());
        Ok(node)
    }

    /// Insert a child under `parent`, taking the parent's child count as the
    /// new sibling ordinal and incrementing it
    pub fn insert_child(&mut self, parent: NodeId, payload: CommentPayload) -> Result<TreeNode> {
        let parent_node = self.nodes.get(&parent).ok_or(TreeError::NodeNotFound(parent))?;
        let path = parent_node.path.child(parent_node.numchild as u64)?;

        if self.by_path.contains_key(&path) {
            return Err(TreeError::InvalidPath(format!(
                "path {} is already taken",
                path
            )));
        }

        let node = TreeNode::new(self.allocate_id(), path, payload);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.numchild += 1;
        }
        self.insert_node(node.clone());
        Ok(node)
    }

    /// Direct children, ordered by submission time then path
    pub fn children(&self, path: &NodePath) -> Vec<TreeNode> {
        let depth = path.depth() + 1;
        let mut children: Vec<TreeNode> = self
            .scan_prefix(path)
            .filter(|node| node.depth == depth)
            .cloned()
            .collect();
        children.sort_by(|a, b| {
            a.payload
                .submit_date
                .cmp(&b.payload.submit_date)
                .then_with(|| a.path.cmp(&b.path))
        });
        children
    }

    /// All strict descendants in path order
    pub fn descendants(&self, path: &NodePath) -> Vec<TreeNode> {
        self.scan_prefix(path).cloned().collect()
    }

    pub fn descendant_count(&self, path: &NodePath) -> usize {
        self.scan_prefix(path).count()
    }

    pub fn children_count(&self, path: &NodePath) -> usize {
        let depth = path.depth() + 1;
        self.scan_prefix(path).filter(|n| n.depth == depth).count()
    }

    /// Union of the strict descendant ranges of several prefixes, keeping
    /// nodes at `min_depth` or deeper, deduplicated, in path order
    pub fn nodes_under(&self, prefixes: &[NodePath], min_depth: usize) -> Vec<TreeNode> {
        let mut found: BTreeMap<&NodePath, &TreeNode> = BTreeMap::new();
        for prefix in prefixes {
            for node in self.scan_prefix(prefix) {
                if node.depth >= min_depth {
                    found.insert(&node.path, node);
                }
            }
        }
        found.into_values().cloned().collect()
    }

    /// All nodes matching a predicate, in path order
    pub fn scan(&self, filter: &dyn Fn(&TreeNode) -> bool) -> Vec<TreeNode> {
        self.by_path
            .values()
            .filter_map(|id| self.nodes.get(id))
            .filter(|node| filter(node))
            .cloned()
            .collect()
    }

    /// Look up the association of a content object within a site
    pub fn find_association(&self, key: &ContentKey, site: SiteId) -> Option<Association> {
        self.by_key
            .get(&(key.clone(), site))
            .and_then(|&idx| self.associations.get(idx))
            .filter(|assoc| assoc.matches(key, site))
            .cloned()
    }

    /// Look up the association bound to a root
    pub fn association_for_root(&self, root: NodeId) -> Option<Association> {
        self.by_root
            .get(&root)
            .and_then(|&idx| self.associations.get(idx))
            .cloned()
    }

    /// Associations whose content type is in `types`, optionally within one site
    pub fn associations_matching(
        &self,
        types: &[ContentType],
        site: Option<SiteId>,
    ) -> Vec<Association> {
        self.associations
            .iter()
            .filter(|a| types.contains(a.content_type()))
            .filter(|a| site.map(|s| a.site == s).unwrap_or(true))
            .cloned()
            .collect()
    }

    /// Insert an association, enforcing uniqueness of (content key, site) and
    /// of the bound root
    pub fn insert_association(&mut self, association: Association) -> Result<()> {
        let key = (association.content_key.clone(), association.site);
        if self.by_key.contains_key(&key) {
            return Err(TreeError::AssociationConflict(format!(
                "{} on site {}",
                association.content_key, association.site
            )));
        }
        if self.by_root.contains_key(&association.root) {
            return Err(TreeError::AssociationConflict(format!(
                "root {} is already bound",
                association.root
            )));
        }

        let root = self
            .nodes
            .get(&association.root)
            .ok_or(TreeError::NodeNotFound(association.root))?;
        if !root.is_root() {
            return Err(TreeError::Validation(format!(
                "node {} is not a root",
                association.root
            )));
        }

        let idx = self.associations.len();
        self.by_root.insert(association.root, idx);
        self.by_key.insert(key, idx);
        self.associations.push(association);
        Ok(())
    }

    /// Remove a root that never got an association or children
    pub fn discard_root(&mut self, id: NodeId) -> Result<()> {
        let node = self.nodes.get(&id).ok_or(TreeError::NodeNotFound(id))?;
        if !node.is_root() || node.numchild > 0 || self.by_root.contains_key(&id) {
            return Err(TreeError::Validation(format!(
                "node {} is not an unused root",
                id
            )));
        }

        let path = node.path.clone();
        self.by_path.remove(&path);
        self.nodes.remove(&id);
        Ok(())
    }

    /// Record a flag, rejecting a second identical (node, user, flag)
    pub fn add_flag(&mut self, record: FlagRecord) -> Result<()> {
        if !self.nodes.contains_key(&record.node) {
            return Err(TreeError::NodeNotFound(record.node));
        }
        if record.user.trim().is_empty() {
            return Err(TreeError::Validation(
                "Flag must name the flagging user".to_string(),
            ));
        }
        if self.flags.iter().any(|f| f.same_as(&record)) {
            return Err(TreeError::DuplicateFlag(format!(
                "'{}' by {} on comment {}",
                record.flag, record.user, record.node
            )));
        }

        self.flags.push(record);
        Ok(())
    }

    /// Flags of one kind raised on `node`, oldest first
    pub fn flags_for(&self, node: NodeId, flag: CommentFlag) -> Vec<FlagRecord> {
        self.flags
            .iter()
            .filter(|f| f.node == node && f.flag == flag)
            .cloned()
            .collect()
    }

    /// Set the public flag of one node
    pub fn set_public(&mut self, id: NodeId, is_public: bool) -> Result<TreeNode> {
        self.update(id, |payload| payload.is_public = is_public)
    }

    /// Set the removed flag of one node
    pub fn set_removed(&mut self, id: NodeId, is_removed: bool) -> Result<TreeNode> {
        self.update(id, |payload| payload.is_removed = is_removed)
    }

    /// Replace the text of one node
    pub fn update_comment(
        &mut self,
        id: NodeId,
        comment: String,
        rendered: Option<String>,
    ) -> Result<TreeNode> {
        self.update(id, |payload| payload.update_comment(comment, rendered))
    }

    /// Set the public flag on every direct child of `parent`; returns how
    /// many children changed
    pub fn set_public_for_children(&mut self, parent: NodeId, is_public: bool) -> Result<usize> {
        let path = self
            .nodes
            .get(&parent)
            .map(|n| n.path.clone())
            .ok_or(TreeError::NodeNotFound(parent))?;

        let ids: Vec<NodeId> = self
            .scan_prefix(&path)
            .filter(|n| n.depth == path.depth() + 1 && n.payload.is_public != is_public)
            .map(|n| n.id)
            .collect();

        for id in &ids {
            if let Some(node) = self.nodes.get_mut(id) {
                node.payload.is_public = is_public;
            }
        }
        Ok(ids.len())
    }

    /// Check structural invariants: path/depth agreement, parents present,
    /// child counters matching stored children
    pub fn verify(&self) -> Result<()> {
        for node in self.nodes.values() {
            if node.depth != node.path.depth() {
                return Err(TreeError::InvalidDepth {
                    depth: node.path.depth(),
                    target: node.depth,
                });
            }

            if let Some(parent_path) = node.path.parent() {
                if !self.by_path.contains_key(&parent_path) {
                    return Err(TreeError::InvalidPath(format!(
                        "node {} has no parent at {}",
                        node.id, parent_path
                    )));
                }
            }

            let children = self.children_count(&node.path);
            if children != node.numchild {
                return Err(TreeError::Validation(format!(
                    "node {} counts {} children but has {}",
                    node.id, node.numchild, children
                )));
            }
        }

        for assoc in &self.associations {
            if !self.nodes.get(&assoc.root).map(|n| n.is_root()).unwrap_or(false) {
                return Err(TreeError::AssociationNotFound(format!(
                    "association {} points at missing root {}",
                    assoc.content_key, assoc.root
                )));
            }
        }

        if let Some(orphan) = self.flags.iter().find(|f| !self.nodes.contains_key(&f.node)) {
            return Err(TreeError::NodeNotFound(orphan.node));
        }

        Ok(())
    }

    /// Rebuild derived indexes (after deserialization)
    pub fn rebuild_indexes(&mut self) {
        self.by_path = self
            .nodes
            .values()
            .map(|n| (n.path.clone(), n.id))
            .collect();
        self.by_key.clear();
        self.by_root.clear();
        for (idx, assoc) in self.associations.iter().enumerate() {
            self.by_key
                .insert((assoc.content_key.clone(), assoc.site), idx);
            self.by_root.insert(assoc.root, idx);
        }
    }

    /// Strict descendants of `prefix` in path order, as one range scan
    fn scan_prefix<'a>(&'a self, prefix: &'a NodePath) -> impl Iterator<Item = &'a TreeNode> + 'a {
        self.by_path
            .range(prefix.clone()..)
            .skip_while(move |(path, _)| *path == prefix)
            .take_while(move |(path, _)| path.is_descendant_of(prefix))
            .filter_map(move |(_, id)| self.nodes.get(id))
    }

    fn update(&mut self, id: NodeId, f: impl FnOnce(&mut CommentPayload)) -> Result<TreeNode> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::NodeNotFound(id))?;
        f(&mut node.payload);
        Ok(node.clone())
    }

    fn allocate_id(&mut self) -> NodeId {
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert_node(&mut self, node: TreeNode) {
        self.by_path.insert(node.path.clone(), node.id);
        self.nodes.insert(node.id, node);
    }
}

/// Serialized form: indexes are derived and not stored
#[derive(Serialize, Deserialize)]
struct TreeStateFile {
    next_id: u64,
    next_root_ordinal: u64,
    nodes: Vec<TreeNode>,
    associations: Vec<Association>,
    #[serde(default)]
    flags: Vec<FlagRecord>,
}

impl Serialize for TreeState {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let nodes = self
            .by_path
            .values()
            .filter_map(|id| self.nodes.get(id))
            .cloned()
            .collect();

        TreeStateFile {
            next_id: self.next_id,
            next_root_ordinal: self.next_root_ordinal,
            nodes,
            associations: self.associations.clone(),
            flags: self.flags.clone(),
        }
        .serialize(serializer)
    }
}

// Custom deserialization to rebuild indexes
impl<'de> Deserialize<'de> for TreeState {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let file = TreeStateFile::deserialize(deserializer)?;
        let mut state = Self {
            nodes: file.nodes.into_iter().map(|n| (n.id, n)).collect(),
            associations: file.associations,
            flags: file.flags,
            next_id: file.next_id,
            next_root_ordinal: file.next_root_ordinal,
            ..Default::default()
        };
        state.rebuild_indexes();
        Ok(state)
    }
}
