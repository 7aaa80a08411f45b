//! Tree manager: node lifecycle and depth-limited insertion

use crate::comment::{CommentPayload, CommentValidator, TreeNode};
use crate::config::Config;
use crate::error::Result;
use crate::limiter::ThreadLevelPolicy;
use crate::store::TreeStore;
use crate::types::{NodeId, SiteId};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Entry point of the comment tree engine
///
/// Owns the storage backend and the injected thread level policy. Shareable
/// between request threads behind an `Arc`.
pub struct TreeManager {
    /// Storage backend
    pub(super) store: Arc<dyn TreeStore>,
    /// Thread level policy, replaceable at runtime
    policy: RwLock<ThreadLevelPolicy>,
    /// Comment content validation
    validator: CommentValidator,
    /// Site used when the caller passes none
    pub(super) default_site: SiteId,
}

impl TreeManager {
    /// Create a new tree manager with the given storage
    pub fn new(store: impl TreeStore + 'static) -> Self {
        Self::with_storage(Arc::new(store))
    }

    /// Create a new tree manager with shared storage
    pub fn with_storage(store: Arc<dyn TreeStore>) -> Self {
        Self {
            store,
            policy: RwLock::new(ThreadLevelPolicy::default()),
            validator: CommentValidator::new(),
            default_site: SiteId::default(),
        }
    }

    /// Create a tree manager configured from `config`
    pub fn from_config(store: Arc<dyn TreeStore>, config: &Config) -> Self {
        Self {
            store,
            policy: RwLock::new(ThreadLevelPolicy::from(&config.threads)),
            validator: CommentValidator::with_max_length(config.comments.max_comment_length),
            default_site: config.site.site_id,
        }
    }

    /// Replace the thread level policy
    pub fn with_policy(self, policy: ThreadLevelPolicy) -> Self {
        self.set_policy(policy);
        self
    }

    /// Set the site used when the caller passes none
    pub fn with_default_site(mut self, site: SiteId) -> Self {
        self.default_site = site;
        self
    }

    /// Swap the policy in place; later insertions use the new limits
    pub fn set_policy(&self, policy: ThreadLevelPolicy) {
        let mut current = self.policy.write().unwrap_or_else(|e| e.into_inner());
        *current = policy;
    }

    /// Snapshot of the current policy
    pub fn policy(&self) -> ThreadLevelPolicy {
        self.policy
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn default_site(&self) -> SiteId {
        self.default_site
    }

    /// Storage backend
    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    /// Load a node by ID
    pub fn get(&self, id: NodeId) -> Result<TreeNode> {
        self.store.get(id)
    }

    /// Reload a node from storage, dropping its cached association
    pub fn refresh(&self, node: &TreeNode) -> Result<TreeNode> {
        self.store.get(node.id)
    }

    /// Create a bare root with no association
    pub fn add_root(&self) -> Result<TreeNode> {
        let root = self.store.create_root()?;
        debug!("Created root {} at {}", root.id, root.path);
        Ok(root)
    }

    /// Insert a comment under `parent`
    ///
    /// The global limit is checked first, then the content type's limit when
    /// the parent's tree has an association. Both checks run before anything
    /// is written, so a rejected insertion leaves no trace in storage.
    pub fn add_child(&self, parent: &TreeNode, payload: CommentPayload) -> Result<TreeNode> {
        self.validator.validate(&payload)?;

        let policy = self.policy();
        if let Err(e) = policy.check_global(parent.id, parent.depth) {
            warn!("Rejected reply to {}: {}", parent.id, e);
            return Err(e);
        }

        let association = self.try_association_of(parent)?;
        if let Some(assoc) = &association {
            if let Err(e) = policy.check(parent.id, parent.depth, assoc.content_type()) {
                warn!(
                    "Rejected reply to {} under {}: {}",
                    parent.id,
                    assoc.content_type(),
                    e
                );
                return Err(e);
            }
        }

        let child = self.store.insert_child(parent.id, payload)?;
        if let Some(assoc) = association {
            child.cache_association(assoc);
        }

        debug!(
            "Inserted comment {} at {} (depth {})",
            child.id, child.path, child.depth
        );
        Ok(child)
    }

    /// Direct children ordered by submission time
    pub fn children_of(&self, node: &TreeNode) -> Result<Vec<TreeNode>> {
        self.store.children(&node.path)
    }

    /// All descendants in path order
    pub fn descendants_of(&self, node: &TreeNode) -> Result<Vec<TreeNode>> {
        self.store.descendants(&node.path)
    }

    /// Number of descendants, regardless of visibility
    pub fn descendant_count(&self, node: &TreeNode) -> Result<usize> {
        self.store.descendant_count(&node.path)
    }

    pub fn children_count(&self, node: &TreeNode) -> Result<usize> {
        self.store.children_count(&node.path)
    }

    pub fn set_public(&self, id: NodeId, is_public: bool) -> Result<TreeNode> {
        self.store.set_public(id, is_public)
    }

    /// Soft-remove or restore a comment
    pub fn set_removed(&self, id: NodeId, is_removed: bool) -> Result<TreeNode> {
        self.store.set_removed(id, is_removed)
    }

    /// Edit a comment's text
    pub fn update_comment(
        &self,
        id: NodeId,
        comment: impl Into<String>,
        rendered: Option<String>,
    ) -> Result<TreeNode> {
        let comment = comment.into();
        self.validator.validate_content(&comment)?;
        self.store.update_comment(id, comment, rendered)
    }

    /// Comments waiting for moderation: not public and not removed
    pub fn in_moderation(&self) -> Result<Vec<TreeNode>> {
        self.store
            .scan(&|n: &TreeNode| !n.is_root() && !n.payload.is_public && !n.payload.is_removed)
    }
}
