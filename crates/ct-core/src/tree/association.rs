//! Association index: one comment root per content object and site

use super::manager::TreeManager;
use crate::comment::{Association, CommentPayload, TreeNode};
use crate::error::{Result, TreeError};
use crate::types::{ContentKey, ContentType, SiteId};
use tracing::{debug, info, warn};

impl TreeManager {
    /// Root of a content object's thread, `None` before the first comment
    pub fn get_root(&self, key: &ContentKey, site: Option<SiteId>) -> Result<Option<TreeNode>> {
        let site = site.unwrap_or(self.default_site);
        match self.store.find_association(key, site)? {
            Some(assoc) => self.root_of(assoc).map(Some),
            None => Ok(None),
        }
    }

    /// Root of a content object's thread, created on first use
    ///
    /// Concurrent callers converge on one root: the association insert is
    /// guarded by the store's uniqueness constraint, and a caller that loses
    /// the race drops its speculative root and reads the winner's.
    pub fn get_or_create_root(&self, key: &ContentKey, site: Option<SiteId>) -> Result<TreeNode> {
        let site = site.unwrap_or(self.default_site);
        if let Some(assoc) = self.store.find_association(key, site)? {
            return self.root_of(assoc);
        }

        let root = self.store.create_root()?;
        let assoc = Association::new(key.clone(), site, root.id);

        match self.store.insert_association(assoc.clone()) {
            Ok(()) => {
                info!("Created comment root {} for {} on site {}", root.id, key, site);
                root.cache_association(assoc);
                Ok(root)
            }
            Err(TreeError::AssociationConflict(reason)) => {
                warn!("Lost root creation race for {}: {}", key, reason);
                if let Err(e) = self.store.discard_root(root.id) {
                    warn!("Failed to discard speculative root {}: {}", root.id, e);
                }
                let winner = self.store.find_association(key, site)?.ok_or_else(|| {
                    TreeError::AssociationNotFound(format!("{} on site {}", key, site))
                })?;
                self.root_of(winner)
            }
            Err(e) => {
                if let Err(discard) = self.store.discard_root(root.id) {
                    warn!("Failed to discard speculative root {}: {}", root.id, discard);
                }
                Err(e)
            }
        }
    }

    /// Resolve the root and post a comment under it
    pub fn create_for_object(
        &self,
        key: &ContentKey,
        site: Option<SiteId>,
        payload: CommentPayload,
    ) -> Result<TreeNode> {
        let root = self.get_or_create_root(key, site)?;
        self.add_child(&root, payload)
    }

    /// Association of the tree holding `node`
    ///
    /// Cached on the node instance; a node reloaded from storage resolves it
    /// again.
    pub fn association_of(&self, node: &TreeNode) -> Result<Association> {
        self.try_association_of(node)?.ok_or_else(|| {
            TreeError::AssociationNotFound(format!("tree of node {}", node.id))
        })
    }

    /// Like `association_of`, but `None` for trees created with `add_root`
    pub fn try_association_of(&self, node: &TreeNode) -> Result<Option<Association>> {
        if let Some(assoc) = node.cached_association() {
            return Ok(Some(assoc.clone()));
        }

        let root_id = if node.is_root() {
            node.id
        } else {
            match self.store.get_by_path(&node.path.root_path()) {
                Ok(root) => root.id,
                Err(TreeError::PathNotFound(path)) => {
                    debug!("Node {} has no stored root at {}", node.id, path);
                    return Err(TreeError::NodeNotFound(node.id));
                }
                Err(e) => return Err(e),
            }
        };

        let assoc = self.store.association_for_root(root_id)?;
        if let Some(assoc) = &assoc {
            debug!("Resolved association of node {}: {}", node.id, assoc.content_key);
            node.cache_association(assoc.clone());
        }
        Ok(assoc)
    }

    /// Content type of the object a node's thread belongs to
    pub fn content_type_of(&self, node: &TreeNode) -> Result<ContentType> {
        if let Some(content_type) = node.cached_content_type() {
            return Ok(content_type.clone());
        }
        Ok(self.association_of(node)?.content_key.content_type)
    }

    /// Whether replies are still accepted under `node`
    pub fn allow_thread(&self, node: &TreeNode) -> Result<bool> {
        let assoc = self.try_association_of(node)?;
        Ok(self
            .policy()
            .allows_thread(node.depth, assoc.as_ref().map(|a| a.content_type())))
    }

    /// Comments posted to objects of one content type, or to one object when
    /// `object_id` is given, in path order
    pub fn for_model(
        &self,
        content_type: &ContentType,
        object_id: Option<u64>,
        site: Option<SiteId>,
    ) -> Result<Vec<TreeNode>> {
        let roots: Vec<_> = self
            .store
            .associations_matching(std::slice::from_ref(content_type), site)?
            .into_iter()
            .filter(|a| object_id.map(|id| a.content_key.object_id == id).unwrap_or(true))
            .map(|a| a.root)
            .collect();

        let mut prefixes = Vec::with_capacity(roots.len());
        for root in roots {
            prefixes.push(self.store.get(root)?.path);
        }
        self.store.nodes_under(&prefixes, 2)
    }

    fn root_of(&self, assoc: Association) -> Result<TreeNode> {
        let root = self.store.get(assoc.root)?;
        root.cache_association(assoc);
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::{CommentBuilder, CommentFlag, FlagRecord};
    use crate::limiter::ThreadLevelPolicy;
    use crate::path::NodePath;
    use crate::store::{MemoryStore, TreeState, TreeStore};
    use crate::types::NodeId;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn article(id: u64) -> ContentKey {
        ContentKey::new(ContentType::new("tests", "article"), id)
    }

    fn payload(text: &str) -> CommentPayload {
        CommentBuilder::new().content(text).build().unwrap()
    }

    /// Store whose first association lookup misses, as if another writer
    /// committed between the caller's read and write
    struct StaleReadStore {
        inner: MemoryStore,
        stale: AtomicBool,
    }

    impl TreeStore for StaleReadStore {
        fn get(&self, id: NodeId) -> Result<TreeNode> {
            self.inner.get(id)
        }
        fn get_by_path(&self, path: &NodePath) -> Result<TreeNode> {
            self.inner.get_by_path(path)
        }
        fn create_root(&self) -> Result<TreeNode> {
            self.inner.create_root()
        }
        fn insert_child(&self, parent: NodeId, payload: CommentPayload) -> Result<TreeNode> {
            self.inner.insert_child(parent, payload)
        }
        fn children(&self, path: &NodePath) -> Result<Vec<TreeNode>> {
            self.inner.children(path)
        }
        fn descendants(&self, path: &NodePath) -> Result<Vec<TreeNode>> {
            self.inner.descendants(path)
        }
        fn descendant_count(&self, path: &NodePath) -> Result<usize> {
            self.inner.descendant_count(path)
        }
        fn children_count(&self, path: &NodePath) -> Result<usize> {
            self.inner.children_count(path)
        }
        fn nodes_under(&self, prefixes: &[NodePath], min_depth: usize) -> Result<Vec<TreeNode>> {
            self.inner.nodes_under(prefixes, min_depth)
        }
        fn scan(&self, filter: &dyn Fn(&TreeNode) -> bool) -> Result<Vec<TreeNode>> {
            self.inner.scan(filter)
        }
        fn find_association(&self, key: &ContentKey, site: SiteId) -> Result<Option<Association>> {
            if self.stale.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_association(key, site)
        }
        fn association_for_root(&self, root: NodeId) -> Result<Option<Association>> {
            self.inner.association_for_root(root)
        }
        fn associations_matching(
            &self,
            types: &[ContentType],
            site: Option<SiteId>,
        ) -> Result<Vec<Association>> {
            self.inner.associations_matching(types, site)
        }
        fn insert_association(&self, association: Association) -> Result<()> {
            self.inner.insert_association(association)
        }
        fn discard_root(&self, id: NodeId) -> Result<()> {
            self.inner.discard_root(id)
        }
        fn set_public(&self, id: NodeId, is_public: bool) -> Result<TreeNode> {
            self.inner.set_public(id, is_public)
        }
        fn set_removed(&self, id: NodeId, is_removed: bool) -> Result<TreeNode> {
            self.inner.set_removed(id, is_removed)
        }
        fn update_comment(
            &self,
            id: NodeId,
            comment: String,
            rendered: Option<String>,
        ) -> Result<TreeNode> {
            self.inner.update_comment(id, comment, rendered)
        }
        fn set_public_for_children(&self, parent: NodeId, is_public: bool) -> Result<usize> {
            self.inner.set_public_for_children(parent, is_public)
        }
        fn add_flag(&self, record: FlagRecord) -> Result<()> {
            self.inner.add_flag(record)
        }
        fn flags_for(&self, node: NodeId, flag: CommentFlag) -> Result<Vec<FlagRecord>> {
            self.inner.flags_for(node, flag)
        }
        fn snapshot(&self) -> Result<TreeState> {
            self.inner.snapshot()
        }
    }

    #[test]
    fn test_get_root_before_first_comment() {
        let manager = TreeManager::new(MemoryStore::new());
        assert!(manager.get_root(&article(1), None).unwrap().is_none());
    }

    #[test]
    fn test_get_or_create_root_is_idempotent() {
        let manager = TreeManager::new(MemoryStore::new());
        let first = manager.get_or_create_root(&article(42), None).unwrap();
        let second = manager.get_or_create_root(&article(42), None).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(manager.get_root(&article(42), None).unwrap().unwrap().id, first.id);
    }

    #[test]
    fn test_roots_are_per_site() {
        let manager = TreeManager::new(MemoryStore::new());
        let site1 = manager.get_or_create_root(&article(1), Some(SiteId(1))).unwrap();
        let site2 = manager.get_or_create_root(&article(1), Some(SiteId(2))).unwrap();
        let default = manager.get_or_create_root(&article(1), None).unwrap();

        assert_ne!(site1.id, site2.id);
        assert_eq!(default.id, site1.id);
    }

    #[test]
    fn test_lost_race_converges_on_winner() {
        let store = Arc::new(StaleReadStore {
            inner: MemoryStore::new(),
            stale: AtomicBool::new(false),
        });
        let manager = TreeManager::with_storage(store.clone());

        let winner = manager.get_or_create_root(&article(42), Some(SiteId(1))).unwrap();

        store.stale.store(true, Ordering::SeqCst);
        let loser = manager.get_or_create_root(&article(42), Some(SiteId(1))).unwrap();

        assert_eq!(loser.id, winner.id);
        let state = store.snapshot().unwrap();
        state.verify().unwrap();
        // The speculative root was dropped again
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_concurrent_root_creation() {
        let manager = Arc::new(TreeManager::new(MemoryStore::new()));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    manager
                        .get_or_create_root(&article(42), Some(SiteId(1)))
                        .unwrap()
                        .id
                })
            })
            .collect();

        let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids[0], ids[1]);

        let state = manager.store().snapshot().unwrap();
        let ct = ContentType::new("tests", "article");
        assert_eq!(state.associations_matching(&[ct], None).len(), 1);
    }

    #[test]
    fn test_content_type_of_walks_to_root() {
        let manager = TreeManager::new(MemoryStore::new());
        let root = manager.get_or_create_root(&article(3), None).unwrap();
        let a = manager.add_child(&root, payload("a")).unwrap();
        let a1 = manager.add_child(&a, payload("a1")).unwrap();

        let reloaded = manager.refresh(&a1).unwrap();
        assert!(reloaded.cached_association().is_none());
        assert_eq!(
            manager.content_type_of(&reloaded).unwrap(),
            ContentType::new("tests", "article")
        );
        assert!(reloaded.cached_association().is_some());
        assert_eq!(manager.content_type_of(&root).unwrap().model, "article");
    }

    #[test]
    fn test_association_of_bare_root_fails() {
        let manager = TreeManager::new(MemoryStore::new());
        let root = manager.add_root().unwrap();
        assert!(matches!(
            manager.association_of(&root),
            Err(TreeError::AssociationNotFound(_))
        ));
        assert!(manager.try_association_of(&root).unwrap().is_none());
    }

    #[test]
    fn test_association_of_node_without_stored_root() {
        let manager = TreeManager::new(MemoryStore::new());
        manager.add_root().unwrap();
        let detached = TreeNode::new(
            NodeId(99),
            NodePath::parse("00090000").unwrap(),
            payload("detached"),
        );

        assert!(matches!(
            manager.try_association_of(&detached),
            Err(TreeError::NodeNotFound(NodeId(99)))
        ));
        assert!(matches!(
            manager.add_child(&detached, payload("reply")),
            Err(TreeError::NodeNotFound(NodeId(99)))
        ));
    }

    #[test]
    fn test_content_type_of_prefers_cached_association() {
        let manager = TreeManager::new(MemoryStore::new());
        let detached = TreeNode::new(
            NodeId(7),
            NodePath::parse("00050001").unwrap(),
            payload("detached"),
        );
        detached.cache_association(Association::new(article(8), SiteId(1), NodeId(6)));

        // Answered from the instance; the store holds no such tree
        assert_eq!(
            manager.content_type_of(&detached).unwrap(),
            ContentType::new("tests", "article")
        );
    }

    #[test]
    fn test_create_for_object() {
        let manager = TreeManager::new(MemoryStore::new());
        let comment = manager
            .create_for_object(&article(5), None, payload("first!"))
            .unwrap();
        assert_eq!(comment.depth, 2);

        let root = manager.get_root(&article(5), None).unwrap().unwrap();
        assert_eq!(manager.children_count(&root).unwrap(), 1);
    }

    #[test]
    fn test_allow_thread() {
        let diary = ContentType::new("tests", "diary");
        let manager = TreeManager::new(MemoryStore::new())
            .with_policy(ThreadLevelPolicy::new(3).with_override(&diary, 2));
        let root = manager
            .get_or_create_root(&ContentKey::new(diary, 1), None)
            .unwrap();
        let c = manager.add_child(&root, payload("c")).unwrap();

        assert!(manager.allow_thread(&root).unwrap());
        assert!(!manager.allow_thread(&c).unwrap());
    }

    #[test]
    fn test_for_model() {
        let manager = TreeManager::new(MemoryStore::new());
        manager.create_for_object(&article(1), None, payload("one")).unwrap();
        manager.create_for_object(&article(2), None, payload("two")).unwrap();
        manager
            .create_for_object(&article(2), Some(SiteId(2)), payload("elsewhere"))
            .unwrap();
        manager
            .create_for_object(
                &ContentKey::new(ContentType::new("tests", "diary"), 1),
                None,
                payload("diary"),
            )
            .unwrap();

        let ct = ContentType::new("tests", "article");
        assert_eq!(manager.for_model(&ct, None, None).unwrap().len(), 3);
        assert_eq!(manager.for_model(&ct, Some(2), None).unwrap().len(), 2);
        assert_eq!(manager.for_model(&ct, Some(2), Some(SiteId(1))).unwrap().len(), 1);
    }
}
