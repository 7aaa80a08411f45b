//! Moderation hooks and comment flags

use super::manager::TreeManager;
use crate::comment::{CommentFlag, FlagRecord, TreeNode};
use crate::error::Result;
use tracing::{debug, info};

impl TreeManager {
    /// Unpublish every direct child of `node`; returns how many changed
    pub fn unpublish_children(&self, node: &TreeNode) -> Result<usize> {
        let changed = self.store.set_public_for_children(node.id, false)?;
        info!("Unpublished {} replies to comment {}", changed, node.id);
        Ok(changed)
    }

    /// Record a flag raised by `user` on a comment and react to it
    ///
    /// A user raises each flag at most once per comment; a repeat fails with
    /// `DuplicateFlag` before anything changes. Returns the number of
    /// comments whose state changed.
    pub fn on_comment_flagged(
        &self,
        node: &TreeNode,
        user: &str,
        flag: CommentFlag,
    ) -> Result<usize> {
        self.store.add_flag(FlagRecord::new(node.id, user, flag))?;
        info!("{} flagged comment {} with '{}'", user, node.id, flag);

        match flag {
            CommentFlag::ModeratorDeletion => {
                self.store.set_removed(node.id, true)?;
                info!("Comment {} removed by moderator", node.id);
                Ok(1 + self.unpublish_children(node)?)
            }
            CommentFlag::ModeratorApproval => {
                self.store.set_removed(node.id, false)?;
                self.store.set_public(node.id, true)?;
                info!("Comment {} approved by moderator", node.id);
                Ok(1)
            }
            CommentFlag::SuggestRemoval | CommentFlag::Like | CommentFlag::Dislike => {
                debug!("Flag '{}' on comment {} needs no action", flag, node.id);
                Ok(0)
            }
        }
    }

    /// Users who raised `flag` on `node`, in the order they raised it
    pub fn users_flagging(&self, node: &TreeNode, flag: CommentFlag) -> Result<Vec<String>> {
        Ok(self
            .store
            .flags_for(node.id, flag)?
            .into_iter()
            .map(|record| record.user)
            .collect())
    }

    pub fn flag_count(&self, node: &TreeNode, flag: CommentFlag) -> Result<usize> {
        Ok(self.store.flags_for(node.id, flag)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::{CommentBuilder, CommentPayload};
    use crate::error::TreeError;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn payload(text: &str) -> CommentPayload {
        CommentBuilder::new().content(text).build().unwrap()
    }

    fn thread() -> (TreeManager, TreeNode, TreeNode, Vec<TreeNode>) {
        let manager = TreeManager::new(MemoryStore::new());
        let root = manager.add_root().unwrap();
        let parent = manager.add_child(&root, payload("parent")).unwrap();
        let replies = (0..3)
            .map(|i| manager.add_child(&parent, payload(&format!("reply {}", i))).unwrap())
            .collect();
        (manager, root, parent, replies)
    }

    #[test]
    fn test_unpublish_children() {
        let (manager, _root, parent, replies) = thread();
        manager.set_public(replies[0].id, false).unwrap();

        assert_eq!(manager.unpublish_children(&parent).unwrap(), 2);
        for reply in &replies {
            assert!(!manager.get(reply.id).unwrap().is_public());
        }
        assert!(manager.get(parent.id).unwrap().is_public());
    }

    #[test]
    fn test_unpublish_skips_grandchildren() {
        let (manager, root, parent, replies) = thread();
        let nested = manager.add_child(&replies[0], payload("nested")).unwrap();

        manager.unpublish_children(&root).unwrap();
        assert!(!manager.get(parent.id).unwrap().is_public());
        assert!(manager.get(nested.id).unwrap().is_public());
    }

    #[test]
    fn test_moderator_deletion() {
        let (manager, root, parent, _replies) = thread();

        let changed = manager
            .on_comment_flagged(&parent, "moderator", CommentFlag::ModeratorDeletion)
            .unwrap();
        assert_eq!(changed, 4);
        assert!(manager.get(parent.id).unwrap().is_removed());
        assert!(manager.nested_tree(&root, true, None).unwrap().is_empty());
        assert_eq!(manager.descendant_count(&root).unwrap(), 4);
    }

    #[test]
    fn test_moderator_approval() {
        let manager = TreeManager::new(MemoryStore::new());
        let root = manager.add_root().unwrap();
        let pending = CommentBuilder::new()
            .content("pending")
            .public(false)
            .build()
            .unwrap();
        let pending = manager.add_child(&root, pending).unwrap();
        assert_eq!(manager.in_moderation().unwrap().len(), 1);

        manager
            .on_comment_flagged(&pending, "moderator", CommentFlag::ModeratorApproval)
            .unwrap();
        assert!(manager.get(pending.id).unwrap().is_public());
        assert!(manager.in_moderation().unwrap().is_empty());
    }

    #[test]
    fn test_user_flags_are_recorded() {
        let (manager, _root, parent, _replies) = thread();
        for flag in [CommentFlag::SuggestRemoval, CommentFlag::Like, CommentFlag::Dislike] {
            assert_eq!(manager.on_comment_flagged(&parent, "alice", flag).unwrap(), 0);
        }
        manager
            .on_comment_flagged(&parent, "bob", CommentFlag::Like)
            .unwrap();

        assert!(manager.get(parent.id).unwrap().is_public());
        assert_eq!(
            manager.users_flagging(&parent, CommentFlag::Like).unwrap(),
            vec!["alice".to_string(), "bob".to_string()]
        );
        assert_eq!(manager.flag_count(&parent, CommentFlag::Dislike).unwrap(), 1);
        assert_eq!(manager.flag_count(&parent, CommentFlag::ModeratorDeletion).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_flag_is_rejected() {
        let (manager, _root, parent, _replies) = thread();
        manager
            .on_comment_flagged(&parent, "alice", CommentFlag::SuggestRemoval)
            .unwrap();

        let err = manager
            .on_comment_flagged(&parent, "alice", CommentFlag::SuggestRemoval)
            .unwrap_err();
        assert!(matches!(err, TreeError::DuplicateFlag(_)));
        assert_eq!(manager.flag_count(&parent, CommentFlag::SuggestRemoval).unwrap(), 1);
    }

    #[test]
    fn test_repeated_deletion_changes_nothing() {
        let (manager, _root, parent, replies) = thread();
        manager
            .on_comment_flagged(&parent, "moderator", CommentFlag::ModeratorDeletion)
            .unwrap();
        manager.set_public(replies[0].id, true).unwrap();

        assert!(manager
            .on_comment_flagged(&parent, "moderator", CommentFlag::ModeratorDeletion)
            .is_err());
        assert!(manager.get(replies[0].id).unwrap().is_public());
    }
}
