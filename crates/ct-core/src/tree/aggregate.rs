//! Queries spanning the trees of many content objects

use super::manager::TreeManager;
use crate::comment::TreeNode;
use crate::error::Result;
use crate::path::NodePath;
use crate::types::{ContentType, SiteId};
use std::str::FromStr;

impl TreeManager {
    /// Comments of every object of the given content types, in path order
    ///
    /// `site` of `None` spans all sites. Roots are never included.
    pub fn for_content_types(
        &self,
        types: &[ContentType],
        site: Option<SiteId>,
    ) -> Result<Vec<TreeNode>> {
        let roots = self.matching_roots(types, site)?;
        if roots.is_empty() {
            return Ok(Vec::new());
        }
        self.store.nodes_under(&roots, 2)
    }

    /// Number of comments under every object of the given content types,
    /// removed and unpublished ones included
    pub fn count_for_content_types(
        &self,
        types: &[ContentType],
        site: Option<SiteId>,
    ) -> Result<usize> {
        let mut total = 0;
        for root in self.matching_roots(types, site)? {
            total += self.store.descendant_count(&root)?;
        }
        Ok(total)
    }

    /// Like `for_content_types`, with `app.model` labels
    pub fn for_app_models(&self, labels: &[&str], site: Option<SiteId>) -> Result<Vec<TreeNode>> {
        let types = labels
            .iter()
            .map(|label| ContentType::from_str(label))
            .collect::<Result<Vec<_>>>()?;
        self.for_content_types(&types, site)
    }

    fn matching_roots(&self, types: &[ContentType], site: Option<SiteId>) -> Result<Vec<NodePath>> {
        let mut roots = Vec::new();
        for assoc in self.store.associations_matching(types, site)? {
            roots.push(self.store.get(assoc.root)?.path);
        }
        Ok(roots)
    }
}
