//! Ancestor-chain recovery.
//!
//! Nodes carry no parent references, so the chain from the root to a node is
//! found by descending only into children whose key covers the target's key.
//! Coverage is non-strict: a parent whose key equals its child's key is still
//! an ancestor. Candidates are confirmed by node identity, not by geometry.
//!
//! Strict containment ([`Rectangle::is_proper_superset`]) is not used as the
//! filter. A node with a single child, or whose extreme points all sit in one
//! child, shares that child's key exactly, and a strict filter would never
//! descend into it. Identity already tells apart siblings with equal keys.
//!
//! [`Rectangle::is_proper_superset`]: crate::rectangle::Rectangle::is_proper_superset

use crate::errors::{IndexError, IndexResult};
use crate::rstar_tree::arena::RStarTree;
use crate::rstar_tree::rtree_types::NodeId;

impl RStarTree {
    /// Checks if `target` is `ancestor` or lies somewhere below it.
    pub fn is_descendant(&self, ancestor: NodeId, target: NodeId) -> IndexResult<bool> {
        if ancestor == target {
            return Ok(true);
        }
        let node = self.node(ancestor)?;
        let target_key = self.node(target)?.key();
        if node.is_leaf() || !node.key().contains(target_key) {
            return Ok(false);
        }
        for child in node.children() {
            if self.node(*child)?.key().contains(target_key) && self.is_descendant(*child, target)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns `[from, …, to]`, the chain of nodes leading from `from` down to
    /// `to`.
    ///
    /// # Errors
    ///
    /// [`IndexError::PathNotFound`] if `to` does not lie below `from`.
    pub fn path_to_subtree(&self, from: NodeId, to: NodeId) -> IndexResult<Vec<NodeId>> {
        let target_key = self.node(to)?.key().clone();
        let mut path = vec![from];
        let mut current = from;
        while current != to {
            let mut next = None;
            for child in self.node(current)?.children() {
                if self.node(*child)?.key().contains(&target_key)
                    && self.is_descendant(*child, to)?
                {
                    next = Some(*child);
                    break;
                }
            }
            current = next.ok_or(IndexError::PathNotFound { from, to })?;
            path.push(current);
        }
        Ok(path)
    }
}
