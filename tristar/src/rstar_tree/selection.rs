//! Subtree selection: which child an entry descends into.

use std::cmp::Ordering;

use crate::errors::{IndexError, IndexResult};
use crate::rectangle::Rectangle;
use crate::rstar_tree::arena::RStarTree;
use crate::rstar_tree::rtree_types::NodeId;

/// Growth of a child's volume if it had to cover `entry`.
pub fn volume_enlargement(candidate: &Rectangle, entry: &Rectangle) -> f64 {
    candidate.union(entry).volume() - candidate.volume()
}

/// Overlap between the enlarged candidate and every other sibling.
///
/// The candidate is identified by position so siblings with identical keys
/// still count against each other.
pub fn overlap_enlargement(siblings: &[Rectangle], candidate: usize, entry: &Rectangle) -> f64 {
    let enlarged = siblings[candidate].union(entry);
    siblings
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != candidate)
        .map(|(_, s)| enlarged.intersection_volume(s))
        .sum()
}

/// Position of the lexicographically smallest score; the first one wins ties.
pub(crate) fn first_minimum<const N: usize>(scores: impl Iterator<Item = [f64; N]>) -> Option<usize> {
    let mut best: Option<(usize, [f64; N])> = None;
    for (i, score) in scores.enumerate() {
        let better = match &best {
            None => true,
            Some((_, current)) => score.partial_cmp(current) == Some(Ordering::Less),
        };
        if better {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

impl RStarTree {
    /// Descends from `node` (at `level`, root = 0) to the leaf that should
    /// receive `entry`, returning the leaf and its level.
    ///
    /// Among children that are all leaves the choice minimizes
    /// (overlap enlargement, volume enlargement, volume); higher up it
    /// minimizes (volume enlargement, volume).
    pub fn choose_subtree(
        &self,
        node: NodeId,
        level: usize,
        entry: &Rectangle,
    ) -> IndexResult<(NodeId, usize)> {
        let mut current = node;
        let mut level = level;
        loop {
            let node = self.node(current)?;
            if node.is_leaf() {
                return Ok((current, level));
            }
            let children = node.children();

            let keys = self.child_keys(current)?;
            let best = if self.points_to_leaves(current)? {
                first_minimum((0..keys.len()).map(|i| {
                    [
                        overlap_enlargement(&keys, i, entry),
                        volume_enlargement(&keys[i], entry),
                        keys[i].volume(),
                    ]
                }))
            } else {
                first_minimum(
                    keys.iter()
                        .map(|k| [volume_enlargement(k, entry), k.volume()]),
                )
            };

            let chosen = best.ok_or_else(|| {
                IndexError::IllegalNode(format!("internal node {} has no children", current))
            })?;
            log::trace!(
                "Descending from node {} at level {} into child {}",
                current,
                level,
                children[chosen]
            );
            current = children[chosen];
            level += 1;
        }
    }
}
