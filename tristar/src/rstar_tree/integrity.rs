//! Structural verification of an R*-tree.

use std::collections::HashSet;

use crate::config::TreeConfig;
use crate::rectangle::Rectangle;
use crate::rstar_tree::arena::RStarTree;
use crate::rstar_tree::rtree_types::{NodeId, NodeKind};

/// Result of an integrity check
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityReport {
    /// Nodes reached from the root
    pub nodes_checked: u64,
    /// Depth of the leaves (root = 0), if they agree
    pub leaf_depth: Option<usize>,
    /// Summary of findings
    pub is_valid: bool,
    /// Detailed error messages
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self {
            nodes_checked: 0,
            leaf_depth: None,
            is_valid: true,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, message: String) {
        self.is_valid = false;
        self.errors.push(message);
    }
}

impl Default for IntegrityReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RStarTree {
    /// Walks the whole tree and checks:
    /// - every key equals the bounding box of the node's contents
    /// - non-root nodes hold between `m` and `M` entries, the root at most `M`
    /// - internal nodes are not empty
    /// - all leaves sit at the same depth
    /// - every point id appears once and every live node is reachable
    pub fn check_integrity(&self, config: &TreeConfig) -> IntegrityReport {
        let mut report = IntegrityReport::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut seen_points = HashSet::new();
        let mut stack = vec![(self.root(), 0usize)];

        while let Some((id, depth)) = stack.pop() {
            if !visited.insert(id) {
                report.fail(format!("Node {} is reachable more than once", id));
                continue;
            }
            let node = match self.node(id) {
                Ok(node) => node,
                Err(e) => {
                    report.fail(format!("Node {} is referenced but missing: {}", id, e));
                    continue;
                }
            };
            report.nodes_checked += 1;

            let is_root = depth == 0;
            let len = node.len();
            if len > config.max_entries() {
                report.fail(format!(
                    "Node {} holds {} entries, more than {}",
                    id,
                    len,
                    config.max_entries()
                ));
            }
            if !is_root && len < config.min_entries() {
                report.fail(format!(
                    "Node {} holds {} entries, fewer than {}",
                    id,
                    len,
                    config.min_entries()
                ));
            }

            let expected = match node.kind() {
                NodeKind::Leaf { points } => {
                    match report.leaf_depth {
                        None => report.leaf_depth = Some(depth),
                        Some(d) if d != depth => report.fail(format!(
                            "Leaf {} at depth {} but other leaves at depth {}",
                            id, depth, d
                        )),
                        Some(_) => {}
                    }
                    for point_id in points.keys() {
                        if !seen_points.insert(*point_id) {
                            report.fail(format!("Point {} is stored more than once", point_id));
                        }
                    }
                    Rectangle::bounding_box_points(points.values().map(|e| e.coordinates))
                }
                NodeKind::Internal { children } => {
                    if children.is_empty() {
                        report.fail(format!("Internal node {} has no children", id));
                    }
                    let mut keys = Vec::with_capacity(children.len());
                    for child in children {
                        if let Ok(child_node) = self.node(*child) {
                            keys.push(child_node.key().clone());
                        }
                        stack.push((*child, depth + 1));
                    }
                    Rectangle::bounding_box(&keys)
                }
            };
            if &expected != node.key() {
                report.fail(format!(
                    "Node {} has key {} but its contents span {}",
                    id,
                    node.key(),
                    expected
                ));
            }
        }

        if seen_points.len() != self.len() {
            report.fail(format!(
                "{} points registered but {} reachable",
                self.len(),
                seen_points.len()
            ));
        }
        if visited.len() != self.node_count() {
            report.fail(format!(
                "{} live nodes but {} reachable from the root",
                self.node_count(),
                visited.len()
            ));
        }
        report
    }
}
