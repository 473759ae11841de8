//! Snapshot records for handing a tree to other tools.
//!
//! A snapshot is a nested [`NodeRecord`] mirroring the tree: leaves carry
//! their points, internal nodes their children, and every node its key. An
//! empty tree is a single record flagged `is_null`.
//!
//! The `kdtree` field names a secondary index built over a leaf by an outside
//! tool (see the `tristar_kdtree` crate). The tree never sets or reads it;
//! restoring a snapshot drops it.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{IndexError, IndexResult};
use crate::rectangle::Rectangle;
use crate::rstar_tree::{
    Attributes, Coordinates, NodeId, NodeKind, PointEntry, PointId, RStarTree, TreeNode,
};

/// One node of a snapshot.
///
/// JSON layout:
///
/// ```json
/// {
///   "is_leaf": true,
///   "is_null": false,
///   "key": {"minima": [0.0, 0.0, 0.0], "maxima": [1.0, 1.0, 1.0]},
///   "points": {"1": [[0.0, 0.0, 0.0], [0.5, 0.25]]},
///   "kdtree": null,
///   "children": []
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub is_leaf: bool,
    #[serde(default)]
    pub is_null: bool,
    #[serde(default)]
    pub key: Option<Rectangle>,
    #[serde(default)]
    pub points: Option<IndexMap<PointId, (Coordinates, Attributes)>>,
    #[serde(default)]
    pub kdtree: Option<String>,
    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

impl NodeRecord {
    /// The record of an empty tree.
    pub fn null() -> Self {
        NodeRecord {
            is_null: true,
            ..Default::default()
        }
    }

    /// Visits this record and all records below it, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a NodeRecord)) {
        visit(self);
        for child in &self.children {
            child.walk(&mut *visit);
        }
    }

    /// Total number of points in the snapshot.
    pub fn point_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |record| count += record.points.as_ref().map_or(0, IndexMap::len));
        count
    }

    pub fn to_json(&self) -> IndexResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_pretty_json(&self) -> IndexResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> IndexResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> IndexResult<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::legacy())
            .map_err(|e| IndexError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> IndexResult<Self> {
        bincode::serde::decode_from_slice(bytes, bincode::config::legacy())
            .map(|(record, _)| record)
            .map_err(|e| IndexError::Serialization(e.to_string()))
    }

    /// Writes the snapshot as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> IndexResult<()> {
        let json = self.to_pretty_json()?;
        std::fs::write(path.as_ref(), json)?;
        log::debug!("Saved snapshot to {:?}", path.as_ref());
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> IndexResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loading snapshot from {:?}", path.as_ref());
        Self::from_json(&json)
    }
}

fn key_record(key: &Rectangle) -> Option<Rectangle> {
    if key.is_empty() {
        None
    } else {
        Some(key.clone())
    }
}

fn illegal(message: String) -> IndexError {
    log::error!("Rejected snapshot: {}", message);
    IndexError::IllegalNode(message)
}

impl RStarTree {
    /// Captures the whole tree as a nested record.
    pub fn to_snapshot(&self) -> IndexResult<NodeRecord> {
        let root = self.node(self.root())?;
        if root.is_leaf() && root.is_empty() {
            return Ok(NodeRecord::null());
        }
        self.node_record(self.root())
    }

    fn node_record(&self, id: NodeId) -> IndexResult<NodeRecord> {
        let node = self.node(id)?;
        let record = match node.kind() {
            NodeKind::Leaf { points } => NodeRecord {
                is_leaf: true,
                key: key_record(node.key()),
                points: Some(
                    points
                        .iter()
                        .map(|(pid, e)| (*pid, (e.coordinates, e.attributes.clone())))
                        .collect(),
                ),
                ..Default::default()
            },
            NodeKind::Internal { children } => NodeRecord {
                key: key_record(node.key()),
                children: children
                    .iter()
                    .map(|child| self.node_record(*child))
                    .collect::<IndexResult<_>>()?,
                ..Default::default()
            },
        };
        Ok(record)
    }

    /// Rebuilds a tree from a snapshot.
    ///
    /// Stored keys are ignored and recomputed from the points.
    ///
    /// # Errors
    ///
    /// * [`IndexError::IllegalNode`] for a record holding both points and
    ///   children, an internal record without children, or a null record
    ///   below the root
    /// * [`IndexError::DuplicatePoint`] / [`IndexError::InvalidPoint`] for bad
    ///   point data
    pub fn from_snapshot(record: &NodeRecord) -> IndexResult<RStarTree> {
        let mut tree = RStarTree::new();
        if record.is_null {
            if record.points.as_ref().is_some_and(|p| !p.is_empty()) || !record.children.is_empty()
            {
                return Err(illegal("null root record carries data".to_string()));
            }
            return Ok(tree);
        }

        let placeholder = tree.root();
        let root = tree.build_node(record)?;
        tree.set_root(root);
        tree.release(placeholder)?;
        tree.recompute_subtree_rectangles(root)?;
        log::debug!(
            "Restored snapshot with {} points in {} nodes",
            tree.len(),
            tree.node_count()
        );
        Ok(tree)
    }

    fn build_node(&mut self, record: &NodeRecord) -> IndexResult<NodeId> {
        if record.is_null {
            return Err(illegal("null record below the root".to_string()));
        }
        if record.points.is_some() && !record.children.is_empty() {
            return Err(illegal("record holds both points and children".to_string()));
        }

        if record.is_leaf {
            if !record.children.is_empty() {
                return Err(illegal("leaf record has children".to_string()));
            }
            let leaf = self.allocate(TreeNode::new_leaf());
            if let Some(points) = &record.points {
                for (id, (coordinates, attributes)) in points {
                    self.add_point(leaf, *id, PointEntry::new(*coordinates, attributes.clone()))?;
                }
            }
            return Ok(leaf);
        }

        if record.points.is_some() {
            return Err(illegal("internal record carries points".to_string()));
        }
        if record.children.is_empty() {
            return Err(illegal("internal record has no children".to_string()));
        }
        let node = self.allocate(TreeNode::new_internal());
        for child in &record.children {
            let child = self.build_node(child)?;
            self.add_child(node, child)?;
        }
        Ok(node)
    }
}
