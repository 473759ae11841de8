//! Core types of the in-memory R*-tree.
//!
//! This module defines:
//! - identifiers (`NodeId`, `PointId`) and point payloads
//! - the node representation (`NodeKind`, `TreeNode`)
//! - statistics reported by insertions and the cursor

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::rectangle::Rectangle;

// ============================================================================
// Identifiers and payloads
// ============================================================================

/// Identifier of an indexed point, unique within a tree
pub type PointId = u64;

/// Spatial coordinates of a point (x, y, z)
pub type Coordinates = [f64; 3];

/// Opaque auxiliary values carried with a point
pub type Attributes = Vec<f64>;

/// Slot of a node in the tree's arena.
///
/// Ids are only meaningful for the tree that issued them. A slot freed by a
/// split may later be handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        NodeId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point stored in a leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEntry {
    pub coordinates: Coordinates,
    pub attributes: Attributes,
}

impl PointEntry {
    pub fn new(coordinates: Coordinates, attributes: Attributes) -> Self {
        PointEntry {
            coordinates,
            attributes,
        }
    }
}

/// An input row: a point together with its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: PointId,
    pub coordinates: Coordinates,
    pub attributes: Attributes,
}

impl PointRecord {
    pub fn new(id: PointId, coordinates: Coordinates, attributes: Attributes) -> Self {
        PointRecord {
            id,
            coordinates,
            attributes,
        }
    }

    pub fn into_entry(self) -> (PointId, PointEntry) {
        (self.id, PointEntry::new(self.coordinates, self.attributes))
    }
}

/// Tabular row `(id, x, y, z, attr1, attr2)`.
impl From<(PointId, f64, f64, f64, f64, f64)> for PointRecord {
    fn from(row: (PointId, f64, f64, f64, f64, f64)) -> Self {
        let (id, x, y, z, attr1, attr2) = row;
        PointRecord::new(id, [x, y, z], vec![attr1, attr2])
    }
}

// ============================================================================
// Node Types
// ============================================================================

/// Contents of a node. A node holds either points or children, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Leaf node holding points in insertion order
    Leaf { points: IndexMap<PointId, PointEntry> },
    /// Internal node holding child node ids in order
    Internal { children: Vec<NodeId> },
}

/// A node of the tree with its cached bounding rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub(crate) kind: NodeKind,
    pub(crate) key: Rectangle,
}

impl TreeNode {
    pub fn new_leaf() -> Self {
        TreeNode {
            kind: NodeKind::Leaf {
                points: IndexMap::new(),
            },
            key: Rectangle::empty(),
        }
    }

    pub fn new_internal() -> Self {
        TreeNode {
            kind: NodeKind::Internal {
                children: Vec::new(),
            },
            key: Rectangle::empty(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Cached bounding rectangle of the node's contents
    pub fn key(&self) -> &Rectangle {
        &self.key
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Number of points (leaf) or children (internal)
    pub fn len(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf { points } => points.len(),
            NodeKind::Internal { children } => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Points of a leaf; `None` for internal nodes
    pub fn points(&self) -> Option<&IndexMap<PointId, PointEntry>> {
        match &self.kind {
            NodeKind::Leaf { points } => Some(points),
            NodeKind::Internal { .. } => None,
        }
    }

    /// Children of an internal node; empty for leaves
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf { .. } => &[],
            NodeKind::Internal { children } => children,
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// What a single top-level insertion did to the tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertStats {
    /// Points moved by forced reinsertion, in the order they were removed
    pub reinserted: Vec<PointId>,
    /// Node splits performed, root split included
    pub splits: usize,
    /// Whether the tree grew a level
    pub root_split: bool,
}

/// Running totals over the lifetime of a cursor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorStats {
    pub inserts: u64,
    pub splits: u64,
    pub reinsertions: u64,
    pub root_splits: u64,
}

impl CursorStats {
    pub(crate) fn record(&mut self, insert: &InsertStats) {
        self.inserts += 1;
        self.splits += insert.splits as u64;
        self.reinsertions += insert.reinserted.len() as u64;
        if insert.root_split {
            self.root_splits += 1;
        }
    }
}
