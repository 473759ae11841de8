//! Node storage for the R*-tree.
//!
//! Nodes live in slots of a vector and refer to their children by [`NodeId`].
//! Slots freed by splits go onto a free list and are handed out again by the
//! next allocation. No node knows its parent; ancestor chains are recovered by
//! searching down from the root (see `path.rs`).

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::errors::{IndexError, IndexResult};
use crate::rectangle::Rectangle;
use crate::rstar_tree::rtree_types::{NodeId, NodeKind, PointEntry, PointId, TreeNode};

/// An R*-tree over 3-D points stored in a node arena.
///
/// `RStarTree` holds structure only. Insertion with overflow handling is
/// driven by [`RTreeCursor`](crate::rstar_tree::RTreeCursor); the primitives
/// here mutate a single node and recompute that node's own rectangle, never
/// its ancestors'.
#[derive(Debug, Clone)]
pub struct RStarTree {
    nodes: Vec<Option<TreeNode>>,
    free: Vec<NodeId>,
    root: NodeId,
    point_ids: HashSet<PointId>,
}

impl Default for RStarTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RStarTree {
    /// Creates a tree whose root is an empty leaf.
    pub fn new() -> Self {
        RStarTree {
            nodes: vec![Some(TreeNode::new_leaf())],
            free: Vec::new(),
            root: NodeId::new(0),
            point_ids: HashSet::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    /// Stores a node in a free slot, or a new one if none is free.
    pub(crate) fn allocate(&mut self, node: TreeNode) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = Some(node);
            return id;
        }
        self.nodes.push(Some(node));
        NodeId::new(self.nodes.len() - 1)
    }

    /// Takes a node out of the arena and frees its slot.
    ///
    /// Point ids held by a released leaf stay registered; callers move those
    /// points into other leaves.
    pub(crate) fn release(&mut self, id: NodeId) -> IndexResult<TreeNode> {
        let node = self
            .nodes
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(IndexError::NodeNotFound(id))?;
        self.free.push(id);
        Ok(node)
    }

    /// Checks if `id` refers to a live node.
    pub fn contains_node(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.index()), Some(Some(_)))
    }

    pub fn node(&self, id: NodeId) -> IndexResult<&TreeNode> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(IndexError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> IndexResult<&mut TreeNode> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(IndexError::NodeNotFound(id))
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.point_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point_ids.is_empty()
    }

    pub fn contains_point(&self, id: PointId) -> bool {
        self.point_ids.contains(&id)
    }

    /// Number of levels; a lone root leaf has height 1.
    pub fn height(&self) -> IndexResult<usize> {
        let mut height = 1;
        let mut current = self.node(self.root)?;
        while let Some(first) = current.children().first() {
            current = self.node(*first)?;
            height += 1;
        }
        Ok(height)
    }

    /// Checks if the node is internal and every child is a leaf.
    pub fn points_to_leaves(&self, id: NodeId) -> IndexResult<bool> {
        let node = self.node(id)?;
        if node.is_leaf() {
            return Ok(false);
        }
        for child in node.children() {
            if !self.node(*child)?.is_leaf() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Keys of a node's children, in child order.
    pub fn child_keys(&self, id: NodeId) -> IndexResult<Vec<Rectangle>> {
        self.node(id)?
            .children()
            .iter()
            .map(|child| self.node(*child).map(|n| n.key().clone()))
            .collect()
    }

    // ========================================================================
    // Rectangle maintenance
    // ========================================================================

    /// Recomputes a node's key from its contents (leaf: point coordinates,
    /// internal: children's keys). Children are trusted as they are.
    pub fn recompute_own_rectangle(&mut self, id: NodeId) -> IndexResult<()> {
        let key = match self.node(id)?.kind() {
            NodeKind::Leaf { points } => {
                Rectangle::bounding_box_points(points.values().map(|e| e.coordinates))
            }
            NodeKind::Internal { .. } => Rectangle::bounding_box(&self.child_keys(id)?),
        };
        self.node_mut(id)?.key = key;
        Ok(())
    }

    /// Recomputes every key in the subtree, children before parents.
    pub fn recompute_subtree_rectangles(&mut self, id: NodeId) -> IndexResult<()> {
        let children = self.node(id)?.children().to_vec();
        for child in children {
            self.recompute_subtree_rectangles(child)?;
        }
        self.recompute_own_rectangle(id)
    }

    // ========================================================================
    // Entry mutation
    // ========================================================================

    /// Adds a point to a leaf and recomputes the leaf's key.
    ///
    /// # Errors
    ///
    /// * [`IndexError::InvalidOperation`] if `leaf` is internal
    /// * [`IndexError::DuplicatePoint`] if the id is already in the tree
    /// * [`IndexError::InvalidPoint`] if a coordinate is not finite
    pub fn add_point(&mut self, leaf: NodeId, id: PointId, entry: PointEntry) -> IndexResult<()> {
        if !self.node(leaf)?.is_leaf() {
            return Err(IndexError::InvalidOperation(format!(
                "Cannot add point {} to internal node {}",
                id, leaf
            )));
        }
        if self.point_ids.contains(&id) {
            return Err(IndexError::DuplicatePoint(id));
        }
        validate_point(id, &entry)?;

        if let NodeKind::Leaf { points } = &mut self.node_mut(leaf)?.kind {
            points.insert(id, entry);
        }
        self.point_ids.insert(id);
        self.recompute_own_rectangle(leaf)
    }

    /// Removes a point from a leaf, keeping the order of the remaining points,
    /// and recomputes the leaf's key.
    pub fn remove_point(&mut self, leaf: NodeId, id: PointId) -> IndexResult<PointEntry> {
        let removed = match &mut self.node_mut(leaf)?.kind {
            NodeKind::Leaf { points } => points.shift_remove(&id),
            NodeKind::Internal { .. } => {
                return Err(IndexError::InvalidOperation(format!(
                    "Cannot remove point {} from internal node {}",
                    id, leaf
                )))
            }
        };
        let entry = removed.ok_or(IndexError::PointNotFound(id))?;
        self.point_ids.remove(&id);
        self.recompute_own_rectangle(leaf)?;
        Ok(entry)
    }

    /// Appends a child to an internal node and recomputes the node's key.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> IndexResult<()> {
        if !self.contains_node(child) {
            return Err(IndexError::NodeNotFound(child));
        }
        match &mut self.node_mut(parent)?.kind {
            NodeKind::Internal { children } => children.push(child),
            NodeKind::Leaf { .. } => {
                return Err(IndexError::InvalidOperation(format!(
                    "Cannot add child {} to leaf {}",
                    child, parent
                )))
            }
        }
        self.recompute_own_rectangle(parent)
    }

    /// Detaches a child from an internal node and recomputes the node's key.
    /// The child itself stays in the arena.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> IndexResult<()> {
        match &mut self.node_mut(parent)?.kind {
            NodeKind::Internal { children } => {
                let position = children
                    .iter()
                    .position(|c| *c == child)
                    .ok_or(IndexError::ChildNotFound { parent, child })?;
                children.remove(position);
            }
            NodeKind::Leaf { .. } => return Err(IndexError::ChildNotFound { parent, child }),
        }
        self.recompute_own_rectangle(parent)
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// All points in depth-first leaf order.
    pub fn collect_points(&self) -> IndexResult<Vec<(PointId, PointEntry)>> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id)?;
            match node.kind() {
                NodeKind::Leaf { points } => {
                    out.extend(points.iter().map(|(pid, e)| (*pid, e.clone())));
                }
                NodeKind::Internal { children } => stack.extend(children.iter().rev()),
            }
        }
        Ok(out)
    }

    /// Maps each point id to the leaf holding it.
    pub fn leaf_index(&self) -> IndexResult<IndexMap<PointId, NodeId>> {
        let mut index = IndexMap::with_capacity(self.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match self.node(id)?.kind() {
                NodeKind::Leaf { points } => index.extend(points.keys().map(|pid| (*pid, id))),
                NodeKind::Internal { children } => stack.extend(children.iter().rev()),
            }
        }
        Ok(index)
    }

    /// Finds the leaf holding a point by descending only through nodes whose
    /// key contains the point's coordinates.
    pub fn locate(&self, id: PointId, coordinates: &[f64]) -> IndexResult<Option<NodeId>> {
        let mut stack = vec![self.root];
        while let Some(node_id) = stack.pop() {
            let node = self.node(node_id)?;
            if !node.key().contains_point(coordinates) {
                continue;
            }
            match node.kind() {
                NodeKind::Leaf { points } => {
                    if points.contains_key(&id) {
                        return Ok(Some(node_id));
                    }
                }
                NodeKind::Internal { children } => stack.extend(children.iter().rev()),
            }
        }
        Ok(None)
    }
}

/// Rejects points with non-finite coordinates.
pub(crate) fn validate_point(id: PointId, entry: &PointEntry) -> IndexResult<()> {
    if let Some(axis) = entry.coordinates.iter().position(|c| !c.is_finite()) {
        return Err(IndexError::InvalidPoint {
            id,
            reason: format!("coordinate on axis {} is not finite", axis),
        });
    }
    Ok(())
}

impl TreeNode {
    pub(crate) fn leaf_with(points: IndexMap<PointId, PointEntry>) -> Self {
        TreeNode {
            kind: NodeKind::Leaf { points },
            key: Rectangle::empty(),
        }
    }

    pub(crate) fn internal_with(children: Vec<NodeId>) -> Self {
        TreeNode {
            kind: NodeKind::Internal { children },
            key: Rectangle::empty(),
        }
    }
}
