//! Insertion driver for the R*-tree.
//!
//! An [`RTreeCursor`] owns a tree together with its fixed [`TreeConfig`].
//! Every top-level [`RTreeCursor::insert`] runs one `InsertionPass`, which
//! carries the per-insert state: the levels that already had overflow
//! treatment and the statistics of what happened.
//!
//! Overflow handling follows the R* rules:
//! - the first overflowing leaf at a level gives up its `p` points farthest
//!   from its center, which are reinserted from the root;
//! - any later overflow at that level, any internal overflow and any root
//!   overflow splits the node;
//! - a split that overfills the parent propagates up the insertion path, and
//!   a split of the root grows the tree by one level.

use std::collections::HashMap;

use crate::config::TreeConfig;
use crate::errors::{IndexError, IndexResult};
use crate::rectangle::Rectangle;
use crate::rstar_tree::arena::{validate_point, RStarTree};
use crate::rstar_tree::integrity::IntegrityReport;
use crate::rstar_tree::reinsert::reinsert_candidates;
use crate::rstar_tree::rtree_types::{
    Coordinates, CursorStats, InsertStats, NodeId, PointEntry, PointId, PointRecord, TreeNode,
};
use crate::rstar_tree::split::{plan_leaf_split, plan_node_split};

/// A tree bound to its fanout parameters.
///
/// # Examples
///
/// ```rust
/// use tristar::{PointRecord, RTreeCursor, TreeConfig};
///
/// let records = vec![
///     PointRecord::new(1, [0.0, 0.0, 0.0], vec![]),
///     PointRecord::new(2, [1.0, 0.0, 0.0], vec![]),
///     PointRecord::new(3, [0.0, 1.0, 0.0], vec![]),
///     PointRecord::new(4, [0.0, 0.0, 1.0], vec![]),
///     PointRecord::new(5, [10.0, 10.0, 10.0], vec![]),
/// ];
/// let cursor = RTreeCursor::bulk_load(records, TreeConfig::default()).unwrap();
///
/// assert_eq!(cursor.len(), 5);
/// assert_eq!(cursor.height().unwrap(), 2);
/// assert!(cursor.check_integrity().is_valid);
/// ```
#[derive(Debug, Clone)]
pub struct RTreeCursor {
    tree: RStarTree,
    config: TreeConfig,
    stats: CursorStats,
}

impl RTreeCursor {
    /// Creates a cursor over an empty tree.
    pub fn new(config: TreeConfig) -> IndexResult<Self> {
        Self::with_tree(RStarTree::new(), config)
    }

    /// Binds an existing tree (for example one restored from a snapshot).
    ///
    /// # Errors
    ///
    /// * [`IndexError::InvalidConfig`] if `config` is out of bounds, or if the
    ///   tree does not satisfy it (a snapshot taken under a different fanout)
    pub fn with_tree(tree: RStarTree, config: TreeConfig) -> IndexResult<Self> {
        config.validate()?;
        let report = tree.check_integrity(&config);
        if !report.is_valid {
            let message = format!(
                "tree does not fit max_entries {}, min_entries {}: {}",
                config.max_entries(),
                config.min_entries(),
                report.errors.join("; ")
            );
            log::error!("Rejected tree binding: {}", message);
            return Err(IndexError::InvalidConfig(message));
        }
        Ok(RTreeCursor {
            tree,
            config,
            stats: CursorStats::default(),
        })
    }

    /// Builds a tree from records.
    ///
    /// The first `M - 1` records form the root leaf directly; the rest go
    /// through [`RTreeCursor::insert`] one by one.
    pub fn bulk_load<I>(records: I, config: TreeConfig) -> IndexResult<Self>
    where
        I: IntoIterator<Item = PointRecord>,
    {
        let mut cursor = Self::new(config)?;
        let mut records = records.into_iter();
        let root = cursor.tree.root();
        for record in records.by_ref().take(config.max_entries() - 1) {
            let (id, entry) = record.into_entry();
            cursor.tree.add_point(root, id, entry)?;
        }
        for record in records {
            cursor.insert_record(record)?;
        }
        log::debug!(
            "Bulk loaded {} points into a tree of height {}",
            cursor.len(),
            cursor.height()?
        );
        Ok(cursor)
    }

    /// Inserts a point, handling any overflow it causes.
    ///
    /// # Errors
    ///
    /// * [`IndexError::DuplicatePoint`] if `id` is already indexed
    /// * [`IndexError::InvalidPoint`] if a coordinate is not finite
    /// * [`IndexError::InvariantViolation`] if tree maintenance hits a
    ///   structural fault; the tree should then be discarded
    ///
    /// Cursor statistics only count successful inserts. A failed insert
    /// records nothing, even if it split or reinserted before failing.
    pub fn insert(&mut self, id: PointId, entry: PointEntry) -> IndexResult<InsertStats> {
        if self.tree.contains_point(id) {
            return Err(IndexError::DuplicatePoint(id));
        }
        validate_point(id, &entry)?;

        let mut pass = InsertionPass::new(&mut self.tree, &self.config);
        pass.insert_point(id, entry)?;
        let stats = pass.stats;
        self.stats.record(&stats);
        Ok(stats)
    }

    pub fn insert_record(&mut self, record: PointRecord) -> IndexResult<InsertStats> {
        let (id, entry) = record.into_entry();
        self.insert(id, entry)
    }

    /// Recomputes every rectangle in the tree from the leaves up.
    pub fn update_bounding_rectangles(&mut self) -> IndexResult<()> {
        let root = self.tree.root();
        self.tree.recompute_subtree_rectangles(root)
    }

    pub fn check_integrity(&self) -> IntegrityReport {
        self.tree.check_integrity(&self.config)
    }

    pub fn tree(&self) -> &RStarTree {
        &self.tree
    }

    pub fn into_tree(self) -> RStarTree {
        self.tree
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn stats(&self) -> &CursorStats {
        &self.stats
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn height(&self) -> IndexResult<usize> {
        self.tree.height()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

/// State of one top-level insertion.
struct InsertionPass<'a> {
    tree: &'a mut RStarTree,
    config: &'a TreeConfig,
    /// level -> overflow already treated during this insertion
    level_actions: HashMap<usize, bool>,
    stats: InsertStats,
}

impl<'a> InsertionPass<'a> {
    fn new(tree: &'a mut RStarTree, config: &'a TreeConfig) -> Self {
        InsertionPass {
            tree,
            config,
            level_actions: HashMap::from([(0, false)]),
            stats: InsertStats::default(),
        }
    }

    /// Places a point in the leaf chosen from the root and treats overflow.
    fn insert_point(&mut self, id: PointId, entry: PointEntry) -> IndexResult<()> {
        let entry_key = Rectangle::from_point(&entry.coordinates);
        let root = self.tree.root();
        let (leaf, level) = self.tree.choose_subtree(root, 0, &entry_key)?;
        let path = self.tree.path_to_subtree(root, leaf)?;
        let count = self.tree.node(leaf)?.len();

        self.tree.add_point(leaf, id, entry)?;
        self.refresh_path(&path)?;
        if count < self.config.max_entries() {
            return Ok(());
        }

        if level == 0 {
            self.overflow_treatment(&path)?;
            return Ok(());
        }

        let predecessor = *path
            .len()
            .checked_sub(2)
            .and_then(|i| path.get(i))
            .ok_or_else(|| fault(format!("leaf {} at level {} has no predecessor", leaf, level)))?;
        let split = self.overflow_treatment(&path)?;
        if split && self.tree.node(predecessor)?.len() > self.config.max_entries() {
            let root_split = self.propagate_overflow_treatment(&path[..path.len() - 1])?;
            if root_split {
                log::debug!("Overflow from point {} propagated to the root", id);
            }
        }
        Ok(())
    }

    /// Treats an overflowing node, the last element of `path`, at level
    /// `path.len() - 1`. Returns whether a split happened.
    fn overflow_treatment(&mut self, path: &[NodeId]) -> IndexResult<bool> {
        let target = *path
            .last()
            .ok_or_else(|| fault("overflow treatment on an empty path".to_string()))?;
        let level = path.len() - 1;
        let is_leaf = self.tree.node(target)?.is_leaf();

        let treated = self.level_actions.get(&level).copied().unwrap_or(false);
        if level != 0 && !treated {
            self.level_actions.insert(level, true);
            if is_leaf {
                self.leaf_re_insert(path)?;
                return Ok(false);
            }
        }

        if is_leaf {
            self.split_leaf(path)?;
        } else {
            self.split_node(path)?;
        }
        Ok(true)
    }

    fn split_leaf(&mut self, path: &[NodeId]) -> IndexResult<()> {
        let target = *path
            .last()
            .ok_or_else(|| fault("leaf split on an empty path".to_string()))?;
        let points = self
            .tree
            .node(target)?
            .points()
            .ok_or_else(|| fault(format!("leaf split on internal node {}", target)))?
            .clone();
        if points.len() != self.config.max_entries() + 1 {
            return Err(fault(format!(
                "leaf split on node {} holding {} points, expected {}",
                target,
                points.len(),
                self.config.max_entries() + 1
            )));
        }

        let coordinates: Vec<Coordinates> = points.values().map(|e| e.coordinates).collect();
        let plan = plan_leaf_split(&coordinates, self.config);
        let entries: Vec<(PointId, PointEntry)> = points.into_iter().collect();
        let (first, second) = plan.partition(&entries);
        log::debug!(
            "Splitting leaf {} on axis {} into {} and {} points",
            target,
            plan.axis,
            first.len(),
            second.len()
        );

        let first = self
            .tree
            .allocate(TreeNode::leaf_with(first.into_iter().collect()));
        let second = self
            .tree
            .allocate(TreeNode::leaf_with(second.into_iter().collect()));
        self.replace_with_split(path, first, second)
    }

    fn split_node(&mut self, path: &[NodeId]) -> IndexResult<()> {
        let target = *path
            .last()
            .ok_or_else(|| fault("node split on an empty path".to_string()))?;
        let node = self.tree.node(target)?;
        if node.is_leaf() {
            return Err(fault(format!("node split on leaf {}", target)));
        }
        let children = node.children().to_vec();
        if children.len() != self.config.max_entries() + 1 {
            return Err(fault(format!(
                "node split on node {} holding {} children, expected {}",
                target,
                children.len(),
                self.config.max_entries() + 1
            )));
        }

        let keys = self.tree.child_keys(target)?;
        let plan = plan_node_split(&keys, self.config);
        let (first, second) = plan.partition(&children);
        log::debug!(
            "Splitting node {} on axis {} ({:?} ordering) into {} and {} children",
            target,
            plan.axis,
            plan.edge,
            first.len(),
            second.len()
        );

        let first = self.tree.allocate(TreeNode::internal_with(first));
        let second = self.tree.allocate(TreeNode::internal_with(second));
        self.replace_with_split(path, first, second)
    }

    /// Swaps the split node (last in `path`) for its two halves, under its
    /// predecessor or under a new root.
    fn replace_with_split(
        &mut self,
        path: &[NodeId],
        first: NodeId,
        second: NodeId,
    ) -> IndexResult<()> {
        self.tree.recompute_own_rectangle(first)?;
        self.tree.recompute_own_rectangle(second)?;

        let (target, ancestors) = path
            .split_last()
            .ok_or_else(|| fault("split on an empty path".to_string()))?;
        match ancestors.last() {
            None => {
                let root = self
                    .tree
                    .allocate(TreeNode::internal_with(vec![first, second]));
                self.tree.recompute_own_rectangle(root)?;
                self.tree.set_root(root);
                self.tree.release(*target)?;
                self.stats.root_split = true;
                log::debug!("Root {} split, new root is {}", target, root);
            }
            Some(predecessor) => {
                self.tree.remove_child(*predecessor, *target)?;
                self.tree.release(*target)?;
                self.tree.add_child(*predecessor, first)?;
                self.tree.add_child(*predecessor, second)?;
                self.refresh_path(ancestors)?;
            }
        }
        self.stats.splits += 1;
        Ok(())
    }

    /// Moves the `p` points farthest from the leaf's center out of the leaf
    /// and reinserts them from the root, closest of them first.
    fn leaf_re_insert(&mut self, path: &[NodeId]) -> IndexResult<()> {
        let target = *path
            .last()
            .ok_or_else(|| fault("reinsertion on an empty path".to_string()))?;
        let node = self.tree.node(target)?;
        let points = node
            .points()
            .ok_or_else(|| fault(format!("reinsertion from internal node {}", target)))?;
        let candidates = reinsert_candidates(points, node.key(), self.config.reinsert_count());

        let mut removed = Vec::with_capacity(candidates.len());
        for id in &candidates {
            removed.push((*id, self.tree.remove_point(target, *id)?));
        }
        self.refresh_path(path)?;
        log::debug!("Reinserting {:?} from leaf {}", candidates, target);
        self.stats.reinserted.extend(candidates);

        for (id, entry) in removed.into_iter().rev() {
            self.insert_point(id, entry)?;
        }
        Ok(())
    }

    /// Walks `path` (root first, ending at the predecessor of the node that
    /// split) from its end back to the root, treating every overfull node.
    /// The node at index `i` sits at level `i`. Returns whether the root split.
    fn propagate_overflow_treatment(&mut self, path: &[NodeId]) -> IndexResult<bool> {
        let mut root_split = false;
        for i in (0..path.len()).rev() {
            if self.tree.node(path[i])?.len() > self.config.max_entries() {
                let split = self.overflow_treatment(&path[..=i])?;
                if i == 0 {
                    root_split = split;
                }
            }
        }
        Ok(root_split)
    }

    /// Recomputes rectangles along a root-first path, deepest node first.
    fn refresh_path(&mut self, path: &[NodeId]) -> IndexResult<()> {
        for id in path.iter().rev() {
            self.tree.recompute_own_rectangle(*id)?;
        }
        Ok(())
    }
}

fn fault(message: String) -> IndexError {
    log::error!("R*-tree invariant violated: {}", message);
    IndexError::InvariantViolation(message)
}
