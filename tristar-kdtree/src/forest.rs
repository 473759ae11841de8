//! Per-leaf k-d indexing of R*-tree snapshots.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tristar::{IndexResult, NodeRecord};

use crate::kdtree::{KdNode, KdRecord};
use crate::policy::AxisPolicy;

/// Prefix of the ids written into `NodeRecord::kdtree`.
pub const KDTREE_ID_PREFIX: &str = "kdtree_";

/// All k-d trees of one snapshot, keyed by the id stored in the leaf.
///
/// Serializes as a plain JSON object `{"kdtree_1": {...}, ...}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KdForest {
    trees: IndexMap<String, KdRecord>,
}

impl KdForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&KdRecord> {
        self.trees.get(id)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Trees in the order their leaves were visited.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &KdRecord)> {
        self.trees.iter()
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

    pub fn save_json(&self, path: impl AsRef<Path>) -> IndexResult<()> {
        std::fs::write(path, self.to_pretty_json()?)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> IndexResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Builds a k-d tree for every leaf of `record` that holds points, using
/// [`AxisPolicy::MaxVariance`].
///
/// See [`index_leaves_with`].
pub fn index_leaves(record: &mut NodeRecord) -> KdForest {
    index_leaves_with(record, AxisPolicy::default())
}

/// Rebuilds the k-d index of a snapshot from scratch.
///
/// Every `kdtree` field is cleared first. Leaves holding points are then
/// numbered `kdtree_1`, `kdtree_2`, ... in depth-first order, parents
/// before children and children left to right, and get their id written
/// back into the record.
pub fn index_leaves_with(record: &mut NodeRecord, policy: AxisPolicy) -> KdForest {
    clear_ids(record);
    let mut forest = KdForest::new();
    assign_ids(record, policy, &mut forest);
    log::debug!(
        "Indexed {} leaves holding {} points",
        forest.len(),
        record.point_count()
    );
    forest
}

fn clear_ids(record: &mut NodeRecord) {
    record.kdtree = None;
    for child in record.children.iter_mut() {
        clear_ids(child);
    }
}

fn assign_ids(record: &mut NodeRecord, policy: AxisPolicy, forest: &mut KdForest) {
    if record.is_leaf {
        let points: Vec<_> = record
            .points
            .iter()
            .flat_map(|points| points.iter())
            .map(|(id, (coordinates, _))| (*id, *coordinates))
            .collect();
        if let Some(root) = KdNode::build(points, policy) {
            let id = format!("{}{}", KDTREE_ID_PREFIX, forest.len() + 1);
            log::trace!("Built {} over {} points", id, root.len());
            forest.trees.insert(id.clone(), KdRecord::from(root.as_ref()));
            record.kdtree = Some(id);
        }
        return;
    }
    for child in record.children.iter_mut() {
        assign_ids(child, policy, forest);
    }
}
