//! Forced reinsertion candidate selection.

use indexmap::IndexMap;

use crate::rectangle::Rectangle;
use crate::rstar_tree::rtree_types::{PointEntry, PointId};

/// Picks the `count` points of an overflowing leaf lying farthest from the
/// center of `key`, farthest first. Points at equal distance keep their
/// insertion order.
pub fn reinsert_candidates(
    points: &IndexMap<PointId, PointEntry>,
    key: &Rectangle,
    count: usize,
) -> Vec<PointId> {
    let mut by_distance: Vec<(PointId, f64)> = points
        .iter()
        .map(|(id, entry)| (*id, key.squared_distance_to_point(&entry.coordinates)))
        .collect();
    by_distance.sort_by(|a, b| b.1.total_cmp(&a.1));
    by_distance
        .into_iter()
        .take(count)
        .map(|(id, _)| id)
        .collect()
}
