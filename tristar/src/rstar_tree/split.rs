//! R* split strategy.
//!
//! An overflowing node holds `M + 1` items. For every axis the items are
//! sorted and every split position `k` in `m..=M+1-m` is tried, giving two
//! groups `items[..k]` and `items[k..]`. The axis with the smallest total
//! margin over all positions wins; along it, the position with the smallest
//! (overlap, combined volume) wins.
//!
//! Leaf items are points, sorted by their coordinate. Internal items are child
//! rectangles, sorted both by lower and by upper bound.
//!
//! Everything here is pure: the functions take item geometry and return
//! orderings and positions. Applying a split is up to the cursor.

use crate::config::TreeConfig;
use crate::rectangle::Rectangle;
use crate::rstar_tree::rtree_constants::DIMENSIONS;
use crate::rstar_tree::rtree_types::Coordinates;
use crate::rstar_tree::selection::first_minimum;

/// Which bound of a child rectangle an ordering sorts by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortEdge {
    Lower,
    Upper,
}

/// The chosen split of an overflowing node.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    pub axis: usize,
    /// Size of the first group
    pub index: usize,
    pub edge: SortEdge,
    /// Item positions in the winning sort order
    pub order: Vec<usize>,
}

impl SplitPlan {
    /// Splits `items` (in their original order) into the two planned groups.
    pub fn partition<T: Clone>(&self, items: &[T]) -> (Vec<T>, Vec<T>) {
        let (first, second) = self.order.split_at(self.index);
        (
            first.iter().map(|&i| items[i].clone()).collect(),
            second.iter().map(|&i| items[i].clone()).collect(),
        )
    }
}

/// Stable ordering of points by their coordinate on `axis`.
pub fn sort_points(points: &[Coordinates], axis: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| points[a][axis].total_cmp(&points[b][axis]));
    order
}

/// Stable ordering of rectangles by one of their bounds on `axis`.
pub fn sort_rectangles(keys: &[Rectangle], axis: usize, edge: SortEdge) -> Vec<usize> {
    let bound = |r: &Rectangle| match edge {
        SortEdge::Lower => r.lower(axis),
        SortEdge::Upper => r.upper(axis),
    };
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| bound(&keys[a]).total_cmp(&bound(&keys[b])));
    order
}

fn point_groups(points: &[Coordinates], order: &[usize], k: usize) -> (Rectangle, Rectangle) {
    let (first, second) = order.split_at(k);
    (
        Rectangle::bounding_box_points(first.iter().map(|&i| points[i])),
        Rectangle::bounding_box_points(second.iter().map(|&i| points[i])),
    )
}

fn rectangle_groups(keys: &[Rectangle], order: &[usize], k: usize) -> (Rectangle, Rectangle) {
    let (first, second) = order.split_at(k);
    (
        Rectangle::bounding_box(first.iter().map(|&i| &keys[i])),
        Rectangle::bounding_box(second.iter().map(|&i| &keys[i])),
    )
}

fn margin(groups: (Rectangle, Rectangle)) -> f64 {
    groups.0.perimeter() + groups.1.perimeter()
}

fn overlap_and_volume(groups: (Rectangle, Rectangle)) -> [f64; 2] {
    [
        groups.0.intersection_volume(&groups.1),
        groups.0.volume() + groups.1.volume(),
    ]
}

/// Axis whose sorted points give the smallest margin sum; lowest axis on ties.
pub fn choose_split_axis_leaf(points: &[Coordinates], config: &TreeConfig) -> usize {
    let sums = (0..DIMENSIONS).map(|axis| {
        let order = sort_points(points, axis);
        [config
            .split_range()
            .map(|k| margin(point_groups(points, &order, k)))
            .sum::<f64>()]
    });
    first_minimum(sums).unwrap_or(0)
}

/// Split position along `axis`; smallest `k` on ties.
pub fn choose_split_index_leaf(points: &[Coordinates], axis: usize, config: &TreeConfig) -> usize {
    let order = sort_points(points, axis);
    let positions: Vec<usize> = config.split_range().collect();
    let scores = positions
        .iter()
        .map(|&k| overlap_and_volume(point_groups(points, &order, k)));
    first_minimum(scores)
        .map(|i| positions[i])
        .unwrap_or(config.min_entries())
}

/// Axis whose lower and upper orderings give the smallest margin sum.
pub fn choose_split_axis_node(keys: &[Rectangle], config: &TreeConfig) -> usize {
    let sums = (0..DIMENSIONS).map(|axis| {
        let by_lower = sort_rectangles(keys, axis, SortEdge::Lower);
        let by_upper = sort_rectangles(keys, axis, SortEdge::Upper);
        [config
            .split_range()
            .map(|k| {
                margin(rectangle_groups(keys, &by_lower, k))
                    + margin(rectangle_groups(keys, &by_upper, k))
            })
            .sum::<f64>()]
    });
    first_minimum(sums).unwrap_or(0)
}

/// Split position and ordering along `axis`. Candidates are ranked by
/// position first, lower ordering before upper, and the first minimum wins.
pub fn choose_split_index_node(
    keys: &[Rectangle],
    axis: usize,
    config: &TreeConfig,
) -> (usize, SortEdge) {
    let by_lower = sort_rectangles(keys, axis, SortEdge::Lower);
    let by_upper = sort_rectangles(keys, axis, SortEdge::Upper);
    let candidates: Vec<(usize, SortEdge)> = config
        .split_range()
        .flat_map(|k| [(k, SortEdge::Lower), (k, SortEdge::Upper)])
        .collect();
    let scores = candidates.iter().map(|&(k, edge)| {
        let order = match edge {
            SortEdge::Lower => &by_lower,
            SortEdge::Upper => &by_upper,
        };
        overlap_and_volume(rectangle_groups(keys, order, k))
    });
    first_minimum(scores)
        .map(|i| candidates[i])
        .unwrap_or((config.min_entries(), SortEdge::Lower))
}

/// Plans the split of an overflowing leaf.
pub fn plan_leaf_split(points: &[Coordinates], config: &TreeConfig) -> SplitPlan {
    let axis = choose_split_axis_leaf(points, config);
    let index = choose_split_index_leaf(points, axis, config);
    SplitPlan {
        axis,
        index,
        edge: SortEdge::Lower,
        order: sort_points(points, axis),
    }
}

/// Plans the split of an overflowing internal node. The groups follow the
/// ordering that won the index selection.
pub fn plan_node_split(keys: &[Rectangle], config: &TreeConfig) -> SplitPlan {
    let axis = choose_split_axis_node(keys, config);
    let (index, edge) = choose_split_index_node(keys, axis, config);
    SplitPlan {
        axis,
        index,
        edge,
        order: sort_rectangles(keys, axis, edge),
    }
}
