//! Static k-d trees over the points of one leaf.
//!
//! A tree is built once from a fixed point set: each node takes the median
//! point along its split axis, points before it in sorted order go left and
//! points after it go right. Sorting is stable, so points with equal
//! coordinates on the axis keep their input order.

use serde::{Deserialize, Serialize};
use tristar::{Coordinates, PointId, Rectangle};

use crate::policy::AxisPolicy;

/// In-memory k-d node. Keeps the point id so queries can report it.
#[derive(Debug, Clone, PartialEq)]
pub struct KdNode {
    pub id: PointId,
    pub point: Coordinates,
    pub axis: usize,
    pub left: Option<Box<KdNode>>,
    pub right: Option<Box<KdNode>>,
}

impl KdNode {
    /// Builds a tree over `points`, `None` when there are none.
    pub fn build(points: Vec<(PointId, Coordinates)>, policy: AxisPolicy) -> Option<Box<KdNode>> {
        Self::build_at(points, policy, 0)
    }

    fn build_at(
        mut points: Vec<(PointId, Coordinates)>,
        policy: AxisPolicy,
        depth: usize,
    ) -> Option<Box<KdNode>> {
        if points.is_empty() {
            return None;
        }
        let axis = policy.choose_axis(&points, depth);
        points.sort_by(|a, b| a.1[axis].total_cmp(&b.1[axis]));

        let median = points.len() / 2;
        let right = points.split_off(median + 1);
        let (id, point) = points.pop()?;
        Some(Box::new(KdNode {
            id,
            point,
            axis,
            left: Self::build_at(points, policy, depth + 1),
            right: Self::build_at(right, policy, depth + 1),
        }))
    }

    pub fn len(&self) -> usize {
        1 + self.left.as_ref().map_or(0, |n| n.len()) + self.right.as_ref().map_or(0, |n| n.len())
    }

    /// Number of levels, a single node has depth 1.
    pub fn depth(&self) -> usize {
        let left = self.left.as_ref().map_or(0, |n| n.depth());
        let right = self.right.as_ref().map_or(0, |n| n.depth());
        1 + left.max(right)
    }

    /// Ids of the points inside `rect` (boundary included), in preorder.
    pub fn within(&self, rect: &Rectangle) -> Vec<PointId> {
        let mut found = Vec::new();
        if !rect.is_empty() {
            self.collect_within(rect, &mut found);
        }
        found
    }

    fn collect_within(&self, rect: &Rectangle, found: &mut Vec<PointId>) {
        if rect.contains_point(&self.point) {
            found.push(self.id);
        }
        let split = self.point[self.axis];
        if let Some(left) = &self.left {
            if rect.lower(self.axis) <= split {
                left.collect_within(rect, found);
            }
        }
        if let Some(right) = &self.right {
            if rect.upper(self.axis) >= split {
                right.collect_within(rect, found);
            }
        }
    }

    /// Closest point to `query` with its squared distance. On equal
    /// distances the first point reached wins.
    pub fn nearest(&self, query: &Coordinates) -> (PointId, f64) {
        let mut best = (self.id, squared_distance(&self.point, query));
        self.search_nearest(query, &mut best);
        best
    }

    fn search_nearest(&self, query: &Coordinates, best: &mut (PointId, f64)) {
        let distance = squared_distance(&self.point, query);
        if distance < best.1 {
            *best = (self.id, distance);
        }
        let diff = query[self.axis] - self.point[self.axis];
        let (near, far) = if diff <= 0.0 {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };
        if let Some(near) = near {
            near.search_nearest(query, best);
        }
        if let Some(far) = far {
            if diff * diff <= best.1 {
                far.search_nearest(query, best);
            }
        }
    }
}

fn squared_distance(a: &Coordinates, b: &Coordinates) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Serialized form of a k-d node: `{point, axis, left, right}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdRecord {
    pub point: Coordinates,
    pub axis: usize,
    pub left: Option<Box<KdRecord>>,
    pub right: Option<Box<KdRecord>>,
}

impl KdRecord {
    pub fn len(&self) -> usize {
        1 + self.left.as_ref().map_or(0, |n| n.len()) + self.right.as_ref().map_or(0, |n| n.len())
    }

    /// Point coordinates in preorder.
    pub fn points(&self) -> Vec<Coordinates> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_points(&mut out);
        out
    }

    fn collect_points(&self, out: &mut Vec<Coordinates>) {
        out.push(self.point);
        if let Some(left) = &self.left {
            left.collect_points(out);
        }
        if let Some(right) = &self.right {
            right.collect_points(out);
        }
    }
}

impl From<&KdNode> for KdRecord {
    fn from(node: &KdNode) -> Self {
        KdRecord {
            point: node.point,
            axis: node.axis,
            left: node.left.as_deref().map(|n| Box::new(KdRecord::from(n))),
            right: node.right.as_deref().map(|n| Box::new(KdRecord::from(n))),
        }
    }
}
