use serde::{Deserialize, Serialize};

use crate::errors::{IndexError, IndexResult};

/// An axis-aligned box in `d` dimensions.
///
/// `Rectangle` is the key type of every node in the R*-tree: a leaf's key is
/// the bounding box of its points, an internal node's key is the bounding box
/// of its children's keys. It is an immutable value type; every operation
/// returns a new value.
///
/// A distinguished *empty* rectangle (no axes at all) stands for "no extent".
/// It is the identity of [`Rectangle::union`], and every measure of it is zero,
/// so bounding-box folds over an empty collection degenerate cleanly.
///
/// # Examples
///
/// ```rust
/// use tristar::Rectangle;
///
/// let a = Rectangle::from_point(&[0.0, 0.0, 0.0]);
/// let b = Rectangle::from_point(&[1.0, 2.0, 3.0]);
/// let both = a.union(&b);
///
/// assert_eq!(both.volume(), 6.0);
/// assert_eq!(Rectangle::empty().union(&both), both);
/// ```
#[derive(Clone, PartialEq, Default, Debug, Serialize, Deserialize)]
pub struct Rectangle {
    /// Lower corner, one coordinate per axis
    minima: Vec<f64>,
    /// Upper corner, one coordinate per axis
    maxima: Vec<f64>,
}

impl std::fmt::Display for Rectangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "Rectangle(empty)")
        } else {
            write!(f, "Rectangle({:?}, {:?})", self.minima, self.maxima)
        }
    }
}

impl Rectangle {
    /// Creates a rectangle from its two corners.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidOperation`] if the corners have different
    /// (or zero) dimensions, a coordinate is not finite, or a minimum exceeds
    /// the matching maximum.
    pub fn new(minima: Vec<f64>, maxima: Vec<f64>) -> IndexResult<Rectangle> {
        if minima.is_empty() || minima.len() != maxima.len() {
            return Err(IndexError::InvalidOperation(format!(
                "Rectangle corners must share a non-zero dimension (got {} and {})",
                minima.len(),
                maxima.len()
            )));
        }
        for (axis, (lo, hi)) in minima.iter().zip(maxima.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(IndexError::InvalidOperation(format!(
                    "Rectangle coordinate on axis {} is not finite",
                    axis
                )));
            }
            if lo > hi {
                return Err(IndexError::InvalidOperation(format!(
                    "Rectangle minimum {} exceeds maximum {} on axis {}",
                    lo, hi, axis
                )));
            }
        }
        Ok(Rectangle { minima, maxima })
    }

    /// The empty rectangle.
    pub fn empty() -> Rectangle {
        Rectangle::default()
    }

    /// A degenerate rectangle covering exactly one point.
    pub fn from_point(point: &[f64]) -> Rectangle {
        Rectangle {
            minima: point.to_vec(),
            maxima: point.to_vec(),
        }
    }

    /// Smallest rectangle covering every point, or empty for no points.
    pub fn bounding_box_points<P, I>(points: I) -> Rectangle
    where
        P: AsRef<[f64]>,
        I: IntoIterator<Item = P>,
    {
        let mut bbox = Rectangle::empty();
        for point in points {
            bbox.expand(point.as_ref(), point.as_ref());
        }
        bbox
    }

    /// Smallest rectangle covering every rectangle, or empty for none.
    pub fn bounding_box<'a, I>(rectangles: I) -> Rectangle
    where
        I: IntoIterator<Item = &'a Rectangle>,
    {
        let mut bbox = Rectangle::empty();
        for rect in rectangles {
            if !rect.is_empty() {
                bbox.expand(&rect.minima, &rect.maxima);
            }
        }
        bbox
    }

    fn expand(&mut self, lower: &[f64], upper: &[f64]) {
        if self.is_empty() {
            self.minima = lower.to_vec();
            self.maxima = upper.to_vec();
            return;
        }
        debug_assert_eq!(self.minima.len(), lower.len(), "dimension mismatch");
        for (min, lo) in self.minima.iter_mut().zip(lower) {
            *min = min.min(*lo);
        }
        for (max, hi) in self.maxima.iter_mut().zip(upper) {
            *max = max.max(*hi);
        }
    }

    /// Checks if this is the empty rectangle.
    pub fn is_empty(&self) -> bool {
        self.minima.is_empty()
    }

    /// Number of axes (0 for the empty rectangle).
    pub fn dimension(&self) -> usize {
        self.minima.len()
    }

    pub fn minima(&self) -> &[f64] {
        &self.minima
    }

    pub fn maxima(&self) -> &[f64] {
        &self.maxima
    }

    /// Lower bound on `axis`; the empty rectangle sorts after everything.
    pub fn lower(&self, axis: usize) -> f64 {
        self.minima.get(axis).copied().unwrap_or(f64::INFINITY)
    }

    /// Upper bound on `axis`; the empty rectangle sorts after everything.
    pub fn upper(&self, axis: usize) -> f64 {
        self.maxima.get(axis).copied().unwrap_or(f64::INFINITY)
    }

    fn extents(&self) -> impl Iterator<Item = f64> + '_ {
        self.minima
            .iter()
            .zip(self.maxima.iter())
            .map(|(lo, hi)| hi - lo)
    }

    /// Product of the extents, zero for the empty rectangle.
    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.extents().product()
    }

    /// Sum of the lengths of all edges of the box (the R* "margin").
    ///
    /// A `d`-dimensional box has `2^(d-1)` edges parallel to each axis, so this
    /// is `2^(d-1)` times the sum of the extents; in 2-D it is the ordinary
    /// perimeter.
    pub fn perimeter(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let edges_per_axis = 2f64.powi(self.dimension() as i32 - 1);
        edges_per_axis * self.extents().sum::<f64>()
    }

    /// Returns the smallest rectangle covering both rectangles.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        if self.is_empty() {
            return other.clone();
        }
        let mut result = self.clone();
        if !other.is_empty() {
            result.expand(&other.minima, &other.maxima);
        }
        result
    }

    /// Volume of the overlap of two rectangles; zero when they are disjoint,
    /// only touch, or either is empty.
    pub fn intersection_volume(&self, other: &Rectangle) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        let mut volume = 1.0;
        for axis in 0..self.dimension().min(other.dimension()) {
            let overlap = self.maxima[axis].min(other.maxima[axis])
                - self.minima[axis].max(other.minima[axis]);
            if overlap <= 0.0 {
                return 0.0;
            }
            volume *= overlap;
        }
        volume
    }

    /// Checks if this rectangle covers `other` (equal rectangles cover each
    /// other). Everything covers the empty rectangle; the empty rectangle
    /// covers nothing else.
    pub fn contains(&self, other: &Rectangle) -> bool {
        if other.is_empty() {
            return true;
        }
        if self.is_empty() || self.dimension() != other.dimension() {
            return false;
        }
        (0..self.dimension()).all(|axis| {
            self.minima[axis] <= other.minima[axis] && other.maxima[axis] <= self.maxima[axis]
        })
    }

    /// Strict containment: covers `other` and differs from it on at least one
    /// bound. Equal rectangles are never proper supersets of each other.
    pub fn is_proper_superset(&self, other: &Rectangle) -> bool {
        !self.is_empty() && self.contains(other) && self != other
    }

    /// Checks if the point lies inside or on the boundary.
    pub fn contains_point(&self, point: &[f64]) -> bool {
        !self.is_empty()
            && self.dimension() == point.len()
            && point
                .iter()
                .enumerate()
                .all(|(axis, x)| self.minima[axis] <= *x && *x <= self.maxima[axis])
    }

    /// Midpoint of every axis (no coordinates for the empty rectangle).
    pub fn center(&self) -> Vec<f64> {
        self.minima
            .iter()
            .zip(self.maxima.iter())
            .map(|(lo, hi)| (lo + hi) / 2.0)
            .collect()
    }

    /// Squared Euclidean distance between the rectangle's center and `point`.
    pub fn squared_distance_to_point(&self, point: &[f64]) -> f64 {
        self.center()
            .iter()
            .zip(point)
            .map(|(c, x)| (c - x) * (c - x))
            .sum()
    }
}
