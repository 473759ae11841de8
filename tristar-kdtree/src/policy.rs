//! Split axis selection for k-d tree construction.

use serde::{Deserialize, Serialize};
use tristar::rstar_tree::DIMENSIONS;
use tristar::Coordinates;

/// How a k-d node picks the axis it splits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisPolicy {
    /// Axis is `depth mod 3`.
    Cyclic,
    /// Axis with the largest population variance of the node's points.
    /// Ties go to the lowest axis.
    #[default]
    MaxVariance,
}

impl AxisPolicy {
    /// Picks the split axis for `points` at `depth`.
    pub fn choose_axis<T>(&self, points: &[(T, Coordinates)], depth: usize) -> usize {
        match self {
            AxisPolicy::Cyclic => depth % DIMENSIONS,
            AxisPolicy::MaxVariance => {
                let mut best_axis = 0;
                let mut best_variance = f64::NEG_INFINITY;
                for axis in 0..DIMENSIONS {
                    let variance = population_variance(points.iter().map(|(_, c)| c[axis]));
                    if variance > best_variance {
                        best_axis = axis;
                        best_variance = variance;
                    }
                }
                best_axis
            }
        }
    }
}

/// Population variance, zero for an empty sequence.
pub fn population_variance(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let (count, sum) = values
        .clone()
        .fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if count == 0 {
        return 0.0;
    }
    let mean = sum / count as f64;
    values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64
}
