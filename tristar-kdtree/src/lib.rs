//! # Tristar k-d - Per-Leaf k-d Trees for Tristar Snapshots
//!
//! This crate builds a static k-d tree over the points of every leaf in a
//! [`tristar::NodeRecord`] snapshot and links each leaf to its tree through
//! the record's `kdtree` field.
//!
//! ## Features
//!
//! - **Median Splits**: each node holds the median point along its axis
//! - **Axis Policies**: cyclic (`depth mod 3`) or largest variance
//! - **Wholesale Rebuilds**: stale ids are cleared before numbering leaves
//! - **Queries**: box and nearest-point search on the in-memory trees
//! - **JSON Forest**: all trees of a snapshot in one object keyed by id
//!
//! ## Quick Start
//!
//! ```rust
//! use tristar::{PointEntry, RTreeCursor, TreeConfig};
//! use tristar_kdtree::{index_leaves, KdForest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cursor = RTreeCursor::new(TreeConfig::default())?;
//! for i in 0..10u64 {
//!     cursor.insert(i, PointEntry::new([i as f64, 0.0, 1.0], vec![]))?;
//! }
//!
//! let mut snapshot = cursor.tree().to_snapshot()?;
//! let forest = index_leaves(&mut snapshot);
//! assert!(!forest.is_empty());
//!
//! let json = forest.to_json()?;
//! assert_eq!(KdForest::from_json(&json)?, forest);
//! # Ok(())
//! # }
//! ```

pub mod forest;
pub mod kdtree;
pub mod policy;

pub use forest::{index_leaves, index_leaves_with, KdForest, KDTREE_ID_PREFIX};
pub use kdtree::{KdNode, KdRecord};
pub use policy::AxisPolicy;
