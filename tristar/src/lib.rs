//! # Tristar - R*-tree Spatial Index for 3-D Points
//!
//! This crate maintains an R*-tree over three-dimensional point data. Points
//! are inserted one at a time; the tree keeps every node between `m` and `M`
//! entries and keeps its bounding rectangles tight using the R* heuristics.
//!
//! ## Features
//!
//! - **Subtree Selection**: overlap enlargement just above the leaves, volume
//!   enlargement higher up
//! - **Forced Reinsertion**: the first overflow at a level moves the points
//!   farthest from the leaf's center instead of splitting
//! - **R* Splits**: split axis by minimal margin, split index by minimal
//!   overlap then volume
//! - **Arena Storage**: nodes addressed by id, no parent pointers
//! - **Snapshots**: nested records with JSON and binary codecs
//! - **Integrity Checks**: verify keys, fanout and leaf depth of a whole tree
//!
//! ## Quick Start
//!
//! ```rust
//! use tristar::{PointEntry, RTreeCursor, TreeConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TreeConfig::builder()
//!     .max_entries(4)
//!     .min_entries(2)
//!     .reinsert_count(1)
//!     .build()?;
//! let mut cursor = RTreeCursor::new(config)?;
//!
//! for i in 0..20u64 {
//!     let f = i as f64;
//!     cursor.insert(i, PointEntry::new([f, f * 0.5, 1.0], vec![f]))?;
//! }
//!
//! assert_eq!(cursor.len(), 20);
//! assert!(cursor.check_integrity().is_valid);
//! # Ok(())
//! # }
//! ```
//!
//! ## Snapshots
//!
//! ```rust
//! use tristar::{NodeRecord, PointRecord, RStarTree, RTreeCursor, TreeConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rows = vec![(1u64, 0.0, 0.0, 0.0, 0.5, 0.5), (2, 1.0, 1.0, 1.0, 0.1, 0.9)];
//! let cursor = RTreeCursor::bulk_load(rows.into_iter().map(PointRecord::from), TreeConfig::default())?;
//!
//! let json = cursor.tree().to_snapshot()?.to_json()?;
//! let restored = RStarTree::from_snapshot(&NodeRecord::from_json(&json)?)?;
//! assert_eq!(restored.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod rectangle;
pub mod rstar_tree;
pub mod snapshot;

pub use config::{TreeConfig, TreeConfigBuilder};
pub use errors::{IndexError, IndexResult};
pub use rectangle::Rectangle;
pub use rstar_tree::{
    Attributes, Coordinates, CursorStats, InsertStats, IntegrityReport, NodeId, NodeKind,
    PointEntry, PointId, PointRecord, RStarTree, RTreeCursor, TreeNode,
};
pub use snapshot::NodeRecord;
