//! In-memory R*-tree over 3-D points.
//!
//! The tree is stored in a node arena (`arena`) and grown by an insertion
//! cursor (`cursor`) implementing the R* heuristics:
//! - subtree selection by overlap and volume enlargement (`selection`)
//! - margin-driven split axis and overlap-driven split index (`split`)
//! - forced reinsertion of the points farthest from a leaf's center
//!   (`reinsert`), once per level and insertion
//!
//! Nodes keep no parent references; the chain from the root to a node is
//! recovered on demand (`path`).

pub mod rtree_constants;
pub mod rtree_types;
mod arena;
mod cursor;
pub mod integrity;
mod path;
pub mod reinsert;
pub mod selection;
pub mod split;

pub use arena::RStarTree;
pub use cursor::RTreeCursor;
pub use integrity::IntegrityReport;
pub use rtree_constants::DIMENSIONS;
pub use rtree_types::{
    Attributes, Coordinates, CursorStats, InsertStats, NodeId, NodeKind, PointEntry, PointId,
    PointRecord, TreeNode,
};
