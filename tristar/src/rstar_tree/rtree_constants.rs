//! Constants for the R*-tree.

/// Number of spatial axes of indexed points
pub const DIMENSIONS: usize = 3;

/// Default maximum number of entries per node (M)
pub const DEFAULT_MAX_ENTRIES: usize = 4;

/// Default minimum number of entries per non-root node (m)
pub const DEFAULT_MIN_ENTRIES: usize = 2;

/// Default number of points moved by one forced reinsertion (p)
pub const DEFAULT_REINSERT_COUNT: usize = 1;
