//! Per-leaf k-d indexing of real snapshots.

mod kdtree_index_test;
