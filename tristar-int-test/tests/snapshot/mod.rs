//! Snapshot integration tests: codecs, files and restoring trees.

mod snapshot_test;
