//! Error types for the tristar index.
//!
//! Every fallible operation returns [`IndexResult`]. Two families of errors
//! share the enum:
//! - caller errors (bad configuration, bad points, unknown ids, malformed
//!   snapshots), which are recoverable;
//! - [`IndexError::InvariantViolation`], which means the structural
//!   maintenance logic itself is broken. The operation that hit it is aborted
//!   and the tree should be discarded.

use std::io;
use thiserror::Error;

use crate::rstar_tree::{NodeId, PointId};

/// Errors that can occur while building, mutating or persisting an index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid point {id}: {reason}")]
    InvalidPoint { id: PointId, reason: String },

    #[error("Point {0} is already indexed")]
    DuplicatePoint(PointId),

    #[error("Point {0} not found")]
    PointNotFound(PointId),

    #[error("Child {child} not found under node {parent}")]
    ChildNotFound { parent: NodeId, child: NodeId },

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("No path from node {from} to node {to}")]
    PathNotFound { from: NodeId, to: NodeId },

    #[error("Illegal node: {0}")]
    IllegalNode(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
