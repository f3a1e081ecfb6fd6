//! Error types for the provenance graph.

use crate::node::NodeId;
use thiserror::Error;
use trellis_diff::{DiffError, PatchError};

/// Errors that can occur in graph operations.
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    #[error("Patch failed at node {node}: {source}")]
    Patch {
        node: NodeId,
        #[source]
        source: PatchError,
    },

    #[error("Diff failed: {0}")]
    Diff(#[from] DiffError),

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported export version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: u8, actual: u8 },
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
