//! Error types for the Trellis SDK.

use thiserror::Error;
use trellis_diff::{DiffError, PatchError};
use trellis_graph::{GraphError, NodeId};

/// A boxed error returned by a caller-supplied transition.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for SDK operations.
///
/// Every mutating operation is all-or-nothing: when one of these is
/// returned, the graph and its cursor are exactly as they were before the
/// call.
#[derive(Error, Debug)]
pub enum ProvenanceError {
    /// `apply` was called on an action without a label.
    #[error("Please specify a label for the action")]
    MissingLabel,

    /// The action's transition returned an error.
    #[error("Transition '{label}' failed: {source}")]
    Transition {
        label: String,
        #[source]
        source: BoxError,
    },

    /// A stored delta did not fit the state it was replayed on.
    #[error("Patch failed at node {node}: {source}")]
    Patch {
        node: NodeId,
        #[source]
        source: PatchError,
    },

    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    #[error("Diff failed: {0}")]
    Diff(#[from] DiffError),

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

impl From<GraphError> for ProvenanceError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::UnknownNode(id) => ProvenanceError::UnknownNode(id),
            GraphError::Patch { node, source } => ProvenanceError::Patch { node, source },
            GraphError::Diff(e) => ProvenanceError::Diff(e),
            GraphError::InvalidGraph(msg) => ProvenanceError::InvalidGraph(msg),
            GraphError::Serialization(msg) => ProvenanceError::Serialization(msg),
            e @ GraphError::UnsupportedVersion { .. } => {
                ProvenanceError::InvalidGraph(e.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for ProvenanceError {
    fn from(err: serde_json::Error) -> Self {
        ProvenanceError::Serialization(err.to_string())
    }
}

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, ProvenanceError>;
