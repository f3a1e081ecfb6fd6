//! Node definitions for the provenance tree.
//!
//! Each node records:
//! - Its identity and its position in the tree (parent and children)
//! - The label, classification and metadata of the action that created it
//! - A payload: either a full state or a delta against its parent

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ulid::Ulid;

/// Free-form metadata attached to a node.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Unique identifier for a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Ulid);

impl NodeId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Short form used in log lines.
    pub fn short(&self) -> String {
        let full = self.0.to_string();
        full[full.len() - 8..].to_string()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classification of the action that produced a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    /// A normal, user-visible step.
    #[default]
    Regular,
    /// A transient step that undo and redo pass over.
    Ephemeral,
}

/// How a node's state is persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageMode {
    /// Store a delta against the parent's state.
    #[default]
    Diff,
    /// Store the full state.
    Complete,
}

/// The persisted payload of a node.
///
/// Serialized as two sibling fields on the node: `storage` names the
/// variant and `payload` carries the delta or the state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "storage", content = "payload")]
pub enum Payload<S, D> {
    /// A delta against the parent node's state.
    Diff(D),
    /// The full state at this node.
    Complete(S),
}

impl<S, D> Payload<S, D> {
    pub fn storage(&self) -> StorageMode {
        match self {
            Payload::Diff(_) => StorageMode::Diff,
            Payload::Complete(_) => StorageMode::Complete,
        }
    }

    pub fn is_diff(&self) -> bool {
        matches!(self, Payload::Diff(_))
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Payload::Complete(_))
    }

    /// The stored state, if this payload is complete.
    pub fn state(&self) -> Option<&S> {
        match self {
            Payload::Complete(state) => Some(state),
            Payload::Diff(_) => None,
        }
    }

    /// The stored delta, if this payload is a diff.
    pub fn delta(&self) -> Option<&D> {
        match self {
            Payload::Diff(delta) => Some(delta),
            Payload::Complete(_) => None,
        }
    }
}

/// Descriptive fields copied from an action onto the node it creates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMeta {
    pub label: String,
    pub action_type: ActionType,
    pub metadata: Metadata,
    pub event_type: Option<String>,
}

impl NodeMeta {
    pub fn new(label: impl Into<String>) -> Self {
        NodeMeta {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_action_type(mut self, action_type: ActionType) -> Self {
        self.action_type = action_type;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_event_type(mut self, event_type: Option<String>) -> Self {
        self.event_type = event_type;
        self
    }
}

/// A recorded snapshot point in the provenance tree.
///
/// Nodes are created by the graph and never modified afterwards, except
/// that the graph appends to `child_ids` when a new child is committed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node<S, D> {
    pub id: NodeId,

    /// `None` only for the root.
    pub parent_id: Option<NodeId>,

    /// Children in creation order.
    pub child_ids: Vec<NodeId>,

    pub label: String,

    pub classification: ActionType,

    pub metadata: Metadata,

    pub event_type: Option<String>,

    /// Milliseconds since the Unix epoch.
    pub created_at: i64,

    #[serde(flatten)]
    pub payload: Payload<S, D>,
}

impl<S, D> Node<S, D> {
    pub(crate) fn new(
        parent_id: Option<NodeId>,
        meta: NodeMeta,
        payload: Payload<S, D>,
    ) -> Self {
        Node {
            id: NodeId::new(),
            parent_id,
            child_ids: Vec::new(),
            label: meta.label,
            classification: meta.action_type,
            metadata: meta.metadata,
            event_type: meta.event_type,
            created_at: chrono::Utc::now().timestamp_millis(),
            payload,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.child_ids.is_empty()
    }

    pub fn is_ephemeral(&self) -> bool {
        self.classification == ActionType::Ephemeral
    }

    pub fn storage(&self) -> StorageMode {
        self.payload.storage()
    }
}
