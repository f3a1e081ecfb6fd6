//! Trellis SDK - record, navigate and replay application state history
//!
//! This SDK wraps the provenance graph in a thread-safe handle that applies
//! labeled actions, moves the "current" cursor, and notifies observers.
//!
//! # Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use trellis_sdk::{Action, Provenance, StorageMode};
//!
//! #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
//! struct Todos {
//!     name: String,
//!     todos: Vec<String>,
//! }
//!
//! let provenance = Provenance::new(Todos { name: String::new(), todos: vec![] });
//!
//! let rename = Action::new(|state: &Todos, args: &[String]| Todos {
//!     name: args[0].clone(),
//!     ..state.clone()
//! })
//! .set_label("rename")
//! .set_args(["New Name".to_string()]);
//! let renamed = provenance.apply(&rename).unwrap();
//!
//! let add_todo = Action::new(|state: &Todos, args: &[String]| {
//!     let mut next = state.clone();
//!     next.todos.extend(args.iter().cloned());
//!     next
//! })
//! .set_label("addTodo")
//! .set_args(["Task 1".to_string()])
//! .save_state_mode(StorageMode::Complete);
//! provenance.apply(&add_todo).unwrap();
//!
//! // Undo back to the rename and read any node's state at will.
//! provenance.undo().unwrap();
//! assert_eq!(provenance.current_id(), renamed.id);
//! assert_eq!(provenance.current_state().unwrap().name, "New Name");
//! ```
//!
//! # Architecture
//!
//! - [`action`] - Action descriptors and the [`Transition`] capability
//! - [`provenance`] - The [`Provenance`] handle: apply, navigation, observers
//! - [`events`] - Structural-change events and subscriptions
//! - [`config`] - Tracker configuration
//! - [`error`] - Error types

pub mod action;
pub mod config;
pub mod error;
pub mod events;
pub mod provenance;

// Re-exports for convenience
pub use action::{Action, Fallible, Infallible, Transition};
pub use config::{ProvenanceConfig, ProvenanceConfigBuilder};
pub use error::{BoxError, ProvenanceError, Result};
pub use events::{EventKind, ProvenanceEvent, Subscription};
pub use provenance::Provenance;

// Re-export commonly used types from the lower layers
pub use trellis_diff::{DiffEngine, JsonDiff, WholeState};
pub use trellis_graph::{
    ActionType, GraphExport, GraphNode, GraphStats, Metadata, Node, NodeId, Payload,
    StorageMode,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::config::ProvenanceConfig;
    pub use crate::error::ProvenanceError;
    pub use crate::events::ProvenanceEvent;
    pub use crate::provenance::Provenance;
    pub use trellis_graph::{ActionType, NodeId, StorageMode};
}
