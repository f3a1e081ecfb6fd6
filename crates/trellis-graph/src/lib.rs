//! # trellis-graph
//!
//! Provenance tree for the Trellis engine.
//!
//! This crate provides:
//! - An append-only tree of nodes with a movable "current" cursor
//! - Per-node storage as either a full state or a delta against the parent
//! - State reconstruction from the nearest complete ancestor
//! - A bounded cache of materialized states
//! - Validated export and import of whole graphs
//!
//! ## Architecture
//!
//! Nodes live in a flat arena keyed by [`NodeId`], with parent and child
//! links stored as ids. A node is only ever appended under the current
//! node and is never modified afterwards, which keeps the arena a single
//! rooted tree and makes every cached state valid forever.
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use trellis_diff::JsonDiff;
//! use trellis_graph::{NodeMeta, ProvenanceGraph, StorageMode};
//!
//! let mut graph = ProvenanceGraph::new(json!({ "counter": 0 }), JsonDiff);
//!
//! let base = graph.reconstruct(&graph.current()).unwrap();
//! let next = json!({ "counter": 1 });
//! let id = graph
//!     .commit(&base, next, NodeMeta::new("increment"), StorageMode::Diff)
//!     .unwrap()
//!     .id;
//!
//! assert_eq!(graph.current(), id);
//! assert_eq!(graph.reconstruct(&id).unwrap(), json!({ "counter": 1 }));
//! ```

mod cache;
mod config;
mod error;
mod export;
mod graph;
mod node;

pub use cache::{CacheStats, StateCache};
pub use config::GraphConfig;
pub use error::{GraphError, Result};
pub use export::{GraphExport, EXPORT_VERSION};
pub use graph::{GraphNode, GraphStats, ProvenanceGraph};
pub use node::{ActionType, Metadata, Node, NodeId, NodeMeta, Payload, StorageMode};
