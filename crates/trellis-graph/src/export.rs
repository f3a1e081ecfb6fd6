//! Export and import of whole provenance graphs.
//!
//! An export lists every node in creation order together with the root and
//! the cursor. Importing re-checks every structural invariant before the
//! graph is rebuilt, so a corrupt or hand-edited export is rejected instead
//! of producing a graph that cannot be navigated.

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::graph::ProvenanceGraph;
use crate::node::{Node, NodeId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};
use trellis_diff::DiffEngine;

/// Current export format version.
pub const EXPORT_VERSION: u8 = 1;

/// A serializable copy of a provenance graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphExport<S, D> {
    pub version: u8,
    pub root: NodeId,
    pub current: NodeId,
    pub nodes: Vec<Node<S, D>>,
}

impl<S, E> ProvenanceGraph<S, E>
where
    S: Clone,
    E: DiffEngine<S>,
{
    /// Copy every node and the cursor into an export.
    pub fn export(&self) -> GraphExport<S, E::Delta> {
        GraphExport {
            version: EXPORT_VERSION,
            root: self.root(),
            current: self.current(),
            nodes: self.nodes().cloned().collect(),
        }
    }

    /// Rebuild a graph from an export, validating it first.
    pub fn from_export(
        export: GraphExport<S, E::Delta>,
        engine: E,
        config: GraphConfig,
    ) -> Result<Self> {
        if let Err(err) = validate(&export) {
            warn!(error = %err, "rejected graph import");
            return Err(err);
        }
        debug!(nodes = export.nodes.len(), "imported provenance graph");
        Ok(ProvenanceGraph::from_parts(
            engine,
            config,
            export.nodes,
            export.root,
            export.current,
        ))
    }
}

impl<S, E> ProvenanceGraph<S, E>
where
    S: Clone + Serialize + DeserializeOwned,
    E: DiffEngine<S>,
{
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.export())?)
    }

    pub fn from_json(json: &str, engine: E, config: GraphConfig) -> Result<Self> {
        let export: GraphExport<S, E::Delta> = serde_json::from_str(json)?;
        Self::from_export(export, engine, config)
    }
}

fn invalid(msg: impl Into<String>) -> GraphError {
    GraphError::InvalidGraph(msg.into())
}

fn validate<S, D>(export: &GraphExport<S, D>) -> Result<()> {
    if export.version != EXPORT_VERSION {
        return Err(GraphError::UnsupportedVersion {
            expected: EXPORT_VERSION,
            actual: export.version,
        });
    }

    let mut by_id: HashMap<NodeId, &Node<S, D>> = HashMap::new();
    for node in &export.nodes {
        if by_id.insert(node.id, node).is_some() {
            return Err(invalid(format!("duplicate node id {}", node.id)));
        }
    }

    let roots: Vec<&Node<S, D>> = export.nodes.iter().filter(|n| n.is_root()).collect();
    match roots.as_slice() {
        [root] if root.id == export.root => {
            if !root.payload.is_complete() {
                return Err(invalid("root node must store a complete state"));
            }
        }
        [root] => {
            return Err(invalid(format!(
                "root is {} but export names {}",
                root.id, export.root
            )))
        }
        _ => return Err(invalid(format!("expected one root, found {}", roots.len()))),
    }

    if !by_id.contains_key(&export.current) {
        return Err(invalid(format!("cursor {} is not a node", export.current)));
    }

    let mut child_refs = 0;
    for node in &export.nodes {
        if let Some(parent) = node.parent_id {
            if !by_id.contains_key(&parent) {
                return Err(invalid(format!(
                    "node {} names missing parent {}",
                    node.id, parent
                )));
            }
        }

        let mut seen = HashSet::new();
        for child in &node.child_ids {
            if !seen.insert(*child) {
                return Err(invalid(format!("node {} lists child {} twice", node.id, child)));
            }
            match by_id.get(child) {
                Some(c) if c.parent_id == Some(node.id) => {}
                _ => {
                    return Err(invalid(format!(
                        "node {} lists {} as a child but is not its parent",
                        node.id, child
                    )))
                }
            }
        }
        child_refs += node.child_ids.len();
    }

    if child_refs != export.nodes.len() - 1 {
        return Err(invalid("child lists do not cover every non-root node"));
    }

    // Every node must hang off the root; anything else sits on a cycle.
    let mut reached = HashSet::from([export.root]);
    let mut queue = VecDeque::from([export.root]);
    while let Some(id) = queue.pop_front() {
        for child in &by_id[&id].child_ids {
            if reached.insert(*child) {
                queue.push_back(*child);
            }
        }
    }
    if reached.len() != export.nodes.len() {
        return Err(invalid("graph contains nodes unreachable from the root"));
    }

    Ok(())
}
