//! The provenance tree and its cursor.
//!
//! Nodes live in a flat arena indexed by [`NodeId`]; parent and child links
//! are stored as ids. Nodes are only ever appended as children of the
//! current node, so the arena always forms a single rooted tree.

use crate::cache::{CacheStats, StateCache};
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::node::{Node, NodeId, NodeMeta, Payload, StorageMode};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};
use trellis_diff::{DiffEngine, DiffError};

/// A node whose delta type is the one produced by engine `E`.
pub type GraphNode<S, E> = Node<S, <E as DiffEngine<S>>::Delta>;

/// An append-only tree of provenance nodes with a movable cursor.
pub struct ProvenanceGraph<S, E: DiffEngine<S>> {
    engine: E,
    config: GraphConfig,
    nodes: Vec<GraphNode<S, E>>,
    index: HashMap<NodeId, usize>,
    root: NodeId,
    current: NodeId,
    cache: StateCache<S>,
}

impl<S, E> ProvenanceGraph<S, E>
where
    S: Clone,
    E: DiffEngine<S>,
{
    /// Create a graph whose root stores `initial` in full.
    pub fn new(initial: S, engine: E) -> Self {
        Self::with_config(initial, engine, GraphConfig::default())
    }

    pub fn with_config(initial: S, engine: E, config: GraphConfig) -> Self {
        let root = Node::new(None, NodeMeta::new("Root"), Payload::Complete(initial));
        let root_id = root.id;
        debug!(root = %root_id, "created provenance graph");

        let mut index = HashMap::new();
        index.insert(root_id, 0);

        ProvenanceGraph {
            engine,
            cache: StateCache::new(config.cache_capacity),
            config,
            nodes: vec![root],
            index,
            root: root_id,
            current: root_id,
        }
    }

    /// Assemble a graph from nodes that have already been validated.
    pub(crate) fn from_parts(
        engine: E,
        config: GraphConfig,
        nodes: Vec<GraphNode<S, E>>,
        root: NodeId,
        current: NodeId,
    ) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id, i))
            .collect();

        ProvenanceGraph {
            engine,
            cache: StateCache::new(config.cache_capacity),
            config,
            nodes,
            index,
            root,
            current,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &GraphNode<S, E> {
        &self.nodes[self.index[&self.root]]
    }

    /// The id the cursor points at.
    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn current_node(&self) -> &GraphNode<S, E> {
        &self.nodes[self.index[&self.current]]
    }

    pub fn get(&self, id: &NodeId) -> Option<&GraphNode<S, E>> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Like [`get`](Self::get), but fails with `UnknownNode`.
    pub fn node(&self, id: &NodeId) -> Result<&GraphNode<S, E>> {
        self.get(id).ok_or(GraphError::UnknownNode(*id))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from construction.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order, root first.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode<S, E>> {
        self.nodes.iter()
    }

    pub fn children(&self, id: &NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.child_ids)
    }

    pub fn parent(&self, id: &NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent_id)
    }

    /// Nodes without children.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.id)
            .collect()
    }

    /// Ids on the path from the root down to `id`, inclusive at both ends.
    pub fn path_from_root(&self, id: &NodeId) -> Result<Vec<NodeId>> {
        let mut path = vec![*id];
        let mut cursor = self.node(id)?;
        while let Some(parent) = cursor.parent_id {
            path.push(parent);
            cursor = self.node(&parent)?;
        }
        path.reverse();
        Ok(path)
    }

    /// Number of edges between the root and `id`.
    pub fn depth(&self, id: &NodeId) -> Result<usize> {
        Ok(self.path_from_root(id)?.len() - 1)
    }

    /// Whether `ancestor` lies on the path from the root to `id`.
    pub fn is_ancestor(&self, ancestor: &NodeId, id: &NodeId) -> Result<bool> {
        self.node(ancestor)?;
        let mut cursor = self.node(id)?.parent_id;
        while let Some(parent) = cursor {
            if parent == *ancestor {
                return Ok(true);
            }
            cursor = self.node(&parent)?.parent_id;
        }
        Ok(false)
    }

    /// Number of diff nodes between `id` and its nearest complete ancestor
    /// (0 when `id` itself stores a full state).
    pub fn diff_chain_len(&self, id: &NodeId) -> Result<usize> {
        let mut len = 0;
        let mut cursor = self.node(id)?;
        while cursor.payload.is_diff() {
            len += 1;
            match cursor.parent_id {
                Some(parent) => cursor = self.node(&parent)?,
                None => break,
            }
        }
        Ok(len)
    }

    /// Move the cursor to `id`, returning the previous cursor.
    pub fn move_to(&mut self, id: &NodeId) -> Result<NodeId> {
        if !self.contains(id) {
            return Err(GraphError::UnknownNode(*id));
        }
        let previous = std::mem::replace(&mut self.current, *id);
        debug!(from = %previous.short(), to = %id.short(), "moved cursor");
        Ok(previous)
    }

    /// Materialize the state at `id`.
    ///
    /// Walks up to the nearest ancestor whose state is available in full
    /// (stored `Complete` or held in the cache), then patches forward along
    /// the path back down to `id`. Stored payloads are never modified and
    /// the returned state is a fresh value.
    pub fn reconstruct(&self, id: &NodeId) -> Result<S> {
        let mut pending = Vec::new();
        let mut cursor = self.node(id)?;

        let mut state = loop {
            match &cursor.payload {
                Payload::Complete(state) => break state.clone(),
                Payload::Diff(delta) => {
                    if let Some(state) = self.cache.get(&cursor.id) {
                        trace!(node = %cursor.id.short(), "cache hit");
                        break state;
                    }
                    pending.push((cursor.id, delta));
                    let parent = cursor.parent_id.ok_or_else(|| {
                        GraphError::InvalidGraph(format!("diff node {} has no parent", cursor.id))
                    })?;
                    cursor = self.node(&parent)?;
                }
            }
        };

        trace!(node = %id.short(), replayed = pending.len(), "reconstructing state");
        for (node, delta) in pending.iter().rev() {
            state = self
                .engine
                .patch(&state, delta)
                .map_err(|source| GraphError::Patch {
                    node: *node,
                    source,
                })?;
        }

        if !pending.is_empty() {
            self.cache.insert(*id, state.clone());
        }
        Ok(state)
    }

    /// Append a node under the current node and move the cursor to it.
    ///
    /// `current_state` must be the materialized state of the current node;
    /// it is the base the delta is computed against when the node is stored
    /// as a diff. Nothing is modified if computing the delta fails or the
    /// delta does not replay onto `current_state`.
    pub fn commit(
        &mut self,
        current_state: &S,
        next_state: S,
        meta: NodeMeta,
        mode: StorageMode,
    ) -> Result<&GraphNode<S, E>> {
        let parent = self.current;
        let storage = self.storage_for(&parent, mode)?;

        // A diff node's state is whatever its delta replays to, which can
        // differ from `next_state` when the engine's encoding is lossy.
        let (payload, state) = match storage {
            StorageMode::Complete => (Payload::Complete(next_state.clone()), next_state),
            StorageMode::Diff => {
                let delta = self.engine.compute(current_state, &next_state)?;
                let replayed = self
                    .engine
                    .patch(current_state, &delta)
                    .map_err(DiffError::Unreplayable)?;
                (Payload::Diff(delta), replayed)
            }
        };

        let node = Node::new(Some(parent), meta, payload);
        let id = node.id;
        let parent_slot = self.index[&parent];

        self.index.insert(id, self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent_slot].child_ids.push(id);
        self.current = id;
        self.cache.insert(id, state);

        debug!(
            node = %id.short(),
            parent = %parent.short(),
            storage = ?storage,
            "committed node"
        );
        Ok(&self.nodes[self.index[&id]])
    }

    /// The storage a new child of `parent` gets, after applying the
    /// checkpoint policy to the requested mode.
    fn storage_for(&self, parent: &NodeId, requested: StorageMode) -> Result<StorageMode> {
        if requested == StorageMode::Complete {
            return Ok(StorageMode::Complete);
        }
        if let Some(interval) = self.config.checkpoint_interval {
            let chain = self.diff_chain_len(parent)? + 1;
            if chain >= interval.max(1) {
                debug!(parent = %parent.short(), chain, "promoting node to checkpoint");
                return Ok(StorageMode::Complete);
            }
        }
        Ok(StorageMode::Diff)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Compute summary statistics about the tree.
    pub fn stats(&self) -> GraphStats {
        let mut max_depth = 0;
        let mut complete_nodes = 0;
        let mut branch_points = 0;
        let mut internal_nodes = 0;
        let mut total_children = 0;

        // Imported arenas need not list parents before children.
        let mut queue = VecDeque::from([(self.root, 0)]);
        while let Some((id, depth)) = queue.pop_front() {
            max_depth = max_depth.max(depth);
            if let Some(node) = self.get(&id) {
                queue.extend(node.child_ids.iter().map(|child| (*child, depth + 1)));
            }
        }

        for node in &self.nodes {
            if node.payload.is_complete() {
                complete_nodes += 1;
            }
            if !node.child_ids.is_empty() {
                internal_nodes += 1;
                total_children += node.child_ids.len();
            }
            if node.child_ids.len() > 1 {
                branch_points += 1;
            }
        }

        GraphStats {
            total_nodes: self.nodes.len(),
            leaf_count: self.nodes.len() - internal_nodes,
            max_depth,
            complete_nodes,
            diff_nodes: self.nodes.len() - complete_nodes,
            branch_points,
            avg_branching: if internal_nodes == 0 {
                0.0
            } else {
                total_children as f64 / internal_nodes as f64
            },
        }
    }
}

/// Statistics about a provenance tree.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub leaf_count: usize,
    pub max_depth: usize,
    pub complete_nodes: usize,
    pub diff_nodes: usize,
    /// Nodes with more than one child.
    pub branch_points: usize,
    /// Mean child count over nodes that have children.
    pub avg_branching: f64,
}
