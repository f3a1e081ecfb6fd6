//! The provenance tracker: apply actions, navigate, and observe changes.

use crate::action::{Action, Transition};
use crate::config::ProvenanceConfig;
use crate::error::{ProvenanceError, Result};
use crate::events::{Listener, ListenerRegistry, ProvenanceEvent, Subscription};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use trellis_diff::{DiffEngine, JsonDiff};
use trellis_graph::{GraphExport, GraphNode, NodeId, ProvenanceGraph};

/// Records actions applied to a state and lets callers move through, and
/// branch from, the resulting history.
///
/// Writers (`apply` and every cursor move) are serialized internally.
/// Reads such as [`get_state`](Self::get_state) only take a shared lock and
/// may run alongside each other. Listeners run while the writer lock is
/// still held, so they may read but must not call mutating methods.
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use trellis_sdk::{Action, Provenance};
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// struct Counter {
///     counter: i64,
/// }
///
/// let provenance = Provenance::new(Counter { counter: 0 });
///
/// let increment = Action::new(|state: &Counter, _: &[()]| Counter {
///     counter: state.counter + 1,
/// })
/// .set_label("increment");
///
/// let node = provenance.apply(&increment).unwrap();
/// assert_eq!(provenance.current_id(), node.id);
/// assert_eq!(provenance.get_state(&node.id).unwrap(), Counter { counter: 1 });
/// ```
pub struct Provenance<S, E: DiffEngine<S> = JsonDiff> {
    graph: Arc<RwLock<ProvenanceGraph<S, E>>>,
    write_gate: Mutex<()>,
    listeners: Arc<RwLock<ListenerRegistry>>,
    event_tx: broadcast::Sender<ProvenanceEvent>,
    config: ProvenanceConfig,
}

impl<S> Provenance<S, JsonDiff>
where
    S: Clone + Serialize + DeserializeOwned,
{
    /// Start tracking from `initial` with the structural JSON diff engine.
    pub fn new(initial: S) -> Self {
        Self::with_engine(initial, JsonDiff::new(), ProvenanceConfig::default())
    }

    pub fn with_config(initial: S, config: ProvenanceConfig) -> Self {
        Self::with_engine(initial, JsonDiff::new(), config)
    }
}

impl<S, E> Provenance<S, E>
where
    S: Clone,
    E: DiffEngine<S>,
{
    /// Start tracking from `initial` with a custom diff engine.
    pub fn with_engine(initial: S, engine: E, config: ProvenanceConfig) -> Self {
        let graph = ProvenanceGraph::with_config(initial, engine, config.graph_config());
        Self::from_graph(graph, config)
    }

    /// Restore a tracker from an export. The cursor is restored as well.
    pub fn import(
        export: GraphExport<S, E::Delta>,
        engine: E,
        config: ProvenanceConfig,
    ) -> Result<Self> {
        let graph = ProvenanceGraph::from_export(export, engine, config.graph_config())?;
        Ok(Self::from_graph(graph, config))
    }

    fn from_graph(graph: ProvenanceGraph<S, E>, config: ProvenanceConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Provenance {
            graph: Arc::new(RwLock::new(graph)),
            write_gate: Mutex::new(()),
            listeners: Arc::new(RwLock::new(ListenerRegistry::default())),
            event_tx,
            config,
        }
    }

    pub fn config(&self) -> &ProvenanceConfig {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.graph.read().root()
    }

    pub fn current_id(&self) -> NodeId {
        self.graph.read().current()
    }

    /// A copy of the node under the cursor.
    pub fn current(&self) -> GraphNode<S, E> {
        self.graph.read().current_node().clone()
    }

    pub fn node(&self, id: &NodeId) -> Result<GraphNode<S, E>> {
        Ok(self.graph.read().node(id)?.clone())
    }

    pub fn len(&self) -> usize {
        self.graph.read().len()
    }

    /// Always false: the root exists from construction.
    pub fn is_empty(&self) -> bool {
        self.graph.read().is_empty()
    }

    /// Run a read-only query against the underlying graph.
    pub fn read<R>(&self, f: impl FnOnce(&ProvenanceGraph<S, E>) -> R) -> R {
        f(&self.graph.read())
    }

    /// Materialize the state at `id`, independent of the cursor.
    pub fn get_state(&self, id: &NodeId) -> Result<S> {
        Ok(self.graph.read().reconstruct(id)?)
    }

    pub fn current_state(&self) -> Result<S> {
        let graph = self.graph.read();
        Ok(graph.reconstruct(&graph.current())?)
    }

    /// Apply `action` to the current state and record the result as a new
    /// child of the current node, which becomes the new current node.
    ///
    /// Fails with [`ProvenanceError::MissingLabel`] if the action has no
    /// label, and with [`ProvenanceError::Transition`] if the transition
    /// returns an error. In both cases the graph is left untouched.
    pub fn apply<A, T>(&self, action: &Action<S, A, T>) -> Result<GraphNode<S, E>>
    where
        T: Transition<S, A>,
    {
        let meta = action.node_meta()?;
        let _gate = self.write_gate.lock();

        let (parent, current_state) = {
            let graph = self.graph.read();
            let parent = graph.current();
            (parent, graph.reconstruct(&parent)?)
        };

        let next_state = action.run(&current_state)?;

        let node = self
            .graph
            .write()
            .commit(&current_state, next_state, meta, action.save_mode())?
            .clone();
        debug!(node = %node.id.short(), label = %node.label, "applied action");

        self.emit(ProvenanceEvent::NodeAdded {
            node: node.id,
            parent,
            label: node.label.clone(),
        });
        self.emit(ProvenanceEvent::CurrentChanged {
            previous: parent,
            current: node.id,
        });
        Ok(node)
    }

    /// Move the cursor to `id`. Applying afterwards branches from `id`.
    pub fn move_to(&self, id: &NodeId) -> Result<()> {
        let _gate = self.write_gate.lock();
        self.move_cursor(id)
    }

    /// Move to the nearest non-ephemeral ancestor (or the root).
    pub fn undo(&self) -> Result<NodeId> {
        let _gate = self.write_gate.lock();
        let target = {
            let graph = self.graph.read();
            let mut cursor = graph.current_node();
            let mut target = cursor.parent_id.ok_or(ProvenanceError::NothingToUndo)?;
            loop {
                cursor = graph.node(&target)?;
                match cursor.parent_id {
                    Some(parent) if cursor.is_ephemeral() => target = parent,
                    _ => break,
                }
            }
            target
        };
        self.move_cursor(&target)?;
        Ok(target)
    }

    /// Move down the most recently created child, passing through
    /// ephemeral nodes until a regular node or a leaf is reached.
    pub fn redo(&self) -> Result<NodeId> {
        let _gate = self.write_gate.lock();
        let target = {
            let graph = self.graph.read();
            let mut target = *graph
                .current_node()
                .child_ids
                .last()
                .ok_or(ProvenanceError::NothingToRedo)?;
            loop {
                let node = graph.node(&target)?;
                match node.child_ids.last() {
                    Some(child) if node.is_ephemeral() => target = *child,
                    _ => break,
                }
            }
            target
        };
        self.move_cursor(&target)?;
        Ok(target)
    }

    /// Move the cursor back to the root.
    pub fn reset(&self) -> Result<()> {
        let _gate = self.write_gate.lock();
        let root = self.graph.read().root();
        self.move_cursor(&root)
    }

    /// Caller must hold the write gate.
    fn move_cursor(&self, id: &NodeId) -> Result<()> {
        let previous = self.graph.write().move_to(id)?;
        if previous != *id {
            self.emit(ProvenanceEvent::CurrentChanged {
                previous,
                current: *id,
            });
        }
        Ok(())
    }

    /// Register a listener for every structural change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ProvenanceEvent) + Send + Sync + 'static,
    {
        self.add_listener(Arc::new(listener))
    }

    fn add_listener(&self, listener: Listener) -> Subscription {
        let id = self.listeners.write().add(listener);
        Subscription::new(id, &self.listeners)
    }

    /// A broadcast receiver of every event emitted after this call.
    pub fn events(&self) -> broadcast::Receiver<ProvenanceEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: ProvenanceEvent) {
        let listeners = self.listeners.read().snapshot();
        for listener in listeners {
            listener(&event);
        }
        let _ = self.event_tx.send(event);
    }

    pub fn export(&self) -> GraphExport<S, E::Delta> {
        self.graph.read().export()
    }
}

impl<S, E> Provenance<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: DiffEngine<S> + Send + Sync + 'static,
    E::Delta: Send + Sync,
{
    /// Call `callback` with `selector(state)` whenever the cursor moves and
    /// the selected value differs from the one last seen.
    pub fn observe_state<T, Sel, Cb>(&self, selector: Sel, callback: Cb) -> Result<Subscription>
    where
        T: PartialEq + Send + 'static,
        Sel: Fn(&S) -> T + Send + Sync + 'static,
        Cb: Fn(&T) + Send + Sync + 'static,
    {
        let initial = selector(&self.current_state()?);
        let last_seen = Mutex::new(initial);
        let graph = Arc::downgrade(&self.graph);

        Ok(self.add_listener(Arc::new(move |event: &ProvenanceEvent| {
            let ProvenanceEvent::CurrentChanged { current, .. } = event else {
                return;
            };
            let Some(graph) = graph.upgrade() else {
                return;
            };
            let state = match graph.read().reconstruct(current) {
                Ok(state) => state,
                Err(err) => {
                    warn!(node = %current.short(), error = %err, "state observer skipped");
                    return;
                }
            };
            let selected = selector(&state);
            let mut last = last_seen.lock();
            if *last != selected {
                callback(&selected);
                *last = selected;
            }
        })))
    }
}

impl<S, E> Provenance<S, E>
where
    S: Clone + Serialize + DeserializeOwned,
    E: DiffEngine<S>,
{
    pub fn to_json(&self) -> Result<String> {
        Ok(self.graph.read().to_json()?)
    }

    pub fn from_json(json: &str, engine: E, config: ProvenanceConfig) -> Result<Self> {
        let graph = ProvenanceGraph::from_json(json, engine, config.graph_config())?;
        Ok(Self::from_graph(graph, config))
    }
}
