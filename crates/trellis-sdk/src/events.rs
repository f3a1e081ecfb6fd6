//! Structural-change notifications.
//!
//! Listeners are called synchronously, in registration order, after each
//! mutation has been fully applied. Events are delivered in mutation order.

use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use trellis_graph::NodeId;

/// The kind of a [`ProvenanceEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    NodeAdded,
    CurrentChanged,
}

/// Events emitted by a [`Provenance`](crate::Provenance).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProvenanceEvent {
    /// A node was committed under `parent`.
    NodeAdded {
        node: NodeId,
        parent: NodeId,
        label: String,
    },
    /// The cursor moved.
    CurrentChanged { previous: NodeId, current: NodeId },
}

impl ProvenanceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProvenanceEvent::NodeAdded { .. } => EventKind::NodeAdded,
            ProvenanceEvent::CurrentChanged { .. } => EventKind::CurrentChanged,
        }
    }
}

pub(crate) type Listener = Arc<dyn Fn(&ProvenanceEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

impl ListenerRegistry {
    pub(crate) fn add(&mut self, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.listeners.iter().any(|(lid, _)| *lid == id)
    }

    /// Copy out the listeners so they can run without holding the lock.
    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.listeners.len()
    }
}

/// Handle returned by `subscribe`. Dropping it keeps the listener
/// registered; call [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    id: u64,
    registry: Weak<RwLock<ListenerRegistry>>,
}

impl Subscription {
    pub(crate) fn new(id: u64, registry: &Arc<RwLock<ListenerRegistry>>) -> Self {
        Subscription {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    /// Remove the listener. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.write().remove(self.id),
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map(|registry| registry.read().contains(self.id))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
