//! Bounded cache of materialized states.
//!
//! Nodes never change once committed, so a cached state stays valid for
//! the life of the graph. Entries are evicted oldest-first when full.

use crate::node::NodeId;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Hit/miss counters for a [`StateCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
struct CacheInner<S> {
    states: HashMap<NodeId, S>,
    order: VecDeque<NodeId>,
    hits: u64,
    misses: u64,
}

/// A FIFO cache of reconstructed states, shared behind a lock so that
/// reconstruction can populate it through `&self`.
#[derive(Debug)]
pub struct StateCache<S> {
    capacity: usize,
    inner: Mutex<CacheInner<S>>,
}

impl<S: Clone> StateCache<S> {
    pub fn new(capacity: usize) -> Self {
        StateCache {
            capacity,
            inner: Mutex::new(CacheInner {
                states: HashMap::new(),
                order: VecDeque::new(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get a copy of the cached state for `id`.
    pub fn get(&self, id: &NodeId) -> Option<S> {
        if self.capacity == 0 {
            return None;
        }
        let mut inner = self.inner.lock();
        match inner.states.get(id).cloned() {
            Some(state) => {
                inner.hits += 1;
                Some(state)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, id: NodeId, state: S) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.states.insert(id, state).is_some() {
            return;
        }
        inner.order.push_back(id);
        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.states.remove(&evicted);
            }
        }
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.inner.lock().states.contains_key(id)
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.states.clear();
        inner.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.states.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}
