//! Configuration for a [`Provenance`](crate::Provenance).

use serde::{Deserialize, Serialize};
use trellis_graph::GraphConfig;

/// Configuration for a provenance tracker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    /// Force a complete node once this many diffs would be chained.
    pub checkpoint_interval: Option<usize>,
    /// Maximum number of materialized states kept in memory.
    pub cache_capacity: usize,
    /// Capacity of the broadcast event channel.
    pub event_capacity: usize,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        let graph = GraphConfig::default();
        Self {
            checkpoint_interval: graph.checkpoint_interval,
            cache_capacity: graph.cache_capacity,
            event_capacity: 100,
        }
    }
}

impl ProvenanceConfig {
    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            checkpoint_interval: self.checkpoint_interval,
            cache_capacity: self.cache_capacity,
        }
    }
}

/// Builder for provenance configuration.
pub struct ProvenanceConfigBuilder {
    config: ProvenanceConfig,
}

impl ProvenanceConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ProvenanceConfig::default(),
        }
    }

    pub fn checkpoint_interval(mut self, interval: usize) -> Self {
        self.config.checkpoint_interval = Some(interval);
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn build(self) -> ProvenanceConfig {
        self.config
    }
}

impl Default for ProvenanceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
