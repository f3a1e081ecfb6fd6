//! Graph configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`ProvenanceGraph`](crate::ProvenanceGraph).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Store a node `Complete` once the run of diff nodes since the nearest
    /// complete ancestor would reach this length. `None` never forces it.
    pub checkpoint_interval: Option<usize>,

    /// Maximum number of materialized states kept in memory. `0` disables
    /// the cache.
    pub cache_capacity: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: None,
            cache_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GraphConfig = serde_json::from_str(r#"{ "checkpoint_interval": 8 }"#).unwrap();
        assert_eq!(config.checkpoint_interval, Some(8));
        assert_eq!(config.cache_capacity, 64);
    }
}
