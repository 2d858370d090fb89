//! Propagator Configuration
//!
//! Tunables for a [`Propagator`](super::Propagator). The defaults suit
//! interactive use; embedding applications can load overrides from JSON.

use serde::{Deserialize, Serialize};

/// Configuration for a propagator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropagatorConfig {
    /// Remember the affected variables for each distinct set of updates.
    pub cache_affected_sets: bool,

    /// Maximum number of cached update sets. `None` means unbounded.
    pub cache_capacity: Option<usize>,

    /// Reject updates whose value kind differs from the variable's current one.
    pub enforce_value_kinds: bool,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            cache_affected_sets: true,
            cache_capacity: None,
            enforce_value_kinds: true,
        }
    }
}

impl PropagatorConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_affected_sets = false;
        self
    }

    pub fn allow_kind_changes(mut self) -> Self {
        self.enforce_value_kinds = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = PropagatorConfig::from_json("{}").unwrap();
        assert_eq!(config, PropagatorConfig::default());
        assert!(config.cache_affected_sets);
        assert!(config.enforce_value_kinds);
        assert_eq!(config.cache_capacity, None);
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config =
            PropagatorConfig::from_json(r#"{"cache_capacity": 16, "enforce_value_kinds": false}"#)
                .unwrap();
        assert_eq!(
            config,
            PropagatorConfig::default()
                .with_cache_capacity(16)
                .allow_kind_changes()
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(PropagatorConfig::from_json(r#"{"cache_size": 4}"#).is_err());
    }

    #[test]
    fn json_round_trips() {
        let config = PropagatorConfig::default().without_cache();
        let json = config.to_json().unwrap();
        assert_eq!(PropagatorConfig::from_json(&json).unwrap(), config);
    }
}
