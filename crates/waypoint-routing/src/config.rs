//! Configuration for network synchronisation

use serde::{Deserialize, Serialize};

/// Synchronisation settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Give up after this many full passes (`None` runs to the fixed point)
    pub max_passes: Option<u32>,

    /// Emit every reachable table at `trace` level after each pass
    pub log_tables: bool,
}

impl RoutingConfig {
    /// Config that fails with a convergence error after `max_passes` passes
    ///
    /// A run that hits the limit keeps every route it accepted, so the
    /// network is usable but not yet converged. Synchronising again with
    /// [`RoutingConfig::default`] completes it.
    pub fn bounded(max_passes: u32) -> Self {
        Self {
            max_passes: Some(max_passes),
            ..Default::default()
        }
    }

    /// Enable per-pass table dumps
    pub fn with_table_logging(mut self, enabled: bool) -> Self {
        self.log_tables = enabled;
        self
    }

    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
