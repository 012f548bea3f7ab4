//! Engine configuration.
//!
//! The configuration is optional: every field has a default, so an empty
//! JSON object (or YAML document) yields [`EngineConfig::default`].

use serde::{Deserialize, Serialize};
use std::cmp::max;

/// Settings that control how a pipeline run is executed.
///
/// None of these settings affect the result of a run, only how it is
/// computed.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of worker threads used to evaluate independent pipes.
    ///
    /// With the default of `1` the whole run happens on the calling thread.
    /// Larger values evaluate pipes that do not depend on each other
    /// concurrently.  `0` is treated as `1`.
    pub workers: u16,

    /// Check operator arity of every reachable expression before any pipe is
    /// evaluated.
    ///
    /// When disabled, malformed expressions are still rejected, but only when
    /// the pipe that owns them runs.  The default value is `true`.
    pub validate_expressions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            validate_expressions: true,
        }
    }
}

impl EngineConfig {
    /// Number of threads the engine actually uses.
    pub fn effective_workers(&self) -> usize {
        max(self.workers, 1) as usize
    }

    /// Read a configuration from a YAML (or JSON) document.
    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }
}
