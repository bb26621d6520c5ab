//! Engine configuration
//!
//! Knobs that control how iterations are scheduled, independent of which
//! process a model describes. Rule tables and parameters live in `rules`.

use serde::{Deserialize, Serialize};

use crate::core::error::{ConfigError, Result};

/// Configuration for the iteration scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for every random draw the model makes
    ///
    /// `None` draws a seed once when the model is created. The chosen seed
    /// is available from `Model::seed`, so any run can be replayed.
    pub seed: Option<u64>,

    /// Minimum node count before evaluation fans out over rayon
    ///
    /// Below this threshold, thread overhead exceeds benefits. Results are
    /// identical either way because each node draws from its own stream.
    pub parallel_threshold: usize,

    /// Whether iteration results carry the per-node delta map
    ///
    /// Long runs on large graphs that only need aggregate trends can turn
    /// this off to avoid materialising one map per iteration.
    pub record_node_status: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            parallel_threshold: 1000,
            record_node_status: true,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_node_status(mut self, record: bool) -> Self {
        self.record_node_status = record;
        self
    }

    /// Parse a config from TOML; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.parallel_threshold == 0 {
            return Err(ConfigError::InvalidEngine(
                "parallel_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
