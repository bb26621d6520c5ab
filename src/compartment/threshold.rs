//! Fractional-neighbourhood threshold

use crate::compartment::{check_unit, Compartment, EvalContext};
use crate::core::error::{ConfigError, Result, SimError};
use crate::rules::parameters::Parameters;
use crate::rules::registry::StatusRegistry;

/// Per-node parameter consulted before the instance constant
pub const DEFAULT_THRESHOLD_PARAM: &str = "threshold";

/// Fires when at least `threshold` of the in-neighbours are in `trigger`
///
/// The threshold for a node is its value in the per-node parameter table
/// if it has one, otherwise the instance constant. Nodes with no
/// in-neighbours never fire.
#[derive(Debug, Clone)]
pub struct NodeThreshold {
    trigger: String,
    threshold: Option<f64>,
    param: String,
}

impl NodeThreshold {
    pub fn new(trigger: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            threshold: None,
            param: DEFAULT_THRESHOLD_PARAM.to_string(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> std::result::Result<Self, ConfigError> {
        check_unit("threshold", threshold)?;
        self.threshold = Some(threshold);
        Ok(self)
    }

    /// Read per-node thresholds from a differently named parameter table
    pub fn with_node_param(mut self, name: &str) -> Self {
        self.param = name.to_string();
        self
    }

    fn threshold_for(&self, ctx: &EvalContext<'_>) -> Result<f64> {
        if let Some(value) = ctx.params.node(&self.param, ctx.node) {
            return Ok(value);
        }
        self.threshold.ok_or_else(|| SimError::MissingNodeParameter {
            node: ctx.node,
            parameter: self.param.clone(),
        })
    }
}

impl Compartment for NodeThreshold {
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool> {
        let total = ctx.in_degree();
        if total == 0 {
            return Ok(false);
        }
        let code = ctx.resolve_status(&self.trigger)?;
        let triggered = ctx.count_neighbors_in(code);
        let threshold = self.threshold_for(ctx)?;
        Ok(triggered as f64 / total as f64 >= threshold)
    }

    fn validate(
        &self,
        registry: &StatusRegistry,
        params: &Parameters,
    ) -> std::result::Result<(), ConfigError> {
        registry.resolve(&self.trigger)?;
        if self.threshold.is_none() && !params.has_node_table(&self.param) {
            return Err(ConfigError::MissingThreshold(self.param.clone()));
        }
        Ok(())
    }
}
