//! Neighbour-count driven random transitions

use serde::{Deserialize, Serialize};

use crate::compartment::{check_unit, validate_trigger, Compartment, EvalContext};
use crate::core::error::{ConfigError, Result};
use crate::rules::parameters::Parameters;
use crate::rules::registry::StatusRegistry;

/// Where a per-draw rate comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rate {
    Fixed(f64),
    /// Per-node parameter, falling back to the model-wide value of that name
    Param(String),
}

impl Rate {
    pub fn validate(&self, params: &Parameters) -> std::result::Result<(), ConfigError> {
        match self {
            Rate::Fixed(rate) => check_unit("rate", *rate),
            Rate::Param(name) if params.is_known(name) => Ok(()),
            Rate::Param(name) => Err(ConfigError::MissingParameter(name.clone())),
        }
    }

    pub fn resolve(&self, ctx: &EvalContext<'_>) -> Result<f64> {
        match self {
            Rate::Fixed(rate) => Ok(*rate),
            Rate::Param(name) => ctx.node_param(name),
        }
    }
}

impl From<f64> for Rate {
    fn from(rate: f64) -> Self {
        Rate::Fixed(rate)
    }
}

/// Fires with probability `rate * trigger_count`
///
/// Without a triggering status the count is 1, making this a plain coin
/// flip (e.g. recovery). With one, the count is the number of in-neighbours
/// currently in that status.
#[derive(Debug, Clone)]
pub struct NodeStochastic {
    rate: Rate,
    trigger: Option<String>,
}

impl NodeStochastic {
    pub fn new(rate: impl Into<Rate>) -> std::result::Result<Self, ConfigError> {
        let rate = rate.into();
        if let Rate::Fixed(value) = rate {
            check_unit("rate", value)?;
        }
        Ok(Self {
            rate,
            trigger: None,
        })
    }

    pub fn triggered_by(mut self, status: &str) -> Self {
        self.trigger = Some(status.to_string());
        self
    }

    pub fn rate(&self) -> &Rate {
        &self.rate
    }
}

impl Compartment for NodeStochastic {
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool> {
        let sample = ctx.sample();
        let trigger_count = match &self.trigger {
            Some(name) => {
                let code = ctx.resolve_status(name)?;
                ctx.count_neighbors_in(code)
            }
            None => 1,
        };
        let rate = self.rate.resolve(ctx)?;
        Ok(sample < rate * trigger_count as f64)
    }

    fn validate(
        &self,
        registry: &StatusRegistry,
        params: &Parameters,
    ) -> std::result::Result<(), ConfigError> {
        validate_trigger(self.trigger.as_deref(), registry)?;
        self.rate.validate(params)
    }
}
