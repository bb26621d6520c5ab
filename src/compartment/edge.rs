//! Edge-level predicates
//!
//! Each variant scans the in-neighbours of the evaluated node (optionally
//! only those in a triggering status) and looks at the edge connecting the
//! neighbour to the node. The first neighbour that passes wins.

use crate::compartment::operator::NumericCondition;
use crate::compartment::{check_unit, validate_trigger, Compartment, EvalContext, Probability};
use crate::core::error::{ConfigError, Result, SimError};
use crate::graph::AttrValue;
use crate::rules::parameters::Parameters;
use crate::rules::registry::StatusRegistry;

/// Per-edge parameter consulted before the instance constant
pub const DEFAULT_EDGE_THRESHOLD_PARAM: &str = "threshold";

fn candidates(ctx: &EvalContext<'_>, trigger: Option<&str>) -> Result<Vec<usize>> {
    Ok(match trigger {
        Some(name) => {
            let code = ctx.resolve_status(name)?;
            ctx.neighbors_in(code).collect()
        }
        None => ctx.in_neighbors().to_vec(),
    })
}

/// Independent cascade: one draw per candidate edge
///
/// The per-edge probability is taken from the edge parameter table, then
/// the instance constant, then `1 / in_degree`.
#[derive(Debug, Clone)]
pub struct EdgeStochastic {
    threshold: Option<f64>,
    trigger: Option<String>,
    param: String,
}

impl EdgeStochastic {
    pub fn new() -> Self {
        Self {
            threshold: None,
            trigger: None,
            param: DEFAULT_EDGE_THRESHOLD_PARAM.to_string(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> std::result::Result<Self, ConfigError> {
        check_unit("threshold", threshold)?;
        self.threshold = Some(threshold);
        Ok(self)
    }

    pub fn triggered_by(mut self, status: &str) -> Self {
        self.trigger = Some(status.to_string());
        self
    }

    pub fn with_edge_param(mut self, name: &str) -> Self {
        self.param = name.to_string();
        self
    }
}

impl Default for EdgeStochastic {
    fn default() -> Self {
        Self::new()
    }
}

impl Compartment for EdgeStochastic {
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool> {
        let degree = ctx.in_degree();
        let directed = ctx.network.is_directed();
        for neighbor in candidates(ctx, self.trigger.as_deref())? {
            let from = ctx.network.node_at(neighbor);
            let threshold = ctx
                .params
                .edge(&self.param, from, ctx.node, directed)
                .or(self.threshold)
                .unwrap_or(1.0 / degree as f64);
            if ctx.sample() < threshold {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn validate(
        &self,
        registry: &StatusRegistry,
        _params: &Parameters,
    ) -> std::result::Result<(), ConfigError> {
        validate_trigger(self.trigger.as_deref(), registry)
    }
}

/// Some candidate edge carries a categorical attribute value
#[derive(Debug, Clone)]
pub struct EdgeCategoricalAttribute {
    attribute: String,
    value: AttrValue,
    trigger: Option<String>,
    probability: Probability,
}

impl EdgeCategoricalAttribute {
    pub fn new(attribute: &str, value: impl Into<AttrValue>) -> Self {
        Self {
            attribute: attribute.to_string(),
            value: value.into(),
            trigger: None,
            probability: Probability::CERTAIN,
        }
    }

    pub fn triggered_by(mut self, status: &str) -> Self {
        self.trigger = Some(status.to_string());
        self
    }

    pub fn with_probability(mut self, p: f64) -> std::result::Result<Self, ConfigError> {
        self.probability = Probability::new(p)?;
        Ok(self)
    }
}

impl Compartment for EdgeCategoricalAttribute {
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool> {
        for neighbor in candidates(ctx, self.trigger.as_deref())? {
            if *ctx.edge_attr(neighbor, &self.attribute)? == self.value
                && self.probability.passes(ctx)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn validate(
        &self,
        registry: &StatusRegistry,
        _params: &Parameters,
    ) -> std::result::Result<(), ConfigError> {
        validate_trigger(self.trigger.as_deref(), registry)
    }
}

/// Some candidate edge has a numeric attribute satisfying a condition
#[derive(Debug, Clone)]
pub struct EdgeNumericalAttribute {
    attribute: String,
    condition: NumericCondition,
    trigger: Option<String>,
    probability: Probability,
}

impl EdgeNumericalAttribute {
    pub fn new(attribute: &str, condition: NumericCondition) -> Self {
        Self {
            attribute: attribute.to_string(),
            condition,
            trigger: None,
            probability: Probability::CERTAIN,
        }
    }

    pub fn parse(
        attribute: &str,
        op: &str,
        values: &[AttrValue],
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(attribute, NumericCondition::parse(op, values)?))
    }

    pub fn triggered_by(mut self, status: &str) -> Self {
        self.trigger = Some(status.to_string());
        self
    }

    pub fn with_probability(mut self, p: f64) -> std::result::Result<Self, ConfigError> {
        self.probability = Probability::new(p)?;
        Ok(self)
    }
}

impl Compartment for EdgeNumericalAttribute {
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool> {
        for neighbor in candidates(ctx, self.trigger.as_deref())? {
            let value = ctx.edge_attr(neighbor, &self.attribute)?;
            let Some(value) = value.as_f64() else {
                return Err(SimError::NonNumericEdgeAttribute {
                    from: ctx.network.node_at(neighbor),
                    to: ctx.node,
                    attribute: self.attribute.clone(),
                });
            };
            if self.condition.holds(value) && self.probability.passes(ctx) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn validate(
        &self,
        registry: &StatusRegistry,
        _params: &Parameters,
    ) -> std::result::Result<(), ConfigError> {
        validate_trigger(self.trigger.as_deref(), registry)
    }
}
