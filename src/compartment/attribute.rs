//! Node attribute comparisons

use serde::{Deserialize, Serialize};

use crate::compartment::operator::{NumericCondition, Operator};
use crate::compartment::{Compartment, EvalContext, Probability};
use crate::core::error::{ConfigError, Result};
use crate::graph::AttrValue;

/// Node attribute equals a fixed categorical value
#[derive(Debug, Clone)]
pub struct NodeCategoricalAttribute {
    attribute: String,
    value: AttrValue,
    probability: Probability,
}

impl NodeCategoricalAttribute {
    pub fn new(attribute: &str, value: impl Into<AttrValue>) -> Self {
        Self {
            attribute: attribute.to_string(),
            value: value.into(),
            probability: Probability::CERTAIN,
        }
    }

    pub fn with_probability(mut self, p: f64) -> std::result::Result<Self, ConfigError> {
        self.probability = Probability::new(p)?;
        Ok(self)
    }
}

impl Compartment for NodeCategoricalAttribute {
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool> {
        let matches = *ctx.node_attr(&self.attribute)? == self.value;
        Ok(matches && self.probability.passes(ctx))
    }
}

/// Numeric node attribute compared against a scalar or range
#[derive(Debug, Clone)]
pub struct NodeNumericalAttribute {
    attribute: String,
    condition: NumericCondition,
    probability: Probability,
}

impl NodeNumericalAttribute {
    pub fn new(attribute: &str, condition: NumericCondition) -> Self {
        Self {
            attribute: attribute.to_string(),
            condition,
            probability: Probability::CERTAIN,
        }
    }

    /// `op` is one of `==, !=, <, <=, >, >=, IN`
    pub fn parse(
        attribute: &str,
        op: &str,
        values: &[AttrValue],
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(attribute, NumericCondition::parse(op, values)?))
    }

    pub fn with_probability(mut self, p: f64) -> std::result::Result<Self, ConfigError> {
        self.probability = Probability::new(p)?;
        Ok(self)
    }
}

impl Compartment for NodeNumericalAttribute {
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool> {
        let value = ctx.numeric_node_attr(&self.attribute)?;
        Ok(self.condition.holds(value) && self.probability.passes(ctx))
    }
}

/// A numeric quantity read off the evaluated node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NumericVariable {
    Attribute(String),
    /// The node's status code at the start of the iteration
    Status,
}

impl NumericVariable {
    fn read(&self, ctx: &EvalContext<'_>) -> Result<f64> {
        match self {
            NumericVariable::Attribute(name) => ctx.numeric_node_attr(name),
            NumericVariable::Status => Ok(ctx.status() as f64),
        }
    }
}

#[derive(Debug, Clone)]
enum Comparand {
    Value(NumericCondition),
    Variable(Operator, NumericVariable),
}

/// Compares a node variable against a constant or another node variable
#[derive(Debug, Clone)]
pub struct NodeNumericalVariable {
    variable: NumericVariable,
    comparand: Comparand,
    probability: Probability,
}

impl NodeNumericalVariable {
    pub fn against_value(
        variable: NumericVariable,
        op: &str,
        values: &[AttrValue],
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            variable,
            comparand: Comparand::Value(NumericCondition::parse(op, values)?),
            probability: Probability::CERTAIN,
        })
    }

    /// Variable-to-variable comparison; `IN` has no meaning here
    pub fn against_variable(
        variable: NumericVariable,
        op: &str,
        other: NumericVariable,
    ) -> std::result::Result<Self, ConfigError> {
        let op: Operator = op.parse()?;
        if op == Operator::In {
            return Err(ConfigError::InvalidRange(format!("{:?}", other)));
        }
        Ok(Self {
            variable,
            comparand: Comparand::Variable(op, other),
            probability: Probability::CERTAIN,
        })
    }

    pub fn with_probability(mut self, p: f64) -> std::result::Result<Self, ConfigError> {
        self.probability = Probability::new(p)?;
        Ok(self)
    }
}

impl Compartment for NodeNumericalVariable {
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool> {
        let lhs = self.variable.read(ctx)?;
        let holds = match &self.comparand {
            Comparand::Value(condition) => condition.holds(lhs),
            Comparand::Variable(op, other) => op.compare(lhs, other.read(ctx)?),
        };
        Ok(holds && self.probability.passes(ctx))
    }
}
