//! Load model definitions from TOML
//!
//! A definition names the statuses, model-wide parameters, initial
//! placement and the ordered rule table. Compartments are written as tagged
//! tables:
//!
//! ```toml
//! [[rules]]
//! from = "Susceptible"
//! to = "Infected"
//! compartment = { type = "node_stochastic", rate_param = "beta", trigger = "Infected" }
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::compartment::{
    Compartment, CompartmentRef, Composed, Conditional, CountDown, EdgeCategoricalAttribute,
    EdgeNumericalAttribute, EdgeStochastic, NodeCategoricalAttribute, NodeNumericalAttribute,
    NodeNumericalVariable, NodeStochastic, NodeThreshold, NumericVariable, Rate,
};
use crate::core::config::EngineConfig;
use crate::core::error::{ConfigError, Result};
use crate::core::types::{NodeId, StatusCode};
use crate::graph::{AttrValue, Network};
use crate::rules::initial::InitialStatus;
use crate::rules::parameters::{ParameterSpec, Parameters};
use crate::simulation::model::Model;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDefinition {
    pub name: String,
    /// Code of the first status; later statuses count up from it
    #[serde(default)]
    pub base: StatusCode,
    pub statuses: Vec<String>,
    #[serde(default)]
    pub sentinels: BTreeMap<String, StatusCode>,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    #[serde(default)]
    pub declare: Vec<DeclarationDef>,
    #[serde(default)]
    pub initial: InitialDef,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationDef {
    pub name: String,
    pub default: Option<f64>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitialDef {
    pub default: Option<String>,
    #[serde(default)]
    pub fractions: BTreeMap<String, f64>,
    #[serde(default)]
    pub nodes: BTreeMap<String, Vec<u64>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDef {
    pub from: String,
    pub to: String,
    pub compartment: CompartmentDef,
}

/// A scalar, or a `[low, high]` pair for `IN`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReferenceDef {
    One(AttrValue),
    Many(Vec<AttrValue>),
}

impl ReferenceDef {
    fn values(&self) -> Vec<AttrValue> {
        match self {
            ReferenceDef::One(v) => vec![v.clone()],
            ReferenceDef::Many(vs) => vs.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum CompartmentDef {
    NodeStochastic {
        rate: Option<f64>,
        rate_param: Option<String>,
        trigger: Option<String>,
    },
    NodeThreshold {
        trigger: String,
        threshold: Option<f64>,
        param: Option<String>,
    },
    NodeCategoricalAttribute {
        attribute: String,
        value: AttrValue,
        probability: Option<f64>,
    },
    NodeNumericalAttribute {
        attribute: String,
        operator: String,
        value: ReferenceDef,
        probability: Option<f64>,
    },
    NodeNumericalVariable {
        /// Attribute name, or `"@status"` for the node's status code
        variable: String,
        operator: String,
        value: Option<ReferenceDef>,
        other: Option<String>,
        probability: Option<f64>,
    },
    EdgeStochastic {
        threshold: Option<f64>,
        param: Option<String>,
        trigger: Option<String>,
    },
    EdgeCategoricalAttribute {
        attribute: String,
        value: AttrValue,
        trigger: Option<String>,
        probability: Option<f64>,
    },
    EdgeNumericalAttribute {
        attribute: String,
        operator: String,
        value: ReferenceDef,
        trigger: Option<String>,
        probability: Option<f64>,
    },
    CountDown {
        name: String,
        iterations: u32,
    },
    /// Short-circuit AND over the listed compartments, in order
    All {
        steps: Vec<CompartmentDef>,
    },
    Conditional {
        condition: Box<CompartmentDef>,
        then: Box<CompartmentDef>,
        #[serde(rename = "else")]
        otherwise: Box<CompartmentDef>,
    },
}

const STATUS_VARIABLE: &str = "@status";

fn variable(name: &str) -> NumericVariable {
    if name == STATUS_VARIABLE {
        NumericVariable::Status
    } else {
        NumericVariable::Attribute(name.to_string())
    }
}

impl CompartmentDef {
    /// Build the compartment this definition describes
    pub fn build(&self) -> std::result::Result<CompartmentRef, ConfigError> {
        let built = match self {
            CompartmentDef::NodeStochastic {
                rate,
                rate_param,
                trigger,
            } => {
                let rate = match (rate, rate_param) {
                    (Some(value), None) => Rate::Fixed(*value),
                    (None, Some(name)) => Rate::Param(name.clone()),
                    (None, None) => return Err(ConfigError::MissingParameter("rate".into())),
                    (Some(_), Some(name)) => {
                        return Err(ConfigError::InvalidDefinition(format!(
                            "node_stochastic takes rate or rate_param, not both ('{}')",
                            name
                        )))
                    }
                };
                let mut c = NodeStochastic::new(rate)?;
                if let Some(t) = trigger {
                    c = c.triggered_by(t);
                }
                c.into_ref()
            }
            CompartmentDef::NodeThreshold {
                trigger,
                threshold,
                param,
            } => {
                let mut c = NodeThreshold::new(trigger);
                if let Some(value) = threshold {
                    c = c.with_threshold(*value)?;
                }
                if let Some(name) = param {
                    c = c.with_node_param(name);
                }
                c.into_ref()
            }
            CompartmentDef::NodeCategoricalAttribute {
                attribute,
                value,
                probability,
            } => NodeCategoricalAttribute::new(attribute, value.clone())
                .with_probability(probability.unwrap_or(1.0))?
                .into_ref(),
            CompartmentDef::NodeNumericalAttribute {
                attribute,
                operator,
                value,
                probability,
            } => NodeNumericalAttribute::parse(attribute, operator, &value.values())?
                .with_probability(probability.unwrap_or(1.0))?
                .into_ref(),
            CompartmentDef::NodeNumericalVariable {
                variable: var,
                operator,
                value,
                other,
                probability,
            } => {
                let lhs = variable(var);
                let c = match (value, other) {
                    (Some(value), None) => {
                        NodeNumericalVariable::against_value(lhs, operator, &value.values())?
                    }
                    (None, Some(other)) => {
                        NodeNumericalVariable::against_variable(lhs, operator, variable(other))?
                    }
                    _ => {
                        return Err(ConfigError::InvalidDefinition(format!(
                            "'{}' needs exactly one of value or other",
                            var
                        )))
                    }
                };
                c.with_probability(probability.unwrap_or(1.0))?.into_ref()
            }
            CompartmentDef::EdgeStochastic {
                threshold,
                param,
                trigger,
            } => {
                let mut c = EdgeStochastic::new();
                if let Some(value) = threshold {
                    c = c.with_threshold(*value)?;
                }
                if let Some(name) = param {
                    c = c.with_edge_param(name);
                }
                if let Some(t) = trigger {
                    c = c.triggered_by(t);
                }
                c.into_ref()
            }
            CompartmentDef::EdgeCategoricalAttribute {
                attribute,
                value,
                trigger,
                probability,
            } => {
                let mut c = EdgeCategoricalAttribute::new(attribute, value.clone())
                    .with_probability(probability.unwrap_or(1.0))?;
                if let Some(t) = trigger {
                    c = c.triggered_by(t);
                }
                c.into_ref()
            }
            CompartmentDef::EdgeNumericalAttribute {
                attribute,
                operator,
                value,
                trigger,
                probability,
            } => {
                let mut c = EdgeNumericalAttribute::parse(attribute, operator, &value.values())?
                    .with_probability(probability.unwrap_or(1.0))?;
                if let Some(t) = trigger {
                    c = c.triggered_by(t);
                }
                c.into_ref()
            }
            CompartmentDef::CountDown { name, iterations } => {
                CountDown::new(name, *iterations)?.into_ref()
            }
            CompartmentDef::All { steps } => {
                let mut built = steps.iter().rev().map(CompartmentDef::build);
                let mut chain = built.next().ok_or_else(|| {
                    ConfigError::InvalidDefinition("empty compartment chain".into())
                })??;
                for step in built {
                    chain = Composed::new(step?, chain).into_ref();
                }
                chain
            }
            CompartmentDef::Conditional {
                condition,
                then,
                otherwise,
            } => Conditional::new(condition.build()?, then.build()?, otherwise.build()?).into_ref(),
        };
        Ok(built)
    }
}

impl InitialDef {
    pub fn to_initial(&self) -> InitialStatus {
        let mut initial = InitialStatus::new();
        if let Some(status) = &self.default {
            initial = initial.with_default(status);
        }
        for (status, fraction) in &self.fractions {
            initial = initial.with_fraction(status, *fraction);
        }
        for (status, nodes) in &self.nodes {
            initial = initial.assign_all(nodes.iter().copied().map(NodeId), status);
        }
        initial
    }
}

impl ModelDefinition {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Build a configured model over `network`
    ///
    /// Statuses are registered first, then parameters, then rules in file
    /// order, then the initial placement.
    pub fn build(&self, network: Network, config: EngineConfig) -> Result<Model> {
        let mut model = Model::with_status_base(&self.name, network, config, self.base)?;
        for status in &self.statuses {
            model.add_status(status);
        }
        for (name, &code) in &self.sentinels {
            model.add_status_with_code(name, code)?;
        }

        let mut params = Parameters::new();
        for (name, &value) in &self.parameters {
            params.set_model(name, value);
        }
        model.set_parameters(params);
        for decl in &self.declare {
            let spec = match decl.default {
                Some(default) => ParameterSpec::optional(&decl.name, default, &decl.description),
                None => ParameterSpec::mandatory(&decl.name, &decl.description),
            };
            model.declare_parameter(spec);
        }

        for rule in &self.rules {
            model.add_rule(&rule.from, &rule.to, rule.compartment.build()?)?;
        }
        model.set_initial_status(self.initial.to_initial())?;
        Ok(model)
    }
}
