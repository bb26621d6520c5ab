//! Typed parameter bundle handed to every compartment evaluation
//!
//! Three numeric tables: model-wide values, per-node values and per-edge
//! values, each keyed by parameter name. Models declare which model-wide
//! parameters they need; declarations are checked once when the model is
//! configured.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::types::{EdgeKey, NodeId};

/// Whether a declared model parameter must be supplied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Requirement {
    Mandatory,
    Optional { default: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub requirement: Requirement,
    pub description: String,
}

impl ParameterSpec {
    pub fn mandatory(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            requirement: Requirement::Mandatory,
            description: description.to_string(),
        }
    }

    pub fn optional(name: &str, default: f64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            requirement: Requirement::Optional { default },
            description: description.to_string(),
        }
    }
}

/// Values stored for one node pair, keyed by the pair with the smaller id first
///
/// Directed lookups read the orientation they ask for. Undirected lookups
/// read whichever orientation was written last, so both ends of an edge
/// agree.
#[derive(Debug, Clone, Copy, Default)]
struct EdgeValues {
    forward: Option<f64>,
    backward: Option<f64>,
    latest: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Parameters {
    model: AHashMap<String, f64>,
    nodes: AHashMap<String, AHashMap<NodeId, f64>>,
    edges: AHashMap<String, AHashMap<EdgeKey, EdgeValues>>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, name: &str, value: f64) -> Self {
        self.set_model(name, value);
        self
    }

    pub fn set_model(&mut self, name: &str, value: f64) {
        self.model.insert(name.to_string(), value);
    }

    pub fn set_node(&mut self, name: &str, node: NodeId, value: f64) {
        self.nodes
            .entry(name.to_string())
            .or_default()
            .insert(node, value);
    }

    /// Store a per-edge value for `u -> v`
    ///
    /// On an undirected network the pair is unordered: a later write for
    /// `v -> u` replaces this one for both orientations.
    pub fn set_edge(&mut self, name: &str, u: NodeId, v: NodeId, value: f64) {
        let entry = self
            .edges
            .entry(name.to_string())
            .or_default()
            .entry(EdgeKey::new(u, v, false))
            .or_default();
        if u <= v {
            entry.forward = Some(value);
        } else {
            entry.backward = Some(value);
        }
        entry.latest = value;
    }

    pub fn model(&self, name: &str) -> Option<f64> {
        self.model.get(name).copied()
    }

    pub fn node(&self, name: &str, node: NodeId) -> Option<f64> {
        self.nodes.get(name)?.get(&node).copied()
    }

    /// Per-edge lookup; undirected edges give the same value in either order
    pub fn edge(&self, name: &str, u: NodeId, v: NodeId, directed: bool) -> Option<f64> {
        let values = self.edges.get(name)?.get(&EdgeKey::new(u, v, false))?;
        match (directed, u <= v) {
            (false, _) => Some(values.latest),
            (true, true) => values.forward,
            (true, false) => values.backward,
        }
    }

    pub fn has_node_table(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn has_edge_table(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    /// Per-node value if present, else the model-wide value
    pub fn node_or_model(&self, name: &str, node: NodeId) -> Option<f64> {
        self.node(name, node).or_else(|| self.model(name))
    }

    /// True if `name` can be resolved for at least some node
    pub fn is_known(&self, name: &str) -> bool {
        self.model.contains_key(name) || self.nodes.contains_key(name)
    }

    /// Check declarations, filling in defaults for absent optional parameters
    pub fn apply_declarations(&mut self, specs: &[ParameterSpec]) -> Result<(), ConfigError> {
        for spec in specs {
            if self.model.contains_key(&spec.name) {
                continue;
            }
            match spec.requirement {
                Requirement::Mandatory => {
                    return Err(ConfigError::MissingParameter(spec.name.clone()))
                }
                Requirement::Optional { default } => {
                    self.model.insert(spec.name.clone(), default);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mandatory_missing_is_error() {
        let mut params = Parameters::new();
        let specs = vec![ParameterSpec::mandatory("beta", "infection rate")];
        assert_eq!(
            params.apply_declarations(&specs),
            Err(ConfigError::MissingParameter("beta".into()))
        );
    }

    #[test]
    fn test_optional_gets_default() {
        let mut params = Parameters::new().with_model("beta", 0.1);
        let specs = vec![
            ParameterSpec::mandatory("beta", "infection rate"),
            ParameterSpec::optional("gamma", 0.05, "recovery rate"),
        ];
        params.apply_declarations(&specs).unwrap();
        assert_eq!(params.model("gamma"), Some(0.05));
        assert_eq!(params.model("beta"), Some(0.1));
    }

    #[test]
    fn test_supplied_optional_is_kept() {
        let mut params = Parameters::new().with_model("gamma", 0.5);
        params
            .apply_declarations(&[ParameterSpec::optional("gamma", 0.05, "")])
            .unwrap();
        assert_eq!(params.model("gamma"), Some(0.5));
    }

    #[test]
    fn test_node_value_overrides_model_value() {
        let mut params = Parameters::new().with_model("threshold", 0.3);
        params.set_node("threshold", NodeId(1), 0.9);
        assert_eq!(params.node_or_model("threshold", NodeId(1)), Some(0.9));
        assert_eq!(params.node_or_model("threshold", NodeId(2)), Some(0.3));
    }

    #[test]
    fn test_edge_lookup_respects_direction() {
        let mut params = Parameters::new();
        params.set_edge("threshold", NodeId(1), NodeId(2), 0.4);
        assert_eq!(params.edge("threshold", NodeId(2), NodeId(1), false), Some(0.4));
        assert_eq!(params.edge("threshold", NodeId(2), NodeId(1), true), None);
        assert_eq!(params.edge("threshold", NodeId(1), NodeId(2), true), Some(0.4));
    }

    #[test]
    fn test_undirected_edge_value_is_symmetric() {
        let mut params = Parameters::new();
        params.set_edge("threshold", NodeId(1), NodeId(2), 0.1);
        params.set_edge("threshold", NodeId(2), NodeId(1), 0.9);

        assert_eq!(params.edge("threshold", NodeId(1), NodeId(2), false), Some(0.9));
        assert_eq!(params.edge("threshold", NodeId(2), NodeId(1), false), Some(0.9));
        // Directed lookups keep each orientation
        assert_eq!(params.edge("threshold", NodeId(1), NodeId(2), true), Some(0.1));
        assert_eq!(params.edge("threshold", NodeId(2), NodeId(1), true), Some(0.9));
    }
}
