use thiserror::Error;

use crate::core::types::{NodeId, StatusCode};

/// Problems detected while a model is being built, before any iteration runs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown status: '{0}'")]
    UnknownStatus(String),

    #[error("Status '{name}' is already registered with code {existing}")]
    DuplicateStatus { name: String, existing: StatusCode },

    #[error("Status code {code} is already used by '{owner}'")]
    DuplicateCode { code: StatusCode, owner: String },

    #[error("Missing mandatory parameter: '{0}'")]
    MissingParameter(String),

    #[error("Invalid operator: '{0}'")]
    InvalidOperator(String),

    #[error("Operator IN requires an ascending two-element range, got {0}")]
    InvalidRange(String),

    #[error("Operator {op} requires a numeric reference value, got {value}")]
    NonNumericReference { op: String, value: String },

    #[error("{what} must lie in [0, 1], got {value}")]
    OutOfUnitRange { what: &'static str, value: f64 },

    #[error("No threshold source: set a constant or provide per-node '{0}' values")]
    MissingThreshold(String),

    #[error("CountDown '{0}' needs at least one iteration")]
    InvalidCountDown(String),

    #[error("Initial configuration references unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Initial fractions sum to {0}, which exceeds 1")]
    FractionsExceedOne(f64),

    #[error("Status codes must start at a non-negative base, got {0}")]
    NegativeStatusBase(StatusCode),

    #[error("Model has no statuses registered")]
    NoStatuses,

    #[error("Invalid engine configuration: {0}")]
    InvalidEngine(String),

    #[error("Invalid compartment definition: {0}")]
    InvalidDefinition(String),
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Edge not found: ({from}, {to})")]
    EdgeNotFound { from: NodeId, to: NodeId },

    #[error("Node {node} has no attribute '{attribute}'")]
    MissingNodeAttribute { node: NodeId, attribute: String },

    #[error("Edge ({from}, {to}) has no attribute '{attribute}'")]
    MissingEdgeAttribute {
        from: NodeId,
        to: NodeId,
        attribute: String,
    },

    #[error("Node attribute '{attribute}' of {node} is not numeric")]
    NonNumericAttribute { node: NodeId, attribute: String },

    #[error("Edge ({from}, {to}) attribute '{attribute}' is not numeric")]
    NonNumericEdgeAttribute {
        from: NodeId,
        to: NodeId,
        attribute: String,
    },

    #[error("Parameter '{parameter}' has no value for node {node}")]
    MissingNodeParameter { node: NodeId, parameter: String },

    #[error("Model has no initial status configuration")]
    NotInitialized,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl SimError {
    /// True for errors raised while building a model rather than while running it
    pub fn is_config(&self) -> bool {
        matches!(self, SimError::Config(_) | SimError::TomlError(_))
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: SimError = ConfigError::UnknownStatus("Zombie".into()).into();
        assert!(err.is_config());
        assert!(err.to_string().contains("Zombie"));
    }

    #[test]
    fn test_runtime_error_is_not_config() {
        let err = SimError::MissingNodeAttribute {
            node: NodeId(4),
            attribute: "age".into(),
        };
        assert!(!err.is_config());
        assert_eq!(err.to_string(), "Node 4 has no attribute 'age'");
    }
}
