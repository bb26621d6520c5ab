//! netcascade - compartmental rule engine for discrete-time processes on networks

pub mod compartment;
pub mod core;
pub mod graph;
pub mod rules;
pub mod simulation;

pub use crate::compartment::{Compartment, CompartmentRef};
pub use crate::core::{EngineConfig, NodeId, Result, SimError, StatusCode};
pub use crate::graph::{AttrValue, Network};
pub use crate::rules::{InitialStatus, ModelDefinition, Parameters};
pub use crate::simulation::{build_trends, IterationResult, Model, Trends};
