//! Model configuration: statuses, transition rules, parameters and initial state

pub mod initial;
pub mod loader;
pub mod parameters;
pub mod registry;
pub mod table;

pub use initial::InitialStatus;
pub use loader::{CompartmentDef, ModelDefinition};
pub use parameters::{ParameterSpec, Parameters, Requirement};
pub use registry::StatusRegistry;
pub use table::{Rule, RuleTable};
