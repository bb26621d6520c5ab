pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{ConfigError, Result, SimError};
pub use types::{EdgeKey, Iteration, NodeId, StatusCode, BLOCKED};
