pub mod iteration;
pub mod model;
pub mod rule_eval;
pub mod scheduler;
pub mod trends;

pub use iteration::IterationResult;
pub use model::Model;
pub use rule_eval::evaluate_rules;
pub use scheduler::{count_statuses, Environment, Scheduler};
pub use trends::{build_trends, StatusTrend, Trends};
