//! Compartments: composable predicates that gate status transitions
//!
//! A compartment answers one question for one node: does this transition
//! fire now? Variants look at neighbour statuses, thresholds, node and edge
//! attributes or per-node countdowns. `Composed` chains two compartments with
//! short-circuit AND; `Conditional` routes between two branches.
//!
//! Compartments are shared behind `Arc` and evaluated through `&self`, so
//! the same instance can back several rules and run on several threads.
//! Anything that must persist between evaluations lives in the scheduler's
//! per-node `NodeState`, never in the compartment.

pub mod attribute;
pub mod combinator;
pub mod context;
pub mod countdown;
pub mod edge;
pub mod operator;
pub mod stochastic;
pub mod threshold;

use std::fmt;
use std::sync::Arc;

use crate::core::error::{ConfigError, Result};
use crate::rules::parameters::Parameters;
use crate::rules::registry::StatusRegistry;

pub use attribute::{
    NodeCategoricalAttribute, NodeNumericalAttribute, NodeNumericalVariable, NumericVariable,
};
pub use combinator::{Composed, Conditional};
pub use context::{EvalContext, NodeState};
pub use countdown::CountDown;
pub use edge::{EdgeCategoricalAttribute, EdgeNumericalAttribute, EdgeStochastic};
pub use operator::{NumericCondition, Operator, Reference};
pub use stochastic::{NodeStochastic, Rate};
pub use threshold::NodeThreshold;

/// Shared handle to a compartment
pub type CompartmentRef = Arc<dyn Compartment>;

pub trait Compartment: Send + Sync + fmt::Debug {
    /// Evaluate the predicate for `ctx.node`
    ///
    /// Reads statuses only from `ctx.snapshot`. Errors abort the iteration.
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool>;

    /// Configuration-time check against the model's statuses and parameters
    fn validate(
        &self,
        _registry: &StatusRegistry,
        _params: &Parameters,
    ) -> std::result::Result<(), ConfigError> {
        Ok(())
    }

    /// Short-circuit AND: `next` only runs when `self` succeeds
    fn compose(self, next: CompartmentRef) -> Composed
    where
        Self: Sized + 'static,
    {
        Composed::new(Arc::new(self), next)
    }

    fn into_ref(self) -> CompartmentRef
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

/// Success probability applied after an attribute match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probability(f64);

impl Probability {
    pub const CERTAIN: Probability = Probability(1.0);

    pub fn new(p: f64) -> std::result::Result<Self, ConfigError> {
        check_unit("probability", p)?;
        Ok(Self(p))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Certain gates pass without consuming a draw
    pub fn passes(&self, ctx: &mut EvalContext<'_>) -> bool {
        self.0 >= 1.0 || ctx.sample() < self.0
    }
}

impl Default for Probability {
    fn default() -> Self {
        Self::CERTAIN
    }
}

pub(crate) fn check_unit(what: &'static str, value: f64) -> std::result::Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { what, value })
    }
}

pub(crate) fn validate_trigger(
    trigger: Option<&str>,
    registry: &StatusRegistry,
) -> std::result::Result<(), ConfigError> {
    match trigger {
        Some(name) => registry.resolve(name).map(|_| ()),
        None => Ok(()),
    }
}
