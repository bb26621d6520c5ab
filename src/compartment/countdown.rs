//! Per-node countdown timers

use crate::compartment::{Compartment, EvalContext};
use crate::core::error::{ConfigError, Result};

/// Fires on the `iterations`-th consecutive evaluation for a node
///
/// The first evaluation starts the counter at `iterations`; every
/// evaluation, including the first and failed ones, decrements it. It fires
/// when the counter reaches zero, after which the counter is cleared and the
/// next evaluation starts a fresh countdown. The scheduler also clears a
/// node's counters whenever its status changes, so a node that leaves and
/// later returns starts from scratch.
///
/// Counters live in the scheduler's per-node state under `name`, so two
/// countdowns sharing a name share a timer.
#[derive(Debug, Clone)]
pub struct CountDown {
    name: String,
    iterations: u32,
}

impl CountDown {
    pub fn new(name: &str, iterations: u32) -> std::result::Result<Self, ConfigError> {
        if iterations == 0 {
            return Err(ConfigError::InvalidCountDown(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            iterations,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Compartment for CountDown {
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool> {
        let remaining = ctx.state.counter(&self.name).unwrap_or(self.iterations) - 1;
        if remaining == 0 {
            ctx.state.clear_counter(&self.name);
            Ok(true)
        } else {
            ctx.state.set_counter(&self.name, remaining);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compartment::test_support::Fixture;

    #[test]
    fn test_fires_on_third_evaluation() {
        let mut fx = Fixture::star(1);
        let c = CountDown::new("incubation", 3).unwrap();
        assert!(!fx.eval(&c, 1).unwrap());
        assert!(!fx.eval(&c, 1).unwrap());
        assert!(fx.eval(&c, 1).unwrap());
    }

    #[test]
    fn test_restarts_after_firing() {
        let mut fx = Fixture::star(1);
        let c = CountDown::new("t", 2).unwrap();
        let fired: Vec<bool> = (0..6).map(|_| fx.eval(&c, 1).unwrap()).collect();
        assert_eq!(fired, vec![false, true, false, true, false, true]);
    }

    #[test]
    fn test_single_iteration_fires_immediately() {
        let mut fx = Fixture::star(1);
        let c = CountDown::new("now", 1).unwrap();
        assert!(fx.eval(&c, 1).unwrap());
        assert!(fx.states[1].is_empty());
    }

    #[test]
    fn test_counters_are_per_node() {
        let mut fx = Fixture::star(2);
        let c = CountDown::new("t", 2).unwrap();
        assert!(!fx.eval(&c, 1).unwrap());
        assert!(!fx.eval(&c, 2).unwrap());
        assert!(fx.eval(&c, 1).unwrap());
        assert_eq!(fx.states[2].counter("t"), Some(1));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(matches!(
            CountDown::new("bad", 0),
            Err(ConfigError::InvalidCountDown(_))
        ));
    }
}
