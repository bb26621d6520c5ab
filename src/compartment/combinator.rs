//! Structural combinators

use crate::compartment::{Compartment, CompartmentRef, EvalContext};
use crate::core::error::{ConfigError, Result};
use crate::rules::parameters::Parameters;
use crate::rules::registry::StatusRegistry;

/// `first` AND `then`, with `then` skipped when `first` fails
#[derive(Debug, Clone)]
pub struct Composed {
    first: CompartmentRef,
    then: CompartmentRef,
}

impl Composed {
    pub fn new(first: CompartmentRef, then: CompartmentRef) -> Self {
        Self { first, then }
    }
}

impl Compartment for Composed {
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool> {
        if !self.first.execute(ctx)? {
            return Ok(false);
        }
        self.then.execute(ctx)
    }

    fn validate(
        &self,
        registry: &StatusRegistry,
        params: &Parameters,
    ) -> std::result::Result<(), ConfigError> {
        self.first.validate(registry, params)?;
        self.then.validate(registry, params)
    }
}

/// If/then/else: exactly one branch runs, picked by `condition`
#[derive(Debug, Clone)]
pub struct Conditional {
    condition: CompartmentRef,
    then_branch: CompartmentRef,
    else_branch: CompartmentRef,
}

impl Conditional {
    pub fn new(
        condition: CompartmentRef,
        then_branch: CompartmentRef,
        else_branch: CompartmentRef,
    ) -> Self {
        Self {
            condition,
            then_branch,
            else_branch,
        }
    }
}

impl Compartment for Conditional {
    fn execute(&self, ctx: &mut EvalContext<'_>) -> Result<bool> {
        if self.condition.execute(ctx)? {
            self.then_branch.execute(ctx)
        } else {
            self.else_branch.execute(ctx)
        }
    }

    fn validate(
        &self,
        registry: &StatusRegistry,
        params: &Parameters,
    ) -> std::result::Result<(), ConfigError> {
        self.condition.validate(registry, params)?;
        self.then_branch.validate(registry, params)?;
        self.else_branch.validate(registry, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compartment::test_support::Fixture;
    use crate::compartment::{CountDown, NodeStochastic, NodeThreshold};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns a fixed answer and counts how often it was asked
    #[derive(Debug)]
    struct Probe {
        answer: bool,
        calls: AtomicUsize,
    }

    impl Probe {
        fn new(answer: bool) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Compartment for Probe {
        fn execute(&self, _ctx: &mut EvalContext<'_>) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    #[test]
    fn test_composed_truth_table() {
        let mut fx = Fixture::star(1);
        for (a, b) in [(true, true), (true, false), (false, true), (false, false)] {
            let c = Composed::new(Probe::new(a), Probe::new(b));
            assert_eq!(fx.eval(&c, 0).unwrap(), a && b);
        }
    }

    #[test]
    fn test_composed_short_circuits() {
        let mut fx = Fixture::star(1);
        let head = Probe::new(false);
        let tail = Probe::new(true);
        let c = Composed::new(head.clone(), tail.clone());
        assert!(!fx.eval(&c, 0).unwrap());
        assert_eq!(head.calls(), 1);
        assert_eq!(tail.calls(), 0);
    }

    #[test]
    fn test_compose_method_chains() {
        let mut fx = Fixture::star(1);
        let c = NodeStochastic::new(1.0)
            .unwrap()
            .compose(CountDown::new("delay", 2).unwrap().into_ref());
        assert!(!fx.eval(&c, 1).unwrap());
        assert!(fx.eval(&c, 1).unwrap());
    }

    #[test]
    fn test_conditional_runs_one_branch() {
        let mut fx = Fixture::star(1);
        let then_branch = Probe::new(true);
        let else_branch = Probe::new(false);

        let yes = Conditional::new(Probe::new(true), then_branch.clone(), else_branch.clone());
        assert!(fx.eval(&yes, 0).unwrap());
        let no = Conditional::new(Probe::new(false), then_branch.clone(), else_branch.clone());
        assert!(!fx.eval(&no, 0).unwrap());

        assert_eq!(then_branch.calls(), 1);
        assert_eq!(else_branch.calls(), 1);
    }

    #[test]
    fn test_validation_reaches_children() {
        let fx = Fixture::star(1);
        let c = Conditional::new(
            Probe::new(true),
            Probe::new(true),
            NodeThreshold::new("Zombie").with_threshold(0.5).unwrap().into_ref(),
        );
        assert_eq!(
            c.validate(&fx.registry, &fx.params),
            Err(ConfigError::UnknownStatus("Zombie".into()))
        );
    }
}
