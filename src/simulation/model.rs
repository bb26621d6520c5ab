//! Model - statuses, rules and parameters bound to one network
//!
//! A model is Uninitialized until `set_initial_status` succeeds. Changing
//! the status set or the rule table afterwards drops it back to
//! Uninitialized, so a stale configuration can never run.

use std::collections::BTreeMap;

use crate::compartment::CompartmentRef;
use crate::core::config::EngineConfig;
use crate::core::error::{ConfigError, Result, SimError};
use crate::core::types::{Iteration, NodeId, StatusCode};
use crate::graph::Network;
use crate::rules::initial::InitialStatus;
use crate::rules::parameters::{ParameterSpec, Parameters};
use crate::rules::registry::StatusRegistry;
use crate::rules::table::{Rule, RuleTable};
use crate::simulation::iteration::IterationResult;
use crate::simulation::scheduler::{iteration_rng, Environment, Scheduler};

pub struct Model {
    name: String,
    network: Network,
    registry: StatusRegistry,
    rules: RuleTable,
    params: Parameters,
    declarations: Vec<ParameterSpec>,
    config: EngineConfig,
    seed: u64,
    scheduler: Option<Scheduler>,
}

impl Model {
    pub fn new(name: &str, network: Network, config: EngineConfig) -> Result<Self> {
        Self::with_status_base(name, network, config, 0)
    }

    /// Like `new`, but statuses are numbered from `base` instead of 0
    pub fn with_status_base(
        name: &str,
        network: Network,
        config: EngineConfig,
        base: StatusCode,
    ) -> Result<Self> {
        config.validate()?;
        if base < 0 {
            return Err(ConfigError::NegativeStatusBase(base).into());
        }
        let seed = config.seed.unwrap_or_else(rand::random);
        tracing::info!(
            model = name,
            nodes = network.node_count(),
            edges = network.edge_count(),
            seed,
            "model created"
        );
        Ok(Self {
            name: name.to_string(),
            network,
            registry: StatusRegistry::with_base(base),
            rules: RuleTable::new(),
            params: Parameters::new(),
            declarations: Vec::new(),
            config,
            seed,
            scheduler: None,
        })
    }

    /// Register a status, returning its code; re-adding a name is a no-op
    pub fn add_status(&mut self, name: &str) -> StatusCode {
        if let Some(code) = self.registry.code(name) {
            return code;
        }
        self.invalidate("status added");
        self.registry.add_status(name)
    }

    /// Register a sentinel such as `Blocked = -1`
    pub fn add_status_with_code(&mut self, name: &str, code: StatusCode) -> Result<StatusCode> {
        if self.registry.code(name) == Some(code) {
            return Ok(code);
        }
        let code = self.registry.register_with_code(name, code)?;
        self.invalidate("status added");
        Ok(code)
    }

    /// Append a `from -> to` rule; earlier rules take precedence
    pub fn add_rule(&mut self, from: &str, to: &str, compartment: CompartmentRef) -> Result<()> {
        let from_code = self.registry.resolve(from)?;
        let to_code = self.registry.resolve(to)?;
        compartment.validate(&self.registry, &self.params)?;
        if from_code == to_code {
            tracing::warn!(status = from, "rule leaves status unchanged");
        }
        self.rules.push(Rule {
            from: from_code,
            to: to_code,
            compartment,
        });
        self.invalidate("rule added");
        Ok(())
    }

    /// Replace the parameter tables
    pub fn set_parameters(&mut self, params: Parameters) {
        self.params = params;
        self.invalidate("parameters replaced");
    }

    /// Require a model-wide parameter, or supply a default for it
    pub fn declare_parameter(&mut self, spec: ParameterSpec) {
        self.declarations.push(spec);
        self.invalidate("parameter declared");
    }

    /// Check the whole configuration and place every node in its first status
    ///
    /// Random placements draw from the model seed, so the same seed always
    /// yields the same starting point.
    pub fn set_initial_status(&mut self, initial: InitialStatus) -> Result<()> {
        self.params.apply_declarations(&self.declarations)?;
        self.rules.validate(&self.registry, &self.params)?;

        let mut rng = iteration_rng(self.seed, 0);
        let statuses = initial.resolve(&self.network, &self.registry, &mut rng)?;
        self.scheduler = Some(Scheduler::new(self.seed, statuses));

        tracing::info!(
            model = %self.name,
            statuses = self.registry.len(),
            rules = self.rules.len(),
            "model configured"
        );
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Run one iteration; the first call reports the initial state
    pub fn iteration(&mut self) -> Result<IterationResult> {
        let scheduler = self.scheduler.as_mut().ok_or(SimError::NotInitialized)?;
        let env = Environment {
            network: &self.network,
            registry: &self.registry,
            rules: &self.rules,
            params: &self.params,
            config: &self.config,
        };
        scheduler.step(&env)
    }

    /// Run exactly `n` iterations
    ///
    /// Stops at the first failing iteration. Iterations completed before it
    /// stay applied but their results are dropped with the error; use
    /// `iteration_bunch_into` to keep them.
    pub fn iteration_bunch(&mut self, n: usize) -> Result<Vec<IterationResult>> {
        let mut results = Vec::with_capacity(n);
        self.iteration_bunch_into(n, &mut results)?;
        Ok(results)
    }

    /// Run up to `n` iterations, appending each result to `results`
    ///
    /// On error `results` holds every iteration that was committed before
    /// the failing one.
    pub fn iteration_bunch_into(
        &mut self,
        n: usize,
        results: &mut Vec<IterationResult>,
    ) -> Result<()> {
        results.reserve(n);
        for _ in 0..n {
            results.push(self.iteration()?);
        }
        Ok(())
    }

    /// Back to iteration 0 with the initial statuses and fresh per-node state
    pub fn reset(&mut self) -> Result<()> {
        let scheduler = self.scheduler.as_mut().ok_or(SimError::NotInitialized)?;
        scheduler.reset();
        tracing::debug!(model = %self.name, "model reset");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Index of the next iteration to run
    pub fn current_iteration(&self) -> Option<Iteration> {
        self.scheduler.as_ref().map(Scheduler::iteration)
    }

    pub fn status_of(&self, node: NodeId) -> Result<StatusCode> {
        let scheduler = self.scheduler.as_ref().ok_or(SimError::NotInitialized)?;
        let index = self
            .network
            .index_of(node)
            .ok_or(SimError::NodeNotFound(node))?;
        Ok(scheduler.statuses()[index])
    }

    /// Current status of every node
    pub fn status_map(&self) -> Result<BTreeMap<NodeId, StatusCode>> {
        let scheduler = self.scheduler.as_ref().ok_or(SimError::NotInitialized)?;
        Ok(self
            .network
            .nodes()
            .iter()
            .copied()
            .zip(scheduler.statuses().iter().copied())
            .collect())
    }

    fn invalidate(&mut self, reason: &str) {
        if self.scheduler.take().is_some() {
            tracing::warn!(
                model = %self.name,
                reason,
                "configuration changed, initial status must be set again"
            );
        }
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("nodes", &self.network.node_count())
            .field("statuses", &self.registry.len())
            .field("rules", &self.rules.len())
            .field("seed", &self.seed)
            .field("iteration", &self.current_iteration())
            .finish()
    }
}
