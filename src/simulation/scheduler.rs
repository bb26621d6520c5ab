//! Iteration scheduler - one discrete step over every node
//!
//! Each step reads a status vector frozen at the start of the iteration,
//! writes transitions into a separate buffer and publishes the buffer only
//! after every node has been evaluated. No node can observe another node's
//! transition from the same step, so outcomes do not depend on visiting
//! order.
//!
//! Uses rayon for parallel evaluation above `EngineConfig::parallel_threshold`.
//! Every node draws from its own ChaCha stream keyed by (seed, iteration,
//! node position), so parallel and sequential runs agree draw for draw.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::compartment::{EvalContext, NodeState};
use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::types::{Iteration, StatusCode};
use crate::graph::Network;
use crate::rules::parameters::Parameters;
use crate::rules::registry::StatusRegistry;
use crate::rules::table::RuleTable;
use crate::simulation::iteration::IterationResult;
use crate::simulation::rule_eval::evaluate_rules;

/// Read-only inputs shared by every node evaluation in a step
pub struct Environment<'a> {
    pub network: &'a Network,
    pub registry: &'a StatusRegistry,
    pub rules: &'a RuleTable,
    pub params: &'a Parameters,
    pub config: &'a EngineConfig,
}

/// Master RNG for one iteration; stream 0 is reserved for initial placement
pub fn iteration_rng(seed: u64, iteration: Iteration) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(iteration);
    rng
}

fn node_rng(key: &[u8; 32], index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::from_seed(*key);
    rng.set_stream(index as u64);
    rng
}

/// Authoritative status vector plus the bookkeeping needed to report deltas
#[derive(Debug, Clone)]
pub struct Scheduler {
    seed: u64,
    iteration: Iteration,
    initial: Vec<StatusCode>,
    statuses: Vec<StatusCode>,
    states: Vec<NodeState>,
    counts: BTreeMap<StatusCode, usize>,
}

impl Scheduler {
    pub fn new(seed: u64, initial: Vec<StatusCode>) -> Self {
        let n = initial.len();
        Self {
            seed,
            iteration: 0,
            statuses: initial.clone(),
            initial,
            states: vec![NodeState::default(); n],
            counts: BTreeMap::new(),
        }
    }

    /// Index of the next iteration to run
    pub fn iteration(&self) -> Iteration {
        self.iteration
    }

    pub fn statuses(&self) -> &[StatusCode] {
        &self.statuses
    }

    pub fn node_state(&self, index: usize) -> Option<&NodeState> {
        self.states.get(index)
    }

    /// Back to iteration 0 with the initial statuses and no auxiliary state
    pub fn reset(&mut self) {
        self.iteration = 0;
        self.statuses.clone_from(&self.initial);
        self.states.iter_mut().for_each(|s| *s = NodeState::default());
        self.counts.clear();
    }

    /// Run one step
    ///
    /// A node that changes status loses its countdown counters. On error
    /// nothing is committed: statuses, per-node state and the
    /// iteration counter are exactly as before the call.
    pub fn step(&mut self, env: &Environment<'_>) -> Result<IterationResult> {
        if self.iteration == 0 {
            return Ok(self.baseline(env));
        }

        let mut states = self.states.clone();
        let updates = self.evaluate(env, &mut states)?;

        let mut changed = BTreeMap::new();
        for (index, update) in updates.into_iter().enumerate() {
            if let Some(to) = update {
                if self.statuses[index] != to {
                    self.statuses[index] = to;
                    states[index].clear();
                    changed.insert(env.network.node_at(index), to);
                }
            }
        }
        self.states = states;

        let counts = count_statuses(&self.statuses, env.registry);
        let deltas: BTreeMap<StatusCode, i64> = counts
            .iter()
            .map(|(&code, &now)| {
                let before = self.counts.get(&code).copied().unwrap_or(0);
                (code, now as i64 - before as i64)
            })
            .collect();

        debug_assert!(
            counts.iter().all(|(code, &now)| {
                self.counts.get(code).copied().unwrap_or(0) as i64 + deltas[code] == now as i64
            }),
            "status deltas do not reconcile with counts"
        );
        debug_assert_eq!(deltas.values().sum::<i64>(), 0);

        tracing::debug!(
            iteration = self.iteration,
            changed = changed.len(),
            "iteration complete: {:?}",
            counts
        );

        let result = IterationResult {
            iteration: self.iteration,
            status: env.config.record_node_status.then_some(changed),
            node_count: counts.clone(),
            status_delta: deltas,
        };
        self.counts = counts;
        self.iteration += 1;
        Ok(result)
    }

    /// Iteration 0: no transitions, establishes the baseline counts
    fn baseline(&mut self, env: &Environment<'_>) -> IterationResult {
        let counts = count_statuses(&self.statuses, env.registry);
        let status = env.config.record_node_status.then(|| {
            self.statuses
                .iter()
                .enumerate()
                .map(|(index, &code)| (env.network.node_at(index), code))
                .collect()
        });
        let result = IterationResult {
            iteration: 0,
            status,
            node_count: counts.clone(),
            status_delta: counts.keys().map(|&code| (code, 0)).collect(),
        };
        self.counts = counts;
        self.iteration = 1;
        result
    }

    /// Evaluate every node against the frozen snapshot
    fn evaluate(
        &self,
        env: &Environment<'_>,
        states: &mut [NodeState],
    ) -> Result<Vec<Option<StatusCode>>> {
        let snapshot: &[StatusCode] = &self.statuses;
        let mut key = [0u8; 32];
        iteration_rng(self.seed, self.iteration).fill_bytes(&mut key);

        let visit = |index: usize, state: &mut NodeState| -> Result<Option<StatusCode>> {
            if env.rules.rules_from(snapshot[index]).next().is_none() {
                return Ok(None);
            }
            let mut rng = node_rng(&key, index);
            let mut ctx = EvalContext {
                node: env.network.node_at(index),
                index,
                network: env.network,
                snapshot,
                registry: env.registry,
                params: env.params,
                state,
                rng: &mut rng,
            };
            evaluate_rules(env.rules, &mut ctx)
        };

        if snapshot.len() >= env.config.parallel_threshold {
            states
                .par_iter_mut()
                .enumerate()
                .map(|(index, state)| visit(index, state))
                .collect()
        } else {
            states
                .iter_mut()
                .enumerate()
                .map(|(index, state)| visit(index, state))
                .collect()
        }
    }
}

/// Nodes per status; every registered status appears, even at zero
pub fn count_statuses(
    statuses: &[StatusCode],
    registry: &StatusRegistry,
) -> BTreeMap<StatusCode, usize> {
    let mut counts: BTreeMap<StatusCode, usize> = registry.codes().map(|c| (c, 0)).collect();
    for &code in statuses {
        *counts.entry(code).or_insert(0) += 1;
    }
    counts
}
