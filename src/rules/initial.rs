//! Initial status assignment
//!
//! Nodes can be placed explicitly, drawn at random as a fraction of the
//! network, or left at the default status. Explicit placements win over
//! random ones; random draws only pick among nodes nobody placed.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::compartment::check_unit;
use crate::core::error::ConfigError;
use crate::core::types::{NodeId, StatusCode};
use crate::graph::Network;
use crate::rules::registry::StatusRegistry;

#[derive(Debug, Clone, Default)]
pub struct InitialStatus {
    default_status: Option<String>,
    fractions: Vec<(String, f64)>,
    assignments: Vec<(NodeId, String)>,
}

impl InitialStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status for nodes not otherwise placed; defaults to the first
    /// registered non-sentinel status
    pub fn with_default(mut self, status: &str) -> Self {
        self.default_status = Some(status.to_string());
        self
    }

    /// Put about `fraction * n` randomly chosen nodes into `status`
    ///
    /// All fractions together place `round(sum * n)` nodes, capped by the
    /// nodes left after explicit assignments, shared out by largest
    /// remainder.
    pub fn with_fraction(mut self, status: &str, fraction: f64) -> Self {
        self.fractions.push((status.to_string(), fraction));
        self
    }

    pub fn assign(mut self, node: NodeId, status: &str) -> Self {
        self.assignments.push((node, status.to_string()));
        self
    }

    pub fn assign_all<I>(mut self, nodes: I, status: &str) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.assignments
            .extend(nodes.into_iter().map(|n| (n, status.to_string())));
        self
    }

    /// Produce one status per node, aligned with the network's node order
    pub fn resolve(
        &self,
        network: &Network,
        registry: &StatusRegistry,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<StatusCode>, ConfigError> {
        let default = match &self.default_status {
            Some(name) => registry.resolve(name)?,
            None => registry.default_status().ok_or(ConfigError::NoStatuses)?,
        };

        let n = network.node_count();
        let mut statuses = vec![default; n];
        let mut placed = vec![false; n];

        for (node, name) in &self.assignments {
            let idx = network
                .index_of(*node)
                .ok_or(ConfigError::UnknownNode(*node))?;
            statuses[idx] = registry.resolve(name)?;
            placed[idx] = true;
        }

        let mut total = 0.0;
        let mut drawn = Vec::with_capacity(self.fractions.len());
        for (name, fraction) in &self.fractions {
            check_unit("fraction", *fraction)?;
            total += fraction;
            drawn.push((registry.resolve(name)?, *fraction));
        }
        if total > 1.0 + f64::EPSILON {
            return Err(ConfigError::FractionsExceedOne(total));
        }

        if !drawn.is_empty() {
            let mut pool: Vec<usize> = (0..n).filter(|&i| !placed[i]).collect();
            pool.shuffle(rng);
            let target = ((total * n as f64).round() as usize).min(pool.len());
            let quotas: Vec<f64> = drawn.iter().map(|(_, f)| f * n as f64).collect();
            let counts = apportion(&quotas, target);

            let mut pool = pool.into_iter();
            for ((code, _), count) in drawn.into_iter().zip(counts) {
                for idx in pool.by_ref().take(count) {
                    statuses[idx] = code;
                }
            }
        }

        Ok(statuses)
    }
}

/// Split `total` slots in proportion to `quotas` (largest remainder)
///
/// The counts always sum to `total`. Ties in the remainder go to the
/// earlier quota.
fn apportion(quotas: &[f64], total: usize) -> Vec<usize> {
    let sum: f64 = quotas.iter().sum();
    if sum <= 0.0 || total == 0 {
        return vec![0; quotas.len()];
    }
    let scaled: Vec<f64> = quotas.iter().map(|q| q * total as f64 / sum).collect();
    let mut counts: Vec<usize> = scaled.iter().map(|q| q.floor() as usize).collect();
    let assigned: usize = counts.iter().sum();

    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = scaled[a] - scaled[a].floor();
        let rb = scaled[b] - scaled[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &i in order.iter().take(total.saturating_sub(assigned)) {
        counts[i] += 1;
    }
    counts
}
