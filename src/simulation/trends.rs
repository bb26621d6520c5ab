//! Trend aggregation and serialization

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::StatusCode;
use crate::rules::registry::StatusRegistry;
use crate::simulation::iteration::IterationResult;

/// Time series for one status, one entry per iteration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTrend {
    pub node_count: Vec<usize>,
    pub status_delta: Vec<i64>,
}

/// Per-status time series across a run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    pub iterations: usize,
    pub trends: BTreeMap<StatusCode, StatusTrend>,
}

/// Reshape a run's results into per-status series
///
/// Every status seen in any result gets a series of full length; iterations
/// that do not mention it count as zero.
pub fn build_trends(results: &[IterationResult]) -> Trends {
    let codes: Vec<StatusCode> = results
        .iter()
        .flat_map(|r| r.node_count.keys().chain(r.status_delta.keys()))
        .copied()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    let trends = codes
        .into_iter()
        .map(|code| {
            let trend = StatusTrend {
                node_count: results.iter().map(|r| r.count(code)).collect(),
                status_delta: results.iter().map(|r| r.delta(code)).collect(),
            };
            (code, trend)
        })
        .collect();

    Trends {
        iterations: results.len(),
        trends,
    }
}

impl Trends {
    pub fn get(&self, status: StatusCode) -> Option<&StatusTrend> {
        self.trends.get(&status)
    }

    /// Count of `status` after the last iteration
    pub fn final_count(&self, status: StatusCode) -> usize {
        self.get(status)
            .and_then(|t| t.node_count.last().copied())
            .unwrap_or(0)
    }

    /// Highest count `status` reached and the iteration it was first reached at
    pub fn peak(&self, status: StatusCode) -> Option<(usize, usize)> {
        let counts = &self.get(status)?.node_count;
        let max = *counts.iter().max()?;
        let at = counts.iter().position(|&c| c == max)?;
        Some((at, max))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    /// One line per status, named through `registry` where possible
    pub fn summary(&self, registry: &StatusRegistry) -> String {
        let mut out = format!("{} iterations\n", self.iterations);
        for (&code, trend) in &self.trends {
            let name = registry
                .name(code)
                .map(str::to_string)
                .unwrap_or_else(|| code.to_string());
            let first = trend.node_count.first().copied().unwrap_or(0);
            let last = trend.node_count.last().copied().unwrap_or(0);
            let peak = trend.node_count.iter().max().copied().unwrap_or(0);
            out.push_str(&format!(
                "  {:<12} start {:>6}  end {:>6}  peak {:>6}\n",
                name, first, last, peak
            ));
        }
        out
    }
}
