//! Per-iteration output

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{Iteration, NodeId, StatusCode};

/// Outcome of one discrete step
///
/// At iteration 0 `status` holds every node (the initial snapshot) and all
/// deltas are zero. Afterwards it holds only the nodes that changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationResult {
    pub iteration: Iteration,
    /// `None` when node-status recording is turned off
    pub status: Option<BTreeMap<NodeId, StatusCode>>,
    /// Nodes per status after the step; every registered status is present
    pub node_count: BTreeMap<StatusCode, usize>,
    /// Change in `node_count` relative to the previous step
    pub status_delta: BTreeMap<StatusCode, i64>,
}

impl IterationResult {
    pub fn count(&self, status: StatusCode) -> usize {
        self.node_count.get(&status).copied().unwrap_or(0)
    }

    pub fn delta(&self, status: StatusCode) -> i64 {
        self.status_delta.get(&status).copied().unwrap_or(0)
    }

    /// Number of nodes reported in the delta map
    pub fn changed(&self) -> usize {
        self.status.as_ref().map_or(0, |s| s.len())
    }
}
