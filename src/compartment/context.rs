//! Everything a compartment may look at while evaluating one node

use ahash::AHashMap;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::error::{Result, SimError};
use crate::core::types::{NodeId, StatusCode};
use crate::graph::{AttrValue, Network};
use crate::rules::parameters::Parameters;
use crate::rules::registry::StatusRegistry;

/// Per-node auxiliary state owned by the scheduler
///
/// Stateful compartments (countdowns) keep their counters here, keyed by
/// compartment name, so one compartment instance can serve every node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeState {
    counters: AHashMap<String, u32>,
}

impl NodeState {
    pub fn counter(&self, name: &str) -> Option<u32> {
        self.counters.get(name).copied()
    }

    pub fn set_counter(&mut self, name: &str, value: u32) {
        self.counters.insert(name.to_string(), value);
    }

    pub fn clear_counter(&mut self, name: &str) {
        self.counters.remove(name);
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
    }
}

/// Read-only view of the iteration plus this node's private mutable slots
pub struct EvalContext<'a> {
    pub node: NodeId,
    /// Position of `node` in graph iteration order
    pub index: usize,
    pub network: &'a Network,
    /// Statuses frozen at the start of the iteration, indexed by position
    pub snapshot: &'a [StatusCode],
    pub registry: &'a StatusRegistry,
    pub params: &'a Parameters,
    pub state: &'a mut NodeState,
    pub rng: &'a mut ChaCha8Rng,
}

impl<'a> EvalContext<'a> {
    /// Status of the evaluated node at the start of the iteration
    pub fn status(&self) -> StatusCode {
        self.snapshot[self.index]
    }

    /// One uniform sample in [0, 1)
    pub fn sample(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Positions of the in-neighbours (predecessors when directed)
    pub fn in_neighbors(&self) -> &'a [usize] {
        self.network.in_neighbor_indices(self.index)
    }

    pub fn in_degree(&self) -> usize {
        self.in_neighbors().len()
    }

    /// In-neighbours whose snapshot status equals `status`
    pub fn neighbors_in(&self, status: StatusCode) -> impl Iterator<Item = usize> + 'a {
        let snapshot = self.snapshot;
        self.network
            .in_neighbor_indices(self.index)
            .iter()
            .copied()
            .filter(move |&i| snapshot[i] == status)
    }

    pub fn count_neighbors_in(&self, status: StatusCode) -> usize {
        self.neighbors_in(status).count()
    }

    pub fn resolve_status(&self, name: &str) -> Result<StatusCode> {
        Ok(self.registry.resolve(name)?)
    }

    pub fn node_attr(&self, name: &str) -> Result<&'a AttrValue> {
        self.network
            .node_attr(self.node, name)
            .ok_or_else(|| SimError::MissingNodeAttribute {
                node: self.node,
                attribute: name.to_string(),
            })
    }

    pub fn numeric_node_attr(&self, name: &str) -> Result<f64> {
        self.node_attr(name)?
            .as_f64()
            .ok_or_else(|| SimError::NonNumericAttribute {
                node: self.node,
                attribute: name.to_string(),
            })
    }

    /// Attribute of the edge linking in-neighbour `neighbor` to this node
    pub fn edge_attr(&self, neighbor: usize, name: &str) -> Result<&'a AttrValue> {
        let from = self.network.node_at(neighbor);
        self.network
            .edge_attr(from, self.node, name)
            .ok_or_else(|| SimError::MissingEdgeAttribute {
                from,
                to: self.node,
                attribute: name.to_string(),
            })
    }

    /// Per-node parameter value, falling back to the model-wide one
    pub fn node_param(&self, name: &str) -> Result<f64> {
        self.params
            .node_or_model(name, self.node)
            .ok_or_else(|| SimError::MissingNodeParameter {
                node: self.node,
                parameter: name.to_string(),
            })
    }
}
