//! In-memory network the rule engine evaluates against
//!
//! Nodes keep insertion order; that order is the order the scheduler visits
//! them in. Adjacency is stored by dense index so neighbour scans during an
//! iteration never hash.

use ahash::{AHashMap, AHashSet};

use crate::core::error::{Result, SimError};
use crate::core::types::{EdgeKey, NodeId};
use crate::graph::attributes::AttrValue;

type AttrMap = AHashMap<String, AttrValue>;

#[derive(Debug, Clone, Default)]
pub struct Network {
    directed: bool,
    nodes: Vec<NodeId>,
    index: AHashMap<NodeId, usize>,
    /// Out-neighbours when directed, all neighbours otherwise
    successors: Vec<Vec<usize>>,
    /// Only populated for directed networks
    predecessors: Vec<Vec<usize>>,
    edges: AHashSet<EdgeKey>,
    node_attrs: Vec<AttrMap>,
    edge_attrs: AHashMap<EdgeKey, AttrMap>,
}

impl Network {
    pub fn undirected() -> Self {
        Self::default()
    }

    pub fn directed() -> Self {
        Self {
            directed: true,
            ..Self::default()
        }
    }

    /// Build a network from an edge list, adding endpoints as they appear
    pub fn from_edges<I>(directed: bool, edges: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut network = if directed {
            Self::directed()
        } else {
            Self::undirected()
        };
        for (u, v) in edges {
            network.add_edge(u, v);
        }
        network
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Add a node; returns its position in iteration order. Re-adding is a no-op.
    pub fn add_node(&mut self, node: NodeId) -> usize {
        if let Some(&idx) = self.index.get(&node) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(node, idx);
        self.successors.push(Vec::new());
        if self.directed {
            self.predecessors.push(Vec::new());
        }
        self.node_attrs.push(AttrMap::new());
        idx
    }

    /// Add an edge, creating missing endpoints. Parallel edges collapse.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId) {
        let key = EdgeKey::new(u, v, self.directed);
        let ui = self.add_node(u);
        let vi = self.add_node(v);
        if !self.edges.insert(key) {
            return;
        }
        self.successors[ui].push(vi);
        if self.directed {
            self.predecessors[vi].push(ui);
        } else if ui != vi {
            self.successors[vi].push(ui);
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.index.contains_key(&node)
    }

    pub fn has_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.edges.contains(&EdgeKey::new(u, v, self.directed))
    }

    /// Position of a node in iteration order
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.index.get(&node).copied()
    }

    pub fn node_at(&self, idx: usize) -> NodeId {
        self.nodes[idx]
    }

    /// Nodes in iteration order
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Indices of the nodes whose status can influence `idx`:
    /// predecessors when directed, neighbours otherwise.
    pub fn in_neighbor_indices(&self, idx: usize) -> &[usize] {
        if self.directed {
            &self.predecessors[idx]
        } else {
            &self.successors[idx]
        }
    }

    pub fn neighbors(&self, node: NodeId) -> Result<impl Iterator<Item = NodeId> + '_> {
        let idx = self.index_of(node).ok_or(SimError::NodeNotFound(node))?;
        Ok(self.successors[idx].iter().map(move |&i| self.nodes[i]))
    }

    pub fn predecessors(&self, node: NodeId) -> Result<impl Iterator<Item = NodeId> + '_> {
        let idx = self.index_of(node).ok_or(SimError::NodeNotFound(node))?;
        Ok(self
            .in_neighbor_indices(idx)
            .iter()
            .map(move |&i| self.nodes[i]))
    }

    pub fn in_degree(&self, node: NodeId) -> Result<usize> {
        let idx = self.index_of(node).ok_or(SimError::NodeNotFound(node))?;
        Ok(self.in_neighbor_indices(idx).len())
    }

    pub fn set_node_attr(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Result<()> {
        let idx = self.index_of(node).ok_or(SimError::NodeNotFound(node))?;
        self.node_attrs[idx].insert(name.into(), value.into());
        Ok(())
    }

    pub fn node_attr(&self, node: NodeId, name: &str) -> Option<&AttrValue> {
        let idx = self.index_of(node)?;
        self.node_attrs[idx].get(name)
    }

    pub fn set_edge_attr(
        &mut self,
        u: NodeId,
        v: NodeId,
        name: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Result<()> {
        let key = EdgeKey::new(u, v, self.directed);
        if !self.edges.contains(&key) {
            return Err(SimError::EdgeNotFound { from: u, to: v });
        }
        self.edge_attrs
            .entry(key)
            .or_default()
            .insert(name.into(), value.into());
        Ok(())
    }

    pub fn edge_attr(&self, u: NodeId, v: NodeId, name: &str) -> Option<&AttrValue> {
        self.edge_attrs
            .get(&EdgeKey::new(u, v, self.directed))?
            .get(name)
    }
}
