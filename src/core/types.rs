//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer code of a node status. Negative codes are reserved for sentinels.
pub type StatusCode = i32;

/// Sentinel code conventionally used for nodes that can never transition
pub const BLOCKED: StatusCode = -1;

/// Iteration counter (simulation time unit)
pub type Iteration = u64;

/// Key of an edge in the attribute store.
///
/// Undirected edges are stored with the smaller endpoint first so the pair
/// resolves to the same key in either order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub source: NodeId,
    pub target: NodeId,
}

impl EdgeKey {
    pub fn new(source: NodeId, target: NodeId, directed: bool) -> Self {
        if directed || source <= target {
            Self { source, target }
        } else {
            Self {
                source: target,
                target: source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_equality() {
        let a = NodeId(1);
        let b = NodeId::from(1);
        let c = NodeId(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_node_id_hash() {
        use std::collections::HashMap;
        let mut map: HashMap<NodeId, &str> = HashMap::new();
        map.insert(NodeId(7), "seed");
        assert_eq!(map.get(&NodeId(7)), Some(&"seed"));
    }

    #[test]
    fn test_undirected_edge_key_is_symmetric() {
        let forward = EdgeKey::new(NodeId(3), NodeId(9), false);
        let backward = EdgeKey::new(NodeId(9), NodeId(3), false);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_directed_edge_key_keeps_orientation() {
        let forward = EdgeKey::new(NodeId(3), NodeId(9), true);
        let backward = EdgeKey::new(NodeId(9), NodeId(3), true);
        assert_ne!(forward, backward);
        assert_eq!(backward.source, NodeId(9));
    }
}
