//! Graph collaborator: node set, adjacency and attribute lookup

pub mod attributes;
pub mod network;

pub use attributes::AttrValue;
pub use network::Network;
