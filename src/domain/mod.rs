pub mod network;
pub mod report;

pub use network::{Edge, FlowIndex, Network, NetworkRequest, Node, NodeKind, RawEdge, RawNode};
pub use report::{EquilibriumReport, FlowSection, NetworkSection, SourceDemand};
