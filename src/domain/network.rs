//! Network model: raw payload types and the validated, typed network.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Raw request payload for one equilibrium computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRequest {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_guess: Option<Vec<f64>>,
}

/// Node as it arrives on the wire. The kind is kept as a string so that an
/// unrecognized value surfaces as a `Validation` error instead of a
/// deserialization failure.
///
/// `totalFlow` is accepted both as a flat field and nested under `data`;
/// network editors emit either form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "totalFlow", default, skip_serializing_if = "Option::is_none")]
    pub total_flow: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RawNodeData>,
}

/// Nested node payload carrying editor-managed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNodeData {
    #[serde(rename = "totalFlow", default)]
    pub total_flow: Option<f64>,
}

impl RawNode {
    /// Demand declared on this node, from either accepted form. The flat
    /// field wins when both are present.
    pub fn declared_flow(&self) -> Option<f64> {
        self.total_flow
            .or_else(|| self.data.as_ref().and_then(|d| d.total_flow))
    }
}

/// Edge as it arrives on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "costFunction")]
    pub cost_function: String,
}

/// Role of a node in the flow problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Source,
    Sink,
    Intermediate,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Source => "source",
            Self::Sink => "sink",
            Self::Intermediate => "node",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for NodeKind {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(Self::Source),
            "sink" => Ok(Self::Sink),
            "node" => Ok(Self::Intermediate),
            _ => Err("invalid node kind; expected source, sink or node"),
        }
    }
}

/// Validated, typed node.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// Declared demand; present exactly when `kind` is `Source`.
    pub total_flow: Option<f64>,
}

/// Validated, typed edge. The cost expression stays textual here; the cost
/// model compiles it.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub cost_function: String,
}

/// Validated network: typed nodes and edges, a node-id → kind map, and the
/// ordered source-id → demand map.
#[derive(Debug, Clone)]
pub struct Network {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub kinds: HashMap<String, NodeKind>,
    pub source_flows: BTreeMap<String, f64>,
}

impl Network {
    /// Validate a raw payload into a typed network.
    pub fn parse(request: &NetworkRequest) -> EngineResult<Self> {
        if request.edges.is_empty() {
            return Err(EngineError::validation("no edges provided"));
        }

        let mut nodes = Vec::with_capacity(request.nodes.len());
        let mut kinds = HashMap::with_capacity(request.nodes.len());
        let mut source_flows = BTreeMap::new();

        for raw in &request.nodes {
            let kind: NodeKind = raw.kind.parse().map_err(|_| {
                EngineError::validation(format!(
                    "unknown node kind '{}' for node '{}'",
                    raw.kind, raw.id
                ))
            })?;

            if kinds.insert(raw.id.clone(), kind).is_some() {
                return Err(EngineError::validation(format!(
                    "duplicate node id '{}'",
                    raw.id
                )));
            }

            let total_flow = match kind {
                NodeKind::Source => {
                    let flow = raw.declared_flow().ok_or_else(|| {
                        EngineError::validation(format!(
                            "source node '{}' has no totalFlow",
                            raw.id
                        ))
                    })?;
                    if flow < 0.0 {
                        return Err(EngineError::validation(format!(
                            "source node '{}' has negative totalFlow {}",
                            raw.id, flow
                        )));
                    }
                    source_flows.insert(raw.id.clone(), flow);
                    Some(flow)
                }
                _ => None,
            };

            nodes.push(Node {
                id: raw.id.clone(),
                kind,
                total_flow,
            });
        }

        let mut edge_ids = HashSet::with_capacity(request.edges.len());
        let mut edges = Vec::with_capacity(request.edges.len());
        for raw in &request.edges {
            if !edge_ids.insert(raw.id.clone()) {
                return Err(EngineError::validation(format!(
                    "duplicate edge id '{}'",
                    raw.id
                )));
            }
            for endpoint in [&raw.source, &raw.target] {
                if !kinds.contains_key(endpoint) {
                    return Err(EngineError::validation(format!(
                        "edge '{}' references unknown node '{}'",
                        raw.id, endpoint
                    )));
                }
            }
            edges.push(Edge {
                id: raw.id.clone(),
                source: raw.source.clone(),
                target: raw.target.clone(),
                cost_function: raw.cost_function.clone(),
            });
        }

        Ok(Self {
            nodes,
            edges,
            kinds,
            source_flows,
        })
    }

    pub fn kind_of(&self, node_id: &str) -> Option<NodeKind> {
        self.kinds.get(node_id).copied()
    }
}

/// Fixed edge-id → flow-vector position mapping.
///
/// Built exactly once per call from the validated edge list, then shared
/// by the cost model, the constraint builder and the solver, so every
/// component agrees on which coordinate carries which edge's flow.
#[derive(Debug, Clone)]
pub struct FlowIndex {
    ids: Vec<String>,
    positions: HashMap<String, usize>,
}

impl FlowIndex {
    pub fn new(edges: &[Edge]) -> Self {
        let ids: Vec<String> = edges.iter().map(|e| e.id.clone()).collect();
        let positions = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        Self { ids, positions }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn position(&self, edge_id: &str) -> Option<usize> {
        self.positions.get(edge_id).copied()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}
