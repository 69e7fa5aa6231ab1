//! Equality constraints derived from network topology.

use std::collections::HashMap;

use crate::domain::network::{FlowIndex, Network, NodeKind};
use crate::error::{EngineError, EngineResult};

/// Linear equality over the flow vector: `Σ coeff·flow[position] = rhs`.
///
/// Constraints are plain data, not closures: the position/coefficient
/// pairs are copied in at construction, so a constraint built inside a
/// loop can never be rebound to a later iteration's edge list.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    terms: Vec<(usize, f64)>,
    rhs: f64,
}

impl LinearConstraint {
    pub fn new(terms: Vec<(usize, f64)>, rhs: f64) -> Self {
        Self { terms, rhs }
    }

    /// `Σ coeff·x[position] − rhs`; zero when satisfied.
    pub fn residual(&self, x: &[f64]) -> f64 {
        let sum: f64 = self.terms.iter().map(|&(i, coeff)| coeff * x[i]).sum();
        sum - self.rhs
    }

    pub fn terms(&self) -> &[(usize, f64)] {
        &self.terms
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }
}

/// Build the equality constraints for a network: one flow-conservation
/// constraint per intermediate node (incoming − outgoing = 0) and one
/// supply constraint per source (outgoing = declared demand). Sinks get
/// none; their balance is implied by the others.
pub fn build_constraints(
    network: &Network,
    index: &FlowIndex,
) -> EngineResult<Vec<LinearConstraint>> {
    let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &network.edges {
        outgoing.entry(&edge.source).or_default().push(&edge.id);
        incoming.entry(&edge.target).or_default().push(&edge.id);
    }

    let position = |edge_id: &str| -> EngineResult<usize> {
        index.position(edge_id).ok_or_else(|| {
            EngineError::constraint(format!("edge '{edge_id}' is missing from the flow index"))
        })
    };

    let mut constraints = Vec::new();

    for node in &network.nodes {
        if node.kind != NodeKind::Intermediate {
            continue;
        }
        let mut terms = Vec::new();
        for &edge_id in incoming.get(node.id.as_str()).into_iter().flatten() {
            terms.push((position(edge_id)?, 1.0));
        }
        for &edge_id in outgoing.get(node.id.as_str()).into_iter().flatten() {
            terms.push((position(edge_id)?, -1.0));
        }
        constraints.push(LinearConstraint::new(terms, 0.0));
    }

    for (source_id, &demand) in &network.source_flows {
        let mut terms = Vec::new();
        for &edge_id in outgoing.get(source_id.as_str()).into_iter().flatten() {
            terms.push((position(edge_id)?, 1.0));
        }
        constraints.push(LinearConstraint::new(terms, demand));
    }

    Ok(constraints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::network::{NetworkRequest, RawEdge, RawNode};

    fn node(id: &str, kind: &str, flow: Option<f64>) -> RawNode {
        RawNode {
            id: id.to_string(),
            kind: kind.to_string(),
            total_flow: flow,
            data: None,
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> RawEdge {
        RawEdge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            cost_function: "x".to_string(),
        }
    }

    fn diamond() -> (Network, FlowIndex) {
        // s -> m1 -> t, s -> m2 -> t
        let request = NetworkRequest {
            nodes: vec![
                node("s", "source", Some(6.0)),
                node("m1", "node", None),
                node("m2", "node", None),
                node("t", "sink", None),
            ],
            edges: vec![
                edge("e0", "s", "m1"),
                edge("e1", "m1", "t"),
                edge("e2", "s", "m2"),
                edge("e3", "m2", "t"),
            ],
            initial_guess: None,
        };
        let network = Network::parse(&request).unwrap();
        let index = FlowIndex::new(&network.edges);
        (network, index)
    }

    #[test]
    fn test_constraint_count_is_intermediates_plus_sources() {
        let (network, index) = diamond();
        let constraints = build_constraints(&network, &index).unwrap();
        assert_eq!(constraints.len(), 2 + 1);
    }

    #[test]
    fn test_conservation_constraint_signs() {
        let (network, index) = diamond();
        let constraints = build_constraints(&network, &index).unwrap();

        // m1: incoming e0 (+1), outgoing e1 (−1), rhs 0
        let m1 = &constraints[0];
        assert_eq!(m1.rhs(), 0.0);
        assert_eq!(m1.terms(), [(0, 1.0), (1, -1.0)]);

        // balanced flow has zero residual, unbalanced does not
        assert_eq!(m1.residual(&[3.0, 3.0, 0.0, 0.0]), 0.0);
        assert_eq!(m1.residual(&[3.0, 1.0, 0.0, 0.0]), 2.0);
    }

    #[test]
    fn test_supply_constraint_targets_demand() {
        let (network, index) = diamond();
        let constraints = build_constraints(&network, &index).unwrap();

        let supply = constraints.last().unwrap();
        assert_eq!(supply.rhs(), 6.0);
        assert_eq!(supply.terms(), [(0, 1.0), (2, 1.0)]);
        assert_eq!(supply.residual(&[4.0, 0.0, 2.0, 0.0]), 0.0);
    }

    #[test]
    fn test_source_without_outgoing_edges_keeps_demand_rhs() {
        // The constraint degenerates to 0 = demand; the solver, not the
        // builder, reports the infeasibility.
        let request = NetworkRequest {
            nodes: vec![
                node("s", "source", Some(5.0)),
                node("a", "sink", None),
                node("b", "sink", None),
            ],
            edges: vec![edge("e0", "a", "b")],
            initial_guess: None,
        };
        let network = Network::parse(&request).unwrap();
        let index = FlowIndex::new(&network.edges);
        let constraints = build_constraints(&network, &index).unwrap();
        assert_eq!(constraints.len(), 1);
        assert!(constraints[0].terms().is_empty());
        assert_eq!(constraints[0].rhs(), 5.0);
    }

    #[test]
    fn test_missing_index_entry_is_constraint_error() {
        let (network, _) = diamond();
        let stale = FlowIndex::new(&network.edges[..2]);
        let err = build_constraints(&network, &stale).unwrap_err();
        assert_eq!(err.kind(), "Constraint");
    }
}
