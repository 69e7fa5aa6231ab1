//! Compiled cost model over the full flow vector.

use crate::cost::expr;
use crate::cost::polynomial::{lower, Polynomial};
use crate::domain::network::{Edge, FlowIndex};
use crate::error::{EngineError, EngineResult};
use crate::solver::Objective;

/// One compiled cost function per edge, in flow-index order, together
/// with the derived calculus the two objectives need:
///
/// - Beckmann potential `Φ(f) = Σ_e ∫₀^{f_e} c_e(t) dt`, whose gradient
///   component is simply `c_e(f_e)`;
/// - total system cost `C(f) = Σ_e c_e(f_e)·f_e`, whose gradient
///   component is `c_e(f_e) + c_e'(f_e)·f_e`.
///
/// Everything is built fresh per call; nothing is registered in any
/// shared table, so concurrent calls cannot alias each other's edges.
#[derive(Debug, Clone)]
pub struct CostModel {
    costs: Vec<Polynomial>,
    integrals: Vec<Polynomial>,
    derivatives: Vec<Polynomial>,
}

impl CostModel {
    /// Compile every edge's cost expression. The edge slice must be the
    /// one the `FlowIndex` was built from, in the same order.
    pub fn build(edges: &[Edge], index: &FlowIndex) -> EngineResult<Self> {
        debug_assert_eq!(edges.len(), index.len());

        let mut costs = Vec::with_capacity(edges.len());
        for edge in edges {
            let ast = expr::parse(&edge.cost_function).map_err(|err| {
                EngineError::parse(format!("edge '{}': {}", edge.id, message_of(&err)))
            })?;
            let poly = lower(&ast).map_err(|err| {
                EngineError::parse(format!("edge '{}': {}", edge.id, message_of(&err)))
            })?;
            costs.push(poly);
        }

        let integrals = costs.iter().map(Polynomial::antiderivative).collect();
        let derivatives = costs.iter().map(Polynomial::derivative).collect();

        Ok(Self {
            costs,
            integrals,
            derivatives,
        })
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// Cost experienced on edge `position` at the given flow.
    pub fn edge_cost(&self, position: usize, flow: f64) -> f64 {
        self.costs[position].eval(flow)
    }

    /// Beckmann potential `Φ(f)`.
    pub fn potential(&self, flow: &[f64]) -> f64 {
        self.integrals
            .iter()
            .zip(flow)
            .map(|(integral, &f)| integral.eval(f))
            .sum()
    }

    /// Total system cost `C(f)`.
    pub fn total_cost(&self, flow: &[f64]) -> f64 {
        self.costs
            .iter()
            .zip(flow)
            .map(|(cost, &f)| cost.eval(f) * f)
            .sum()
    }

    pub fn potential_gradient(&self, flow: &[f64], grad: &mut [f64]) {
        for (i, (cost, &f)) in self.costs.iter().zip(flow).enumerate() {
            grad[i] = cost.eval(f);
        }
    }

    pub fn total_cost_gradient(&self, flow: &[f64], grad: &mut [f64]) {
        for (i, ((cost, derivative), &f)) in self
            .costs
            .iter()
            .zip(&self.derivatives)
            .zip(flow)
            .enumerate()
        {
            grad[i] = cost.eval(f) + derivative.eval(f) * f;
        }
    }

    /// Objective whose minimizer over the feasible polytope is the
    /// Wardrop equilibrium.
    pub fn potential_objective(&self) -> PotentialObjective<'_> {
        PotentialObjective { model: self }
    }

    /// Objective whose minimizer is the social optimum.
    pub fn total_cost_objective(&self) -> TotalCostObjective<'_> {
        TotalCostObjective { model: self }
    }
}

fn message_of(err: &EngineError) -> String {
    match err {
        EngineError::Parse(msg) => msg.clone(),
        other => other.to_string(),
    }
}

pub struct PotentialObjective<'a> {
    model: &'a CostModel,
}

impl Objective for PotentialObjective<'_> {
    fn value(&self, x: &[f64]) -> f64 {
        self.model.potential(x)
    }

    fn gradient(&self, x: &[f64], grad: &mut [f64]) {
        self.model.potential_gradient(x, grad);
    }
}

pub struct TotalCostObjective<'a> {
    model: &'a CostModel,
}

impl Objective for TotalCostObjective<'_> {
    fn value(&self, x: &[f64]) -> f64 {
        self.model.total_cost(x)
    }

    fn gradient(&self, x: &[f64], grad: &mut [f64]) {
        self.model.total_cost_gradient(x, grad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::network::Edge;

    fn edges(costs: &[&str]) -> Vec<Edge> {
        costs
            .iter()
            .enumerate()
            .map(|(i, cost)| Edge {
                id: format!("e{i}"),
                source: "a".to_string(),
                target: "b".to_string(),
                cost_function: cost.to_string(),
            })
            .collect()
    }

    fn build(costs: &[&str]) -> CostModel {
        let edges = edges(costs);
        let index = FlowIndex::new(&edges);
        CostModel::build(&edges, &index).unwrap()
    }

    #[test]
    fn test_potential_sums_edge_integrals() {
        // ∫₀² (x+1) + ∫₀³ (2x) = (2 + 2) + 9 = 13
        let model = build(&["x + 1", "2*x"]);
        assert!((model.potential(&[2.0, 3.0]) - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_total_cost_sums_cost_times_flow() {
        // 2·(2+1) + 3·(2·3) = 6 + 18 = 24
        let model = build(&["x + 1", "2*x"]);
        assert!((model.total_cost(&[2.0, 3.0]) - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_potential_gradient_is_edge_cost() {
        let model = build(&["x + 1", "3*x^2"]);
        let mut grad = [0.0; 2];
        model.potential_gradient(&[2.0, 2.0], &mut grad);
        assert!((grad[0] - 3.0).abs() < 1e-12);
        assert!((grad[1] - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_total_cost_gradient_includes_marginal_term() {
        // d/df [f·(a·f + b)] = 2a·f + b
        let model = build(&["2*x + 1"]);
        let mut grad = [0.0];
        model.total_cost_gradient(&[3.0], &mut grad);
        assert!((grad[0] - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_failure_names_the_edge() {
        let edges = edges(&["x + 1", "x + q"]);
        let index = FlowIndex::new(&edges);
        let err = CostModel::build(&edges, &index).unwrap_err();
        assert_eq!(err.kind(), "Parse");
        assert!(err.to_string().contains("e1"));
    }
}
