//! End-to-end equilibrium computation.
//!
//! Wires the pipeline together: validate the network, compile the cost
//! model, derive constraints and bounds, run the two minimizations, and
//! assemble the rounded report. Every intermediate object is scoped to
//! the call; repeated or concurrent calls share nothing.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cost::CostModel;
use crate::domain::network::{FlowIndex, Network, NetworkRequest};
use crate::domain::report::{EquilibriumReport, FlowSection, NetworkSection, SourceDemand};
use crate::error::{EngineError, EngineResult};
use crate::solver::{
    build_constraints, AugmentedLagrangianSolver, BoxBounds, ConstrainedMinimizer, SolverOptions,
};

/// Decimal digits kept in reported flows, costs and PoA.
const REPORT_DECIMALS: f64 = 1000.0;

/// Round a reported value to 3 decimals. Cosmetic only: rounded values
/// are never fed back into the computation. `±∞` passes through.
pub fn round_reported(value: f64) -> f64 {
    (value * REPORT_DECIMALS).round() / REPORT_DECIMALS
}

/// The equilibrium engine: a constrained minimizer plus the pipeline
/// around it. Stateless between calls, so one instance can serve any
/// number of concurrent callers.
pub struct EquilibriumEngine {
    solver: Box<dyn ConstrainedMinimizer>,
}

impl Default for EquilibriumEngine {
    fn default() -> Self {
        Self::new(Box::new(AugmentedLagrangianSolver::default()))
    }
}

impl EquilibriumEngine {
    pub fn new(solver: Box<dyn ConstrainedMinimizer>) -> Self {
        Self { solver }
    }

    pub fn with_options(options: SolverOptions) -> Self {
        Self::new(Box::new(AugmentedLagrangianSolver::new(options)))
    }

    /// Compute equilibrium flow, social-optimal flow and the Price of
    /// Anarchy for one network.
    pub fn analyze(&self, request: &NetworkRequest) -> EngineResult<EquilibriumReport> {
        let network = Network::parse(request)?;
        let index = FlowIndex::new(&network.edges);
        let model = CostModel::build(&network.edges, &index)?;
        let constraints = build_constraints(&network, &index)?;
        let bounds = BoxBounds::for_network(&network, &index);

        let initial = match &request.initial_guess {
            Some(guess) if guess.len() != index.len() => {
                return Err(EngineError::validation(format!(
                    "initial guess has {} entries but the network has {} edges",
                    guess.len(),
                    index.len()
                )))
            }
            Some(guess) => guess.clone(),
            None => vec![1.0; index.len()],
        };

        debug!(
            edges = index.len(),
            constraints = constraints.len(),
            sources = network.source_flows.len(),
            "solving equilibrium problem"
        );

        let equilibrium =
            self.solver
                .minimize(&model.potential_objective(), &constraints, &bounds, &initial);
        if !equilibrium.converged {
            return Err(EngineError::optimization(format!(
                "equilibrium minimization did not converge: {}",
                equilibrium.message.as_deref().unwrap_or("no solver message")
            )));
        }

        let social =
            self.solver
                .minimize(&model.total_cost_objective(), &constraints, &bounds, &initial);
        if !social.converged {
            return Err(EngineError::optimization(format!(
                "social-optimal minimization did not converge: {}",
                social.message.as_deref().unwrap_or("no solver message")
            )));
        }

        let equilibrium_cost = model.total_cost(&equilibrium.flow);
        let social_cost = model.total_cost(&social.flow);
        let price_of_anarchy = if social_cost > 0.0 {
            equilibrium_cost / social_cost
        } else {
            f64::INFINITY
        };

        Ok(EquilibriumReport {
            flows: FlowSection {
                equilibrium_flow: rounded_flow_map(&index, &equilibrium.flow),
                social_optimal_flow: rounded_flow_map(&index, &social.flow),
            },
            network: NetworkSection {
                equilibrium_total_cost: round_reported(equilibrium_cost),
                social_optimal_total_cost: round_reported(social_cost),
                price_of_anarchy: round_reported(price_of_anarchy),
                equilibrium_iterations: equilibrium.iterations,
                social_optimal_iterations: social.iterations,
            },
            results: network
                .source_flows
                .iter()
                .map(|(id, &flow)| (id.clone(), SourceDemand { total_flow: flow }))
                .collect(),
        })
    }
}

fn rounded_flow_map(index: &FlowIndex, flow: &[f64]) -> BTreeMap<String, f64> {
    index
        .ids()
        .iter()
        .zip(flow)
        .map(|(id, &value)| (id.clone(), round_reported(value)))
        .collect()
}
