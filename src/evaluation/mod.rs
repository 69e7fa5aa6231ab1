//! Benchmark harness: synthetic network generation and timed runs.
//!
//! Generates directed networks of configurable size and cost-function
//! family, times `EquilibriumEngine::analyze` on each, and appends one
//! summary line per instance to a text log that
//! [`analysis`](crate::evaluation::analysis) knows how to read back.

pub mod analysis;

use std::fmt;
use std::io;
use std::io::Write as _;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{info, warn};

use crate::domain::network::{NetworkRequest, RawEdge, RawNode};
use crate::engine::EquilibriumEngine;

/// Cost-function family used when generating synthetic networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CostFamily {
    Linear,
    Quadratic,
    /// 50/50 draw between linear and quadratic per edge.
    Mixed,
}

/// Harness settings.
#[derive(Debug, Clone)]
pub struct EvaluationSettings {
    pub node_sizes: Vec<usize>,
    pub cost_families: Vec<CostFamily>,
    pub instances: usize,
    pub edge_multiplier: usize,
    pub source_demand: f64,
    pub seed: u64,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            node_sizes: vec![10, 20, 30, 40, 50],
            cost_families: CostFamily::iter().collect(),
            instances: 5,
            edge_multiplier: 4,
            source_demand: 10.0,
            seed: 42,
        }
    }
}

/// One benchmark instance, as written to (and read back from) the log.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSummary {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub exec_time: f64,
    /// −1 marks an instance whose computation failed.
    pub poa: f64,
    pub equilibrium_iterations: Option<usize>,
    pub social_iterations: Option<usize>,
}

impl fmt::Display for InstanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Nodes: {}, Edges: {}, Exec Time: {:.4} sec, PoA: {}, Equilibrium Iterations: {}, Social Optimality Iterations: {}",
            self.num_nodes,
            self.num_edges,
            self.exec_time,
            self.poa,
            display_iterations(self.equilibrium_iterations),
            display_iterations(self.social_iterations),
        )
    }
}

fn display_iterations(value: Option<usize>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

/// Generate a random directed network: node 0 is the source carrying the
/// whole demand, the last node is the sink, everything between is an
/// intermediate. Edge count is `edge_multiplier·n` capped at `n·(n−1)`,
/// sampled without replacement over ordered node pairs.
pub fn generate_network(
    num_nodes: usize,
    family: CostFamily,
    demand: f64,
    edge_multiplier: usize,
    rng: &mut StdRng,
) -> NetworkRequest {
    assert!(num_nodes >= 2, "a network needs at least a source and a sink");

    let nodes = (0..num_nodes)
        .map(|i| {
            let (kind, total_flow) = if i == 0 {
                ("source", Some(demand))
            } else if i == num_nodes - 1 {
                ("sink", None)
            } else {
                ("node", None)
            };
            RawNode {
                id: format!("node_{i}"),
                kind: kind.to_string(),
                total_flow,
                data: None,
            }
        })
        .collect();

    let max_edges = num_nodes * (num_nodes - 1);
    let desired = (edge_multiplier * num_nodes).min(max_edges);
    let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(max_edges);
    for i in 0..num_nodes {
        for j in 0..num_nodes {
            if i != j {
                pairs.push((i, j));
            }
        }
    }

    let edges = pairs
        .choose_multiple(rng, desired)
        .enumerate()
        .map(|(k, &(i, j))| {
            let a = rng.gen_range(0.5..=2.0);
            let b = rng.gen_range(0.0..=1.0);
            let quadratic = match family {
                CostFamily::Linear => false,
                CostFamily::Quadratic => true,
                CostFamily::Mixed => rng.gen_bool(0.5),
            };
            let cost_function = if quadratic {
                format!("{a:.3}*x^2 + {b:.3}")
            } else {
                format!("{a:.3}*x + {b:.3}")
            };
            RawEdge {
                id: format!("edge_{k}"),
                source: format!("node_{i}"),
                target: format!("node_{j}"),
                cost_function,
            }
        })
        .collect::<Vec<_>>();

    let initial_guess = Some(vec![1.0; edges.len()]);

    NetworkRequest {
        nodes,
        edges,
        initial_guess,
    }
}

/// Run the harness, appending mode headers and per-instance summary lines
/// to `out`.
pub fn run(
    engine: &EquilibriumEngine,
    settings: &EvaluationSettings,
    out: &mut dyn io::Write,
) -> io::Result<()> {
    let mut rng = StdRng::seed_from_u64(settings.seed);

    for &family in &settings.cost_families {
        writeln!(out, "=== Testing mode: {family} ===")?;
        info!(mode = %family, "running evaluation mode");

        for instance in 1..=settings.instances {
            writeln!(out)?;
            writeln!(out, "Instance {instance}:")?;

            for &num_nodes in &settings.node_sizes {
                let request = generate_network(
                    num_nodes,
                    family,
                    settings.source_demand,
                    settings.edge_multiplier,
                    &mut rng,
                );
                let num_edges = request.edges.len();

                let started = Instant::now();
                let result = engine.analyze(&request);
                let exec_time = started.elapsed().as_secs_f64();

                let summary = match result {
                    Ok(report) => InstanceSummary {
                        num_nodes,
                        num_edges,
                        exec_time,
                        poa: report.network.price_of_anarchy,
                        equilibrium_iterations: Some(report.network.equilibrium_iterations),
                        social_iterations: Some(report.network.social_optimal_iterations),
                    },
                    Err(err) => {
                        warn!(nodes = num_nodes, error = %err, "instance failed");
                        InstanceSummary {
                            num_nodes,
                            num_edges,
                            exec_time,
                            poa: -1.0,
                            equilibrium_iterations: None,
                            social_iterations: None,
                        }
                    }
                };

                writeln!(out, "{summary}")?;
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::network::Network;

    #[test]
    fn test_generated_network_validates() {
        let mut rng = StdRng::seed_from_u64(7);
        let request = generate_network(10, CostFamily::Mixed, 10.0, 4, &mut rng);

        assert_eq!(request.nodes.len(), 10);
        assert_eq!(request.edges.len(), 40);
        assert_eq!(request.initial_guess.as_ref().unwrap().len(), 40);

        let network = Network::parse(&request).unwrap();
        assert_eq!(network.source_flows.get("node_0"), Some(&10.0));
    }

    #[test]
    fn test_edge_count_capped_by_complete_digraph() {
        let mut rng = StdRng::seed_from_u64(7);
        let request = generate_network(3, CostFamily::Linear, 10.0, 4, &mut rng);
        assert_eq!(request.edges.len(), 6);
    }

    #[test]
    fn test_linear_family_emits_linear_costs_only() {
        let mut rng = StdRng::seed_from_u64(7);
        let request = generate_network(6, CostFamily::Linear, 10.0, 4, &mut rng);
        assert!(request
            .edges
            .iter()
            .all(|e| !e.cost_function.contains("x^2")));

        let request = generate_network(6, CostFamily::Quadratic, 10.0, 4, &mut rng);
        assert!(request.edges.iter().all(|e| e.cost_function.contains("x^2")));
    }

    #[test]
    fn test_summary_line_round_trips_through_display() {
        let summary = InstanceSummary {
            num_nodes: 10,
            num_edges: 40,
            exec_time: 0.0123,
            poa: 1.05,
            equilibrium_iterations: Some(52),
            social_iterations: None,
        };
        let line = summary.to_string();
        assert!(line.starts_with("Nodes: 10, Edges: 40, Exec Time: 0.0123 sec, PoA: 1.05"));
        assert!(line.ends_with("Equilibrium Iterations: 52, Social Optimality Iterations: None"));
    }

    #[test]
    fn test_cost_family_parses_from_mode_name() {
        assert_eq!("linear".parse::<CostFamily>().unwrap(), CostFamily::Linear);
        assert_eq!("mixed".parse::<CostFamily>().unwrap(), CostFamily::Mixed);
        assert!("cubic".parse::<CostFamily>().is_err());
    }
}
