//! Offline analysis of harness logs.
//!
//! Reads the summary format written by [`super::run`], groups instances
//! by (mode, node count), filters out instances whose PoA < 1 (numerically
//! infeasible or non-converged), and averages the rest.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use itertools::Itertools;

use super::InstanceSummary;

/// Parsed log, grouped mode → node count → instances.
pub type GroupedRecords = BTreeMap<String, BTreeMap<usize, Vec<InstanceSummary>>>;

/// Aggregates for one (mode, node-count) group. Averages are `None` when
/// every instance in the group was invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAverages {
    pub avg_exec_time: Option<f64>,
    pub avg_poa: Option<f64>,
    pub avg_equilibrium_iterations: Option<f64>,
    pub avg_social_iterations: Option<f64>,
    pub invalid: usize,
    pub total: usize,
}

/// Parse a summary log. Unrecognized lines are skipped, matching the
/// permissiveness of the format's other consumers.
pub fn parse_summary(text: &str) -> GroupedRecords {
    let mut grouped = GroupedRecords::new();
    let mut current_mode: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("=== Testing mode:") {
            let mode = rest.trim_end_matches('=').trim().to_string();
            grouped.entry(mode.clone()).or_default();
            current_mode = Some(mode);
            continue;
        }
        if line.is_empty() || line.starts_with("Instance") {
            continue;
        }
        if !line.starts_with("Nodes:") {
            continue;
        }

        let Some(mode) = current_mode.as_ref() else {
            continue;
        };
        if let Some(summary) = parse_summary_line(line) {
            grouped
                .entry(mode.clone())
                .or_default()
                .entry(summary.num_nodes)
                .or_default()
                .push(summary);
        }
    }

    grouped
}

fn parse_summary_line(line: &str) -> Option<InstanceSummary> {
    let mut num_nodes = None;
    let mut num_edges = None;
    let mut exec_time = None;
    let mut poa = None;
    let mut equilibrium_iterations = None;
    let mut social_iterations = None;

    for part in line.split(',') {
        let (key, value) = part.split_once(':')?;
        let value = value.trim();
        match key.trim() {
            "Nodes" => num_nodes = value.parse().ok(),
            "Edges" => num_edges = value.parse().ok(),
            "Exec Time" => {
                let value = value.strip_suffix("sec").map(str::trim).unwrap_or(value);
                exec_time = value.parse().ok();
            }
            "PoA" => poa = value.parse().ok(),
            "Equilibrium Iterations" => equilibrium_iterations = parse_iterations(value),
            "Social Optimality Iterations" => social_iterations = parse_iterations(value),
            _ => {}
        }
    }

    Some(InstanceSummary {
        num_nodes: num_nodes?,
        num_edges: num_edges?,
        exec_time: exec_time?,
        poa: poa?,
        equilibrium_iterations,
        social_iterations,
    })
}

fn parse_iterations(value: &str) -> Option<usize> {
    match value {
        "None" | "-" => None,
        other => other.parse().ok(),
    }
}

/// Average each group after dropping invalid instances (PoA < 1).
pub fn compute_averages(grouped: &GroupedRecords) -> BTreeMap<String, BTreeMap<usize, GroupAverages>> {
    let mut averages = BTreeMap::new();

    for (mode, by_nodes) in grouped {
        let mut mode_averages = BTreeMap::new();
        for (&num_nodes, records) in by_nodes {
            let valid: Vec<&InstanceSummary> =
                records.iter().filter(|r| r.poa >= 1.0).collect();
            let invalid = records.len() - valid.len();

            let avg = |values: Vec<f64>| -> Option<f64> {
                (!values.is_empty())
                    .then(|| values.iter().sum::<f64>() / values.len() as f64)
            };

            mode_averages.insert(
                num_nodes,
                GroupAverages {
                    avg_exec_time: avg(valid.iter().map(|r| r.exec_time).collect()),
                    avg_poa: avg(valid.iter().map(|r| r.poa).collect()),
                    avg_equilibrium_iterations: avg(
                        valid
                            .iter()
                            .filter_map(|r| r.equilibrium_iterations)
                            .map(|i| i as f64)
                            .collect(),
                    ),
                    avg_social_iterations: avg(
                        valid
                            .iter()
                            .filter_map(|r| r.social_iterations)
                            .map(|i| i as f64)
                            .collect(),
                    ),
                    invalid,
                    total: records.len(),
                },
            );
        }
        averages.insert(mode.clone(), mode_averages);
    }

    averages
}

/// Render the averages as the human-readable table the harness prints.
pub fn render_report(averages: &BTreeMap<String, BTreeMap<usize, GroupAverages>>) -> String {
    let mut out = String::new();
    let mut overall_total = 0usize;
    let mut overall_invalid = 0usize;

    for (mode, by_nodes) in averages {
        let _ = writeln!(out, "Mode: {mode}");
        for (num_nodes, group) in by_nodes {
            overall_total += group.total;
            overall_invalid += group.invalid;
            let _ = writeln!(
                out,
                "  Nodes: {num_nodes}, Avg Exec Time: {} sec, Avg PoA: {}, Avg Equilibrium Iterations: {}, Avg Social Optimality Iterations: {}, Invalid: {}/{}",
                fmt_avg(group.avg_exec_time, 4),
                fmt_avg(group.avg_poa, 3),
                fmt_avg(group.avg_equilibrium_iterations, 1),
                fmt_avg(group.avg_social_iterations, 1),
                group.invalid,
                group.total,
            );
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Overall Total Instances: {overall_total}");
    let _ = writeln!(out, "Overall Invalid Results: {overall_invalid}");
    out
}

fn fmt_avg(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "None".to_string(),
    }
}

/// Modes present in a parsed log, in stable order.
pub fn modes(grouped: &GroupedRecords) -> String {
    grouped.keys().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
=== Testing mode: linear ===

Instance 1:
Nodes: 10, Edges: 40, Exec Time: 0.0120 sec, PoA: 1.05, Equilibrium Iterations: 52, Social Optimality Iterations: 48
Nodes: 10, Edges: 40, Exec Time: 0.0200 sec, PoA: -1, Equilibrium Iterations: None, Social Optimality Iterations: None
Nodes: 20, Edges: 80, Exec Time: 0.0500 sec, PoA: 1.15, Equilibrium Iterations: 70, Social Optimality Iterations: 66

=== Testing mode: quadratic ===

Instance 1:
Nodes: 10, Edges: 40, Exec Time: 0.0300 sec, PoA: 1.00, Equilibrium Iterations: 44, Social Optimality Iterations: 41
";

    #[test]
    fn test_parse_groups_by_mode_and_node_count() {
        let grouped = parse_summary(SAMPLE);
        assert_eq!(modes(&grouped), "linear, quadratic");
        assert_eq!(grouped["linear"][&10].len(), 2);
        assert_eq!(grouped["linear"][&20].len(), 1);
        assert_eq!(grouped["quadratic"][&10].len(), 1);
    }

    #[test]
    fn test_parse_reads_all_fields() {
        let grouped = parse_summary(SAMPLE);
        let record = &grouped["linear"][&10][0];
        assert_eq!(record.num_edges, 40);
        assert_eq!(record.exec_time, 0.0120);
        assert_eq!(record.poa, 1.05);
        assert_eq!(record.equilibrium_iterations, Some(52));
        assert_eq!(record.social_iterations, Some(48));
    }

    #[test]
    fn test_averages_filter_invalid_poa() {
        let grouped = parse_summary(SAMPLE);
        let averages = compute_averages(&grouped);

        let group = &averages["linear"][&10];
        assert_eq!(group.total, 2);
        assert_eq!(group.invalid, 1);
        // only the PoA 1.05 record survives the filter
        assert_eq!(group.avg_poa, Some(1.05));
        assert_eq!(group.avg_exec_time, Some(0.0120));
        assert_eq!(group.avg_equilibrium_iterations, Some(52.0));
    }

    #[test]
    fn test_all_invalid_group_has_no_averages() {
        let text = "\
=== Testing mode: mixed ===
Nodes: 10, Edges: 40, Exec Time: 0.1 sec, PoA: -1, Equilibrium Iterations: None, Social Optimality Iterations: None
";
        let averages = compute_averages(&parse_summary(text));
        let group = &averages["mixed"][&10];
        assert_eq!(group.invalid, 1);
        assert_eq!(group.avg_poa, None);
        assert_eq!(group.avg_exec_time, None);
    }

    #[test]
    fn test_render_report_counts_overall_totals() {
        let report = render_report(&compute_averages(&parse_summary(SAMPLE)));
        assert!(report.contains("Mode: linear"));
        assert!(report.contains("Overall Total Instances: 4"));
        assert!(report.contains("Overall Invalid Results: 1"));
    }

    #[test]
    fn test_harness_output_round_trips() {
        use crate::engine::EquilibriumEngine;
        use crate::evaluation::{run, CostFamily, EvaluationSettings};

        let settings = EvaluationSettings {
            node_sizes: vec![4],
            cost_families: vec![CostFamily::Linear],
            instances: 2,
            ..EvaluationSettings::default()
        };
        let engine = EquilibriumEngine::default();
        let mut buffer = Vec::new();
        run(&engine, &settings, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let grouped = parse_summary(&text);
        assert_eq!(grouped["linear"][&4].len(), 2);
    }
}
