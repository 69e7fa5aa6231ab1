//! Structured result of an equilibrium computation.

use std::collections::BTreeMap;

use serde::Serialize;

/// Success payload of a computation: per-edge flow maps for both
/// solutions, network-level aggregates, and the per-source demand echo.
///
/// All reals are rounded to 3 decimals before they land here; rounding is
/// cosmetic and never feeds back into the computation.
#[derive(Debug, Clone, Serialize)]
pub struct EquilibriumReport {
    pub flows: FlowSection,
    pub network: NetworkSection,
    pub results: BTreeMap<String, SourceDemand>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowSection {
    pub equilibrium_flow: BTreeMap<String, f64>,
    pub social_optimal_flow: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkSection {
    pub equilibrium_total_cost: f64,
    pub social_optimal_total_cost: f64,
    /// Ratio of equilibrium to social-optimal total cost. Holds the
    /// `f64::INFINITY` sentinel when the social cost is zero; note that
    /// `serde_json` renders non-finite floats as `null`, so HTTP clients
    /// observe `null` for that sentinel.
    pub price_of_anarchy: f64,
    pub equilibrium_iterations: usize,
    pub social_optimal_iterations: usize,
}

/// Demand echo for one source node.
#[derive(Debug, Clone, Serialize)]
pub struct SourceDemand {
    #[serde(rename = "totalFlow")]
    pub total_flow: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_to_contract_shape() {
        let report = EquilibriumReport {
            flows: FlowSection {
                equilibrium_flow: BTreeMap::from([("e0".to_string(), 10.0)]),
                social_optimal_flow: BTreeMap::from([("e0".to_string(), 10.0)]),
            },
            network: NetworkSection {
                equilibrium_total_cost: 230.0,
                social_optimal_total_cost: 230.0,
                price_of_anarchy: 1.0,
                equilibrium_iterations: 12,
                social_optimal_iterations: 9,
            },
            results: BTreeMap::from([(
                "n0".to_string(),
                SourceDemand { total_flow: 10.0 },
            )]),
        };

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["flows"]["equilibrium_flow"]["e0"], 10.0);
        assert_eq!(json["network"]["price_of_anarchy"], 1.0);
        assert_eq!(json["network"]["equilibrium_iterations"], 12);
        assert_eq!(json["results"]["n0"]["totalFlow"], 10.0);
    }

    #[test]
    fn test_infinite_poa_renders_as_null_json() {
        let section = NetworkSection {
            equilibrium_total_cost: 0.0,
            social_optimal_total_cost: 0.0,
            price_of_anarchy: f64::INFINITY,
            equilibrium_iterations: 1,
            social_optimal_iterations: 1,
        };
        let json: serde_json::Value = serde_json::to_value(&section).unwrap();
        assert!(json["price_of_anarchy"].is_null());
    }
}
