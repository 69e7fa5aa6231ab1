//! Brute-force grid-search minimizer.
//!
//! Test double for [`super::ConstrainedMinimizer`]: enumerates a uniform
//! lattice over the bounded box and keeps the best point that satisfies
//! every constraint. Exponential in the number of edges; meant for small
//! fixtures whose demands land on lattice points, where it pins down the
//! answer independently of the production solver's internals.

use super::constraints::LinearConstraint;
use super::{BoxBounds, ConstrainedMinimizer, Objective, OptimizationOutcome};

#[derive(Debug, Clone)]
pub struct GridSearchSolver {
    /// Subdivisions per axis; the lattice has `steps + 1` points per edge.
    pub steps: usize,
    /// Stand-in upper bound for axes whose true upper bound is infinite.
    pub fallback_upper: f64,
    pub feasibility_tolerance: f64,
}

impl Default for GridSearchSolver {
    fn default() -> Self {
        Self {
            steps: 40,
            fallback_upper: 20.0,
            feasibility_tolerance: 1e-6,
        }
    }
}

impl GridSearchSolver {
    fn search(
        &self,
        objective: &dyn Objective,
        constraints: &[LinearConstraint],
        bounds: &BoxBounds,
        point: &mut Vec<f64>,
        axis: usize,
        best: &mut Option<(Vec<f64>, f64)>,
        examined: &mut usize,
    ) {
        if axis == bounds.len() {
            *examined += 1;
            let feasible = constraints
                .iter()
                .all(|c| c.residual(point).abs() <= self.feasibility_tolerance);
            if feasible {
                let value = objective.value(point);
                if best.as_ref().map_or(true, |(_, b)| value < *b) {
                    *best = Some((point.clone(), value));
                }
            }
            return;
        }

        let lo = bounds.lower[axis];
        let hi = if bounds.upper[axis].is_finite() {
            bounds.upper[axis]
        } else {
            self.fallback_upper
        };
        for k in 0..=self.steps {
            point[axis] = lo + (hi - lo) * k as f64 / self.steps as f64;
            self.search(objective, constraints, bounds, point, axis + 1, best, examined);
        }
    }
}

impl ConstrainedMinimizer for GridSearchSolver {
    fn minimize(
        &self,
        objective: &dyn Objective,
        constraints: &[LinearConstraint],
        bounds: &BoxBounds,
        initial: &[f64],
    ) -> OptimizationOutcome {
        let mut point = vec![0.0; bounds.len()];
        let mut best: Option<(Vec<f64>, f64)> = None;
        let mut examined = 0usize;
        self.search(
            objective,
            constraints,
            bounds,
            &mut point,
            0,
            &mut best,
            &mut examined,
        );

        match best {
            Some((flow, value)) => OptimizationOutcome {
                flow,
                objective_value: value,
                iterations: examined,
                converged: true,
                message: None,
            },
            None => OptimizationOutcome {
                flow: initial.to_vec(),
                objective_value: f64::NAN,
                iterations: examined,
                converged: false,
                message: Some("no feasible lattice point found".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Objective;

    struct SumOfSquares;

    impl Objective for SumOfSquares {
        fn value(&self, x: &[f64]) -> f64 {
            x.iter().map(|&v| v * v).sum()
        }

        fn gradient(&self, x: &[f64], grad: &mut [f64]) {
            for (g, &v) in grad.iter_mut().zip(x) {
                *g = 2.0 * v;
            }
        }
    }

    #[test]
    fn test_finds_symmetric_split_on_lattice() {
        let bounds = BoxBounds {
            lower: vec![0.0, 0.0],
            upper: vec![10.0, 10.0],
        };
        let constraints = vec![LinearConstraint::new(vec![(0, 1.0), (1, 1.0)], 10.0)];
        let solver = GridSearchSolver::default();
        let outcome = solver.minimize(&SumOfSquares, &constraints, &bounds, &[1.0, 1.0]);

        assert!(outcome.converged);
        assert_eq!(outcome.flow, vec![5.0, 5.0]);
        assert_eq!(outcome.objective_value, 50.0);
        assert_eq!(outcome.iterations, 41 * 41);
    }

    #[test]
    fn test_reports_failure_when_nothing_feasible() {
        let bounds = BoxBounds {
            lower: vec![0.0],
            upper: vec![1.0],
        };
        let constraints = vec![LinearConstraint::new(vec![(0, 1.0)], 50.0)];
        let solver = GridSearchSolver::default();
        let outcome = solver.minimize(&SumOfSquares, &constraints, &bounds, &[0.0]);

        assert!(!outcome.converged);
        assert!(outcome.message.is_some());
    }
}
