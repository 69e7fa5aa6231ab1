//! Augmented-Lagrangian solver with a projected-gradient inner loop.
//!
//! The equality constraints enter through the augmented Lagrangian
//! `L(x) = f(x) + Σ_k λ_k r_k(x) + (ρ/2) Σ_k r_k(x)²` where `r_k` is the
//! k-th constraint residual; the box bounds are handled by projection
//! inside the inner descent. The outer loop updates the multipliers from
//! the residuals and grows ρ when feasibility stalls.

use tracing::debug;

use super::constraints::LinearConstraint;
use super::{BoxBounds, ConstrainedMinimizer, Objective, OptimizationOutcome};

const EPS: f64 = 1e-12;
const ARMIJO_SIGMA: f64 = 1e-4;
const MAX_LINE_SEARCH_TRIALS: usize = 40;
const MIN_STEP: f64 = 1e-16;
const MAX_STEP: f64 = 1e4;

/// Tuning knobs for [`AugmentedLagrangianSolver`].
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    /// Target for both the constraint violation (inf-norm) and the
    /// projected-gradient norm.
    pub tolerance: f64,
    pub max_outer_iterations: usize,
    pub max_inner_iterations: usize,
    pub initial_penalty: f64,
    pub penalty_growth: f64,
    pub max_penalty: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_outer_iterations: 60,
            max_inner_iterations: 500,
            initial_penalty: 10.0,
            penalty_growth: 10.0,
            max_penalty: 1e9,
        }
    }
}

/// Production constrained minimizer.
#[derive(Debug, Clone, Default)]
pub struct AugmentedLagrangianSolver {
    options: SolverOptions,
}

impl AugmentedLagrangianSolver {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    fn penalized_value(
        &self,
        objective: &dyn Objective,
        constraints: &[LinearConstraint],
        multipliers: &[f64],
        penalty: f64,
        x: &[f64],
    ) -> f64 {
        let mut value = objective.value(x);
        for (constraint, &lambda) in constraints.iter().zip(multipliers) {
            let r = constraint.residual(x);
            value += lambda * r + 0.5 * penalty * r * r;
        }
        value
    }

    fn penalized_gradient(
        &self,
        objective: &dyn Objective,
        constraints: &[LinearConstraint],
        multipliers: &[f64],
        penalty: f64,
        x: &[f64],
        grad: &mut [f64],
    ) {
        objective.gradient(x, grad);
        for (constraint, &lambda) in constraints.iter().zip(multipliers) {
            let scale = lambda + penalty * constraint.residual(x);
            for &(i, coeff) in constraint.terms() {
                grad[i] += scale * coeff;
            }
        }
    }

    /// Projected-gradient descent on the penalized function. Returns the
    /// iteration count and the final projected-gradient norm.
    fn minimize_penalized(
        &self,
        objective: &dyn Objective,
        constraints: &[LinearConstraint],
        bounds: &BoxBounds,
        x: &mut [f64],
        multipliers: &[f64],
        penalty: f64,
    ) -> (usize, f64) {
        let n = x.len();
        let mut grad = vec![0.0; n];
        let mut candidate = vec![0.0; n];
        let mut step = 1.0_f64;
        let mut value = self.penalized_value(objective, constraints, multipliers, penalty, x);

        for iteration in 0..self.options.max_inner_iterations {
            self.penalized_gradient(objective, constraints, multipliers, penalty, x, &mut grad);
            let stationarity = projected_gradient_norm(x, &grad, bounds);
            if stationarity <= self.options.tolerance {
                return (iteration, stationarity);
            }

            let mut accepted = false;
            for _ in 0..MAX_LINE_SEARCH_TRIALS {
                for i in 0..n {
                    candidate[i] = x[i] - step * grad[i];
                }
                bounds.project(&mut candidate);

                let displacement: f64 = x
                    .iter()
                    .zip(&candidate)
                    .map(|(&a, &b)| (a - b) * (a - b))
                    .sum();
                if displacement <= EPS * EPS {
                    break;
                }

                let candidate_value =
                    self.penalized_value(objective, constraints, multipliers, penalty, &candidate);
                if candidate_value <= value - ARMIJO_SIGMA * displacement / step {
                    x.copy_from_slice(&candidate);
                    value = candidate_value;
                    accepted = true;
                    break;
                }

                step *= 0.5;
                if step < MIN_STEP {
                    break;
                }
            }

            if !accepted {
                self.penalized_gradient(objective, constraints, multipliers, penalty, x, &mut grad);
                return (iteration + 1, projected_gradient_norm(x, &grad, bounds));
            }
            step = (step * 2.0).min(MAX_STEP);
        }

        self.penalized_gradient(objective, constraints, multipliers, penalty, x, &mut grad);
        (
            self.options.max_inner_iterations,
            projected_gradient_norm(x, &grad, bounds),
        )
    }
}

impl ConstrainedMinimizer for AugmentedLagrangianSolver {
    fn minimize(
        &self,
        objective: &dyn Objective,
        constraints: &[LinearConstraint],
        bounds: &BoxBounds,
        initial: &[f64],
    ) -> OptimizationOutcome {
        let mut x = initial.to_vec();
        bounds.project(&mut x);

        let mut multipliers = vec![0.0; constraints.len()];
        let mut penalty = self.options.initial_penalty;
        let mut total_iterations = 0usize;
        let mut previous_violation = f64::INFINITY;

        for outer in 0..self.options.max_outer_iterations {
            let (inner_iterations, stationarity) =
                self.minimize_penalized(objective, constraints, bounds, &mut x, &multipliers, penalty);
            total_iterations += inner_iterations;

            let violation = max_violation(constraints, &x);
            debug!(outer, violation, stationarity, penalty, "multiplier update");

            if violation <= self.options.tolerance && stationarity <= self.options.tolerance {
                return OptimizationOutcome {
                    objective_value: objective.value(&x),
                    flow: x,
                    iterations: total_iterations.max(1),
                    converged: true,
                    message: None,
                };
            }

            for (lambda, constraint) in multipliers.iter_mut().zip(constraints) {
                *lambda += penalty * constraint.residual(&x);
            }
            if violation > 0.25 * previous_violation {
                penalty = (penalty * self.options.penalty_growth).min(self.options.max_penalty);
            }
            previous_violation = violation;
        }

        let violation = max_violation(constraints, &x);
        OptimizationOutcome {
            objective_value: objective.value(&x),
            flow: x,
            iterations: total_iterations.max(1),
            converged: false,
            message: Some(format!(
                "did not reach tolerance {:.1e} within {} multiplier updates (constraint violation {:.3e})",
                self.options.tolerance, self.options.max_outer_iterations, violation
            )),
        }
    }
}

fn max_violation(constraints: &[LinearConstraint], x: &[f64]) -> f64 {
    constraints
        .iter()
        .map(|c| c.residual(x).abs())
        .fold(0.0, f64::max)
}

/// Gradient component with bound-pinned directions removed: at the lower
/// bound only a descent direction pointing inward counts, likewise at the
/// upper bound.
fn projected_gradient_component(x: f64, g: f64, lo: f64, hi: f64) -> f64 {
    if (hi - lo).abs() <= EPS {
        0.0
    } else if (x - lo).abs() <= EPS * (1.0 + lo.abs()) {
        g.min(0.0)
    } else if hi.is_finite() && (hi - x).abs() <= EPS * (1.0 + hi.abs()) {
        g.max(0.0)
    } else {
        g
    }
}

fn projected_gradient_norm(x: &[f64], grad: &[f64], bounds: &BoxBounds) -> f64 {
    x.iter()
        .zip(grad)
        .zip(bounds.lower.iter().zip(&bounds.upper))
        .map(|((&xi, &gi), (&lo, &hi))| projected_gradient_component(xi, gi, lo, hi).abs())
        .fold(0.0, f64::max)
}
