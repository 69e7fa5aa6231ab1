//! Bounded-degree polynomial calculus for cost functions.
//!
//! The engine supports the closed set of cost shapes that integrate in
//! closed form without a symbolic algebra system: polynomials in the
//! edge's own flow up to [`MAX_DEGREE`]. Lowering an expression outside
//! that set is a `Parse` error.

use crate::cost::expr::{BinaryOp, Expr, UnaryOp};
use crate::error::{EngineError, EngineResult};

/// Highest cost-function degree the lowering accepts. The Beckmann
/// potential adds one more degree through integration.
pub const MAX_DEGREE: usize = 8;

const EXPONENT_EPS: f64 = 1e-9;

/// Dense-coefficient polynomial `c₀ + c₁·x + … + cₙ·xⁿ`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Self { coeffs: vec![0.0] }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            coeffs: vec![value],
        }
    }

    /// The identity polynomial `x`.
    pub fn var() -> Self {
        Self {
            coeffs: vec![0.0, 1.0],
        }
    }

    fn from_coeffs(mut coeffs: Vec<f64>) -> Self {
        while coeffs.len() > 1 && coeffs.last() == Some(&0.0) {
            coeffs.pop();
        }
        if coeffs.is_empty() {
            coeffs.push(0.0);
        }
        Self { coeffs }
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0.0)
    }

    /// The constant value, if this polynomial has degree 0.
    pub fn as_constant(&self) -> Option<f64> {
        (self.degree() == 0).then(|| self.coeffs[0])
    }

    /// Horner evaluation.
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }

    pub fn derivative(&self) -> Self {
        if self.degree() == 0 {
            return Self::zero();
        }
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, &c)| c * k as f64)
            .collect();
        Self::from_coeffs(coeffs)
    }

    /// Antiderivative with zero constant term, so `antiderivative.eval(f)`
    /// is the integral from 0 to `f`.
    pub fn antiderivative(&self) -> Self {
        let mut coeffs = Vec::with_capacity(self.coeffs.len() + 1);
        coeffs.push(0.0);
        coeffs.extend(
            self.coeffs
                .iter()
                .enumerate()
                .map(|(k, &c)| c / (k as f64 + 1.0)),
        );
        Self::from_coeffs(coeffs)
    }

    fn add(&self, other: &Self) -> Self {
        let len = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..len)
            .map(|k| {
                self.coeffs.get(k).copied().unwrap_or(0.0)
                    + other.coeffs.get(k).copied().unwrap_or(0.0)
            })
            .collect();
        Self::from_coeffs(coeffs)
    }

    fn neg(&self) -> Self {
        Self::from_coeffs(self.coeffs.iter().map(|&c| -c).collect())
    }

    fn scale(&self, factor: f64) -> Self {
        Self::from_coeffs(self.coeffs.iter().map(|&c| c * factor).collect())
    }

    fn mul(&self, other: &Self) -> EngineResult<Self> {
        if self.is_zero() || other.is_zero() {
            return Ok(Self::zero());
        }
        let degree = self.degree() + other.degree();
        if degree > MAX_DEGREE {
            return Err(EngineError::parse(format!(
                "cost expression exceeds the supported polynomial degree {MAX_DEGREE}"
            )));
        }
        let mut coeffs = vec![0.0; degree + 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Ok(Self::from_coeffs(coeffs))
    }

    fn pow(&self, exponent: usize) -> EngineResult<Self> {
        let mut result = Self::constant(1.0);
        for _ in 0..exponent {
            result = result.mul(self)?;
        }
        Ok(result)
    }
}

/// Lower a parsed cost expression into polynomial form.
pub fn lower(expr: &Expr) -> EngineResult<Polynomial> {
    match expr {
        Expr::Number(value) => Ok(Polynomial::constant(*value)),
        Expr::Var => Ok(Polynomial::var()),
        Expr::Unary {
            op: UnaryOp::Neg,
            expr,
        } => Ok(lower(expr)?.neg()),
        Expr::Binary { left, op, right } => {
            let lhs = lower(left)?;
            let rhs = lower(right)?;
            match op {
                BinaryOp::Add => Ok(lhs.add(&rhs)),
                BinaryOp::Sub => Ok(lhs.add(&rhs.neg())),
                BinaryOp::Mul => lhs.mul(&rhs),
                BinaryOp::Div => {
                    let divisor = rhs.as_constant().ok_or_else(|| {
                        EngineError::parse(
                            "division by the flow variable cannot be integrated over flow >= 0",
                        )
                    })?;
                    if divisor == 0.0 {
                        return Err(EngineError::parse("division by zero in cost expression"));
                    }
                    Ok(lhs.scale(1.0 / divisor))
                }
                BinaryOp::Pow => {
                    let exponent = rhs.as_constant().ok_or_else(|| {
                        EngineError::parse("exponent must be a constant in cost expressions")
                    })?;
                    let rounded = exponent.round();
                    if (exponent - rounded).abs() > EXPONENT_EPS || rounded < 0.0 {
                        return Err(EngineError::parse(format!(
                            "exponent {exponent} is not a nonnegative integer; the cost cannot be integrated in closed form"
                        )));
                    }
                    let exponent = rounded as usize;
                    if lhs.degree() * exponent > MAX_DEGREE {
                        return Err(EngineError::parse(format!(
                            "cost expression exceeds the supported polynomial degree {MAX_DEGREE}"
                        )));
                    }
                    lhs.pow(exponent)
                }
            }
        }
    }
}
