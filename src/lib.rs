//! Wardrop equilibrium engine.
//!
//! Computes, for a directed network with separable per-edge cost
//! functions and per-source demand, the user (Wardrop) equilibrium flow,
//! the socially optimal flow, and the Price of Anarchy relating their
//! total costs. The equilibrium is found by minimizing the Beckmann
//! potential over the feasible-flow polytope; the social optimum by
//! minimizing total cost directly.

pub mod api;
pub mod config;
pub mod cost;
pub mod domain;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod solver;
pub mod telemetry;

pub use engine::EquilibriumEngine;
pub use error::{EngineError, EngineResult};
