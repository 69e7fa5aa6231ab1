//! Cost-function compilation: expression parsing, polynomial calculus and
//! the per-call cost model.

pub mod expr;
pub mod model;
pub mod polynomial;

pub use model::CostModel;
pub use polynomial::{Polynomial, MAX_DEGREE};
