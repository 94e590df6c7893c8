#![doc = include_str!("../README.md")]

//! Practicable verification engine.
//!
//! Proves universal properties of the cost/benefit decision by refuting
//! their negation, and solves for the exact tipping point of a single
//! variable. Each query runs in its own solver session.

pub mod error;
pub mod options;
pub mod result;
pub mod session;
pub mod threshold;
pub mod verifier;

#[cfg(test)]
mod test_support;

pub use error::EngineError;
pub use options::{EngineOptions, SolverChoice};
pub use result::{BoundaryOutcome, PropertyOutcome, Witness};
pub use threshold::{solve_boundary, solve_boundary_with};
pub use verifier::{
    prove_universal, verify_monotonicity, verify_property, verify_property_with, Direction,
    Obligation, PropertySpec,
};
