#![doc = include_str!("../README.md")]

//! Symbolic model of the reasonably-practicable decision: decision
//! variables and their domains, statutory constants, the derived cost and
//! benefit expressions, and exact evaluation on concrete scenarios.

pub mod assessment;
pub mod config;
pub mod decimal;
pub mod error;
pub mod model;
pub mod variables;

pub use assessment::{Assessment, MeasureStatus, Scenario};
pub use config::{Constants, ModelConfig, TierBounds};
pub use decimal::{format_decimal, parse_decimal};
pub use error::ModelError;
pub use model::{Bindings, Model, ModelEncoding};
pub use variables::{DecisionVar, Domain};
