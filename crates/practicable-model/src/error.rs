use num::rational::BigRational;
use thiserror::Error;

use crate::variables::{DecisionVar, Domain};

/// A model that cannot be evaluated or encoded as given.
///
/// Every variant is raised at construction or assertion time; nothing is
/// clamped or reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Inconsistent bounds for {subject}: lower {lower} exceeds upper {upper}")]
    InvalidBounds {
        subject: String,
        lower: BigRational,
        upper: BigRational,
    },
    #[error("Negative lower bound {lower} for {subject}")]
    NegativeBound {
        subject: String,
        lower: BigRational,
    },
    #[error("Value {value} for {var} lies outside its domain {domain}")]
    FixedOutsideDomain {
        var: DecisionVar,
        value: BigRational,
        domain: Domain,
    },
    #[error("{var} is already fixed to {existing}; refusing to refix it to {requested}")]
    ConflictingFix {
        var: DecisionVar,
        existing: BigRational,
        requested: BigRational,
    },
    #[error("Invalid constant {name} = {value}: {reason}")]
    InvalidConstant {
        name: &'static str,
        value: BigRational,
        reason: &'static str,
    },
    #[error("Not an exact decimal: {0:?}")]
    InvalidDecimal(String),
    #[error("Unknown decision variable: {0:?}")]
    UnknownVariable(String),
    #[error("No value for {0}: it is neither fixed in the model nor given by the scenario")]
    MissingValue(DecisionVar),
}
