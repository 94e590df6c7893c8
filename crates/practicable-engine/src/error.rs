use thiserror::Error;

use practicable_model::{DecisionVar, ModelError};

/// Failures that stop a query before it yields an outcome.
///
/// Inconclusive and infeasible answers are outcomes, not errors; see
/// [`crate::result`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Malformed model: {0}")]
    Model(#[from] ModelError),
    #[error("Solver error: {0}")]
    Solver(String),
    #[error("Invalid property {name}: {reason}")]
    InvalidProperty { name: String, reason: String },
    #[error("Obligation {obligation} references undeclared variable {variable}")]
    UndeclaredVariable {
        obligation: String,
        variable: String,
    },
    #[error("Boundary for {free} is underdetermined: {} still unfixed", format_vars(.unfixed))]
    UnderdeterminedBoundary {
        free: DecisionVar,
        unfixed: Vec<DecisionVar>,
    },
    #[error("Free variable {0} is already fixed")]
    FreeVariableFixed(DecisionVar),
    #[error("Solver reported SAT without a value for {0}")]
    MissingWitness(String),
}

fn format_vars(vars: &[DecisionVar]) -> String {
    vars.iter()
        .map(|v| v.smt_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Stringify a backend error, as every backend has its own error type.
pub(crate) fn solver_error<E: std::error::Error>(err: E) -> EngineError {
    EngineError::Solver(err.to_string())
}
