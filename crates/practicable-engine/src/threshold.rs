//! Tipping points: the exact value of one variable at which cost meets the
//! disproportion threshold.

use std::time::Instant;

use tracing::{info, warn};

use practicable_model::{DecisionVar, Model, Scenario};
use practicable_smt::backends::cvc5_backend::Cvc5Solver;
use practicable_smt::backends::z3_backend::Z3Solver;
use practicable_smt::solver::{SatResult, SmtSolver};
use practicable_smt::sorts::SmtSort;

use crate::error::{solver_error, EngineError};
use crate::options::{EngineOptions, SolverChoice};
use crate::result::BoundaryOutcome;
use crate::session::Session;

/// Pin `fixed` on a copy of `model` and check that exactly `free` is left
/// open.
fn pin_all_but(model: &Model, fixed: &Scenario, free: DecisionVar) -> Result<Model, EngineError> {
    if model.fixed_value(free).is_some() || fixed.get(free).is_some() {
        return Err(EngineError::FreeVariableFixed(free));
    }
    let mut pinned = model.clone();
    for (var, value) in fixed.iter() {
        pinned.fix(var, value.clone())?;
    }
    let unfixed: Vec<DecisionVar> = pinned
        .free_vars()
        .into_iter()
        .filter(|v| *v != free)
        .collect();
    if !unfixed.is_empty() {
        return Err(EngineError::UnderdeterminedBoundary { free, unfixed });
    }
    Ok(pinned)
}

/// Solve `cost = benefit * disproportion_factor` for `free` with a
/// caller-supplied solver.
///
/// Every other variable must be fixed, either on `model` or in `fixed`.
/// When `free` has a zero coefficient in the equation any admissible value
/// balances it, and the solver's choice is returned.
pub fn solve_boundary_with<S: SmtSolver>(
    solver: &mut S,
    model: &Model,
    fixed: &Scenario,
    free: DecisionVar,
) -> Result<BoundaryOutcome, EngineError> {
    let started = Instant::now();
    let pinned = pin_all_but(model, fixed, free)?;
    let balance = pinned.cost().eq(pinned.threshold());
    let name = free.smt_name();

    let mut session = Session::open(solver, &pinned.encoding()).map_err(solver_error)?;
    let (result, witness) = session
        .scoped(|solver| {
            solver.assert(&balance)?;
            solver.check_sat_with_model(&[(name, &SmtSort::Real)])
        })
        .map_err(solver_error)?;

    let outcome = match result {
        SatResult::Sat => {
            let value = witness
                .as_ref()
                .and_then(|m| m.get_real(name))
                .cloned()
                .ok_or_else(|| EngineError::MissingWitness(name.to_string()))?;
            BoundaryOutcome::Boundary {
                variable: free,
                value,
            }
        }
        SatResult::Unsat => BoundaryOutcome::Infeasible,
        SatResult::Unknown(reason) => BoundaryOutcome::Inconclusive { reason },
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        BoundaryOutcome::Inconclusive { reason } => {
            warn!(variable = %free, %reason, elapsed_ms, "boundary inconclusive");
        }
        BoundaryOutcome::Boundary { value, .. } => {
            info!(variable = %free, %value, elapsed_ms, "boundary found");
        }
        BoundaryOutcome::Infeasible => {
            info!(variable = %free, elapsed_ms, "no admissible boundary");
        }
    }
    Ok(outcome)
}

/// Solve for the tipping point of `free` with a fresh backend chosen by
/// `options`.
pub fn solve_boundary(
    model: &Model,
    fixed: &Scenario,
    free: DecisionVar,
    options: &EngineOptions,
) -> Result<BoundaryOutcome, EngineError> {
    match options.solver {
        SolverChoice::Z3 => {
            let mut solver = Z3Solver::with_timeout_secs(options.timeout_secs);
            solve_boundary_with(&mut solver, model, fixed, free)
        }
        SolverChoice::Cvc5 => {
            let mut solver =
                Cvc5Solver::with_timeout_secs(options.timeout_secs).map_err(solver_error)?;
            solve_boundary_with(&mut solver, model, fixed, free)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Event, ScriptedSolver};
    use num::bigint::BigInt;
    use num::rational::BigRational;
    use practicable_model::ModelError;
    use practicable_smt::backends::smtlib_printer::to_smtlib;
    use practicable_smt::solver::ModelValue;

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn all_but_cost() -> Scenario {
        Scenario::new()
            .with(DecisionVar::TimeHours, q(0, 1))
            .with(DecisionVar::ComplexityScore, q(0, 1))
            .with(DecisionVar::ThreatLikelihood, q(1, 2))
            .with(DecisionVar::FatalityCount, q(799, 1))
    }

    #[test]
    fn balance_equation_is_asserted_inside_a_scope() {
        let mut solver = ScriptedSolver::new(vec![SatResult::Sat]).with_model_value(
            "financial_cost",
            ModelValue::Real(q(9_588_000_000, 1)),
        );
        let outcome = solve_boundary_with(
            &mut solver,
            &Model::standard(),
            &all_but_cost(),
            DecisionVar::FinancialCost,
        )
        .unwrap();
        assert_eq!(outcome.value(), Some(&q(9_588_000_000, 1)));
        assert_eq!(solver.scope_balance(), 0);

        let push_at = solver.events.iter().position(|e| *e == Event::Push).unwrap();
        match &solver.events[push_at + 1] {
            Event::Assert(term) => assert!(to_smtlib(term).starts_with("(= (+ (+ financial_cost")),
            other => panic!("expected the balance equation, got {other:?}"),
        }
    }

    #[test]
    fn unsat_is_infeasible_and_unknown_is_inconclusive() {
        let mut solver = ScriptedSolver::new(vec![
            SatResult::Unsat,
            SatResult::Unknown("resource limit".into()),
        ]);
        let model = Model::standard();
        let first =
            solve_boundary_with(&mut solver, &model, &all_but_cost(), DecisionVar::FinancialCost)
                .unwrap();
        assert_eq!(first, BoundaryOutcome::Infeasible);
        let second =
            solve_boundary_with(&mut solver, &model, &all_but_cost(), DecisionVar::FinancialCost)
                .unwrap();
        assert_eq!(
            second,
            BoundaryOutcome::Inconclusive {
                reason: "resource limit".into()
            }
        );
        assert_eq!(second.value(), None);
    }

    #[test]
    fn every_other_variable_must_be_fixed() {
        let mut solver = ScriptedSolver::new(vec![SatResult::Sat]);
        let fixed = Scenario::new().with(DecisionVar::ThreatLikelihood, q(1, 2));
        let err = solve_boundary_with(
            &mut solver,
            &Model::standard(),
            &fixed,
            DecisionVar::FinancialCost,
        )
        .unwrap_err();
        match err {
            EngineError::UnderdeterminedBoundary { free, unfixed } => {
                assert_eq!(free, DecisionVar::FinancialCost);
                assert_eq!(
                    unfixed,
                    vec![
                        DecisionVar::TimeHours,
                        DecisionVar::ComplexityScore,
                        DecisionVar::FatalityCount
                    ]
                );
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(solver.events.is_empty());
    }

    #[test]
    fn free_variable_cannot_be_fixed() {
        let mut solver = ScriptedSolver::new(vec![]);
        let fixed = all_but_cost().with(DecisionVar::FinancialCost, q(1, 1));
        let err = solve_boundary_with(
            &mut solver,
            &Model::standard(),
            &fixed,
            DecisionVar::FinancialCost,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::FreeVariableFixed(DecisionVar::FinancialCost)
        ));
    }

    #[test]
    fn out_of_tier_fixing_is_malformed() {
        let mut solver = ScriptedSolver::new(vec![]);
        let fixed = all_but_cost().with(DecisionVar::FatalityCount, q(900, 1));
        let err = solve_boundary_with(
            &mut solver,
            &Model::standard(),
            &fixed,
            DecisionVar::FinancialCost,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Model(ModelError::FixedOutsideDomain {
                var: DecisionVar::FatalityCount,
                ..
            })
        ));
    }

    #[test]
    fn caller_model_is_left_unpinned() {
        let mut solver = ScriptedSolver::new(vec![SatResult::Unsat]);
        let model = Model::standard();
        solve_boundary_with(&mut solver, &model, &all_but_cost(), DecisionVar::FinancialCost)
            .unwrap();
        assert_eq!(model.free_vars().len(), 5);
    }
}
