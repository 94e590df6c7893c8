//! Universal properties of the decision, proved by refuting their negation.
//!
//! Every property is reduced to an [`Obligation`]: extra declarations,
//! background constraints and a negated claim. [`prove_universal`] asserts
//! the negation inside a scope of a session holding the base model; UNSAT
//! means the property holds, SAT yields a counterexample, and UNKNOWN stays
//! inconclusive.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use tracing::{info, warn};

use practicable_model::{Bindings, DecisionVar, Model};
use practicable_smt::backends::cvc5_backend::Cvc5Solver;
use practicable_smt::backends::z3_backend::Z3Solver;
use practicable_smt::solver::{SatResult, SmtSolver};
use practicable_smt::sorts::SmtSort;
use practicable_smt::terms::SmtTerm;

use crate::error::{solver_error, EngineError};
use crate::options::{EngineOptions, SolverChoice};
use crate::result::{PropertyOutcome, Witness};
use crate::session::Session;

/// A universal claim, stated through its negation.
#[derive(Debug, Clone, PartialEq)]
pub struct Obligation {
    pub name: String,
    /// Variables the obligation introduces beyond the base model.
    pub declarations: Vec<(String, SmtSort)>,
    /// Constraints on those variables (domains, orderings).
    pub constraints: Vec<SmtTerm>,
    /// A satisfying assignment of this term is a counterexample.
    pub negated_claim: SmtTerm,
}

impl Obligation {
    pub fn new(name: impl Into<String>, negated_claim: SmtTerm) -> Self {
        Self {
            name: name.into(),
            declarations: Vec::new(),
            constraints: Vec::new(),
            negated_claim,
        }
    }

    pub fn declare(mut self, name: impl Into<String>, sort: SmtSort) -> Self {
        self.declarations.push((name.into(), sort));
        self
    }

    pub fn constrain(mut self, constraints: impl IntoIterator<Item = SmtTerm>) -> Self {
        self.constraints.extend(constraints);
        self
    }
}

/// Direction in which a variable moves while the decision must stay
/// "required".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

/// The properties the verifier knows how to state.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySpec {
    /// Raising the fatality count, all else held, never makes a required
    /// measure optional.
    MonotoneInMagnitude,
    /// Raising the threat likelihood, all else held, never makes a required
    /// measure optional.
    MonotoneInLikelihood,
    /// Lowering the direct cost, all else held, never makes a required
    /// measure optional.
    AntitoneInCost,
    /// A measure whose cost equals the disproportion threshold is required.
    TieRequired,
    /// The cost of the midpoint of two measures never exceeds the average
    /// of their costs.
    CostConvexity,
    /// Generic monotonicity: `var` moves in `direction`; `hold` variables
    /// are shared by both sides, every other variable varies freely.
    Monotone {
        var: DecisionVar,
        direction: Direction,
        hold: Vec<DecisionVar>,
    },
    /// Caller-supplied obligation over the base model's variables.
    Custom(Obligation),
}

impl PropertySpec {
    pub fn name(&self) -> String {
        match self {
            PropertySpec::MonotoneInMagnitude => "monotone_in_magnitude".into(),
            PropertySpec::MonotoneInLikelihood => "monotone_in_likelihood".into(),
            PropertySpec::AntitoneInCost => "antitone_in_cost".into(),
            PropertySpec::TieRequired => "tie_required".into(),
            PropertySpec::CostConvexity => "cost_convexity".into(),
            PropertySpec::Monotone { var, direction, .. } => {
                let dir = match direction {
                    Direction::Increasing => "increasing",
                    Direction::Decreasing => "decreasing",
                };
                format!("monotone_{dir}_{var}")
            }
            PropertySpec::Custom(obligation) => obligation.name.clone(),
        }
    }

    /// State the property as an obligation over `model`.
    pub fn obligation(&self, model: &Model) -> Result<Obligation, EngineError> {
        match self {
            PropertySpec::MonotoneInMagnitude => named_monotonicity(
                self.name(),
                model,
                DecisionVar::FatalityCount,
                Direction::Increasing,
                &all_but(DecisionVar::FatalityCount),
            ),
            PropertySpec::MonotoneInLikelihood => named_monotonicity(
                self.name(),
                model,
                DecisionVar::ThreatLikelihood,
                Direction::Increasing,
                &all_but(DecisionVar::ThreatLikelihood),
            ),
            PropertySpec::AntitoneInCost => named_monotonicity(
                self.name(),
                model,
                DecisionVar::FinancialCost,
                Direction::Decreasing,
                &all_but(DecisionVar::FinancialCost),
            ),
            PropertySpec::TieRequired => Ok(tie_obligation(model)),
            PropertySpec::CostConvexity => Ok(convexity_obligation(model)),
            PropertySpec::Monotone {
                var,
                direction,
                hold,
            } => named_monotonicity(self.name(), model, *var, *direction, hold),
            PropertySpec::Custom(obligation) => Ok(obligation.clone()),
        }
    }
}

fn all_but(var: DecisionVar) -> Vec<DecisionVar> {
    DecisionVar::ALL.into_iter().filter(|v| *v != var).collect()
}

fn copy_name(var: DecisionVar, side: usize) -> String {
    format!("{}__{side}", var.smt_name())
}

/// Two evaluations of the decision that differ only in `var` (and in any
/// variable not listed in `hold`); the counterexample is one where the
/// first side is required and the second, moved in `direction`, is not.
pub fn monotonicity_obligation(
    model: &Model,
    var: DecisionVar,
    direction: Direction,
    hold: &[DecisionVar],
) -> Result<Obligation, EngineError> {
    let name = PropertySpec::Monotone {
        var,
        direction,
        hold: hold.to_vec(),
    }
    .name();
    named_monotonicity(name, model, var, direction, hold)
}

fn named_monotonicity(
    name: String,
    model: &Model,
    var: DecisionVar,
    direction: Direction,
    hold: &[DecisionVar],
) -> Result<Obligation, EngineError> {
    if hold.contains(&var) {
        return Err(EngineError::InvalidProperty {
            name,
            reason: format!("{var} cannot be both varied and held"),
        });
    }
    if model.fixed_value(var).is_some() {
        warn!(property = %name, %var, "monotonicity over a fixed variable is vacuous");
    }

    let mut sides = [Bindings::identity(), Bindings::identity()];
    let mut declarations = Vec::new();
    let mut constraints = Vec::new();
    let held: BTreeSet<DecisionVar> = hold.iter().copied().collect();
    for v in DecisionVar::ALL {
        if held.contains(&v) {
            continue;
        }
        for (idx, side) in sides.iter_mut().enumerate() {
            let copy = copy_name(v, idx + 1);
            let term = SmtTerm::var(copy.clone());
            constraints.extend(model.domain_constraints_for(v, &term));
            *side = side.clone().bind(v, term);
            declarations.push((copy, SmtSort::Real));
        }
    }

    let first = SmtTerm::var(copy_name(var, 1));
    let second = SmtTerm::var(copy_name(var, 2));
    constraints.push(match direction {
        Direction::Increasing => first.lt(second),
        Direction::Decreasing => first.gt(second),
    });

    let negated_claim = SmtTerm::and(vec![
        model.decision_with(&sides[0]),
        model.decision_with(&sides[1]).not(),
    ]);
    Ok(Obligation {
        name,
        declarations,
        constraints,
        negated_claim,
    })
}

fn tie_obligation(model: &Model) -> Obligation {
    let tie = model.cost().eq(model.threshold());
    Obligation::new(PropertySpec::TieRequired.name(), tie).and_not(model.decision())
}

fn convexity_obligation(model: &Model) -> Obligation {
    let half = || SmtTerm::ratio(1, 2);
    let mut obligation = Obligation::new(PropertySpec::CostConvexity.name(), SmtTerm::bool(true));
    let mut sides = [Bindings::identity(), Bindings::identity()];
    let mut midpoint = Bindings::identity();
    for v in DecisionVar::ALL.into_iter().filter(|v| v.is_cost_side()) {
        let a = SmtTerm::var(copy_name(v, 1));
        let b = SmtTerm::var(copy_name(v, 2));
        obligation = obligation
            .declare(copy_name(v, 1), SmtSort::Real)
            .declare(copy_name(v, 2), SmtSort::Real)
            .constrain(model.domain_constraints_for(v, &a))
            .constrain(model.domain_constraints_for(v, &b));
        midpoint = midpoint.bind(v, a.clone().add(b.clone()).mul(half()));
        sides[0] = sides[0].clone().bind(v, a);
        sides[1] = sides[1].clone().bind(v, b);
    }
    let average = model
        .cost_with(&sides[0])
        .add(model.cost_with(&sides[1]))
        .mul(half());
    obligation.negated_claim = model.cost_with(&midpoint).gt(average);
    obligation
}

impl Obligation {
    fn and_not(mut self, claim: SmtTerm) -> Self {
        self.negated_claim = SmtTerm::and(vec![self.negated_claim, claim.not()]);
        self
    }

    fn check_declared(&self, base: &[(String, SmtSort)]) -> Result<(), EngineError> {
        let declared: BTreeSet<&str> = base
            .iter()
            .chain(&self.declarations)
            .map(|(n, _)| n.as_str())
            .collect();
        let referenced = self
            .constraints
            .iter()
            .chain(std::iter::once(&self.negated_claim))
            .flat_map(SmtTerm::free_vars);
        for name in referenced {
            if !declared.contains(name.as_str()) {
                return Err(EngineError::UndeclaredVariable {
                    obligation: self.name.clone(),
                    variable: name,
                });
            }
        }
        Ok(())
    }
}

/// Refute the negation of a universal claim.
///
/// Runs inside a scope of `session`, so the session's base model is intact
/// afterwards. The witness of a counterexample covers the base model's
/// variables and the obligation's own declarations.
pub fn prove_universal<S: SmtSolver>(
    session: &mut Session<'_, S>,
    obligation: &Obligation,
) -> Result<PropertyOutcome, EngineError> {
    obligation.check_declared(session.base_declarations())?;
    let witness_vars: Vec<(String, SmtSort)> = session
        .base_declarations()
        .iter()
        .chain(&obligation.declarations)
        .cloned()
        .collect();

    let (result, model) = session
        .scoped(|solver| {
            for (name, sort) in &obligation.declarations {
                solver.declare_var(name, sort)?;
            }
            for constraint in &obligation.constraints {
                solver.assert(constraint)?;
            }
            solver.assert(&obligation.negated_claim)?;
            let refs: Vec<(&str, &SmtSort)> =
                witness_vars.iter().map(|(n, s)| (n.as_str(), s)).collect();
            solver.check_sat_with_model(&refs)
        })
        .map_err(solver_error)?;

    Ok(match result {
        SatResult::Unsat => PropertyOutcome::Proven,
        SatResult::Sat => {
            let model = model.ok_or_else(|| EngineError::MissingWitness(obligation.name.clone()))?;
            let mut values = BTreeMap::new();
            for (name, sort) in &witness_vars {
                if *sort != SmtSort::Real {
                    continue;
                }
                let value = model
                    .get_real(name)
                    .ok_or_else(|| EngineError::MissingWitness(name.clone()))?;
                values.insert(name.clone(), value.clone());
            }
            PropertyOutcome::Disproven {
                witness: Witness::new(values),
            }
        }
        SatResult::Unknown(reason) => PropertyOutcome::Inconclusive { reason },
    })
}

/// Check `spec` on `model` with a caller-supplied solver.
pub fn verify_property_with<S: SmtSolver>(
    solver: &mut S,
    model: &Model,
    spec: &PropertySpec,
) -> Result<PropertyOutcome, EngineError> {
    let started = Instant::now();
    let obligation = spec.obligation(model)?;
    let mut session = Session::open(solver, &model.encoding()).map_err(solver_error)?;
    let outcome = prove_universal(&mut session, &obligation)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        PropertyOutcome::Inconclusive { reason } => {
            warn!(property = %obligation.name, %reason, elapsed_ms, "property inconclusive");
        }
        other => {
            info!(
                property = %obligation.name,
                verdict = other.verdict_class(),
                elapsed_ms,
                "property checked"
            );
        }
    }
    Ok(outcome)
}

/// Check `spec` on `model` with a fresh backend chosen by `options`.
pub fn verify_property(
    model: &Model,
    spec: &PropertySpec,
    options: &EngineOptions,
) -> Result<PropertyOutcome, EngineError> {
    match options.solver {
        SolverChoice::Z3 => {
            let mut solver = Z3Solver::with_timeout_secs(options.timeout_secs);
            verify_property_with(&mut solver, model, spec)
        }
        SolverChoice::Cvc5 => {
            let mut solver = Cvc5Solver::with_timeout_secs(options.timeout_secs).map_err(solver_error)?;
            verify_property_with(&mut solver, model, spec)
        }
    }
}

/// Monotonicity of the decision in `increasing`, with `hold` shared.
pub fn verify_monotonicity(
    model: &Model,
    increasing: DecisionVar,
    hold: &[DecisionVar],
    options: &EngineOptions,
) -> Result<PropertyOutcome, EngineError> {
    let spec = PropertySpec::Monotone {
        var: increasing,
        direction: Direction::Increasing,
        hold: hold.to_vec(),
    };
    verify_property(model, &spec, options)
}
