//! End-to-end property checks against the linked Z3 backend.

use num::bigint::BigInt;
use num::rational::BigRational;
use practicable_engine::session::Session;
use practicable_engine::{
    prove_universal, verify_monotonicity, verify_property, verify_property_with, Direction,
    EngineOptions, Obligation, PropertyOutcome, PropertySpec, Witness,
};
use practicable_model::{DecisionVar, MeasureStatus, Model, Scenario};
use practicable_smt::backends::z3_backend::{Z3Error, Z3Solver};
use practicable_smt::solver::{Model as SmtModel, SatResult, SmtSolver};
use practicable_smt::sorts::SmtSort;
use practicable_smt::terms::SmtTerm;

fn q(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

fn options() -> EngineOptions {
    EngineOptions::default()
}

#[test]
fn decision_is_monotone_in_magnitude() {
    let outcome =
        verify_property(&Model::standard(), &PropertySpec::MonotoneInMagnitude, &options())
            .unwrap();
    assert_eq!(outcome, PropertyOutcome::Proven);
}

#[test]
fn decision_is_monotone_in_likelihood() {
    let outcome =
        verify_property(&Model::standard(), &PropertySpec::MonotoneInLikelihood, &options())
            .unwrap();
    assert_eq!(outcome, PropertyOutcome::Proven);
}

#[test]
fn cheaper_measures_stay_required() {
    let outcome =
        verify_property(&Model::standard(), &PropertySpec::AntitoneInCost, &options()).unwrap();
    assert_eq!(outcome, PropertyOutcome::Proven);
}

#[test]
fn ties_are_required() {
    let outcome =
        verify_property(&Model::standard(), &PropertySpec::TieRequired, &options()).unwrap();
    assert!(outcome.is_proven());
}

#[test]
fn cost_is_convex() {
    let outcome =
        verify_property(&Model::standard(), &PropertySpec::CostConvexity, &options()).unwrap();
    assert!(outcome.is_proven());
}

#[test]
fn verify_monotonicity_matches_the_named_property() {
    let hold = [
        DecisionVar::FinancialCost,
        DecisionVar::TimeHours,
        DecisionVar::ComplexityScore,
        DecisionVar::ThreatLikelihood,
    ];
    let outcome =
        verify_monotonicity(&Model::standard(), DecisionVar::FatalityCount, &hold, &options())
            .unwrap();
    assert_eq!(outcome, PropertyOutcome::Proven);
}

fn side(witness: &Witness, copy: usize) -> Scenario {
    let mut scenario = Scenario::new();
    for var in DecisionVar::ALL {
        let name = format!("{}__{copy}", var.smt_name());
        let value = witness
            .get(&name)
            .or_else(|| witness.get(var.smt_name()))
            .unwrap();
        scenario = scenario.with(var, value.clone());
    }
    scenario
}

#[test]
fn raising_cost_can_flip_the_decision() {
    let model = Model::standard();
    let spec = PropertySpec::Monotone {
        var: DecisionVar::FinancialCost,
        direction: Direction::Increasing,
        hold: vec![
            DecisionVar::TimeHours,
            DecisionVar::ComplexityScore,
            DecisionVar::ThreatLikelihood,
            DecisionVar::FatalityCount,
        ],
    };
    let outcome = verify_property(&model, &spec, &options()).unwrap();
    let witness = outcome.witness().expect("raising cost should be refuted");
    let (low, high) = (
        witness.get("financial_cost__1").unwrap(),
        witness.get("financial_cost__2").unwrap(),
    );
    assert!(low < high);

    let before = model.assess(&side(witness, 1)).unwrap();
    let after = model.assess(&side(witness, 2)).unwrap();
    assert_eq!(before.status, MeasureStatus::Required);
    assert_eq!(after.status, MeasureStatus::Optional);
}

#[test]
fn fixed_likelihood_is_respected_by_witnesses() {
    let model = Model::standard()
        .with_fixed(DecisionVar::ThreatLikelihood, q(1, 4))
        .unwrap();
    let spec = PropertySpec::Monotone {
        var: DecisionVar::TimeHours,
        direction: Direction::Increasing,
        hold: vec![
            DecisionVar::FinancialCost,
            DecisionVar::ComplexityScore,
            DecisionVar::ThreatLikelihood,
            DecisionVar::FatalityCount,
        ],
    };
    let outcome = verify_property(&model, &spec, &options()).unwrap();
    let witness = outcome.witness().expect("more staff time can flip the decision");
    assert_eq!(witness.get("threat_likelihood"), Some(&q(1, 4)));
}

#[test]
fn custom_obligations_share_the_base_model() {
    // Benefit can never be negative on the admissible domain.
    let model = Model::standard();
    let obligation = Obligation::new("benefit_non_negative", model.benefit().lt(SmtTerm::int(0)));
    let outcome = verify_property(&model, &PropertySpec::Custom(obligation), &options()).unwrap();
    assert!(outcome.is_proven());

    // ...but it can exceed any fixed figure.
    let obligation = Obligation::new(
        "benefit_at_most_a_billion",
        model.benefit().gt(SmtTerm::int(1_000_000_000)),
    );
    let outcome = verify_property(&model, &PropertySpec::Custom(obligation), &options()).unwrap();
    let witness = outcome.witness().unwrap();
    assert_eq!(witness.len(), 5);
}

#[test]
fn fresh_identical_models_give_identical_outcomes() {
    let run = |spec: &PropertySpec| verify_property(&Model::standard(), spec, &options()).unwrap();

    let proven = PropertySpec::MonotoneInMagnitude;
    assert_eq!(run(&proven), run(&proven));

    // With nothing at stake only a free measure is required, so the first
    // side of any counterexample is pinned to zero.
    let pinned = || {
        Model::standard()
            .with_fixed(DecisionVar::TimeHours, q(0, 1))
            .and_then(|m| m.with_fixed(DecisionVar::ComplexityScore, q(0, 1)))
            .and_then(|m| m.with_fixed(DecisionVar::ThreatLikelihood, q(0, 1)))
            .and_then(|m| m.with_fixed(DecisionVar::FatalityCount, q(200, 1)))
            .unwrap()
    };
    let raising_cost = PropertySpec::Monotone {
        var: DecisionVar::FinancialCost,
        direction: Direction::Increasing,
        hold: vec![
            DecisionVar::TimeHours,
            DecisionVar::ComplexityScore,
            DecisionVar::ThreatLikelihood,
            DecisionVar::FatalityCount,
        ],
    };
    let first = verify_property(&pinned(), &raising_cost, &options()).unwrap();
    let second = verify_property(&pinned(), &raising_cost, &options()).unwrap();
    assert_eq!(first.verdict_class(), "disproven");
    assert_eq!(first, second);
    assert_eq!(first.witness().unwrap().get("financial_cost__1"), Some(&q(0, 1)));
}

#[test]
fn proofs_leave_the_session_reusable() {
    let model = Model::standard();
    let mut solver = Z3Solver::new();
    let mut session = Session::open(&mut solver, &model.encoding()).unwrap();

    let refuted = Obligation::new(
        "likelihood_above_half",
        SmtTerm::var("threat_likelihood").gt(SmtTerm::ratio(1, 2)),
    );
    let outcome = prove_universal(&mut session, &refuted).unwrap();
    assert_eq!(outcome.verdict_class(), "disproven");

    let extra = Obligation::new("copy_outside_tier", SmtTerm::var("m").gt(SmtTerm::int(800)))
        .declare("m", SmtSort::Real)
        .constrain(model.domain_constraints_for(DecisionVar::FatalityCount, &SmtTerm::var("m")));
    assert!(prove_universal(&mut session, &extra).unwrap().is_proven());
    assert_eq!(session.depth(), 0);

    // The first obligation asserted nothing that outlived its scope.
    let again = prove_universal(&mut session, &refuted).unwrap();
    assert_eq!(again.verdict_class(), "disproven");
}

/// Delegates to Z3 but reports every check as unknown.
struct GivesUp(Z3Solver);

impl SmtSolver for GivesUp {
    type Error = Z3Error;

    fn declare_var(&mut self, name: &str, sort: &SmtSort) -> Result<(), Z3Error> {
        self.0.declare_var(name, sort)
    }

    fn assert(&mut self, term: &SmtTerm) -> Result<(), Z3Error> {
        self.0.assert(term)
    }

    fn push(&mut self) -> Result<(), Z3Error> {
        self.0.push()
    }

    fn pop(&mut self) -> Result<(), Z3Error> {
        self.0.pop()
    }

    fn check_sat(&mut self) -> Result<SatResult, Z3Error> {
        Ok(SatResult::Unknown("canceled".into()))
    }

    fn check_sat_with_model(
        &mut self,
        _var_names: &[(&str, &SmtSort)],
    ) -> Result<(SatResult, Option<SmtModel>), Z3Error> {
        Ok((self.check_sat()?, None))
    }

    fn reset(&mut self) -> Result<(), Z3Error> {
        self.0.reset()
    }
}

#[test]
fn unknown_never_counts_as_proven() {
    let mut solver = GivesUp(Z3Solver::new());
    let outcome =
        verify_property_with(&mut solver, &Model::standard(), &PropertySpec::MonotoneInMagnitude)
            .unwrap();
    assert_eq!(
        outcome,
        PropertyOutcome::Inconclusive {
            reason: "canceled".into()
        }
    );
    assert!(!outcome.is_proven());
}
