use std::collections::BTreeMap;

use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::One;
use tracing::debug;

use practicable_smt::sorts::SmtSort;
use practicable_smt::terms::SmtTerm;

use crate::config::{Constants, ModelConfig, TierBounds};
use crate::error::ModelError;
use crate::variables::{DecisionVar, Domain};

/// Declarations and background assertions of a model, ready for a solver.
#[derive(Debug, Clone, Default)]
pub struct ModelEncoding {
    pub declarations: Vec<(String, SmtSort)>,
    pub assertions: Vec<SmtTerm>,
}

impl ModelEncoding {
    /// Append another encoding, e.g. the copies a property query introduces.
    pub fn extend(&mut self, other: ModelEncoding) {
        self.declarations.extend(other.declarations);
        self.assertions.extend(other.assertions);
    }
}

/// The term each decision variable stands for when the derived quantities
/// are instantiated.
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings {
    terms: BTreeMap<DecisionVar, SmtTerm>,
}

impl Bindings {
    /// Every variable bound to its own solver name.
    pub fn identity() -> Self {
        let terms = DecisionVar::ALL
            .into_iter()
            .map(|v| (v, SmtTerm::var(v.smt_name())))
            .collect();
        Self { terms }
    }

    /// Rebind `var` to `term`.
    pub fn bind(mut self, var: DecisionVar, term: SmtTerm) -> Self {
        self.terms.insert(var, term);
        self
    }

    pub fn term(&self, var: DecisionVar) -> SmtTerm {
        self.terms
            .get(&var)
            .cloned()
            .unwrap_or_else(|| SmtTerm::var(var.smt_name()))
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self::identity()
    }
}

/// Symbolic model of the reasonably-practicable decision.
///
/// `cost = financial_cost + time_hours * hourly_rate + complexity_score * complexity_penalty_rate`
///
/// `benefit = threat_likelihood * fatality_count * valuation_constant`
///
/// `decision = cost <= benefit * disproportion_factor`
///
/// The inequality is non-strict: a measure whose cost sits exactly on the
/// disproportion threshold is still required.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    tier: TierBounds,
    constants: Constants,
    domains: BTreeMap<DecisionVar, Domain>,
}

impl Model {
    /// Build a model with the default domains: cost, time and complexity
    /// non-negative, likelihood in `[0, 1]`, magnitude within `tier`.
    pub fn new(tier: TierBounds, constants: Constants) -> Result<Self, ModelError> {
        tier.validate()?;
        constants.validate()?;
        Ok(Self::from_validated(tier, constants))
    }

    /// Standard tier with the statutory constants.
    pub fn standard() -> Self {
        Self::from_validated(TierBounds::standard(), Constants::default())
    }

    fn from_validated(tier: TierBounds, constants: Constants) -> Self {
        let zero = BigRational::from_integer(BigInt::from(0));
        let mut domains = BTreeMap::new();
        domains.insert(DecisionVar::FinancialCost, Domain::at_least(zero.clone()));
        domains.insert(DecisionVar::TimeHours, Domain::at_least(zero.clone()));
        domains.insert(DecisionVar::ComplexityScore, Domain::at_least(zero.clone()));
        domains.insert(
            DecisionVar::ThreatLikelihood,
            Domain::between(zero, BigRational::one()),
        );
        domains.insert(
            DecisionVar::FatalityCount,
            Domain::between(tier.lower.clone(), tier.upper.clone()),
        );
        Self {
            tier,
            constants,
            domains,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        Self::new(config.tier.clone(), config.constants.clone())
    }

    pub fn tier(&self) -> &TierBounds {
        &self.tier
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    pub fn domain(&self, var: DecisionVar) -> &Domain {
        &self.domains[&var]
    }

    pub fn fixed_value(&self, var: DecisionVar) -> Option<&BigRational> {
        self.domain(var).fixed.as_ref()
    }

    /// Variables not pinned to a value.
    pub fn free_vars(&self) -> Vec<DecisionVar> {
        DecisionVar::ALL
            .into_iter()
            .filter(|v| self.fixed_value(*v).is_none())
            .collect()
    }

    /// Pin `var` to `value`.
    ///
    /// Fails when the value lies outside the variable's domain or when the
    /// variable is already pinned to a different value.
    pub fn fix(&mut self, var: DecisionVar, value: BigRational) -> Result<(), ModelError> {
        let domain = self
            .domains
            .get_mut(&var)
            .ok_or_else(|| ModelError::UnknownVariable(var.to_string()))?;
        if !domain.contains(&value) {
            return Err(ModelError::FixedOutsideDomain {
                var,
                value,
                domain: domain.clone(),
            });
        }
        match &domain.fixed {
            Some(existing) if existing != &value => Err(ModelError::ConflictingFix {
                var,
                existing: existing.clone(),
                requested: value,
            }),
            _ => {
                domain.fixed = Some(value);
                Ok(())
            }
        }
    }

    /// Builder form of [`Model::fix`].
    pub fn with_fixed(mut self, var: DecisionVar, value: BigRational) -> Result<Self, ModelError> {
        self.fix(var, value)?;
        Ok(self)
    }

    pub fn cost(&self) -> SmtTerm {
        self.cost_with(&Bindings::identity())
    }

    pub fn benefit(&self) -> SmtTerm {
        self.benefit_with(&Bindings::identity())
    }

    /// `benefit * disproportion_factor`: the largest cost that is still required.
    pub fn threshold(&self) -> SmtTerm {
        self.threshold_with(&Bindings::identity())
    }

    pub fn decision(&self) -> SmtTerm {
        self.decision_with(&Bindings::identity())
    }

    pub fn cost_with(&self, bindings: &Bindings) -> SmtTerm {
        let c = &self.constants;
        bindings
            .term(DecisionVar::FinancialCost)
            .add(
                bindings
                    .term(DecisionVar::TimeHours)
                    .mul(SmtTerm::real(c.hourly_rate.clone())),
            )
            .add(
                bindings
                    .term(DecisionVar::ComplexityScore)
                    .mul(SmtTerm::real(c.complexity_penalty_rate.clone())),
            )
    }

    pub fn benefit_with(&self, bindings: &Bindings) -> SmtTerm {
        bindings
            .term(DecisionVar::ThreatLikelihood)
            .mul(bindings.term(DecisionVar::FatalityCount))
            .mul(SmtTerm::real(self.constants.valuation_constant.clone()))
    }

    pub fn threshold_with(&self, bindings: &Bindings) -> SmtTerm {
        self.benefit_with(bindings)
            .mul(SmtTerm::real(self.constants.disproportion_factor.clone()))
    }

    pub fn decision_with(&self, bindings: &Bindings) -> SmtTerm {
        self.cost_with(bindings).le(self.threshold_with(bindings))
    }

    /// Domain (and pin) constraints of `var` applied to `term`.
    pub fn domain_constraints_for(&self, var: DecisionVar, term: &SmtTerm) -> Vec<SmtTerm> {
        self.domain(var).constraints(term)
    }

    /// Declarations of the five variables plus their domain constraints.
    pub fn encoding(&self) -> ModelEncoding {
        let mut encoding = ModelEncoding::default();
        for var in DecisionVar::ALL {
            encoding
                .declarations
                .push((var.smt_name().to_string(), SmtSort::Real));
            encoding
                .assertions
                .extend(self.domain_constraints_for(var, &SmtTerm::var(var.smt_name())));
        }
        debug!(
            declarations = encoding.declarations.len(),
            assertions = encoding.assertions.len(),
            "encoded decision model"
        );
        encoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use practicable_smt::backends::smtlib_printer::to_smtlib;

    fn whole(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    #[test]
    fn default_domains_match_the_standard_tier() {
        let model = Model::standard();
        assert_eq!(model.domain(DecisionVar::FatalityCount).to_string(), "[200, 800]");
        assert_eq!(model.domain(DecisionVar::ThreatLikelihood).to_string(), "[0, 1]");
        assert_eq!(model.domain(DecisionVar::FinancialCost).to_string(), "[0, +inf)");
        assert_eq!(model.free_vars().len(), 5);
    }

    #[test]
    fn derived_terms_print_as_expected() {
        let model = Model::standard();
        assert_eq!(
            to_smtlib(&model.cost()),
            "(+ (+ financial_cost (* time_hours 15.0)) (* complexity_score 500.0))"
        );
        assert_eq!(
            to_smtlib(&model.benefit()),
            "(* (* threat_likelihood fatality_count) 2400000.0)"
        );
        assert_eq!(
            to_smtlib(&model.decision()),
            format!(
                "(<= {} (* {} 10.0))",
                to_smtlib(&model.cost()),
                to_smtlib(&model.benefit())
            )
        );
    }

    #[test]
    fn bindings_substitute_individual_variables() {
        let model = Model::standard();
        let b = Bindings::identity().bind(DecisionVar::FatalityCount, SmtTerm::var("r1"));
        assert_eq!(
            to_smtlib(&model.benefit_with(&b)),
            "(* (* threat_likelihood r1) 2400000.0)"
        );
        assert_eq!(model.cost_with(&b), model.cost());
    }

    #[test]
    fn fixing_outside_tier_is_malformed() {
        let err = Model::standard()
            .with_fixed(DecisionVar::FatalityCount, whole(801))
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::FixedOutsideDomain {
                var: DecisionVar::FatalityCount,
                ..
            }
        ));
        let err = Model::standard()
            .with_fixed(DecisionVar::FatalityCount, whole(199))
            .unwrap_err();
        assert!(matches!(err, ModelError::FixedOutsideDomain { .. }));
    }

    #[test]
    fn fixing_negative_cost_is_malformed() {
        let err = Model::standard()
            .with_fixed(DecisionVar::FinancialCost, whole(-1))
            .unwrap_err();
        assert!(matches!(err, ModelError::FixedOutsideDomain { .. }));
    }

    #[test]
    fn refixing_requires_the_same_value() {
        let mut model = Model::standard();
        model.fix(DecisionVar::TimeHours, whole(3)).unwrap();
        model.fix(DecisionVar::TimeHours, whole(3)).unwrap();
        let err = model.fix(DecisionVar::TimeHours, whole(4)).unwrap_err();
        assert!(matches!(err, ModelError::ConflictingFix { .. }));
        assert_eq!(model.fixed_value(DecisionVar::TimeHours), Some(&whole(3)));
        assert_eq!(model.free_vars().len(), 4);
    }

    #[test]
    fn encoding_declares_every_variable_once() {
        let model = Model::standard()
            .with_fixed(DecisionVar::ComplexityScore, whole(0))
            .unwrap();
        let encoding = model.encoding();
        assert_eq!(encoding.declarations.len(), 5);
        assert!(encoding
            .declarations
            .iter()
            .all(|(_, sort)| *sort == SmtSort::Real));
        // 3 lower-only + 2 bounded + 1 pin
        assert_eq!(encoding.assertions.len(), 3 + 2 * 2 + 1);
    }

    #[test]
    fn invalid_tier_fails_construction() {
        let tier = TierBounds {
            lower: whole(900),
            upper: whole(800),
        };
        assert!(matches!(
            Model::new(tier, Constants::default()),
            Err(ModelError::InvalidBounds { .. })
        ));
    }
}
