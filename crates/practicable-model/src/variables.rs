use std::fmt;
use std::str::FromStr;

use num::rational::BigRational;
use serde::{Deserialize, Serialize};

use practicable_smt::terms::SmtTerm;

use crate::decimal::format_decimal;
use crate::error::ModelError;

/// The real-valued unknowns of the reasonably-practicable decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionVar {
    /// Direct monetary cost of the measure.
    FinancialCost,
    /// Staff time the measure consumes, in hours.
    TimeHours,
    /// Operational complexity the measure introduces.
    ComplexityScore,
    /// Probability that the threat materialises, in `[0, 1]`.
    ThreatLikelihood,
    /// Outcome magnitude: fatalities the measure would prevent.
    FatalityCount,
}

impl DecisionVar {
    pub const ALL: [DecisionVar; 5] = [
        DecisionVar::FinancialCost,
        DecisionVar::TimeHours,
        DecisionVar::ComplexityScore,
        DecisionVar::ThreatLikelihood,
        DecisionVar::FatalityCount,
    ];

    /// Solver-level name of the variable.
    pub fn smt_name(self) -> &'static str {
        match self {
            DecisionVar::FinancialCost => "financial_cost",
            DecisionVar::TimeHours => "time_hours",
            DecisionVar::ComplexityScore => "complexity_score",
            DecisionVar::ThreatLikelihood => "threat_likelihood",
            DecisionVar::FatalityCount => "fatality_count",
        }
    }

    /// True for the variables that feed the cost side of the decision.
    pub fn is_cost_side(self) -> bool {
        matches!(
            self,
            DecisionVar::FinancialCost | DecisionVar::TimeHours | DecisionVar::ComplexityScore
        )
    }
}

impl fmt::Display for DecisionVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.smt_name())
    }
}

impl FromStr for DecisionVar {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DecisionVar::ALL
            .into_iter()
            .find(|v| v.smt_name() == s)
            .ok_or_else(|| ModelError::UnknownVariable(s.to_string()))
    }
}

/// Admissible values of one decision variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub lower: BigRational,
    /// `None` means unbounded above.
    pub upper: Option<BigRational>,
    /// Pinned value, always inside `[lower, upper]`.
    pub fixed: Option<BigRational>,
}

impl Domain {
    pub fn at_least(lower: BigRational) -> Self {
        Self {
            lower,
            upper: None,
            fixed: None,
        }
    }

    pub fn between(lower: BigRational, upper: BigRational) -> Self {
        Self {
            lower,
            upper: Some(upper),
            fixed: None,
        }
    }

    pub fn contains(&self, value: &BigRational) -> bool {
        value >= &self.lower && self.upper.as_ref().is_none_or(|u| value <= u)
    }

    /// Bound (and pin) constraints for `term` standing in for this variable.
    pub fn constraints(&self, term: &SmtTerm) -> Vec<SmtTerm> {
        let mut out = vec![term.clone().ge(SmtTerm::real(self.lower.clone()))];
        if let Some(upper) = &self.upper {
            out.push(term.clone().le(SmtTerm::real(upper.clone())));
        }
        if let Some(fixed) = &self.fixed {
            out.push(term.clone().eq(SmtTerm::real(fixed.clone())));
        }
        out
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.upper {
            Some(upper) => write!(
                f,
                "[{}, {}]",
                format_decimal(&self.lower),
                format_decimal(upper)
            ),
            None => write!(f, "[{}, +inf)", format_decimal(&self.lower)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::bigint::BigInt;

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for var in DecisionVar::ALL {
            assert_eq!(var.smt_name().parse::<DecisionVar>().unwrap(), var);
        }
        assert!(matches!(
            "venue_capacity".parse::<DecisionVar>(),
            Err(ModelError::UnknownVariable(_))
        ));
    }

    #[test]
    fn domain_membership_is_inclusive() {
        let d = Domain::between(q(0, 1), q(1, 1));
        assert!(d.contains(&q(0, 1)));
        assert!(d.contains(&q(1, 1)));
        assert!(d.contains(&q(1, 2)));
        assert!(!d.contains(&q(-1, 1_000_000)));
        assert!(!d.contains(&q(1_000_001, 1_000_000)));

        let open = Domain::at_least(q(0, 1));
        assert!(open.contains(&q(10_i64.pow(15), 1)));
        assert_eq!(open.to_string(), "[0, +inf)");
        assert_eq!(d.to_string(), "[0, 1]");
    }

    #[test]
    fn pinned_domain_adds_equality_constraint() {
        let mut d = Domain::between(q(200, 1), q(800, 1));
        assert_eq!(d.constraints(&SmtTerm::var("m")).len(), 2);
        d.fixed = Some(q(799, 1));
        let constraints = d.constraints(&SmtTerm::var("m"));
        assert_eq!(constraints.len(), 3);
        assert_eq!(
            constraints[2],
            SmtTerm::var("m").eq(SmtTerm::int(799))
        );
    }

    #[test]
    fn serde_uses_solver_names() {
        let json = serde_json::to_string(&DecisionVar::ThreatLikelihood).unwrap();
        assert_eq!(json, "\"threat_likelihood\"");
    }
}
