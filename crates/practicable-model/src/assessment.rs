//! Exact evaluation of the decision on a concrete scenario.

use std::collections::BTreeMap;
use std::fmt;

use num::rational::BigRational;
use num::traits::Zero;
use serde::{Deserialize, Serialize};

use crate::decimal::{serde_decimal, serde_decimal_opt};
use crate::error::ModelError;
use crate::model::Model;
use crate::variables::DecisionVar;

/// Whether a measure must be implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasureStatus {
    /// Cost is not grossly disproportionate to the benefit.
    Required,
    /// Cost exceeds the benefit by more than the disproportion factor.
    Optional,
}

impl MeasureStatus {
    pub fn is_required(self) -> bool {
        self == MeasureStatus::Required
    }
}

impl fmt::Display for MeasureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureStatus::Required => write!(f, "REQUIRED"),
            MeasureStatus::Optional => write!(f, "OPTIONAL"),
        }
    }
}

/// Concrete values for (some of) the decision variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
    values: BTreeMap<DecisionVar, BigRational>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, var: DecisionVar, value: BigRational) -> Self {
        self.values.insert(var, value);
        self
    }

    pub fn get(&self, var: DecisionVar) -> Option<&BigRational> {
        self.values.get(&var)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DecisionVar, &BigRational)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}

impl FromIterator<(DecisionVar, BigRational)> for Scenario {
    fn from_iter<I: IntoIterator<Item = (DecisionVar, BigRational)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Outcome of evaluating the decision on one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    #[serde(with = "serde_decimal")]
    pub cost: BigRational,
    #[serde(with = "serde_decimal")]
    pub benefit: BigRational,
    /// `benefit * disproportion_factor`.
    #[serde(with = "serde_decimal")]
    pub disproportion_threshold: BigRational,
    /// `cost / benefit`, absent when the benefit is zero.
    #[serde(with = "serde_decimal_opt")]
    pub disproportion_ratio: Option<BigRational>,
    pub status: MeasureStatus,
}

impl Model {
    /// Evaluate cost, benefit and the decision exactly.
    ///
    /// Values come from `scenario`, falling back to the model's fixed values.
    /// Each value is checked against its domain first.
    pub fn assess(&self, scenario: &Scenario) -> Result<Assessment, ModelError> {
        let mut values = BTreeMap::new();
        for var in DecisionVar::ALL {
            let value = scenario
                .get(var)
                .or_else(|| self.fixed_value(var))
                .ok_or(ModelError::MissingValue(var))?;
            let domain = self.domain(var);
            if !domain.contains(value) {
                return Err(ModelError::FixedOutsideDomain {
                    var,
                    value: value.clone(),
                    domain: domain.clone(),
                });
            }
            if let Some(fixed) = self.fixed_value(var) {
                if fixed != value {
                    return Err(ModelError::ConflictingFix {
                        var,
                        existing: fixed.clone(),
                        requested: value.clone(),
                    });
                }
            }
            values.insert(var, value.clone());
        }

        let c = self.constants();
        let v = |var: DecisionVar| &values[&var];
        let cost = v(DecisionVar::FinancialCost)
            + v(DecisionVar::TimeHours) * &c.hourly_rate
            + v(DecisionVar::ComplexityScore) * &c.complexity_penalty_rate;
        let benefit =
            v(DecisionVar::ThreatLikelihood) * v(DecisionVar::FatalityCount) * &c.valuation_constant;
        let disproportion_threshold = &benefit * &c.disproportion_factor;
        let disproportion_ratio = if benefit.is_zero() {
            None
        } else {
            Some(&cost / &benefit)
        };
        let status = if cost <= disproportion_threshold {
            MeasureStatus::Required
        } else {
            MeasureStatus::Optional
        };

        Ok(Assessment {
            cost,
            benefit,
            disproportion_threshold,
            disproportion_ratio,
            status,
        })
    }
}
