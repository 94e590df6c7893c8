//! Model configuration: tier bounds and statutory constants.
//!
//! All numbers serialize as exact decimal strings, e.g.
//!
//! ```json
//! {
//!   "tier": { "lower": "200", "upper": "800" },
//!   "constants": {
//!     "valuation_constant": "2400000",
//!     "disproportion_factor": "10",
//!     "hourly_rate": "15",
//!     "complexity_penalty_rate": "500"
//!   }
//! }
//! ```

use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::{Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::decimal::serde_decimal;
use crate::error::ModelError;

fn whole(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

/// Admissible range of the outcome-magnitude variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBounds {
    #[serde(with = "serde_decimal")]
    pub lower: BigRational,
    #[serde(with = "serde_decimal")]
    pub upper: BigRational,
}

impl TierBounds {
    pub fn new(lower: BigRational, upper: BigRational) -> Result<Self, ModelError> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Standard tier: venues holding 200 to 800 people.
    pub fn standard() -> Self {
        Self {
            lower: whole(200),
            upper: whole(800),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.lower.is_negative() {
            return Err(ModelError::NegativeBound {
                subject: "tier".into(),
                lower: self.lower.clone(),
            });
        }
        if self.lower > self.upper {
            return Err(ModelError::InvalidBounds {
                subject: "tier".into(),
                lower: self.lower.clone(),
                upper: self.upper.clone(),
            });
        }
        Ok(())
    }
}

impl Default for TierBounds {
    fn default() -> Self {
        Self::standard()
    }
}

/// Named constants shared by every derived quantity of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constants {
    /// Monetary value of preventing one fatality.
    #[serde(with = "serde_decimal")]
    pub valuation_constant: BigRational,
    /// Gross disproportion factor (GDF).
    #[serde(with = "serde_decimal")]
    pub disproportion_factor: BigRational,
    /// Cost of one hour of staff time.
    #[serde(with = "serde_decimal")]
    pub hourly_rate: BigRational,
    /// Cost per unit of complexity score.
    #[serde(with = "serde_decimal")]
    pub complexity_penalty_rate: BigRational,
}

impl Constants {
    pub fn validate(&self) -> Result<(), ModelError> {
        let positive = [
            ("valuation_constant", &self.valuation_constant),
            ("disproportion_factor", &self.disproportion_factor),
        ];
        for (name, value) in positive {
            if !value.is_positive() {
                return Err(ModelError::InvalidConstant {
                    name,
                    value: value.clone(),
                    reason: "must be strictly positive",
                });
            }
        }
        let non_negative = [
            ("hourly_rate", &self.hourly_rate),
            ("complexity_penalty_rate", &self.complexity_penalty_rate),
        ];
        for (name, value) in non_negative {
            if value < &BigRational::zero() {
                return Err(ModelError::InvalidConstant {
                    name,
                    value: value.clone(),
                    reason: "must not be negative",
                });
            }
        }
        Ok(())
    }
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            valuation_constant: whole(2_400_000),
            disproportion_factor: whole(10),
            hourly_rate: whole(15),
            complexity_penalty_rate: whole(500),
        }
    }
}

/// Everything needed to construct a [`crate::Model`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub tier: TierBounds,
    #[serde(default)]
    pub constants: Constants,
}

impl ModelConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        self.tier.validate()?;
        self.constants.validate()
    }
}
