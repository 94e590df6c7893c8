use std::collections::BTreeMap;
use std::fmt;

use num::rational::BigRational;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use practicable_model::decimal::{format_decimal, serde_decimal};
use practicable_model::DecisionVar;

/// Exact assignment returned by a satisfiable query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Witness {
    values: BTreeMap<String, BigRational>,
}

impl Witness {
    pub fn new(values: BTreeMap<String, BigRational>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&BigRational> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BigRational)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(k, v)| format!("{k} = {}", format_decimal(v)))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

impl Serialize for Witness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, &format_decimal(value))?;
        }
        map.end()
    }
}

/// Verdict for a universal property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum PropertyOutcome {
    /// The negated claim is unsatisfiable: the property holds on every
    /// admissible assignment.
    Proven,
    /// The negated claim is satisfiable; `witness` breaks the property.
    Disproven { witness: Witness },
    /// The solver gave up. The property is unverified, not passing.
    Inconclusive { reason: String },
}

impl PropertyOutcome {
    /// Stable string naming the variant, independent of payload.
    pub fn verdict_class(&self) -> &'static str {
        match self {
            PropertyOutcome::Proven => "proven",
            PropertyOutcome::Disproven { .. } => "disproven",
            PropertyOutcome::Inconclusive { .. } => "inconclusive",
        }
    }

    pub fn is_proven(&self) -> bool {
        matches!(self, PropertyOutcome::Proven)
    }

    pub fn witness(&self) -> Option<&Witness> {
        match self {
            PropertyOutcome::Disproven { witness } => Some(witness),
            _ => None,
        }
    }
}

/// Answer to a tipping-point query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum BoundaryOutcome {
    /// The exact value of `variable` at which cost equals the disproportion
    /// threshold.
    Boundary {
        variable: DecisionVar,
        #[serde(with = "serde_decimal")]
        value: BigRational,
    },
    /// No admissible value of the free variable balances the scenario.
    Infeasible,
    /// The solver gave up; no value is implied.
    Inconclusive { reason: String },
}

impl BoundaryOutcome {
    pub fn verdict_class(&self) -> &'static str {
        match self {
            BoundaryOutcome::Boundary { .. } => "boundary",
            BoundaryOutcome::Infeasible => "infeasible",
            BoundaryOutcome::Inconclusive { .. } => "inconclusive",
        }
    }

    pub fn value(&self) -> Option<&BigRational> {
        match self {
            BoundaryOutcome::Boundary { value, .. } => Some(value),
            _ => None,
        }
    }
}
