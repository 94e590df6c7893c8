use serde::{Deserialize, Serialize};

/// Which solver backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverChoice {
    #[default]
    Z3,
    Cvc5,
}

/// Options shared by every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub solver: SolverChoice,
    /// Per-check limit; expiry surfaces as an inconclusive outcome. Zero
    /// disables the limit.
    pub timeout_secs: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            solver: SolverChoice::Z3,
            timeout_secs: 60,
        }
    }
}
