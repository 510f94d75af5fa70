use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One weighted input to the trust score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrustComponent {
    pub score: f64,
    pub weight: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrustBreakdown {
    pub coverage: TrustComponent,
    pub mutation: TrustComponent,
    pub contracts: TrustComponent,
    pub a11y: TrustComponent,
    pub perf: TrustComponent,
}

impl TrustBreakdown {
    pub fn components(&self) -> [(&'static str, TrustComponent); 5] {
        [
            ("coverage", self.coverage),
            ("mutation", self.mutation),
            ("contracts", self.contracts),
            ("a11y", self.a11y),
            ("perf", self.perf),
        ]
    }

    pub fn total_weight(&self) -> f64 {
        self.components().iter().map(|(_, c)| c.weight).sum()
    }
}

/// Weighted composite of the gate scores and non-functional sub-scores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrustScore {
    pub passed: bool,
    pub score: f64,
    /// Tier the score was computed under (4 when experiment mode synthesized one).
    pub tier: u8,
    pub threshold: f64,
    pub breakdown: TrustBreakdown,
    /// True when the tier penalty for failing contracts was applied.
    #[serde(default)]
    pub contracts_penalty_applied: bool,
}
