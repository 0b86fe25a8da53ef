use serde::{Deserialize, Serialize};

/// Where a dispatched agent session currently stands, as reported by the
/// agent platform. `Running` covers everything between session start and a
/// PR existing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum AgentSessionStatus {
    Running,
    PrOpened { pr_url: String },
    Failed { reason: String },
}

/// CI status for an open PR, as reported by the git provider / CI system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiStatus {
    Pending,
    Green,
    Red,
    /// The provider didn't give a usable answer this poll (timeout,
    /// maintenance, malformed payload). Distinct from `Pending` so the
    /// supervisor's "N consecutive unknowns" guardrail can count it.
    Unknown,
}
