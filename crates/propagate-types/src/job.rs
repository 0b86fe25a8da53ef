use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bundle::Bundle;

/// The job state machine. Transitions are strictly ordered; see
/// `JobState::can_transition_to` for the allowed edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    PrOpened,
    Green,
    NeedsHuman,
    Failed,
}

impl JobState {
    /// Terminal states are where the supervisor stops polling a job.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Green | JobState::NeedsHuman | JobState::Failed)
    }

    /// Whether `self -> next` is a legal state machine edge.
    ///
    /// `Queued -> Running -> PrOpened -> {Green, NeedsHuman, Failed}`, plus
    /// direct escapes to `NeedsHuman`/`Failed` from `Running` (guardrail trip
    /// or permanent external error before a PR is ever opened).
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Queued, Running)
                | (Running, PrOpened)
                | (Running, NeedsHuman)
                | (Running, Failed)
                | (PrOpened, Green)
                | (PrOpened, NeedsHuman)
                | (PrOpened, Failed)
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::PrOpened => "pr_opened",
            JobState::Green => "green",
            JobState::NeedsHuman => "needs_human",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A single remediation job: one bundle, one agent session, tracked to a
/// terminal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub fingerprint: String,
    pub wave: u32,
    pub bundle: Bundle,
    pub state: JobState,
    pub agent_session_id: Option<String>,
    pub pr_url: Option<String>,
    pub consecutive_unknown_ci_polls: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_id: impl Into<String>, wave: u32, bundle: Bundle, now: DateTime<Utc>) -> Self {
        let fingerprint = bundle.fingerprint.clone();
        Self {
            job_id: job_id.into(),
            fingerprint,
            wave,
            bundle,
            state: JobState::Queued,
            agent_session_id: None,
            pr_url: None,
            consecutive_unknown_ci_polls: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An append-only record of one state transition, forming the durable audit
/// trail for a job. Never mutated once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub job_id: String,
    pub from_state: Option<JobState>,
    pub to_state: JobState,
    pub reason: String,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn transition(
        job_id: impl Into<String>,
        from_state: Option<JobState>,
        to_state: JobState,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            from_state,
            to_state,
            reason: reason.into(),
            at,
        }
    }
}
