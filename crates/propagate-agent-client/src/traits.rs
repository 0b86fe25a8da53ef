use async_trait::async_trait;
use thiserror::Error;

use propagate_types::Bundle;

use crate::types::{AgentSessionStatus, CiStatus};

#[derive(Debug, Error)]
pub enum AgentClientError {
    #[error("transient failure calling {endpoint}: {detail}")]
    Transient { endpoint: String, detail: String },
    #[error("permanent failure calling {endpoint}: {detail}")]
    Permanent { endpoint: String, detail: String },
}

/// Starts and polls autonomous remediation agent sessions.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Start a new session for `bundle`, using `idempotency_key` so a retry
    /// of this call after a dropped response doesn't start a second session
    /// for the same bundle.
    async fn start_session(
        &self,
        bundle: &Bundle,
        idempotency_key: &str,
    ) -> Result<String, AgentClientError>;

    async fn session_status(&self, session_id: &str) -> Result<AgentSessionStatus, AgentClientError>;
}

/// Polls CI status for an open PR.
#[async_trait]
pub trait CiStatusClient: Send + Sync {
    async fn ci_status(&self, pr_url: &str) -> Result<CiStatus, AgentClientError>;
}

/// Reads the set of files changed by an open PR, used by the protected-path
/// guardrail.
#[async_trait]
pub trait GitProviderClient: Send + Sync {
    async fn changed_files(&self, pr_url: &str) -> Result<Vec<String>, AgentClientError>;
}
