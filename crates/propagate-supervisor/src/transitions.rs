use chrono::Utc;
use thiserror::Error;

use propagate_audit::AuditLog;
use propagate_store::{JobStore, StoreError};
use propagate_types::{AuditEntry, JobState};

use crate::reporter::Reporter;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Audit(#[from] propagate_audit::AuditError),
    #[error("illegal transition for job {job_id}: {from:?} -> {to:?}")]
    IllegalTransition {
        job_id: String,
        from: JobState,
        to: JobState,
    },
    #[error("job {0} not found")]
    JobNotFound(String),
}

/// Apply a validated state transition: checks `JobState::can_transition_to`,
/// persists the new state, and appends the audit entry — in that order, so
/// the audit log never records a transition the store rejected.
pub async fn transition(
    store: &JobStore,
    audit: &AuditLog,
    reporter: &dyn Reporter,
    job_id: &str,
    to: JobState,
    reason: &str,
) -> Result<(), SupervisorError> {
    let mut observed_from = None;
    store
        .update(job_id, |job| {
            if !job.state.can_transition_to(to) {
                return Err(StoreError::IllegalTransition(format!(
                    "{} -> {}",
                    job.state, to
                )));
            }
            observed_from = Some(job.state);
            job.state = to;
            job.updated_at = Utc::now();
            Ok(())
        })
        .await
        .map_err(|e| match e {
            StoreError::IllegalTransition(_) => SupervisorError::IllegalTransition {
                job_id: job_id.to_string(),
                from: observed_from.unwrap_or(to),
                to,
            },
            other => SupervisorError::Store(other),
        })?;

    audit.append(&AuditEntry::transition(
        job_id,
        observed_from,
        to,
        reason,
        Utc::now(),
    ))?;
    reporter.job_transitioned(job_id, observed_from, to);
    Ok(())
}
