//! Turns a wave of bundles into dispatched jobs and drives each wave to
//! completion before the next wave starts, bounding how many agent sessions
//! are ever in flight at once.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::sleep;

use propagate_audit::AuditLog;
use propagate_store::{InsertOutcome, JobStore, StoreError};
use propagate_supervisor::{poll_once, Clients, Reporter, StepOutcome, SupervisorError};
use propagate_types::{Bundle, Job, PipelineOptions};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Insert one job per bundle in this wave, skipping bundles whose fingerprint
/// already has a job queued (idempotent dispatch). Returns the job ids now
/// live for this wave, in the order their bundles were given.
pub async fn enqueue_wave(
    bundles: Vec<Bundle>,
    wave: u32,
    store: &JobStore,
    reporter: &dyn Reporter,
) -> Result<Vec<String>, DispatchError> {
    let mut job_ids = Vec::with_capacity(bundles.len());
    for bundle in bundles {
        let short_fingerprint = &bundle.fingerprint[..bundle.fingerprint.len().min(12)];
        let job_id = format!("{}-w{}-{}", bundle.consumer_service, wave, short_fingerprint);
        let job = Job::new(job_id.clone(), wave, bundle, Utc::now());
        match store.try_insert(job).await? {
            InsertOutcome::Inserted => job_ids.push(job_id),
            InsertOutcome::AlreadyExists(existing) => {
                reporter.info(&format!(
                    "bundle fingerprint already has job {existing} queued, skipping duplicate dispatch"
                ));
                job_ids.push(existing);
            }
        }
    }
    Ok(job_ids)
}

/// Drive every job in `job_ids` to a terminal state, never running more than
/// `options.max_concurrent_sessions` `poll_once` calls concurrently. A job
/// that isn't done yet is requeued after `options.poll_interval` rather than
/// held open on a dedicated task, so the pool stays bounded regardless of
/// how many jobs are live.
pub async fn run_wave_to_completion(
    job_ids: Vec<String>,
    clients: Arc<Clients>,
    store: Arc<JobStore>,
    audit: Arc<AuditLog>,
    reporter: Arc<dyn Reporter>,
    options: PipelineOptions,
) -> Result<(), DispatchError> {
    let mut pending: VecDeque<String> = job_ids.into_iter().collect();
    let capacity = options.max_concurrent_sessions.max(1);
    let mut in_flight: JoinSet<Result<Option<String>, SupervisorError>> = JoinSet::new();

    loop {
        while in_flight.len() < capacity {
            let Some(job_id) = pending.pop_front() else {
                break;
            };
            let clients = clients.clone();
            let store = store.clone();
            let audit = audit.clone();
            let reporter = reporter.clone();
            let options = options.clone();
            in_flight.spawn(async move {
                let outcome = poll_once(&job_id, &clients, &store, &audit, reporter.as_ref(), &options).await?;
                match outcome {
                    StepOutcome::Continue => {
                        sleep(options.poll_interval).await;
                        Ok(Some(job_id))
                    }
                    StepOutcome::Terminal(_) => Ok(None),
                }
            });
        }

        let Some(result) = in_flight.join_next().await else {
            // Nothing in flight and nothing pending: every job reached a
            // terminal state.
            break;
        };
        match result.expect("poll task panicked") {
            Ok(Some(job_id)) => pending.push_back(job_id),
            Ok(None) => {}
            Err(e) => return Err(DispatchError::Supervisor(e)),
        }
    }
    Ok(())
}

/// Poll every job in `job_ids` exactly once and return — unlike
/// `run_wave_to_completion`, a job that isn't done yet is left as-is rather
/// than requeued. This backs the "check status" operational surface, which
/// advances existing jobs without dispatching anything new.
pub async fn poll_all_once(
    job_ids: Vec<String>,
    clients: Arc<Clients>,
    store: Arc<JobStore>,
    audit: Arc<AuditLog>,
    reporter: Arc<dyn Reporter>,
    options: PipelineOptions,
) -> Result<(), DispatchError> {
    let capacity = options.max_concurrent_sessions.max(1);
    let mut pending: VecDeque<String> = job_ids.into_iter().collect();
    let mut in_flight: JoinSet<Result<(), SupervisorError>> = JoinSet::new();

    loop {
        while in_flight.len() < capacity {
            let Some(job_id) = pending.pop_front() else {
                break;
            };
            let clients = clients.clone();
            let store = store.clone();
            let audit = audit.clone();
            let reporter = reporter.clone();
            let options = options.clone();
            in_flight.spawn(async move {
                poll_once(&job_id, &clients, &store, &audit, reporter.as_ref(), &options).await?;
                Ok(())
            });
        }
        let Some(result) = in_flight.join_next().await else {
            break;
        };
        result.expect("poll task panicked")?;
    }
    Ok(())
}

/// Run every wave in order, waiting for a wave to fully terminate before the
/// next one is dispatched. Returns every job id dispatched across all waves.
pub async fn run_waves(
    waves: Vec<Vec<Bundle>>,
    clients: Arc<Clients>,
    store: Arc<JobStore>,
    audit: Arc<AuditLog>,
    reporter: Arc<dyn Reporter>,
    options: PipelineOptions,
) -> Result<Vec<String>, DispatchError> {
    let mut all_job_ids = Vec::new();
    for (wave, bundles) in waves.into_iter().enumerate() {
        let job_ids = enqueue_wave(bundles, wave as u32, &store, reporter.as_ref()).await?;
        run_wave_to_completion(
            job_ids.clone(),
            clients.clone(),
            store.clone(),
            audit.clone(),
            reporter.clone(),
            options.clone(),
        )
        .await?;
        all_job_ids.extend(job_ids);
    }
    Ok(all_job_ids)
}
