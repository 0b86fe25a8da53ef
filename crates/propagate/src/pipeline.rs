use std::fs;
use std::sync::Arc;

use propagate_audit::AuditLog;
use propagate_bundle::build_bundle;
use propagate_classifier::classify;
use propagate_config::PipelineConfig;
use propagate_differ::diff_documents;
use propagate_dispatcher::{poll_all_once, run_waves};
use propagate_impact::map_impact;
use propagate_openapi::parse_document;
use propagate_servicemap::{ServiceMap, TelemetryWindow};
use propagate_store::JobStore;
use propagate_supervisor::{Clients, Reporter};
use propagate_types::{Bundle, ChangeSet, Job, JobState};
use propagate_wave::plan_waves;

use crate::conventions::load_repo_conventions;
use crate::errors::{InputError, PropagateError};

/// One producer's contract moving from one version to another. The input
/// that kicks off a run.
pub struct ContractChangeRequest {
    pub producer_service: String,
    pub from_version: String,
    pub to_version: String,
    pub from_document_path: String,
    pub to_document_path: String,
}

/// Outcome of a pipeline run, enough for the CLI to pick an exit code (§6)
/// without re-deriving it from job state itself.
#[derive(Debug, Clone)]
pub enum RunSummary {
    /// The contract change had no breaking entries; nothing was dispatched.
    NoBreakingChanges,
    /// `dry_run` was set: waves were planned but nothing was dispatched.
    DryRun { waves: Vec<Vec<Bundle>> },
    /// Waves were dispatched and driven to completion (or this was a status
    /// check over already-dispatched jobs).
    Completed { jobs: Vec<Job> },
}

impl RunSummary {
    /// Exit code per spec.md §6: 0 clean, 2 some escalated, 3 some failed.
    /// Configuration errors never reach this far — they're raised before a
    /// `RunSummary` exists.
    pub fn exit_code(&self) -> i32 {
        let jobs = match self {
            RunSummary::NoBreakingChanges | RunSummary::DryRun { .. } => return 0,
            RunSummary::Completed { jobs } => jobs,
        };
        if jobs.iter().any(|j| j.state == JobState::Failed) {
            3
        } else if jobs.iter().any(|j| j.state == JobState::NeedsHuman) {
            2
        } else {
            0
        }
    }
}

fn read_document(path: &str) -> Result<propagate_openapi::OpenApiDocument, PropagateError> {
    let bytes = fs::read(path).map_err(|source| {
        PropagateError::Input(InputError::ContractIo {
            path: path.to_string(),
            source,
        })
    })?;
    parse_document(&bytes)
        .map_err(|e| PropagateError::Input(InputError::Contract(e)))
}

fn build_change_set(request: &ContractChangeRequest) -> Result<ChangeSet, PropagateError> {
    let from = read_document(&request.from_document_path)?;
    let to = read_document(&request.to_document_path)?;
    let classified = diff_documents(&from, &to).into_iter().map(|e| classify(&e)).collect();
    Ok(ChangeSet::new(
        request.producer_service.clone(),
        request.from_version.clone(),
        request.to_version.clone(),
        classified,
    ))
}

fn plan_bundles(config: &PipelineConfig, change_set: &ChangeSet) -> Result<Vec<Vec<Bundle>>, PropagateError> {
    let service_map =
        ServiceMap::load(&config.service_map_path).map_err(|e| PropagateError::Input(e.into()))?;
    let telemetry =
        TelemetryWindow::load(&config.telemetry_path).map_err(|e| PropagateError::Input(e.into()))?;
    let conventions = load_repo_conventions(&config.repo_conventions_path)
        .map_err(|e| PropagateError::Input(e.into()))?;

    let impacts = map_impact(change_set, &service_map, &telemetry);
    let bundles: Vec<Bundle> = conventions
        .iter()
        .filter_map(|convention| build_bundle(convention, change_set, &impacts))
        .collect();

    Ok(plan_waves(bundles, &service_map))
}

/// Run the full pipeline for one contract change: diff, classify, map
/// impact, bundle, plan waves, and — unless `config.options.dry_run` — drive
/// every wave to a terminal outcome.
pub async fn run_pipeline(
    config: &PipelineConfig,
    request: ContractChangeRequest,
    clients: Arc<Clients>,
    store: Arc<JobStore>,
    audit: Arc<AuditLog>,
    reporter: Arc<dyn Reporter>,
) -> Result<RunSummary, PropagateError> {
    let change_set = build_change_set(&request)?;
    if !change_set.is_breaking {
        return Ok(RunSummary::NoBreakingChanges);
    }

    let waves = plan_bundles(config, &change_set)?;

    if config.options.dry_run {
        return Ok(RunSummary::DryRun { waves });
    }

    let job_ids = run_waves(
        waves,
        clients,
        store.clone(),
        audit,
        reporter,
        config.options.clone(),
    )
    .await
    .map_err(PropagateError::Dispatch)?;

    let mut jobs = Vec::with_capacity(job_ids.len());
    for job_id in job_ids {
        if let Some(job) = store.get(&job_id).await.map_err(|e| {
            PropagateError::StateMachineViolation(propagate_supervisor::SupervisorError::Store(e))
        })? {
            jobs.push(job);
        }
    }
    Ok(RunSummary::Completed { jobs })
}

/// Drive one supervisor pass over every non-terminal job without dispatching
/// anything new — the "check status" operational surface.
pub async fn check_status(
    config: &PipelineConfig,
    clients: Arc<Clients>,
    store: Arc<JobStore>,
    audit: Arc<AuditLog>,
    reporter: Arc<dyn Reporter>,
) -> Result<RunSummary, PropagateError> {
    let all_jobs = store
        .all()
        .await
        .map_err(|e| PropagateError::StateMachineViolation(propagate_supervisor::SupervisorError::Store(e)))?;
    let live_ids: Vec<String> = all_jobs
        .iter()
        .filter(|j| !j.state.is_terminal())
        .map(|j| j.job_id.clone())
        .collect();

    poll_all_once(live_ids, clients, store.clone(), audit, reporter, config.options.clone())
        .await
        .map_err(PropagateError::Dispatch)?;

    let jobs = store
        .all()
        .await
        .map_err(|e| PropagateError::StateMachineViolation(propagate_supervisor::SupervisorError::Store(e)))?;
    Ok(RunSummary::Completed { jobs })
}
