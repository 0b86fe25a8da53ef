use std::sync::Arc;

use chrono::Utc;

use propagate_agent_client::{AgentClient, AgentClientError, AgentSessionStatus, CiStatus, CiStatusClient, GitProviderClient};
use propagate_audit::AuditLog;
use propagate_store::JobStore;
use propagate_types::{JobState, PipelineOptions};

use crate::guardrails::{ci_guardrail, protected_path_guardrail};
use crate::reporter::Reporter;
use crate::transitions::{transition, SupervisorError};

/// The three external clients a poll step needs. Grouped so the dispatcher
/// only has to thread one value through its worker pool.
pub struct Clients {
    pub agent: Arc<dyn AgentClient>,
    pub ci: Arc<dyn CiStatusClient>,
    pub git: Arc<dyn GitProviderClient>,
}

/// Result of one poll step: either the job needs polling again later, or it
/// has reached a terminal state and the caller should stop scheduling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Terminal(JobState),
}

/// Advance `job_id` by exactly one unit of work: start a session, check an
/// in-flight session's status, or check CI on an open PR — whichever
/// matches its current state. Never blocks longer than one network call;
/// the caller (the dispatcher's worker pool) is responsible for spacing
/// repeated calls by `options.poll_interval`.
pub async fn poll_once(
    job_id: &str,
    clients: &Clients,
    store: &JobStore,
    audit: &AuditLog,
    reporter: &dyn Reporter,
    options: &PipelineOptions,
) -> Result<StepOutcome, SupervisorError> {
    let job = store
        .get(job_id)
        .await?
        .ok_or_else(|| SupervisorError::JobNotFound(job_id.to_string()))?;

    if job.state.is_terminal() {
        return Ok(StepOutcome::Terminal(job.state));
    }

    // A session that never reaches a terminal result within its wall-clock
    // budget is escalated rather than polled forever.
    if matches!(job.state, JobState::Running | JobState::PrOpened) {
        let elapsed = (Utc::now() - job.created_at)
            .to_std()
            .unwrap_or_default();
        if elapsed > options.session_timeout {
            transition(store, audit, reporter, job_id, JobState::NeedsHuman, "timeout").await?;
            return Ok(StepOutcome::Terminal(JobState::NeedsHuman));
        }
    }

    match job.state {
        JobState::Queued => {
            match clients.agent.start_session(&job.bundle, &job.fingerprint).await {
                Ok(session_id) => {
                    store
                        .update(job_id, |j| {
                            j.agent_session_id = Some(session_id);
                            Ok(())
                        })
                        .await?;
                    transition(store, audit, reporter, job_id, JobState::Running, "agent session started").await?;
                    Ok(StepOutcome::Continue)
                }
                Err(AgentClientError::Permanent { detail, .. }) => {
                    transition(store, audit, reporter, job_id, JobState::Failed, &detail).await?;
                    Ok(StepOutcome::Terminal(JobState::Failed))
                }
                Err(AgentClientError::Transient { .. }) => {
                    reporter.warn(&format!("{job_id}: transient error starting session, will retry"));
                    Ok(StepOutcome::Continue)
                }
            }
        }

        JobState::Running => {
            let session_id = job
                .agent_session_id
                .clone()
                .expect("a running job always has a session id");
            match clients.agent.session_status(&session_id).await {
                Ok(AgentSessionStatus::Running) => Ok(StepOutcome::Continue),
                Ok(AgentSessionStatus::PrOpened { pr_url }) => {
                    let changed_files = clients.git.changed_files(&pr_url).await.ok();
                    store
                        .update(job_id, |j| {
                            j.pr_url = Some(pr_url.clone());
                            Ok(())
                        })
                        .await?;
                    match protected_path_guardrail(changed_files.as_deref(), &job.bundle.protected_paths) {
                        Ok(()) => {
                            transition(store, audit, reporter, job_id, JobState::PrOpened, "pr opened").await?;
                            Ok(StepOutcome::Continue)
                        }
                        Err(trip) => {
                            transition(store, audit, reporter, job_id, JobState::NeedsHuman, &trip.to_string()).await?;
                            Ok(StepOutcome::Terminal(JobState::NeedsHuman))
                        }
                    }
                }
                Ok(AgentSessionStatus::Failed { reason }) => {
                    transition(store, audit, reporter, job_id, JobState::Failed, &reason).await?;
                    Ok(StepOutcome::Terminal(JobState::Failed))
                }
                Err(AgentClientError::Transient { .. }) => {
                    reporter.warn(&format!("{job_id}: transient error polling session, will retry"));
                    Ok(StepOutcome::Continue)
                }
                Err(AgentClientError::Permanent { detail, .. }) => {
                    transition(store, audit, reporter, job_id, JobState::Failed, &detail).await?;
                    Ok(StepOutcome::Terminal(JobState::Failed))
                }
            }
        }

        JobState::PrOpened => {
            let pr_url = job.pr_url.clone().expect("a pr_opened job always has a pr_url");
            let status = clients.ci.ci_status(&pr_url).await.unwrap_or(CiStatus::Unknown);
            let (next_count, trip) = ci_guardrail(status, job.consecutive_unknown_ci_polls, options.max_consecutive_unknown_ci_polls);
            store
                .update(job_id, |j| {
                    j.consecutive_unknown_ci_polls = next_count;
                    Ok(())
                })
                .await?;

            if let Some(trip) = trip {
                transition(store, audit, reporter, job_id, JobState::NeedsHuman, &trip.to_string()).await?;
                return Ok(StepOutcome::Terminal(JobState::NeedsHuman));
            }

            match status {
                CiStatus::Green => {
                    transition(store, audit, reporter, job_id, JobState::Green, "ci green").await?;
                    Ok(StepOutcome::Terminal(JobState::Green))
                }
                CiStatus::Red => {
                    transition(store, audit, reporter, job_id, JobState::NeedsHuman, "ci failure").await?;
                    Ok(StepOutcome::Terminal(JobState::NeedsHuman))
                }
                CiStatus::Pending | CiStatus::Unknown => Ok(StepOutcome::Continue),
            }
        }

        JobState::Green | JobState::NeedsHuman | JobState::Failed => Ok(StepOutcome::Terminal(job.state)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use propagate_agent_client::{FakeAgentClient, FakeCiStatusClient, FakeGitProviderClient};
    use propagate_types::{Bundle, ChangeSet, Job, RemediationKind};

    fn bundle() -> Bundle {
        Bundle {
            kind: RemediationKind::BreakingContractChange,
            consumer_service: "checkout".into(),
            consumer_repo: "org/checkout".into(),
            producer_service: "billing".into(),
            change_set: ChangeSet::new("billing", "v1", "v2", vec![]),
            impacts: vec![],
            candidate_paths: vec![],
            protected_paths: vec!["src/generated/**".into()],
            fingerprint: "fp-1".into(),
        }
    }

    async fn harness() -> (JobStore, AuditLog, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path().join("jobs")).unwrap();
        let audit = AuditLog::open(dir.path().join("audit.jsonl"));
        (store, audit, dir)
    }

    #[tokio::test]
    async fn queued_job_starts_a_session_and_moves_to_running() {
        let (store, audit, _dir) = harness().await;
        store.try_insert(Job::new("job-1", 0, bundle(), Utc::now())).await.unwrap();
        let clients = Clients {
            agent: Arc::new(FakeAgentClient::default()),
            ci: Arc::new(FakeCiStatusClient::default()),
            git: Arc::new(FakeGitProviderClient::default()),
        };
        let outcome = poll_once("job-1", &clients, &store, &audit, &crate::reporter::SilentReporter, &PipelineOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Continue);
        assert_eq!(store.get("job-1").await.unwrap().unwrap().state, JobState::Running);
    }

    #[tokio::test]
    async fn pr_touching_protected_path_escalates_to_needs_human() {
        let (store, audit, _dir) = harness().await;
        let mut job = Job::new("job-1", 0, bundle(), Utc::now());
        job.state = JobState::Running;
        job.agent_session_id = Some("sess-1".to_string());
        store.try_insert(job).await.unwrap();

        let agent = FakeAgentClient::default();
        agent.set_status(
            "sess-1",
            AgentSessionStatus::PrOpened {
                pr_url: "https://git.example/pr/1".to_string(),
            },
        );
        let git = FakeGitProviderClient::default();
        git.set_files("https://git.example/pr/1", vec!["src/generated/client.rs".to_string()]);

        let clients = Clients {
            agent: Arc::new(agent),
            ci: Arc::new(FakeCiStatusClient::default()),
            git: Arc::new(git),
        };
        let outcome = poll_once("job-1", &clients, &store, &audit, &crate::reporter::SilentReporter, &PipelineOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Terminal(JobState::NeedsHuman));
    }

    #[tokio::test]
    async fn green_ci_reaches_terminal_green() {
        let (store, audit, _dir) = harness().await;
        let mut job = Job::new("job-1", 0, bundle(), Utc::now());
        job.state = JobState::PrOpened;
        job.pr_url = Some("https://git.example/pr/1".to_string());
        store.try_insert(job).await.unwrap();

        let ci = FakeCiStatusClient::default();
        ci.set_status("https://git.example/pr/1", CiStatus::Green);
        let clients = Clients {
            agent: Arc::new(FakeAgentClient::default()),
            ci: Arc::new(ci),
            git: Arc::new(FakeGitProviderClient::default()),
        };
        let outcome = poll_once("job-1", &clients, &store, &audit, &crate::reporter::SilentReporter, &PipelineOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Terminal(JobState::Green));
    }

    #[tokio::test]
    async fn red_ci_escalates_to_needs_human() {
        let (store, audit, _dir) = harness().await;
        let mut job = Job::new("job-1", 0, bundle(), Utc::now());
        job.state = JobState::PrOpened;
        job.pr_url = Some("https://git.example/pr/1".to_string());
        store.try_insert(job).await.unwrap();

        let ci = FakeCiStatusClient::default();
        ci.set_status("https://git.example/pr/1", CiStatus::Red);
        let clients = Clients {
            agent: Arc::new(FakeAgentClient::default()),
            ci: Arc::new(ci),
            git: Arc::new(FakeGitProviderClient::default()),
        };
        let outcome = poll_once("job-1", &clients, &store, &audit, &crate::reporter::SilentReporter, &PipelineOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Terminal(JobState::NeedsHuman));
        assert_eq!(store.get("job-1").await.unwrap().unwrap().state, JobState::NeedsHuman);
    }

    #[tokio::test]
    async fn five_consecutive_unknown_ci_polls_escalates() {
        let (store, audit, _dir) = harness().await;
        let mut job = Job::new("job-1", 0, bundle(), Utc::now());
        job.state = JobState::PrOpened;
        job.pr_url = Some("https://git.example/pr/1".to_string());
        job.consecutive_unknown_ci_polls = 4;
        store.try_insert(job).await.unwrap();

        // FakeCiStatusClient with no scripted status for this PR returns Unknown.
        let clients = Clients {
            agent: Arc::new(FakeAgentClient::default()),
            ci: Arc::new(FakeCiStatusClient::default()),
            git: Arc::new(FakeGitProviderClient::default()),
        };
        let options = PipelineOptions {
            max_consecutive_unknown_ci_polls: 5,
            ..PipelineOptions::default()
        };
        let outcome = poll_once("job-1", &clients, &store, &audit, &crate::reporter::SilentReporter, &options)
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Terminal(JobState::NeedsHuman));
    }
}
