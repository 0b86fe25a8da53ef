use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use propagate_types::Bundle;

use crate::traits::{AgentClient, AgentClientError, CiStatusClient, GitProviderClient};
use crate::types::{AgentSessionStatus, CiStatus};

/// An in-memory `AgentClient` for tests: scripts a fixed status per session
/// id and records every `start_session` call so tests can assert on
/// idempotency-key reuse.
#[derive(Default)]
pub struct FakeAgentClient {
    pub next_session_id: Mutex<u64>,
    pub started: Mutex<Vec<(String, String)>>,
    pub statuses: Mutex<HashMap<String, AgentSessionStatus>>,
}

impl FakeAgentClient {
    pub fn set_status(&self, session_id: &str, status: AgentSessionStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(session_id.to_string(), status);
    }
}

#[async_trait]
impl AgentClient for FakeAgentClient {
    async fn start_session(
        &self,
        bundle: &Bundle,
        idempotency_key: &str,
    ) -> Result<String, AgentClientError> {
        let mut counter = self.next_session_id.lock().unwrap();
        *counter += 1;
        let session_id = format!("fake-session-{counter}");
        self.started
            .lock()
            .unwrap()
            .push((bundle.fingerprint.clone(), idempotency_key.to_string()));
        self.statuses
            .lock()
            .unwrap()
            .insert(session_id.clone(), AgentSessionStatus::Running);
        Ok(session_id)
    }

    async fn session_status(&self, session_id: &str) -> Result<AgentSessionStatus, AgentClientError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or(AgentSessionStatus::Running))
    }
}

/// An in-memory `CiStatusClient` returning a scripted status per PR url.
#[derive(Default)]
pub struct FakeCiStatusClient {
    pub statuses: Mutex<HashMap<String, CiStatus>>,
}

impl FakeCiStatusClient {
    pub fn set_status(&self, pr_url: &str, status: CiStatus) {
        self.statuses.lock().unwrap().insert(pr_url.to_string(), status);
    }
}

#[async_trait]
impl CiStatusClient for FakeCiStatusClient {
    async fn ci_status(&self, pr_url: &str) -> Result<CiStatus, AgentClientError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(pr_url)
            .copied()
            .unwrap_or(CiStatus::Unknown))
    }
}

/// An in-memory `GitProviderClient` returning a scripted file list per PR.
#[derive(Default)]
pub struct FakeGitProviderClient {
    pub files: Mutex<HashMap<String, Vec<String>>>,
}

impl FakeGitProviderClient {
    pub fn set_files(&self, pr_url: &str, files: Vec<String>) {
        self.files.lock().unwrap().insert(pr_url.to_string(), files);
    }
}

#[async_trait]
impl GitProviderClient for FakeGitProviderClient {
    async fn changed_files(&self, pr_url: &str) -> Result<Vec<String>, AgentClientError> {
        Ok(self.files.lock().unwrap().get(pr_url).cloned().unwrap_or_default())
    }
}
