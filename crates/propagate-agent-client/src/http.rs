use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use propagate_types::Bundle;

use crate::traits::{AgentClient, AgentClientError, CiStatusClient, GitProviderClient};
use crate::types::{AgentSessionStatus, CiStatus};

/// Shared construction helper: a `rustls`-backed client with a fixed
/// user-agent, matching `registry::RegistryClient`'s
/// `Client::builder().user_agent(...)` convention.
fn build_client() -> Client {
    Client::builder()
        .user_agent(concat!("propagate/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("reqwest client with rustls backend is always constructible")
}

pub struct HttpAgentClient {
    client: Client,
    base_url: String,
}

impl HttpAgentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct StartSessionResponse {
    session_id: String,
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn start_session(
        &self,
        bundle: &Bundle,
        idempotency_key: &str,
    ) -> Result<String, AgentClientError> {
        let endpoint = format!("{}/sessions", self.base_url);
        let response = self
            .client
            .post(&endpoint)
            .header("Idempotency-Key", idempotency_key)
            .json(bundle)
            .send()
            .await
            .map_err(|e| transient(&endpoint, e))?;
        if !response.status().is_success() {
            return Err(classify_status(&endpoint, response.status()));
        }
        response
            .json::<StartSessionResponse>()
            .await
            .map(|body| body.session_id)
            .map_err(|e| transient(&endpoint, e))
    }

    async fn session_status(&self, session_id: &str) -> Result<AgentSessionStatus, AgentClientError> {
        let endpoint = format!("{}/sessions/{session_id}", self.base_url);
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| transient(&endpoint, e))?;
        if !response.status().is_success() {
            return Err(classify_status(&endpoint, response.status()));
        }
        response
            .json::<AgentSessionStatus>()
            .await
            .map_err(|e| transient(&endpoint, e))
    }
}

pub struct HttpCiStatusClient {
    client: Client,
}

impl Default for HttpCiStatusClient {
    fn default() -> Self {
        Self { client: build_client() }
    }
}

#[derive(Deserialize)]
struct CiStatusResponse {
    status: CiStatus,
}

#[async_trait]
impl CiStatusClient for HttpCiStatusClient {
    async fn ci_status(&self, pr_url: &str) -> Result<CiStatus, AgentClientError> {
        let endpoint = format!("{pr_url}/status");
        let response = match self.client.get(&endpoint).send().await {
            Ok(r) => r,
            Err(_) => return Ok(CiStatus::Unknown),
        };
        if !response.status().is_success() {
            return Ok(CiStatus::Unknown);
        }
        match response.json::<CiStatusResponse>().await {
            Ok(body) => Ok(body.status),
            Err(_) => Ok(CiStatus::Unknown),
        }
    }
}

pub struct HttpGitProviderClient {
    client: Client,
}

impl Default for HttpGitProviderClient {
    fn default() -> Self {
        Self { client: build_client() }
    }
}

#[derive(Deserialize)]
struct ChangedFilesResponse {
    files: Vec<String>,
}

#[async_trait]
impl GitProviderClient for HttpGitProviderClient {
    async fn changed_files(&self, pr_url: &str) -> Result<Vec<String>, AgentClientError> {
        let endpoint = format!("{pr_url}/files");
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| transient(&endpoint, e))?;
        if !response.status().is_success() {
            return Err(classify_status(&endpoint, response.status()));
        }
        response
            .json::<ChangedFilesResponse>()
            .await
            .map(|body| body.files)
            .map_err(|e| transient(&endpoint, e))
    }
}

fn transient(endpoint: &str, error: reqwest::Error) -> AgentClientError {
    AgentClientError::Transient {
        endpoint: endpoint.to_string(),
        detail: error.to_string(),
    }
}

fn classify_status(endpoint: &str, status: reqwest::StatusCode) -> AgentClientError {
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        AgentClientError::Transient {
            endpoint: endpoint.to_string(),
            detail: format!("http {status}"),
        }
    } else {
        AgentClientError::Permanent {
            endpoint: endpoint.to_string(),
            detail: format!("http {status}"),
        }
    }
}
