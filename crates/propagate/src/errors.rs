use thiserror::Error;

use propagate_agent_client::AgentClientError;
use propagate_config::ConfigError;
use propagate_dispatcher::DispatchError;
use propagate_openapi::OpenApiError;
use propagate_servicemap::ServiceMapError;
use propagate_supervisor::SupervisorError;

use crate::conventions::ConventionsError;

/// The error taxonomy at the orchestration boundary: every failure mode a
/// pipeline run can surface, named after what a caller should do about it
/// rather than which crate raised it.
#[derive(Debug, Error)]
pub enum PropagateError {
    /// Missing or invalid configuration. Fatal at startup.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A contract document, service map, telemetry file, or repo-convention
    /// file was unreadable or malformed.
    #[error(transparent)]
    Input(#[from] InputError),
    /// An external call (agent platform, CI, git provider) failed in a way
    /// that's worth retrying.
    #[error(transparent)]
    TransientExternal(#[from] AgentClientError),
    /// A state-machine transition was attempted out of order, or a job's
    /// persisted state could not be loaded or saved.
    #[error(transparent)]
    StateMachineViolation(#[from] SupervisorError),
    /// Dispatch-level failure (duplicate handling, wave sequencing).
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    Contract(#[from] OpenApiError),
    #[error(transparent)]
    ServiceMap(#[from] ServiceMapError),
    #[error(transparent)]
    Conventions(#[from] ConventionsError),
    #[error("failed to read contract document at {path}: {source}")]
    ContractIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
