//! Traits for the three external systems the supervisor talks to — the
//! agent platform, CI, and the git provider — plus `reqwest`-backed
//! implementations and in-memory fakes for tests.

mod fakes;
mod http;
mod traits;
mod types;

pub use fakes::{FakeAgentClient, FakeCiStatusClient, FakeGitProviderClient};
pub use http::{HttpAgentClient, HttpCiStatusClient, HttpGitProviderClient};
pub use traits::{AgentClient, AgentClientError, CiStatusClient, GitProviderClient};
pub use types::{AgentSessionStatus, CiStatus};
