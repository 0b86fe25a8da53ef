use serde::{Deserialize, Serialize};

use crate::change::ChangeSet;
use crate::impact::Impact;

/// Per-consumer repo conventions needed to derive candidate affected paths
/// and protected paths. Supplied externally (§6), one per consumer service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConvention {
    pub consumer_service: String,
    pub repo: String,
    pub client_globs: Vec<String>,
    pub schema_mirror_globs: Vec<String>,
    pub fixture_globs: Vec<String>,
    pub test_globs: Vec<String>,
    pub protected_globs: Vec<String>,
}

impl RepoConvention {
    /// Union of every glob category a remediation agent is allowed to
    /// propose touching as a starting point; the agent may still discover
    /// more files, but this seeds the prompt.
    pub fn candidate_globs(&self) -> Vec<&str> {
        self.client_globs
            .iter()
            .chain(self.schema_mirror_globs.iter())
            .chain(self.fixture_globs.iter())
            .chain(self.test_globs.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Forward-compatible tag distinguishing what kind of remediation a bundle
/// represents. Today only `BreakingContractChange` is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationKind {
    BreakingContractChange,
}

impl Default for RemediationKind {
    fn default() -> Self {
        RemediationKind::BreakingContractChange
    }
}

/// Everything a remediation agent session needs to act on one consumer's
/// exposure to one producer's contract change. The unit of work dispatched
/// to an agent and tracked through to a terminal job outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub kind: RemediationKind,
    pub consumer_service: String,
    pub consumer_repo: String,
    pub producer_service: String,
    pub change_set: ChangeSet,
    pub impacts: Vec<Impact>,
    pub candidate_paths: Vec<String>,
    pub protected_paths: Vec<String>,
    /// Stable, permutation- and version-independent identity for this bundle.
    /// See `propagate_bundle::fingerprint` for how it is computed.
    pub fingerprint: String,
}

impl Bundle {
    pub fn wave_key(&self) -> &str {
        &self.consumer_service
    }
}
