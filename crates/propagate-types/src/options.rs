use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::{deserialize_duration, serialize_duration};

/// Every runtime knob for a single pipeline run, collected into one explicit
/// record rather than threaded as a dynamic parameter bag (§9 redesign note).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub dry_run: bool,
    pub max_concurrent_sessions: usize,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub poll_interval: Duration,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub session_timeout: Duration,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub telemetry_lookback: Duration,
    pub max_consecutive_unknown_ci_polls: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_concurrent_sessions: 4,
            poll_interval: Duration::from_secs(30),
            session_timeout: Duration::from_secs(60 * 60),
            telemetry_lookback: Duration::from_secs(60 * 60 * 24 * 7),
            max_consecutive_unknown_ci_polls: 5,
        }
    }
}
