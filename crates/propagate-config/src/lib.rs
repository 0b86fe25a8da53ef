//! Loads `.propagate.toml` merged with `PROPAGATE_*` environment variables
//! into a `PipelineConfig`, following the teacher's `config.rs` precedence:
//! defaults < file < environment. Unknown keys in the file are rejected at
//! startup via `#[serde(deny_unknown_fields)]`, surfacing as `ConfigError`
//! (CLI exit code 10) rather than being silently ignored.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use propagate_types::PipelineOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {field}: {detail}")]
    InvalidValue { field: String, detail: String },
    #[error("required setting `{0}` is missing from both the config file and the environment")]
    Missing(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    dry_run: Option<bool>,
    max_concurrent_sessions: Option<usize>,
    poll_interval: Option<String>,
    session_timeout: Option<String>,
    telemetry_lookback: Option<String>,
    max_consecutive_unknown_ci_polls: Option<u32>,
    service_map_path: Option<String>,
    telemetry_path: Option<String>,
    repo_conventions_path: Option<String>,
    store_dir: Option<String>,
    audit_log_path: Option<String>,
    agent_platform_base_url: Option<String>,
}

/// Every setting the pipeline needs to run, fully resolved from file + env
/// + built-in defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub options: PipelineOptions,
    pub service_map_path: PathBuf,
    pub telemetry_path: PathBuf,
    pub repo_conventions_path: PathBuf,
    pub store_dir: PathBuf,
    pub audit_log_path: PathBuf,
    pub agent_platform_base_url: String,
}

/// Load config from `path` (if it exists) layered with `PROPAGATE_*`
/// environment variables, which take precedence over the file.
pub fn load(path: impl AsRef<Path>) -> Result<PipelineConfig, ConfigError> {
    load_from(path.as_ref(), &EnvReader)
}

trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

struct EnvReader;

impl EnvSource for EnvReader {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

fn load_from(path: &Path, env: &dyn EnvSource) -> Result<PipelineConfig, ConfigError> {
    let file = read_file_config(path)?;
    let defaults = PipelineOptions::default();

    let dry_run = env_bool(env, "PROPAGATE_DRY_RUN")?
        .or(file.dry_run)
        .unwrap_or(defaults.dry_run);
    let max_concurrent_sessions = env_parsed(env, "PROPAGATE_MAX_CONCURRENT_SESSIONS")?
        .or(file.max_concurrent_sessions)
        .unwrap_or(defaults.max_concurrent_sessions);
    let poll_interval = env_duration(env, "PROPAGATE_POLL_INTERVAL")?
        .or(parse_duration_field("poll_interval", file.poll_interval.as_deref())?)
        .unwrap_or(defaults.poll_interval);
    let session_timeout = env_duration(env, "PROPAGATE_SESSION_TIMEOUT")?
        .or(parse_duration_field("session_timeout", file.session_timeout.as_deref())?)
        .unwrap_or(defaults.session_timeout);
    let telemetry_lookback = env_duration(env, "PROPAGATE_TELEMETRY_LOOKBACK")?
        .or(parse_duration_field("telemetry_lookback", file.telemetry_lookback.as_deref())?)
        .unwrap_or(defaults.telemetry_lookback);
    let max_consecutive_unknown_ci_polls = env_parsed(env, "PROPAGATE_MAX_CONSECUTIVE_UNKNOWN_CI_POLLS")?
        .or(file.max_consecutive_unknown_ci_polls)
        .unwrap_or(defaults.max_consecutive_unknown_ci_polls);

    let service_map_path = required_path(env, "PROPAGATE_SERVICE_MAP_PATH", file.service_map_path, "service_map_path")?;
    let telemetry_path = required_path(env, "PROPAGATE_TELEMETRY_PATH", file.telemetry_path, "telemetry_path")?;
    let repo_conventions_path = required_path(
        env,
        "PROPAGATE_REPO_CONVENTIONS_PATH",
        file.repo_conventions_path,
        "repo_conventions_path",
    )?;
    let store_dir = required_path(env, "PROPAGATE_STORE_DIR", file.store_dir, "store_dir")?;
    let audit_log_path = required_path(env, "PROPAGATE_AUDIT_LOG_PATH", file.audit_log_path, "audit_log_path")?;
    let agent_platform_base_url = env
        .var("PROPAGATE_AGENT_PLATFORM_BASE_URL")
        .or(file.agent_platform_base_url)
        .ok_or_else(|| ConfigError::Missing("agent_platform_base_url".to_string()))?;

    Ok(PipelineConfig {
        options: PipelineOptions {
            dry_run,
            max_concurrent_sessions,
            poll_interval,
            session_timeout,
            telemetry_lookback,
            max_consecutive_unknown_ci_polls,
        },
        service_map_path,
        telemetry_path,
        repo_conventions_path,
        store_dir,
        audit_log_path,
        agent_platform_base_url,
    })
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(source) => Err(ConfigError::Read {
            path: path.display().to_string(),
            source,
        }),
    }
}

fn env_bool(env: &dyn EnvSource, key: &str) -> Result<Option<bool>, ConfigError> {
    match env.var(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<bool>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                field: key.to_string(),
                detail: format!("`{raw}` is not a valid boolean"),
            }),
    }
}

fn env_parsed<T: std::str::FromStr>(env: &dyn EnvSource, key: &str) -> Result<Option<T>, ConfigError> {
    match env.var(key) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| ConfigError::InvalidValue {
            field: key.to_string(),
            detail: format!("`{raw}` could not be parsed"),
        }),
    }
}

fn env_duration(env: &dyn EnvSource, key: &str) -> Result<Option<Duration>, ConfigError> {
    match env.var(key) {
        None => Ok(None),
        Some(raw) => humantime::parse_duration(&raw)
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field: key.to_string(),
                detail: e.to_string(),
            }),
    }
}

fn parse_duration_field(field: &str, raw: Option<&str>) -> Result<Option<Duration>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(raw) => humantime::parse_duration(raw)
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field: field.to_string(),
                detail: e.to_string(),
            }),
    }
}

fn required_path(
    env: &dyn EnvSource,
    env_key: &str,
    file_value: Option<String>,
    field: &str,
) -> Result<PathBuf, ConfigError> {
    env.var(env_key)
        .or(file_value)
        .map(PathBuf::from)
        .ok_or_else(|| ConfigError::Missing(field.to_string()))
}
