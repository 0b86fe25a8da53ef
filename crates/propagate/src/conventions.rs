use std::fs;
use std::path::Path;

use thiserror::Error;

use propagate_types::RepoConvention;

#[derive(Debug, Error)]
pub enum ConventionsError {
    #[error("failed to read repo conventions at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse repo conventions at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads the per-consumer repo conventions (candidate/protected globs) that
/// seed bundle construction. A plain JSON array on disk, the same shape as
/// `ServiceMap`/`TelemetryWindow`'s loaders.
pub fn load_repo_conventions(path: impl AsRef<Path>) -> Result<Vec<RepoConvention>, ConventionsError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConventionsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConventionsError::Parse {
        path: path.display().to_string(),
        source,
    })
}
