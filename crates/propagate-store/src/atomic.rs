use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::StoreError;

/// Write `value` to `path` atomically: serialize to a sibling `.tmp` file,
/// `fsync` it, then rename over the destination. A reader never observes a
/// half-written file, matching the teacher's state-file persistence
/// pattern.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("tmp");
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialize {
        path: path.display().to_string(),
        source,
    })?;
    let file = fs::File::create(&tmp_path).map_err(|source| StoreError::Io {
        path: tmp_path.display().to_string(),
        source,
    })?;
    {
        use std::io::Write;
        let mut file = file;
        file.write_all(&bytes).map_err(|source| StoreError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
        file.sync_all().map_err(|source| StoreError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
    }
    fs::rename(&tmp_path, path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Read and deserialize `path`, or return `T::default()` if it doesn't
/// exist yet (the first write to a fresh store directory).
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Deserialize {
            path: path.display().to_string(),
            source,
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(source) => Err(StoreError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}
