//! Append-only JSONL audit trail of every job state transition. Every
//! transition the supervisor makes is appended here before it is considered
//! durable — this log is the system's durable event trail, standing in for
//! a dedicated metrics/event pipeline.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use propagate_types::AuditEntry;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to open audit log at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to append to audit log at {path}: {source}")]
    Append {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read audit log at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt audit log entry at {path}:{line}: {source}")]
    Corrupt {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// An append-only log of `AuditEntry` records, one JSON object per line.
/// Every append is flushed and `fsync`'d before returning, so a transition
/// is never acknowledged to a caller until it is durable on disk.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| AuditError::Open {
                path: self.path.display().to_string(),
                source,
            })?;

        let mut line = serde_json::to_string(entry).expect("AuditEntry is always serializable");
        line.push('\n');
        file.write_all(line.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|source| AuditError::Append {
                path: self.path.display().to_string(),
                source,
            })?;
        tracing::debug!(job_id = %entry.job_id, to = %entry.to_state, "audit entry appended");
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<AuditEntry>, AuditError> {
        read_entries(&self.path)
    }

    pub fn entries_for_job(&self, job_id: &str) -> Result<Vec<AuditEntry>, AuditError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| e.job_id == job_id)
            .collect())
    }
}

fn read_entries(path: &Path) -> Result<Vec<AuditEntry>, AuditError> {
    let file = match OpenOptions::new().read(true).open(path) {
        Ok(file) => file,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(AuditError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| AuditError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: AuditEntry =
            serde_json::from_str(&line).map_err(|source| AuditError::Corrupt {
                path: path.display().to_string(),
                line: line_no + 1,
                source,
            })?;
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use propagate_types::JobState;

    #[test]
    fn appended_entries_are_readable_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("audit.jsonl"));
        let first = AuditEntry::transition("job-1", None, JobState::Queued, "created", Utc::now());
        let second =
            AuditEntry::transition("job-1", Some(JobState::Queued), JobState::Running, "dispatched", Utc::now());
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].to_state, JobState::Queued);
        assert_eq!(entries[1].to_state, JobState::Running);
    }

    #[test]
    fn missing_log_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("missing.jsonl"));
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn entries_for_job_filters_by_job_id() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("audit.jsonl"));
        log.append(&AuditEntry::transition("job-1", None, JobState::Queued, "a", Utc::now()))
            .unwrap();
        log.append(&AuditEntry::transition("job-2", None, JobState::Queued, "b", Utc::now()))
            .unwrap();
        let entries = log.entries_for_job("job-1").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].job_id, "job-1");
    }
}
