use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use propagate_types::Job;

use crate::atomic::{atomic_write_json, read_json_or_default};
use crate::StoreError;

/// Outcome of a fingerprint-keyed insert attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A job with this fingerprint already exists; dispatch is skipped and
    /// the existing job id is returned so the caller can log which job
    /// absorbed this duplicate.
    AlreadyExists(String),
}

/// Job persistence: a JSON-file-per-table backend storing the job table and
/// a fingerprint -> job_id index for idempotent dispatch, generalizing the
/// teacher's single-file lock (`check-then-create, bail if held`) to a
/// table keyed by fingerprint instead of one global lock file.
///
/// Mutation of a given `job_id` is serialized through a per-job
/// `tokio::sync::Mutex`, the async analogue of a `job_id`-keyed
/// `Arc<Mutex<..>>` map — concurrent jobs never block each other, but two
/// concurrent transitions on the same job always serialize.
pub struct JobStore {
    jobs_path: PathBuf,
    fingerprints_path: PathBuf,
    job_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl JobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            jobs_path: dir.join("jobs.json"),
            fingerprints_path: dir.join("fingerprints.json"),
            job_locks: Mutex::new(HashMap::new()),
        })
    }

    async fn lock_for(&self, job_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.job_locks.lock().await;
        locks
            .entry(job_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn load_jobs(&self) -> Result<BTreeMap<String, Job>, StoreError> {
        read_json_or_default(&self.jobs_path)
    }

    fn save_jobs(&self, jobs: &BTreeMap<String, Job>) -> Result<(), StoreError> {
        atomic_write_json(&self.jobs_path, jobs)
    }

    fn load_fingerprints(&self) -> Result<BTreeMap<String, String>, StoreError> {
        read_json_or_default(&self.fingerprints_path)
    }

    fn save_fingerprints(&self, index: &BTreeMap<String, String>) -> Result<(), StoreError> {
        atomic_write_json(&self.fingerprints_path, index)
    }

    /// Insert `job` if no job with the same fingerprint already exists.
    /// This is the idempotency gate from spec.md §4.6 step 1: a duplicate
    /// dispatch attempt for a bundle already in flight is a no-op.
    pub async fn try_insert(&self, job: Job) -> Result<InsertOutcome, StoreError> {
        let guard = self.lock_for(&job.job_id).await;
        let _permit = guard.lock().await;

        let mut fingerprints = self.load_fingerprints()?;
        if let Some(existing) = fingerprints.get(&job.fingerprint) {
            return Ok(InsertOutcome::AlreadyExists(existing.clone()));
        }
        fingerprints.insert(job.fingerprint.clone(), job.job_id.clone());
        self.save_fingerprints(&fingerprints)?;

        let mut jobs = self.load_jobs()?;
        jobs.insert(job.job_id.clone(), job);
        self.save_jobs(&jobs)?;
        Ok(InsertOutcome::Inserted)
    }

    pub async fn get(&self, job_id: &str) -> Result<Option<Job>, StoreError> {
        let guard = self.lock_for(job_id).await;
        let _permit = guard.lock().await;
        Ok(self.load_jobs()?.get(job_id).cloned())
    }

    pub async fn all(&self) -> Result<Vec<Job>, StoreError> {
        Ok(self.load_jobs()?.into_values().collect())
    }

    /// Read-modify-write a single job under its per-job lock. `f` returns an
    /// error to veto the write (e.g. an illegal state transition); on error
    /// nothing is persisted.
    pub async fn update<F>(&self, job_id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Job) -> Result<(), StoreError>,
    {
        let guard = self.lock_for(job_id).await;
        let _permit = guard.lock().await;

        let mut jobs = self.load_jobs()?;
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;
        f(job)?;
        self.save_jobs(&jobs)?;
        Ok(())
    }
}
