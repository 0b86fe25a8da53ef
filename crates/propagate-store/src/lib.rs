//! Pluggable persistence. A `Store`-shaped set of JSON-file-per-table
//! backends for contract changes, impact sets, and jobs — generalizing the
//! teacher's `StateStore` trait pattern so a future SQL-backed store is a
//! drop-in replacement without committing this engine to a specific
//! database crate up front.

mod atomic;
mod job_store;

use thiserror::Error;

pub use job_store::{InsertOutcome, JobStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize value for {path}: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to deserialize value at {path}: {source}")]
    Deserialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no record found for id {0}")]
    NotFound(String),
    #[error("illegal state transition: {0}")]
    IllegalTransition(String),
}
