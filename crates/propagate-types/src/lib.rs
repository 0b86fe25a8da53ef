//! Domain types shared across the contract propagation engine: the result
//! of diffing two contract versions, the impact and bundling records built
//! from that diff, and the job/audit types the supervisor drives to a
//! terminal outcome.
//!
//! This crate has no I/O and no async dependency; every type here is plain
//! data, constructed and consumed by the crates that do have opinions about
//! how it is produced or persisted.

pub mod bundle;
pub mod change;
pub mod duration;
pub mod impact;
pub mod job;
pub mod options;

pub use bundle::{Bundle, RemediationKind, RepoConvention};
pub use change::{
    ChangeEntry, ChangeKind, ChangeLocation, ChangeSet, ClassifiedChange, Method, Severity,
};
pub use impact::{Confidence, Impact, ServiceEdge, TelemetrySample};
pub use job::{AuditEntry, Job, JobState};
pub use options::PipelineOptions;
