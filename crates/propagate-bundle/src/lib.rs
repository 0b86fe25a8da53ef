//! Builds the per-consumer `Bundle` a remediation agent acts on, and the
//! stable fingerprint that keys idempotency and audit trails for it.

mod builder;
mod fingerprint;

pub use builder::build_bundle;
pub use fingerprint::fingerprint;
