use propagate_types::JobState;

/// How the supervisor reports progress to whatever is driving it. Mirrors
/// the teacher's injected `Reporter` trait: the supervisor never prints
/// directly, so it can run headless (CLI) or under test with a silent/
/// recording implementation.
pub trait Reporter: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn job_transitioned(&self, job_id: &str, from: Option<JobState>, to: JobState);
}

/// A `Reporter` that discards everything. Useful for library callers and
/// tests that don't care about progress output.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn job_transitioned(&self, _job_id: &str, _from: Option<JobState>, _to: JobState) {}
}
