use propagate_supervisor::Reporter;
use propagate_types::JobState;

/// Prints progress to stdout/stderr. The supervisor and dispatcher never
/// print directly; this is the only place in the binary that does.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn job_transitioned(&self, job_id: &str, from: Option<JobState>, to: JobState) {
        match from {
            Some(from) => println!("{job_id}: {from} -> {to}"),
            None => println!("{job_id}: -> {to}"),
        }
    }
}
