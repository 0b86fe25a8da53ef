pub mod guardrails;
pub mod poll;
pub mod reporter;
pub mod transitions;

pub use guardrails::{ci_guardrail, protected_path_guardrail, GuardrailTrip};
pub use poll::{poll_once, Clients, StepOutcome};
pub use reporter::{Reporter, SilentReporter};
pub use transitions::{transition, SupervisorError};
