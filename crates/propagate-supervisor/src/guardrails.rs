use globset::{Glob, GlobSetBuilder};

use propagate_agent_client::CiStatus;

/// Why a job was force-transitioned to `needs_human` by a guardrail rather
/// than by the ordinary state machine flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardrailTrip {
    ProtectedPathTouched(String),
    ChangedFilesUnknown,
    TooManyConsecutiveUnknownCiPolls(u32),
}

impl std::fmt::Display for GuardrailTrip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardrailTrip::ProtectedPathTouched(path) => {
                write!(f, "PR touches protected path `{path}`")
            }
            GuardrailTrip::ChangedFilesUnknown => {
                write!(f, "changed files could not be determined; failing closed")
            }
            GuardrailTrip::TooManyConsecutiveUnknownCiPolls(n) => {
                write!(f, "{n} consecutive unknown CI polls")
            }
        }
    }
}

/// Checks whether a PR's changed files stay within bounds. Fails closed:
/// `None` (changed files couldn't be determined, e.g. the git provider call
/// failed) trips the guardrail exactly like an actual protected-path hit,
/// per spec.md §4.7.
pub fn protected_path_guardrail(
    changed_files: Option<&[String]>,
    protected_globs: &[String],
) -> Result<(), GuardrailTrip> {
    let Some(changed_files) = changed_files else {
        return Err(GuardrailTrip::ChangedFilesUnknown);
    };

    let mut builder = GlobSetBuilder::new();
    for pattern in protected_globs {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    let Ok(set) = builder.build() else {
        // A malformed glob set can't be evaluated; fail closed rather than
        // silently treating every file as unprotected.
        return Err(GuardrailTrip::ChangedFilesUnknown);
    };

    for file in changed_files {
        if set.is_match(file) {
            return Err(GuardrailTrip::ProtectedPathTouched(file.clone()));
        }
    }
    Ok(())
}

/// Tracks the CI-gating guardrail: too many consecutive unpollable CI
/// statuses escalates to a human rather than polling forever. Returns the
/// updated consecutive-unknown counter and, if it trips, the reason.
pub fn ci_guardrail(
    status: CiStatus,
    consecutive_unknown_polls: u32,
    max_consecutive_unknown_polls: u32,
) -> (u32, Option<GuardrailTrip>) {
    let next_count = match status {
        CiStatus::Unknown => consecutive_unknown_polls + 1,
        _ => 0,
    };
    if next_count >= max_consecutive_unknown_polls {
        (next_count, Some(GuardrailTrip::TooManyConsecutiveUnknownCiPolls(next_count)))
    } else {
        (next_count, None)
    }
}
