//! Retry/backoff policy. Domain-agnostic: nothing here knows about contracts,
//! bundles, or jobs, only about how long to wait before trying an external
//! call again.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How an error encountered while calling an external system should be
/// treated by the caller's retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Worth retrying: network blips, 5xx, rate limiting.
    Transient,
    /// Retrying will not help: 4xx other than rate limiting, malformed
    /// input, auth failure.
    Permanent,
    /// Unclear from the response alone; callers retry a bounded number of
    /// times before escalating.
    Ambiguous,
}

/// The backoff curve a `RetryPolicy` computes delays from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategyType {
    Exponential,
    Linear,
    Constant,
    Immediate,
}

/// A fully resolved retry policy for one kind of external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub strategy: RetryStrategyType,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
    pub jitter: bool,
}

impl RetryPolicy {
    pub const fn no_retry() -> Self {
        Self {
            strategy: RetryStrategyType::Immediate,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_attempts: 1,
            jitter: false,
        }
    }

    /// Default policy applied to `ErrorClass::Transient` failures: bounded
    /// exponential backoff with jitter, so concurrent sessions hitting the
    /// same transient outage don't retry in lockstep.
    pub const fn transient_default() -> Self {
        Self {
            strategy: RetryStrategyType::Exponential,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            max_attempts: 5,
            jitter: true,
        }
    }

    /// Default policy applied to `ErrorClass::Ambiguous` failures: a short,
    /// linear, small number of retries before the caller gives up and
    /// surfaces the error upward.
    pub const fn ambiguous_default() -> Self {
        Self {
            strategy: RetryStrategyType::Linear,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_attempts: 3,
            jitter: false,
        }
    }

    /// Picks a sensible default policy for an error class. Callers with a
    /// more specific policy (loaded from config) should prefer that instead.
    pub const fn for_error_class(class: ErrorClass) -> Self {
        match class {
            ErrorClass::Transient => Self::transient_default(),
            ErrorClass::Ambiguous => Self::ambiguous_default(),
            ErrorClass::Permanent => Self::no_retry(),
        }
    }

    /// The delay to wait before attempt number `attempt` (1-indexed: the
    /// delay before the *second* call is `calculate_delay(policy, 1)`).
    /// Returns `None` once `attempt >= max_attempts`, meaning the caller
    /// should give up.
    pub fn calculate_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let raw = match self.strategy {
            RetryStrategyType::Immediate => Duration::ZERO,
            RetryStrategyType::Constant => self.base_delay,
            RetryStrategyType::Linear => self.base_delay.saturating_mul(attempt.max(1)),
            RetryStrategyType::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.base_delay.saturating_mul(factor)
            }
        };
        let capped = raw.min(self.max_delay);
        Some(if self.jitter { apply_jitter(capped) } else { capped })
    }
}

/// Full jitter: scale the delay by a uniform random factor in `[0.5, 1.0]`
/// so it never reaches zero but still spreads out concurrent retriers.
fn apply_jitter(delay: Duration) -> Duration {
    let mut rng = rand::rng();
    let factor: f64 = rng.random_range(0.5..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * factor)
}
