//! Population Data Types
//!
//! The population lifecycle states and the retry policy that spaces attempts.

use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Lifecycle of the population engine.
///
/// `Populated` and `FailedTerminal` are final: once reached, no further fetches are issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PopulationState {
    /// Created, no fetch issued yet.
    Empty,
    /// A fetch is in flight. `attempt` is 1-based.
    Fetching { attempt: u32 },
    /// The store holds the upstream data.
    Populated { records: usize },
    /// The last attempt failed; another one follows after the wait interval.
    FailedRetry { attempt: u32, error: String },
    /// The attempt ceiling was reached. The store stays in its error state.
    FailedTerminal { attempts: u32, error: String },
}

impl fmt::Display for PopulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopulationState::Empty => write!(f, "empty"),
            PopulationState::Fetching { attempt } => write!(f, "fetching (attempt {attempt})"),
            PopulationState::Populated { records } => write!(f, "populated ({records} records)"),
            PopulationState::FailedRetry { attempt, .. } => {
                write!(f, "retrying (attempt {attempt} failed)")
            }
            PopulationState::FailedTerminal { attempts, .. } => {
                write!(f, "failed permanently after {attempts} attempts")
            }
        }
    }
}

/// How long to wait between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// Doubles from `initial` up to `max`, plus up to 10% random jitter.
    Exponential { initial: Duration, max: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub backoff: Backoff,
    /// Total number of attempts before giving up.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 12;

    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            backoff: Backoff::Fixed(interval),
            max_attempts,
        }
    }

    pub fn exponential(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            backoff: Backoff::Exponential { initial, max },
            max_attempts,
        }
    }

    /// Minimum spacing that accompanies the given (1-based) attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::Fixed(interval) => *interval,
            Backoff::Exponential { initial, max } => {
                let exponent = attempt.saturating_sub(1).min(16);
                let base = initial.saturating_mul(1u32 << exponent).min(*max);
                let jitter_ms = (base.as_millis() / 10) as u64;
                let jitter = if jitter_ms > 0 {
                    rand::thread_rng().gen_range(0..=jitter_ms)
                } else {
                    0
                };
                (base + Duration::from_millis(jitter)).min(*max)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Self::DEFAULT_INTERVAL, Self::DEFAULT_MAX_ATTEMPTS)
    }
}
