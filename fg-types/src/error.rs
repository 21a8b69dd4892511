use serde::{Deserialize, Serialize};

/// Error-kind taxonomy from spec.md §7. Concrete error types in other crates
/// implement `Classify` so orchestration code (`fg-operator`) can dispatch on
/// kind without downcasting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Abort the FP instance; manager logs and may abort the process.
    Unrecoverable,
    /// Swallow, count, continue.
    Expected,
    /// Bounded retry with backoff; escalates to `Unrecoverable` after
    /// `max_attempts` consecutive failures.
    Retryable,
    /// Loops go quiescent until status changes.
    Jailed,
    /// Refuse to start.
    Configuration,
}

pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

/// A critical error reported upward from an FP instance to the manager (C7),
/// carried over the single critical-error channel described in spec.md §7.
#[derive(Clone, Debug)]
pub struct CriticalError {
    pub fp_pk: crate::fp::FpPubKey,
    pub message: String,
}

impl std::fmt::Display for CriticalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "critical error for {}: {}", self.fp_pk, self.message)
    }
}
