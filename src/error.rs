//! Error types used by the admission engine.
//!
//! This module defines one enum per fallible seam:
//!
//! - [`ConfigError`] — rejected construction-time configuration.
//! - [`ResolveError`] — a request was resolved more than once.
//! - [`SubmitError`] — the job runner refused a submission.
//! - [`JobError`] — an asynchronous job body failed.
//! - [`ClaimError`] — a claim fan-out failed (wraps the two causes above).
//!
//! Invariant violations found by the offline audit are **not** errors; they
//! are structured findings on [`AuditReport`](crate::AuditReport).

use thiserror::Error;

/// # Errors produced by configuration validation.
///
/// Raised by [`EngineConfig::validate`](crate::EngineConfig::validate) before
/// any worker accepts traffic. Every variant maps to one degenerate knob.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The team must hold at least one worker.
    #[error("team_size must be at least 1")]
    TeamSize,

    /// A zero-length job would make busyness unobservable.
    #[error("job_duration must be positive")]
    JobDuration,

    /// A zero quota would put every worker permanently on break.
    #[error("quota max_claims must be at least 1")]
    MaxClaims,

    /// A zero-length window makes the quota meaningless.
    #[error("quota window must be positive")]
    Window,
}

/// # Error produced by resolving a request twice.
///
/// A [`Request`](crate::Request) is a single-assignment slot: the second
/// resolution attempt is a programming-invariant violation and is surfaced
/// to the caller instead of silently overwriting the first outcome.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// The request already carries a resolved response.
    #[error("response already resolved")]
    DoubleResolution,
}

/// # Errors produced by job submission.
///
/// Returned by [`JobRunner::submit`](crate::JobRunner::submit) when a job
/// cannot be accepted. The claiming worker rolls its own state back, so a
/// refused submission never counts as a served claim.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Shutdown was signaled; the runner no longer accepts work.
    #[error("job runner is shutting down")]
    ShuttingDown,

    /// The runner refused the job for an implementation-specific reason.
    #[error("job submission rejected: {reason}")]
    Rejected {
        /// Human-readable refusal cause.
        reason: String,
    },
}

/// # Error produced by an asynchronous job body.
///
/// Recovered locally by the owning worker (the release guard still frees the
/// worker) and published to the event bus as
/// [`EventKind::JobFailed`](crate::EventKind::JobFailed); never escalated to
/// the claim's caller, since the claim already committed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The job body reported a failure.
    #[error("job execution failed: {reason}")]
    Failed {
        /// Human-readable failure cause.
        reason: String,
    },
}

/// # Errors produced by claim fan-out.
///
/// Returned by [`TeamManager::claim`](crate::TeamManager::claim). A plain
/// "no worker qualified" is `Ok(false)`, not an error; this enum covers the
/// two genuinely exceptional outcomes.
#[derive(Error, Debug)]
pub enum ClaimError {
    /// The request holder was already resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The job runner refused the submission.
    #[error(transparent)]
    Submit(#[from] SubmitError),
}
