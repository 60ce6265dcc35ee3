//! # Offline invariant audit.
//!
//! Pure, single-threaded analysis over a finalized batch of resolved
//! [`Response`](crate::Response)s. The audit answers three questions about a
//! completed run:
//!
//! - **No double-booking** — did any worker serve two overlapping claims
//!   (or positively acknowledge a probe while busy)? A violation is a
//!   correctness bug in the claim path, never expected to occur.
//! - **Quota respected** — did any worker exceed its claims-per-window
//!   quota? A violation means the break policy was bypassed.
//! - **Missed service** (diagnostic, not a correctness check) — how many
//!   rejections happened while a worker was neither genuinely busy nor
//!   genuinely on break? This quantifies scheduling slack (queueing,
//!   context switches) separately from policy violations.
//!
//! ## Flow
//! ```text
//! Vec<Response> ──► group by served_by, sort by time
//!                        │
//!                        ├─► overlap scan    ──► Vec<OverlapViolation>
//!                        ├─► quota-span scan ──► Vec<QuotaViolation>
//!                        └─► sliding-window replay over claims + rejections
//!                                            ──► MissedServiceSummary × 2
//!                                                (claims, probes)
//! ```
//!
//! Findings are data, not errors: the audit never fails. Callers assert on
//! [`AuditReport::no_double_booking`], [`AuditReport::quota_respected`], or
//! [`AuditReport::passed`].

mod checks;
mod report;

pub use checks::Audit;
pub use report::{
    AuditReport, MissedServiceSummary, OverlapViolation, QuotaViolation, WorkerMisses,
};
