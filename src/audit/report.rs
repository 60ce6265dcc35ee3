//! # Audit findings.
//!
//! Structured results produced by [`Audit::run`](crate::audit::Audit::run).
//! Violations carry enough context (worker, timestamps, measured span) to be
//! asserted on in tests or logged by a caller; none of them is an error
//! type.

use std::sync::Arc;

use crate::request::EpochMillis;

/// Two claims (or a claim and a positive probe) overlapped on one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapViolation {
    /// Worker that served both events.
    pub worker: Arc<str>,
    /// When the earlier claim started.
    pub prev_claim_at: EpochMillis,
    /// When the conflicting event was served.
    pub at: EpochMillis,
    /// Observed gap (less than the job duration).
    pub gap: u64,
}

/// More than `max_claims` claims landed on one worker within one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaViolation {
    /// Worker that exceeded its quota.
    pub worker: Arc<str>,
    /// First claim of the offending span.
    pub window_start: EpochMillis,
    /// Last claim of the offending span.
    pub window_end: EpochMillis,
    /// Observed span (less than the window length).
    pub span: u64,
}

/// Missed-service estimate for one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerMisses {
    /// Worker the estimate applies to.
    pub worker: Arc<str>,
    /// Rejections that an ideally efficient scheduler would have served.
    pub missed: usize,
    /// Average excess idle-to-busy latency behind those misses.
    pub avg_excess_wait_ms: u64,
}

/// Aggregated missed-service estimate across the team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissedServiceSummary {
    /// Per-worker estimates, in worker-identity order.
    pub per_worker: Vec<WorkerMisses>,
    /// Total avoidable misses across the team.
    pub total_missed: usize,
    /// Average excess latency across all misses.
    pub avg_excess_wait_ms: u64,
}

/// Complete audit output for one batch of responses.
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    /// Double-booking findings (hard failures; expected empty).
    pub double_bookings: Vec<OverlapViolation>,
    /// Quota-breach findings (hard failures; expected empty).
    pub quota_breaches: Vec<QuotaViolation>,
    /// Avoidable rejected claims.
    pub missed_claims: MissedServiceSummary,
    /// Avoidable rejected probes.
    pub missed_probes: MissedServiceSummary,
}

impl AuditReport {
    /// True iff no worker served overlapping events.
    pub fn no_double_booking(&self) -> bool {
        self.double_bookings.is_empty()
    }

    /// True iff every worker stayed within its quota.
    pub fn quota_respected(&self) -> bool {
        self.quota_breaches.is_empty()
    }

    /// True iff both safety properties hold.
    ///
    /// Missed-service numbers are diagnostics and never fail an audit.
    pub fn passed(&self) -> bool {
        self.no_double_booking() && self.quota_respected()
    }
}
