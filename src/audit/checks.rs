//! # Audit implementation.
//!
//! All three analyses walk per-worker timelines rebuilt from the response
//! batch: responses are grouped by `served_by` and sorted by timestamp,
//! which reconstructs each worker's serialized claim order (claims are
//! serialized per worker by construction).
//!
//! Rejections carry no worker attribution — the whole team refused them —
//! so the missed-service replay merges the full rejected set into every
//! worker's timeline, asking for each worker "could *this* worker have
//! served it?".

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::policies::QuotaPolicy;
use crate::request::{EpochMillis, OutcomeKind, Response};

use super::report::{
    AuditReport, MissedServiceSummary, OverlapViolation, QuotaViolation, WorkerMisses,
};

/// Offline invariant checker for a finalized batch of responses.
///
/// Construct once from the engine configuration the batch ran under, then
/// [`run`](Audit::run) any number of batches.
#[derive(Debug, Clone)]
pub struct Audit {
    job_duration_ms: u64,
    max_claims: usize,
    window_ms: u64,
}

impl Audit {
    /// Builds a checker from the configuration the responses were produced
    /// under.
    pub fn new(cfg: &EngineConfig) -> Self {
        Self::from_parts(cfg.job_duration, cfg.quota)
    }

    /// Builds a checker from the two parameters the analyses need.
    pub fn from_parts(job_duration: Duration, quota: QuotaPolicy) -> Self {
        Self {
            job_duration_ms: job_duration.as_millis().min(u128::from(u64::MAX)) as u64,
            max_claims: quota.max_claims,
            window_ms: quota.window_millis(),
        }
    }

    /// Runs all analyses over one batch.
    pub fn run(&self, responses: &[Response]) -> AuditReport {
        AuditReport {
            double_bookings: self.check_overlaps(responses),
            quota_breaches: self.check_quota(responses),
            missed_claims: self.estimate_missed(responses, OutcomeKind::ClaimRejected),
            missed_probes: self.estimate_missed(responses, OutcomeKind::ProbeRejected),
        }
    }

    /// No-double-booking property.
    ///
    /// For each worker's time-sorted `Claimed`/`ProbeAccepted` events, the
    /// time since the worker's previous `Claimed` event must be at least the
    /// job duration. The first claim has no predecessor and cannot violate.
    fn check_overlaps(&self, responses: &[Response]) -> Vec<OverlapViolation> {
        let mut violations = Vec::new();
        let attended = group_by_worker(responses, |r| {
            matches!(r.kind, OutcomeKind::Claimed | OutcomeKind::ProbeAccepted)
        });

        for (worker, events) in attended {
            let mut last_claim: Option<EpochMillis> = None;
            for resp in events {
                if let Some(prev) = last_claim {
                    let gap = resp.at.saturating_sub(prev);
                    if gap < self.job_duration_ms {
                        violations.push(OverlapViolation {
                            worker: Arc::clone(&worker),
                            prev_claim_at: prev,
                            at: resp.at,
                            gap,
                        });
                    }
                }
                if resp.kind == OutcomeKind::Claimed {
                    last_claim = Some(resp.at);
                }
            }
        }
        violations
    }

    /// Quota-respected property.
    ///
    /// For each worker's time-sorted `Claimed` events, every span of
    /// `max_claims + 1` consecutive claims must stretch at least one window
    /// length from first to last.
    fn check_quota(&self, responses: &[Response]) -> Vec<QuotaViolation> {
        let mut violations = Vec::new();
        let claimed = group_by_worker(responses, |r| r.kind == OutcomeKind::Claimed);

        for (worker, claims) in claimed {
            for i in self.max_claims..claims.len() {
                let window_start = claims[i - self.max_claims].at;
                let span = claims[i].at.saturating_sub(window_start);
                if span < self.window_ms {
                    violations.push(QuotaViolation {
                        worker: Arc::clone(&worker),
                        window_start,
                        window_end: claims[i].at,
                        span,
                    });
                }
            }
        }
        violations
    }

    /// Missed-service estimation for one rejection flavor.
    ///
    /// Replays each worker's claims interleaved with the batch's rejections
    /// of `rejected_kind`, maintaining a sliding window of the worker's most
    /// recent claim timestamps (newest first, capacity `max_claims`). A
    /// rejection is an avoidable miss iff at that instant the worker was
    /// neither busy (strictly more than one job duration since its newest
    /// claim) nor on break (window not full, or its oldest claim's window
    /// already expired). The excess is the idle time beyond the job
    /// duration.
    fn estimate_missed(
        &self,
        responses: &[Response],
        rejected_kind: OutcomeKind,
    ) -> MissedServiceSummary {
        let rejected: Vec<&Response> = responses
            .iter()
            .filter(|r| r.kind == rejected_kind)
            .collect();
        let claimed = group_by_worker(responses, |r| r.kind == OutcomeKind::Claimed);

        let mut per_worker = Vec::with_capacity(claimed.len());
        let mut total_missed = 0usize;
        let mut total_excess = 0u64;

        for (worker, claims) in claimed {
            // Stable sort keeps a claim ahead of a same-instant rejection.
            let mut timeline: Vec<&Response> = claims.into_iter().chain(rejected.iter().copied()).collect();
            timeline.sort_by_key(|r| r.at);

            let mut window: VecDeque<EpochMillis> = VecDeque::with_capacity(self.max_claims);
            let mut missed = 0usize;
            let mut excess = 0u64;

            for resp in timeline {
                if resp.kind == rejected_kind {
                    // A rejection before any claim tells us nothing about
                    // this worker's slack.
                    let Some(&newest) = window.front() else {
                        continue;
                    };
                    let idle_for = resp.at.saturating_sub(newest);
                    let off_break = window.len() < self.max_claims
                        || window
                            .back()
                            .is_some_and(|&oldest| oldest + self.window_ms < resp.at);
                    if idle_for > self.job_duration_ms && off_break {
                        missed += 1;
                        excess += idle_for - self.job_duration_ms;
                    }
                } else {
                    if window.len() == self.max_claims {
                        window.pop_back();
                    }
                    window.push_front(resp.at);
                }
            }

            total_missed += missed;
            total_excess += excess;
            per_worker.push(WorkerMisses {
                worker,
                missed,
                avg_excess_wait_ms: if missed > 0 { excess / missed as u64 } else { 0 },
            });
        }

        MissedServiceSummary {
            per_worker,
            total_missed,
            avg_excess_wait_ms: if total_missed > 0 {
                total_excess / total_missed as u64
            } else {
                0
            },
        }
    }
}

/// Groups matching responses by serving worker, each group sorted by time.
///
/// Responses without attribution (rejections) never match: a `keep` filter
/// is only consulted for attributed responses.
fn group_by_worker(
    responses: &[Response],
    keep: impl Fn(&Response) -> bool,
) -> BTreeMap<Arc<str>, Vec<&Response>> {
    let mut groups: BTreeMap<Arc<str>, Vec<&Response>> = BTreeMap::new();
    for resp in responses {
        if let Some(worker) = &resp.served_by {
            if keep(resp) {
                groups.entry(Arc::clone(worker)).or_default().push(resp);
            }
        }
    }
    for events in groups.values_mut() {
        events.sort_by_key(|r| r.at);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit(job_ms: u64, max_claims: usize, window_ms: u64) -> Audit {
        Audit::from_parts(
            Duration::from_millis(job_ms),
            QuotaPolicy {
                max_claims,
                window: Duration::from_millis(window_ms),
            },
        )
    }

    fn claimed(at: EpochMillis, worker: &str) -> Response {
        Response {
            at,
            kind: OutcomeKind::Claimed,
            served_by: Some(Arc::from(worker)),
        }
    }

    fn probe_ok(at: EpochMillis, worker: &str) -> Response {
        Response {
            at,
            kind: OutcomeKind::ProbeAccepted,
            served_by: Some(Arc::from(worker)),
        }
    }

    fn rejected(at: EpochMillis) -> Response {
        Response {
            at,
            kind: OutcomeKind::ClaimRejected,
            served_by: None,
        }
    }

    #[test]
    fn clean_batch_passes() {
        let batch = vec![claimed(0, "worker-0"), claimed(100, "worker-0"), claimed(200, "worker-0")];
        let report = audit(50, 2, 150).run(&batch);
        assert!(report.passed());
    }

    #[test]
    fn overlapping_claims_are_flagged() {
        let batch = vec![claimed(0, "worker-0"), claimed(30, "worker-0")];
        let report = audit(50, 5, 600).run(&batch);

        assert_eq!(report.double_bookings.len(), 1);
        let v = &report.double_bookings[0];
        assert_eq!(v.worker.as_ref(), "worker-0");
        assert_eq!(v.prev_claim_at, 0);
        assert_eq!(v.at, 30);
        assert_eq!(v.gap, 30);
    }

    #[test]
    fn positive_probe_during_busy_claim_is_flagged() {
        let batch = vec![claimed(0, "worker-0"), probe_ok(20, "worker-0")];
        let report = audit(50, 5, 600).run(&batch);
        assert_eq!(report.double_bookings.len(), 1);
    }

    #[test]
    fn first_claim_has_no_predecessor_to_violate() {
        let batch = vec![claimed(5, "worker-0")];
        let report = audit(50, 5, 600).run(&batch);
        assert!(report.no_double_booking());
    }

    #[test]
    fn workers_are_audited_independently() {
        // 30 ms apart across two workers is no overlap.
        let batch = vec![claimed(0, "worker-0"), claimed(30, "worker-1")];
        let report = audit(50, 5, 600).run(&batch);
        assert!(report.no_double_booking());
    }

    #[test]
    fn quota_breach_is_flagged() {
        let batch = vec![claimed(0, "worker-0"), claimed(50, "worker-0"), claimed(100, "worker-0")];
        let report = audit(10, 2, 150).run(&batch);

        assert_eq!(report.quota_breaches.len(), 1);
        let v = &report.quota_breaches[0];
        assert_eq!(v.window_start, 0);
        assert_eq!(v.window_end, 100);
        assert_eq!(v.span, 100);
    }

    #[test]
    fn quota_span_at_exactly_one_window_is_legal() {
        let batch = vec![claimed(0, "worker-0"), claimed(50, "worker-0"), claimed(150, "worker-0")];
        let report = audit(10, 2, 150).run(&batch);
        assert!(report.quota_respected());
    }

    #[test]
    fn idle_rejection_counts_as_missed_service() {
        // Claim at 0, rejection at 100: the worker finished at 50 and was
        // not on break, so 50 ms of slack caused the miss.
        let batch = vec![claimed(0, "worker-0"), rejected(100)];
        let report = audit(50, 2, 600).run(&batch);

        assert_eq!(report.missed_claims.total_missed, 1);
        assert_eq!(report.missed_claims.avg_excess_wait_ms, 50);
    }

    #[test]
    fn rejection_while_busy_is_not_a_miss() {
        let batch = vec![claimed(0, "worker-0"), rejected(30)];
        let report = audit(50, 2, 600).run(&batch);
        assert_eq!(report.missed_claims.total_missed, 0);
    }

    #[test]
    fn rejection_while_on_break_is_not_a_miss() {
        // Window full (2 claims), oldest window expires at 0 + 600 = 600:
        // a rejection at 120 was correctly refused.
        let batch = vec![claimed(0, "worker-0"), claimed(60, "worker-0"), rejected(120)];
        let report = audit(50, 2, 600).run(&batch);
        assert_eq!(report.missed_claims.total_missed, 0);
    }

    #[test]
    fn rejection_after_break_expiry_is_a_miss() {
        let batch = vec![claimed(0, "worker-0"), claimed(60, "worker-0"), rejected(700)];
        let report = audit(50, 2, 600).run(&batch);

        // Idle since the newest claim at 60: 640 ms, 590 beyond the job.
        assert_eq!(report.missed_claims.total_missed, 1);
        assert_eq!(report.missed_claims.avg_excess_wait_ms, 590);
    }

    #[test]
    fn rejection_before_any_claim_is_skipped() {
        let batch = vec![rejected(10), claimed(20, "worker-0")];
        let report = audit(50, 2, 600).run(&batch);
        assert_eq!(report.missed_claims.total_missed, 0);
    }

    #[test]
    fn probe_misses_are_tracked_separately() {
        let batch = vec![
            claimed(0, "worker-0"),
            Response {
                at: 100,
                kind: OutcomeKind::ProbeRejected,
                served_by: None,
            },
        ];
        let report = audit(50, 2, 600).run(&batch);

        assert_eq!(report.missed_probes.total_missed, 1);
        assert_eq!(report.missed_claims.total_missed, 0);
    }

    #[test]
    fn aggregate_averages_span_all_misses() {
        // Two misses with excesses 50 and 150 → aggregate average 100.
        let batch = vec![claimed(0, "worker-0"), rejected(100), rejected(200)];
        let report = audit(50, 5, 600).run(&batch);

        assert_eq!(report.missed_claims.total_missed, 2);
        assert_eq!(report.missed_claims.avg_excess_wait_ms, 100);
        assert_eq!(report.missed_claims.per_worker.len(), 1);
        assert_eq!(report.missed_claims.per_worker[0].missed, 2);
    }
}
