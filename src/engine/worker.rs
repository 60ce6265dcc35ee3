//! # Worker: the per-worker claim/release state machine.
//!
//! A [`Worker`] owns one free/busy flag and one `RateWindow`, both behind a
//! single per-worker lock, and exposes exactly two operations:
//!
//! - [`Worker::may_qualify`] — read-only: free **and** off break. Probing
//!   never mutates anything.
//! - [`Worker::try_claim`] — the break check, the free → busy transition,
//!   and the quota update happen under one lock acquisition, so no caller
//!   can observe a partially applied claim. Different workers never share a
//!   lock; contention on one worker cannot delay another.
//!
//! ## Claim flow
//! ```text
//! try_claim(now)
//!   ├─ busy or on break ──────────► Ok(false), state untouched
//!   └─ free ∧ off break
//!        ├─► flip free → busy
//!        ├─► submit(job) to JobRunner
//!        │     ├─ Ok  ──► record claim in RateWindow ──► Ok(true)
//!        │     └─ Err ──► flip back to free (window untouched) ──► Err
//!        └─► job body runs (default: sleep job_duration),
//!            then ReleaseGuard flips busy → free
//! ```
//!
//! ## Rules
//! - The release guard runs on **every** job exit path: completion, failure,
//!   or the job future being dropped at shutdown. A worker can never get
//!   stuck busy.
//! - A failing job body is published as `JobFailed` and swallowed; the
//!   claim already committed when the transition succeeded.
//! - A refused submission consumes no quota (the window is only recorded
//!   after the runner accepts).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::SubmitError;
use crate::events::{EventBus, EventKind};
use crate::policies::{QuotaPolicy, RateWindow};
use crate::request::EpochMillis;
use crate::runner::{BoxJobFuture, JobBody, JobRunner};

/// Mutable worker state, guarded by one per-worker lock.
struct WorkerState {
    /// False while a claimed job is in flight.
    free: bool,
    /// Sliding window of quota-expiry deadlines.
    window: RateWindow,
}

/// One member of the team: identity, busy/free flag, and quota window.
///
/// Workers are created by [`TeamManager`](crate::TeamManager) and accessed
/// only through [`may_qualify`](Worker::may_qualify) and
/// [`try_claim`](Worker::try_claim); no external code reaches into a
/// worker's internals.
pub struct Worker {
    id: Arc<str>,
    job_duration: Duration,
    state: Mutex<WorkerState>,
    runner: Arc<dyn JobRunner>,
    body: JobBody,
    bus: EventBus,
}

impl Worker {
    pub(crate) fn new(
        id: impl Into<Arc<str>>,
        job_duration: Duration,
        quota: QuotaPolicy,
        runner: Arc<dyn JobRunner>,
        body: JobBody,
        bus: EventBus,
    ) -> Self {
        Self {
            id: id.into(),
            job_duration,
            state: Mutex::new(WorkerState {
                free: true,
                window: RateWindow::new(quota),
            }),
            runner,
            body,
            bus,
        }
    }

    /// Stable worker identity, assigned at creation.
    pub fn id(&self) -> &Arc<str> {
        &self.id
    }

    /// Read-only capacity probe: free **and** off break at `now`.
    ///
    /// Never mutates the free flag or the quota window.
    pub fn may_qualify(&self, now: EpochMillis) -> bool {
        let state = self.state();
        state.free && !state.window.on_break(now)
    }

    /// Attempts to claim this worker at `now`.
    ///
    /// On success the worker is busy until its job body finishes and the
    /// claim counts against the quota window; returns `Ok(true)`. Returns
    /// `Ok(false)` if the worker was busy or on break, leaving all state
    /// unchanged. Returns `Err` if the job runner refused the submission;
    /// the busy transition is rolled back and no quota is consumed.
    pub fn try_claim(self: &Arc<Self>, now: EpochMillis) -> Result<bool, SubmitError> {
        let mut state = self.state();
        if !state.free || state.window.on_break(now) {
            return Ok(false);
        }

        // Flip to busy before handing the job out; the release guard is the
        // only thing that flips it back.
        state.free = false;
        match self.runner.submit(self.job()) {
            Ok(()) => {
                state.window.record(now);
                Ok(true)
            }
            Err(err) => {
                // The window was not touched yet, so the failed attempt
                // consumes no quota.
                state.free = true;
                Err(err)
            }
        }
    }

    /// Wraps the job body for one accepted claim: guaranteed release plus
    /// failure reporting.
    fn job(self: &Arc<Self>) -> BoxJobFuture {
        let worker = Arc::clone(self);
        Box::pin(async move {
            let _release = ReleaseGuard {
                worker: Arc::clone(&worker),
            };
            let outcome = (worker.body)(worker.job_duration).await;
            if let Err(err) = &outcome {
                worker
                    .bus
                    .publish_fault(EventKind::JobFailed, &worker.id, err.to_string());
            }
            outcome
        })
    }

    fn state(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Flips the owning worker busy → free when dropped.
///
/// Owned by the job future, so the release happens on completion, failure,
/// and drop-without-completion alike.
struct ReleaseGuard {
    worker: Arc<Worker>,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        {
            let mut state = self.worker.state();
            state.free = true;
        }
        self.worker
            .bus
            .publish_for(EventKind::WorkerReleased, &self.worker.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use crate::runner::{default_job_body, TokioRunner};
    use async_trait::async_trait;
    use tokio::time;

    fn quota(max_claims: usize, window_ms: u64) -> QuotaPolicy {
        QuotaPolicy {
            max_claims,
            window: Duration::from_millis(window_ms),
        }
    }

    fn worker(runner: Arc<dyn JobRunner>) -> Arc<Worker> {
        worker_with_body(runner, default_job_body())
    }

    fn worker_with_body(runner: Arc<dyn JobRunner>, body: JobBody) -> Arc<Worker> {
        Arc::new(Worker::new(
            "worker-0",
            Duration::from_millis(10),
            quota(5, 600),
            runner,
            body,
            EventBus::new(16),
        ))
    }

    /// Runner that refuses every submission.
    struct RefusingRunner;

    #[async_trait]
    impl JobRunner for RefusingRunner {
        fn submit(&self, _job: BoxJobFuture) -> Result<(), SubmitError> {
            Err(SubmitError::Rejected {
                reason: "always refuses".into(),
            })
        }

        async fn shutdown(&self) {}
    }

    /// Runner that parks accepted jobs without running them.
    #[derive(Default)]
    struct ParkingRunner {
        parked: Mutex<Vec<BoxJobFuture>>,
    }

    #[async_trait]
    impl JobRunner for ParkingRunner {
        fn submit(&self, job: BoxJobFuture) -> Result<(), SubmitError> {
            self.parked
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(job);
            Ok(())
        }

        async fn shutdown(&self) {}
    }

    impl ParkingRunner {
        fn drop_parked(&self) {
            self.parked
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn claim_occupies_then_releases() {
        let w = worker(Arc::new(TokioRunner::new()));

        assert!(w.try_claim(0).unwrap());
        assert!(!w.may_qualify(0), "busy right after a claim");

        // The job lasts 10 ms of (virtual) time.
        time::sleep(Duration::from_millis(11)).await;
        assert!(w.may_qualify(11), "free again once the job finished");
    }

    #[tokio::test(start_paused = true)]
    async fn busy_worker_refuses_second_claim() {
        let w = worker(Arc::new(TokioRunner::new()));

        assert!(w.try_claim(0).unwrap());
        assert!(!w.try_claim(0).unwrap(), "second claim at the same instant");
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_quota_puts_worker_on_break() {
        let w = worker(Arc::new(TokioRunner::new()));

        for t in [0u64, 1, 2, 3, 4] {
            assert!(w.try_claim(t).unwrap(), "claim at t={t}");
            time::sleep(Duration::from_millis(11)).await;
        }

        // Window holds deadlines 600..=604: on break until 600 passes.
        assert!(!w.try_claim(100).unwrap(), "on break at t=100");
        assert!(w.may_qualify(601), "off break once the oldest expired");
        assert!(w.try_claim(601).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn probing_never_consumes_quota() {
        let w = worker(Arc::new(TokioRunner::new()));

        for _ in 0..100 {
            assert!(w.may_qualify(0));
        }
        {
            let state = w.state();
            assert!(state.free);
            assert_eq!(state.window.active(), 0, "probes recorded no claims");
        }

        // The full quota is still available after all those probes.
        for t in [0u64, 1, 2, 3, 4] {
            assert!(w.try_claim(t).unwrap());
            time::sleep(Duration::from_millis(11)).await;
        }
        assert!(!w.try_claim(5).unwrap(), "sixth claim hits the quota");
    }

    #[tokio::test(start_paused = true)]
    async fn refused_submission_rolls_back_cleanly() {
        let w = worker(Arc::new(RefusingRunner));

        let err = w.try_claim(0).unwrap_err();
        assert!(matches!(err, SubmitError::Rejected { .. }));

        let state = w.state();
        assert!(state.free, "busy transition rolled back");
        assert_eq!(state.window.active(), 0, "no phantom quota consumption");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_job_still_releases_worker() {
        let runner = Arc::new(ParkingRunner::default());
        let w = worker(Arc::clone(&runner) as Arc<dyn JobRunner>);

        assert!(w.try_claim(0).unwrap());
        assert!(!w.may_qualify(0));

        // Dropping the parked job future runs the release guard.
        runner.drop_parked();
        assert!(w.may_qualify(0), "released despite the job never running");
    }

    #[tokio::test(start_paused = true)]
    async fn failing_job_reports_and_releases() {
        let body: JobBody = Arc::new(|duration| {
            Box::pin(async move {
                time::sleep(duration).await;
                Err(JobError::Failed {
                    reason: "simulated fault".into(),
                })
            })
        });
        let w = worker_with_body(Arc::new(TokioRunner::new()), body);
        let mut rx = w.bus.subscribe();

        assert!(w.try_claim(0).unwrap(), "the claim commits regardless");
        time::sleep(Duration::from_millis(11)).await;
        assert!(w.may_qualify(11), "released despite the failure");

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::JobFailed {
                assert_eq!(ev.worker.as_deref(), Some("worker-0"));
                assert_eq!(ev.reason.as_deref(), Some("job execution failed: simulated fault"));
            }
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::JobFailed));
        assert!(kinds.contains(&EventKind::WorkerReleased));
    }
}
