//! # TeamManager: ordered fan-out across the fixed team.
//!
//! The [`TeamManager`] owns the ordered collection of workers sharing one
//! [`JobRunner`], the event bus, and the probe/claim entry points the load
//! side calls into.
//!
//! ## Fan-out
//! ```text
//! probe(now, req) / claim(now, req)
//!   worker-0 ──► worker-1 ──► ... ──► worker-N      (fixed order, early exit)
//!      │
//!      └─ first qualifying worker:
//!           - probe: record identity, resolve ProbeAccepted   (no capacity consumed)
//!           - claim: try_claim(now) wins → record identity, resolve Claimed
//! ```
//!
//! ## Rules
//! - Worker order is fixed at construction and determines tie-break
//!   priority; the team is never resized.
//! - Each worker is tried **exactly once per call**: a claim can be rejected
//!   even though a worker frees up microseconds later. This is a best-effort
//!   decision at a single instant, not a blocking wait.
//! - Two claims racing for the same worker are serialized by that worker's
//!   own lock; the loser moves on to the next worker in order.
//! - Every call resolves the request exactly once.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::error::{ClaimError, ConfigError, ResolveError};
use crate::events::{EventBus, EventKind};
use crate::request::{EpochMillis, OutcomeKind, Request};
use crate::runner::{default_job_body, JobBody, JobRunner};
use crate::subscribers::EventSink;

use super::worker::Worker;

/// Coordinates the fixed team of workers and the shared job runner.
pub struct TeamManager {
    workers: Vec<Arc<Worker>>,
    runner: Arc<dyn JobRunner>,
    bus: EventBus,
}

impl TeamManager {
    /// Builds the team from a validated configuration.
    ///
    /// Workers are created in team order with deterministic identities
    /// (`worker-0`, `worker-1`, ...) and the default job body (occupy the
    /// worker for the configured duration). Fails fast with [`ConfigError`]
    /// before any worker accepts traffic.
    pub fn new(cfg: &EngineConfig, runner: Arc<dyn JobRunner>) -> Result<Self, ConfigError> {
        Self::with_job_body(cfg, runner, default_job_body())
    }

    /// Builds the team with a custom job body.
    ///
    /// The body is invoked once per accepted claim with the configured job
    /// duration; the worker stays busy until the produced future finishes.
    /// A failing body is published as `JobFailed` and the worker still
    /// releases — the claim's caller is never affected.
    pub fn with_job_body(
        cfg: &EngineConfig,
        runner: Arc<dyn JobRunner>,
        body: JobBody,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let bus = EventBus::new(cfg.bus_capacity);
        let workers = (0..cfg.team_size)
            .map(|idx| {
                Arc::new(Worker::new(
                    format!("worker-{idx}"),
                    cfg.job_duration,
                    cfg.quota,
                    Arc::clone(&runner),
                    Arc::clone(&body),
                    bus.clone(),
                ))
            })
            .collect();
        Ok(Self {
            workers,
            runner,
            bus,
        })
    }

    /// Number of workers in the team.
    pub fn team_size(&self) -> usize {
        self.workers.len()
    }

    /// The team, in fan-out order.
    ///
    /// Order is fixed at construction and determines tie-break priority.
    pub fn workers(&self) -> &[Arc<Worker>] {
        &self.workers
    }

    /// The event bus shared by the manager and its workers.
    ///
    /// External code can only subscribe; publishing is reserved to the
    /// engine.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Capacity probe: does any worker currently qualify?
    ///
    /// Scans the team in fixed order; the first worker that is free and off
    /// break is recorded on the request, which resolves as `ProbeAccepted`.
    /// Consumes no capacity and mutates no worker state. Returns `Ok(false)`
    /// (request resolved as `ProbeRejected`) when nobody qualifies.
    pub fn probe(&self, now: EpochMillis, request: &Request) -> Result<bool, ResolveError> {
        for worker in &self.workers {
            if worker.may_qualify(now) {
                request.record_server(Arc::clone(worker.id()));
                request.resolve(now, OutcomeKind::ProbeAccepted)?;
                self.bus.publish_for(EventKind::ProbeAccepted, worker.id());
                return Ok(true);
            }
        }
        request.resolve(now, OutcomeKind::ProbeRejected)?;
        self.bus.publish(EventKind::ProbeRejected);
        Ok(false)
    }

    /// Claim: occupy the first qualifying worker for one job.
    ///
    /// Scans the team in fixed order calling
    /// [`try_claim`](super::worker::Worker::try_claim) until one worker
    /// wins; the serving identity is recorded and the request resolves as
    /// `Claimed`. If the whole team is busy or on break, the request
    /// resolves as `ClaimRejected` and `Ok(false)` is returned.
    ///
    /// If the runner refuses a submission the request resolves as `Errored`
    /// and the failure propagates: the shared runner refusing one job will
    /// refuse them all, so the remaining workers are not tried.
    pub fn claim(&self, now: EpochMillis, request: &Request) -> Result<bool, ClaimError> {
        for worker in &self.workers {
            match worker.try_claim(now) {
                Ok(true) => {
                    request.record_server(Arc::clone(worker.id()));
                    request.resolve(now, OutcomeKind::Claimed)?;
                    self.bus.publish_for(EventKind::ClaimAccepted, worker.id());
                    return Ok(true);
                }
                Ok(false) => continue,
                Err(err) => {
                    self.bus
                        .publish_fault(EventKind::SubmitRejected, worker.id(), err.to_string());
                    request.resolve(now, OutcomeKind::Errored)?;
                    return Err(err.into());
                }
            }
        }
        request.resolve(now, OutcomeKind::ClaimRejected)?;
        self.bus.publish(EventKind::ClaimRejected);
        Ok(false)
    }

    /// Signals shutdown: the runner stops accepting submissions and
    /// in-flight jobs drain gracefully.
    ///
    /// The manager itself holds no additional resources to release.
    pub async fn shutdown(&self) {
        self.bus.publish(EventKind::ShutdownRequested);
        self.runner.shutdown().await;
    }

    /// Spawns the listener task feeding bus events to the given sinks.
    ///
    /// One task drains the bus and hands each event to every sink in
    /// registration order. A panicking sink is isolated and reported; a
    /// listener that falls behind the bus capacity skips the oldest events
    /// and reports how many were missed. The task ends when the manager
    /// (and with it the bus) is dropped.
    pub fn spawn_listener(&self, sinks: Vec<Arc<dyn EventSink>>) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        tokio::spawn(async move {
            loop {
                let ev = match rx.recv().await {
                    Ok(ev) => ev,
                    Err(RecvError::Lagged(skipped)) => {
                        eprintln!("[crewgate] event listener lagged, skipped {skipped} events");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                for sink in &sinks {
                    let observed =
                        std::panic::catch_unwind(AssertUnwindSafe(|| sink.observe(&ev)));
                    if let Err(panic_err) = observed {
                        eprintln!(
                            "[crewgate] event sink '{}' panicked: {panic_err:?}",
                            sink.name()
                        );
                    }
                }
            }
        })
    }
}
