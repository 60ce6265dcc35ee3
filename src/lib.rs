//! # crewgate
//!
//! **Crewgate** is a lightweight admission-control engine for a fixed crew
//! of rate-limited async workers.
//!
//! It models a team serving two kinds of inbound requests: a *probe* (is a
//! worker free? — consumes no capacity) and a *claim* (occupy a worker for a
//! fixed-duration job). Each worker additionally enforces a personal quota:
//! at most N accepted claims within any sliding window of length W — a
//! worker that has exhausted its quota is "on break" and refuses claims even
//! while idle.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            probe(now, req)  /  claim(now, req)
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │  TeamManager (fixed worker order, fan-out, early exit)  │
//! │  - EventBus (broadcast events)                          │
//! │  - Arc<dyn JobRunner> (shared job execution)            │
//! └───────┬──────────────────┬──────────────────┬───────────┘
//!         ▼                  ▼                  ▼
//!   ┌────────────┐     ┌────────────┐     ┌────────────┐
//!   │  Worker 0  │     │  Worker 1  │     │  Worker N  │
//!   │ free flag  │     │    ...     │     │    ...     │
//!   │ RateWindow │     │            │     │            │
//!   └─────┬──────┘     └────────────┘     └────────────┘
//!         │ submit(job)
//!         ▼
//!     JobRunner ──► job body runs ──► ReleaseGuard ──► free again
//! ```
//!
//! ### Lifecycle
//! ```text
//! EngineConfig ──► TeamManager::new(cfg, runner)
//!
//! per request {
//!   ├─► Request::new()                       (single-assignment slot)
//!   ├─► manager.probe(now, &req)             worker qualifies?  ProbeAccepted/ProbeRejected
//!   │   manager.claim(now, &req)             first free ∧ off-break worker:
//!   │        ├─ flip busy, submit job, record quota ─► Claimed
//!   │        ├─ whole team refuses                  ─► ClaimRejected
//!   │        └─ runner refuses submission           ─► Errored (worker rolled back)
//!   └─► req.response().await                 immutable Response { at, kind, served_by }
//! }
//!
//! afterwards:
//!   Audit::new(&cfg).run(&responses)         no double-booking? quota respected?
//!   manager.shutdown().await                 drain in-flight jobs
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                    |
//! |-------------------|---------------------------------------------------------------|---------------------------------------|
//! | **Admission**     | Probe/claim fan-out across a fixed, ordered team.             | [`TeamManager`], [`Worker`]           |
//! | **Break policy**  | Per-worker sliding-window claim quota.                        | [`QuotaPolicy`]                       |
//! | **Requests**      | Single-assignment request/response correlation.               | [`Request`], [`Response`], [`OutcomeKind`] |
//! | **Execution**     | Injected async job facility with graceful drain.              | [`JobRunner`], [`JobBody`], [`TokioRunner`] |
//! | **Audit**         | Offline invariant checking and missed-service estimation.     | [`Audit`], [`AuditReport`]            |
//! | **Observability** | Broadcast events with pluggable sinks.                        | [`Event`], [`EventBus`], [`EventSink`] |
//! | **Errors**        | Typed errors per fallible seam.                               | [`ClaimError`], [`SubmitError`], ...  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `LogWriter` _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use crewgate::{EngineConfig, Request, TeamManager, TokioRunner};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = EngineConfig::default();
//!     let manager = TeamManager::new(&cfg, Arc::new(TokioRunner::new()))?;
//!
//!     let req = Request::new();
//!     if manager.claim(0, &req)? {
//!         let resp = req.response().await;
//!         println!("served by {:?}", resp.served_by);
//!     }
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```

mod config;
mod engine;
mod error;
mod request;

pub mod audit;
pub mod events;
pub mod policies;
pub mod runner;
pub mod subscribers;

// ---- Public re-exports ----

pub use audit::{Audit, AuditReport};
pub use config::EngineConfig;
pub use engine::{TeamManager, Worker};
pub use error::{ClaimError, ConfigError, JobError, ResolveError, SubmitError};
pub use events::{Event, EventBus, EventKind};
pub use policies::QuotaPolicy;
pub use request::{EpochMillis, OutcomeKind, Request, Response};
pub use runner::{BoxJobFuture, JobBody, JobRunner, TokioRunner};
pub use subscribers::EventSink;

// Optional: expose the simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
