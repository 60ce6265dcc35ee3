//! Job execution seam.
//!
//! The engine never runs jobs on the caller's thread of control: every
//! accepted claim hands a job future to an injected [`JobRunner`], which is
//! only required to run it asynchronously and make failures observable.
//!
//! ## Contents
//! - [`JobRunner`], [`BoxJobFuture`] — the submission contract
//! - [`JobBody`] — the per-claim work factory (default: occupy the worker
//!   for the configured job duration)
//! - [`TokioRunner`] — production implementation on the current Tokio
//!   runtime, with graceful drain on shutdown
//!
//! ## Quick wiring
//! ```text
//! TeamManager::new(cfg, Arc<dyn JobRunner>)
//!      └─► Worker::try_claim ── submit(job) ──► JobRunner
//!                                                  └─► job runs, release guard
//!                                                      flips the worker free
//! ```

mod job;
mod pool;

pub(crate) use job::default_job_body;
pub use job::{BoxJobFuture, JobBody, JobRunner};
pub use pool::TokioRunner;
