//! # Job runner contract.
//!
//! [`JobRunner`] is the injected asynchronous-execution capability shared by
//! every worker in a team. The engine stays decoupled from how concurrency
//! is actually realized: threads, a worker pool, or an event loop all
//! satisfy the contract.
//!
//! [`JobBody`] is the other half of the seam: the closure that produces the
//! actual work a claimed worker performs. The default body simply occupies
//! the worker for the configured job duration; embedders supply their own
//! (via [`TeamManager::with_job_body`](crate::TeamManager::with_job_body))
//! to attach real, possibly fallible work.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{JobError, SubmitError};

/// Boxed job future handed to a [`JobRunner`].
///
/// The future owns its release guard: dropping it without polling to
/// completion still frees the claiming worker.
pub type BoxJobFuture = Pin<Box<dyn Future<Output = Result<(), JobError>> + Send + 'static>>;

/// Closure producing a fresh job-body future per accepted claim.
///
/// Receives the configured job duration; the worker stays busy until the
/// produced future finishes, and an `Err` outcome is published as
/// [`EventKind::JobFailed`](crate::EventKind::JobFailed) without ever
/// reaching the claim's caller (the claim already committed).
pub type JobBody = Arc<dyn Fn(Duration) -> BoxJobFuture + Send + Sync>;

/// The default job body: occupy the worker for the full job duration.
pub(crate) fn default_job_body() -> JobBody {
    Arc::new(|duration| {
        Box::pin(async move {
            tokio::time::sleep(duration).await;
            Ok(())
        })
    })
}

/// # Asynchronous job execution facility.
///
/// A `JobRunner` accepts job futures from claiming workers and runs them to
/// completion off the caller's thread of control.
///
/// ## Contract
/// - [`submit`](JobRunner::submit) must **not block** and must not execute or
///   drop the job synchronously in the caller's context (the claiming worker
///   still holds its own state lock at submission time).
/// - Submitted work eventually runs, or its failure is observable — a lost
///   job would leave a worker permanently busy if the job future were also
///   leaked, so implementations must either run or drop every accepted job.
/// - After [`shutdown`](JobRunner::shutdown), submissions are refused with
///   [`SubmitError::ShuttingDown`]; in-flight jobs drain gracefully.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    /// Accepts a job for asynchronous execution.
    ///
    /// Returns an error if the job cannot be accepted; the claiming worker
    /// rolls back its own state in that case.
    fn submit(&self, job: BoxJobFuture) -> Result<(), SubmitError>;

    /// Stops accepting submissions and waits for in-flight jobs to finish.
    async fn shutdown(&self);
}
