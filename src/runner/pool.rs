//! # Tokio-backed job runner.
//!
//! [`TokioRunner`] spawns each job on the current Tokio runtime and tracks
//! it with a [`TaskTracker`], which provides the two halves of graceful
//! shutdown: `close()` (refuse new submissions) and `wait()` (drain
//! in-flight jobs).
//!
//! Panics inside a job are caught and reported to stderr; the job future's
//! release guard has already run by then, so a panicking job never leaves
//! its worker stuck busy.

use async_trait::async_trait;
use futures::FutureExt;
use tokio_util::task::TaskTracker;

use crate::error::SubmitError;

use super::job::{BoxJobFuture, JobRunner};

/// Job runner backed by the current Tokio runtime.
///
/// ### Notes
/// - Jobs are spawned with [`tokio::spawn`] via the tracker, so `submit`
///   must be called from within a Tokio runtime.
/// - Job-level errors (`Err` results) are reported by the owning worker on
///   the event bus; the runner only isolates panics.
#[derive(Debug, Default)]
pub struct TokioRunner {
    tracker: TaskTracker,
}

impl TokioRunner {
    /// Creates a new runner accepting submissions.
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
        }
    }

    /// True once shutdown has been signaled.
    pub fn is_closed(&self) -> bool {
        self.tracker.is_closed()
    }
}

#[async_trait]
impl JobRunner for TokioRunner {
    fn submit(&self, job: BoxJobFuture) -> Result<(), SubmitError> {
        if self.tracker.is_closed() {
            return Err(SubmitError::ShuttingDown);
        }
        self.tracker.spawn(async move {
            match std::panic::AssertUnwindSafe(job).catch_unwind().await {
                // Job-level errors were already reported by the worker.
                Ok(_outcome) => {}
                Err(panic_err) => {
                    eprintln!("[crewgate] job panicked: {panic_err:?}");
                }
            }
        });
        Ok(())
    }

    async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
