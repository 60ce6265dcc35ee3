//! # Request/response correlation.
//!
//! A [`Request`] is a single-assignment result slot: it correlates one
//! inbound probe or claim with its eventual [`Response`] (which worker, what
//! time, what category of outcome). The engine resolves each request exactly
//! once; a second resolution attempt fails with
//! [`ResolveError::DoubleResolution`] instead of silently overwriting.
//!
//! ## Rules
//! - `resolve` publishes the response **once**; `at` and `kind` never change
//!   afterwards.
//! - The serving worker is attached *before* resolution (during fan-out) and
//!   travels inside the resolved [`Response`].
//! - Readers either poll with [`Request::try_response`] or await
//!   [`Request::response`]; both observe the same immutable value.
//!
//! ## Example
//! ```
//! use crewgate::{OutcomeKind, Request};
//!
//! let req = Request::new();
//! assert!(req.try_response().is_none());
//!
//! req.resolve(42, OutcomeKind::ClaimRejected).unwrap();
//! assert!(req.resolve(43, OutcomeKind::Claimed).is_err());
//!
//! let resp = req.try_response().unwrap();
//! assert_eq!(resp.at, 42);
//! assert_eq!(resp.kind, OutcomeKind::ClaimRejected);
//! ```

use std::sync::{Arc, OnceLock};

use tokio::sync::Notify;

use crate::error::ResolveError;

/// Epoch-like monotonic timestamp in milliseconds, supplied by the caller.
pub type EpochMillis = u64;

/// Classification of request outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutcomeKind {
    /// A worker accepted the claim and is performing the job.
    Claimed,
    /// Every worker was busy or on break; the claim was refused.
    ClaimRejected,
    /// A worker was free and off break at probe time (no capacity consumed).
    ProbeAccepted,
    /// No worker was available at probe time.
    ProbeRejected,
    /// The request terminated abnormally (e.g. job submission refused).
    Errored,
}

/// Resolved outcome of a single request.
///
/// Field order matters: responses sort by timestamp first, which is the
/// order the offline audit consumes batches in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Response {
    /// When the request was terminated.
    pub at: EpochMillis,
    /// What happened.
    pub kind: OutcomeKind,
    /// Identity of the worker that served the request, when one qualified.
    pub served_by: Option<Arc<str>>,
}

/// Single-assignment slot correlating a request with its eventual response.
///
/// ### Properties
/// - **Resolve-once**: the first [`resolve`](Request::resolve) wins; later
///   attempts return [`ResolveError::DoubleResolution`].
/// - **Concurrency-safe**: publication is a lock-free `OnceLock` store; the
///   losing resolver observes the error, never a torn response.
/// - **Awaitable**: any number of readers may await [`response`](Request::response).
#[derive(Debug, Default)]
pub struct Request {
    served_by: OnceLock<Arc<str>>,
    outcome: OnceLock<Response>,
    done: Notify,
}

impl Request {
    /// Creates a fresh, unresolved request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the identity of the worker that served this request.
    ///
    /// Fan-out stops at the first qualifying worker, so at most one identity
    /// is ever recorded; the first attribution wins.
    pub(crate) fn record_server(&self, worker: Arc<str>) {
        let _ = self.served_by.set(worker);
    }

    /// Resolves the request with the given timestamp and outcome.
    ///
    /// Returns [`ResolveError::DoubleResolution`] if a response was already
    /// published. On success, all pending and future readers observe the
    /// same immutable [`Response`].
    pub fn resolve(&self, at: EpochMillis, kind: OutcomeKind) -> Result<(), ResolveError> {
        let response = Response {
            at,
            kind,
            served_by: self.served_by.get().cloned(),
        };
        self.outcome
            .set(response)
            .map_err(|_| ResolveError::DoubleResolution)?;
        self.done.notify_waiters();
        Ok(())
    }

    /// Returns the response if the request has been resolved.
    pub fn try_response(&self) -> Option<&Response> {
        self.outcome.get()
    }

    /// Waits until the request is resolved and returns the response.
    pub async fn response(&self) -> &Response {
        loop {
            if let Some(response) = self.outcome.get() {
                return response;
            }
            let notified = self.done.notified();
            // Re-check: the resolver may have won between the first check and
            // registering the waiter.
            if let Some(response) = self.outcome.get() {
                return response;
            }
            notified.await;
        }
    }
}
