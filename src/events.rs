//! # Engine events.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Admission events**: probe/claim outcomes as seen by the fan-out.
//! - **Worker events**: job failures and busy→free releases.
//! - **Runtime events**: shutdown signaling.
//!
//! [`Event`] carries the metadata (wall-clock timestamp, worker, reason);
//! [`EventBus`] broadcasts events to any number of receivers. Publishing is
//! crate-private and goes through the kind-shaped helpers
//! (`publish`/`publish_for`/`publish_fault`), so engine code never
//! hand-assembles an event at a call site; external code only subscribes.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore exact order when events are observed
//! out of order across receivers.
//!
//! ## Delivery semantics
//! The bus wraps [`tokio::sync::broadcast`]: publishing never blocks, each
//! receiver is independent, and a receiver that falls more than
//! `bus_capacity` events behind observes `RecvError::Lagged` and skips the
//! oldest items. Events are dropped when nobody is subscribed.
//!
//! ## Example
//! ```
//! use crewgate::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::JobFailed)
//!     .with_worker("worker-2")
//!     .with_reason("simulated fault");
//!
//! assert_eq!(ev.kind, EventKind::JobFailed);
//! assert_eq!(ev.worker.as_deref(), Some("worker-2"));
//! assert_eq!(ev.reason.as_deref(), Some("simulated fault"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::broadcast;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Admission events ===
    /// A probe found a qualifying worker (no capacity consumed).
    ///
    /// Sets:
    /// - `worker`: the qualifying worker
    ProbeAccepted,

    /// A probe found no qualifying worker.
    ProbeRejected,

    /// A claim was accepted; the worker is now busy.
    ///
    /// Sets:
    /// - `worker`: the serving worker
    ClaimAccepted,

    /// A claim was refused by the whole team (busy or on break).
    ClaimRejected,

    // === Worker events ===
    /// The job runner refused a submission; the worker rolled back.
    ///
    /// Sets:
    /// - `worker`: the worker whose claim was rolled back
    /// - `reason`: the runner's refusal cause
    SubmitRejected,

    /// An asynchronous job body failed; the worker released anyway.
    ///
    /// Sets:
    /// - `worker`: the owning worker
    /// - `reason`: failure message
    JobFailed,

    /// A worker transitioned busy → free.
    ///
    /// Sets:
    /// - `worker`: the released worker
    WorkerReleased,

    // === Runtime events ===
    /// Shutdown was signaled; the runner stops accepting submissions.
    ShutdownRequested,
}

/// Engine event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Worker involved, if applicable.
    pub worker: Option<Arc<str>>,
    /// Human-readable reason (failure messages, refusal causes).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            reason: None,
        }
    }

    /// Attaches the worker identity.
    #[inline]
    pub fn with_worker(mut self, worker: impl Into<Arc<str>>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Broadcast channel for engine events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender); the manager
/// and every worker share one bus. External code interacts with it only
/// through [`EventBus::subscribe`] — publishing is reserved to the engine.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// Capacity is **shared** across all receivers (not per-receiver); the
    /// minimum capacity is 1 (clamped).
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Creates a new receiver observing subsequent events.
    ///
    /// Each call creates an **independent** receiver; it only sees events
    /// sent after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Publishes a bare event of `kind` (team-wide outcomes, shutdown).
    pub(crate) fn publish(&self, kind: EventKind) {
        self.send(Event::new(kind));
    }

    /// Publishes an event attributed to `worker`.
    pub(crate) fn publish_for(&self, kind: EventKind, worker: &Arc<str>) {
        self.send(Event::new(kind).with_worker(Arc::clone(worker)));
    }

    /// Publishes an attributed event carrying a failure reason.
    pub(crate) fn publish_fault(
        &self,
        kind: EventKind,
        worker: &Arc<str>,
        reason: impl Into<Arc<str>>,
    ) {
        self.send(
            Event::new(kind)
                .with_worker(Arc::clone(worker))
                .with_reason(reason),
        );
    }

    /// Never blocks; the event is dropped if nobody is subscribed.
    fn send(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }
}
