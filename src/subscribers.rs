//! # Event sinks: pluggable observers for engine events.
//!
//! Admission events are small and low-rate (a handful per request), so this
//! engine does not queue per observer: the
//! [`TeamManager::spawn_listener`](crate::TeamManager::spawn_listener) task
//! drains the bus once and hands each event to every registered
//! [`EventSink`] in order, synchronously.
//!
//! ## Architecture
//! ```text
//! TeamManager / Worker ── publish ──► EventBus
//!                                        │ (one receiver)
//!                              listener task (spawn_listener)
//!                                        │
//!                          for sink in sinks { sink.observe(&ev) }
//! ```
//!
//! ## Rules
//! - [`EventSink::observe`] is synchronous and must be cheap (counters,
//!   formatting, forwarding). A sink that needs async I/O should push the
//!   event into its own channel and process it on its own task.
//! - A panicking sink is isolated and reported; the listener keeps running.
//! - Overflow is the bus's lag semantics: a listener that falls behind
//!   skips the oldest events and reports how many were missed.
//!
//! The built-in `LogWriter` (feature `logging`) is a stdout printer for
//! demos and debugging.

use crate::events::Event;

/// Contract for engine event observers.
///
/// Implementations are called from the engine's listener task, in
/// registration order, for every event the bus delivers.
pub trait EventSink: Send + Sync + 'static {
    /// Observes one engine event.
    ///
    /// Keep it cheap: this runs inline in the listener loop, so a slow sink
    /// delays the sinks registered after it and risks bus lag.
    fn observe(&self, event: &Event);

    /// Human-readable name (for panic reports).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Simple stdout logging sink.
///
/// Enabled via the `logging` feature. Not intended for production use —
/// implement a custom [`EventSink`] for structured logging or metrics.
///
/// ## Output format
/// ```text
/// [probe-accepted] worker=worker-0
/// [probe-rejected]
/// [claim-accepted] worker=worker-1
/// [claim-rejected]
/// [submit-rejected] worker=worker-0 reason="job runner is shutting down"
/// [job-failed] worker=worker-2 reason="simulated fault"
/// [released] worker=worker-1
/// [shutdown-requested]
/// ```
#[cfg(feature = "logging")]
#[derive(Default)]
pub struct LogWriter;

#[cfg(feature = "logging")]
impl EventSink for LogWriter {
    fn observe(&self, e: &Event) {
        use crate::events::EventKind;

        match e.kind {
            EventKind::ProbeAccepted => {
                println!("[probe-accepted] worker={:?}", e.worker);
            }
            EventKind::ProbeRejected => {
                println!("[probe-rejected]");
            }
            EventKind::ClaimAccepted => {
                println!("[claim-accepted] worker={:?}", e.worker);
            }
            EventKind::ClaimRejected => {
                println!("[claim-rejected]");
            }
            EventKind::SubmitRejected => {
                println!("[submit-rejected] worker={:?} reason={:?}", e.worker, e.reason);
            }
            EventKind::JobFailed => {
                println!("[job-failed] worker={:?} reason={:?}", e.worker, e.reason);
            }
            EventKind::WorkerReleased => {
                println!("[released] worker={:?}", e.worker);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
