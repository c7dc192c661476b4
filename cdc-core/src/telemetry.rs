use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

const TELEMETRY_RING_CAPACITY: usize = 256;

/// Cadence named for the telemetry stream: buffered lines are released to
/// the receiver in batches roughly this often, not one at a time as they
/// fire.
pub const TELEMETRY_FLUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Shared buffer between the `tracing` layer (producer) and the receiver
/// (consumer). A plain `VecDeque` behind a `Mutex` rather than a `tokio`
/// channel: a channel's `try_send` can only ever reject the value being
/// sent, so a full channel drops the *newest* line. Telemetry is specified
/// to drop the *oldest* one instead, which means the producer must be able
/// to evict a queued line to make room — only possible by owning the queue
/// outright.
struct TelemetryRing {
    lines: Mutex<VecDeque<String>>,
    notify: Notify,
}

impl TelemetryRing {
    fn push(&self, line: String) {
        let mut lines = self.lines.lock().unwrap();
        if lines.len() == TELEMETRY_RING_CAPACITY {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    fn drain(&self) -> VecDeque<String> {
        let mut lines = self.lines.lock().unwrap();
        std::mem::take(&mut *lines)
    }

    fn has_pending(&self) -> bool {
        !self.lines.lock().unwrap().is_empty()
    }
}

/// A `tracing` layer that mirrors formatted events onto a bounded ring the
/// control surface exposes as its telemetry stream of human-readable log
/// lines. The ring is lossy by construction: pushing past capacity evicts
/// the oldest buffered line rather than rejecting the newest — telemetry
/// must never apply backpressure to the decode/drain hot paths.
pub struct TelemetryLayer {
    ring: Arc<TelemetryRing>,
}

impl TelemetryLayer {
    /// Builds a layer plus the receiver end callers should hold onto as
    /// the control surface's telemetry stream. Lines fire into the shared
    /// ring immediately, but [`TelemetryReceiver::recv`] only surfaces them
    /// once [`TelemetryReceiver::spawn_flush`] has driven a tick — see
    /// there for the ~500 ms cadence.
    pub fn new() -> (Self, TelemetryReceiver) {
        let ring = Arc::new(TelemetryRing {
            lines: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        });
        (
            TelemetryLayer { ring: ring.clone() },
            TelemetryReceiver {
                ring,
                buffered: VecDeque::new(),
            },
        )
    }
}

#[derive(Default)]
struct LineVisitor {
    line: String,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.line, "{:?}", value);
        } else {
            let _ = write!(self.line, " {}={:?}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for TelemetryLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let line = format!("[{}] {}", event.metadata().level(), visitor.line);
        self.ring.push(line);
    }
}

/// The telemetry stream's receiving end.
pub struct TelemetryReceiver {
    ring: Arc<TelemetryRing>,
    buffered: VecDeque<String>,
}

impl TelemetryReceiver {
    /// Spawns the background task that wakes this receiver roughly every
    /// [`TELEMETRY_FLUSH_INTERVAL`], releasing whatever lines fired since
    /// the previous tick as one batch. Must be called from within a Tokio
    /// runtime; the returned handle can be aborted to stop the cadence.
    pub fn spawn_flush(&self) -> JoinHandle<()> {
        self.spawn_flush_every(TELEMETRY_FLUSH_INTERVAL)
    }

    /// As [`Self::spawn_flush`], but with an explicit cadence — used by
    /// tests to avoid waiting out the full production interval.
    pub fn spawn_flush_every(&self, interval: Duration) -> JoinHandle<()> {
        let ring = Arc::clone(&self.ring);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if ring.has_pending() {
                    ring.notify.notify_one();
                }
            }
        })
    }

    /// Waits for the next flush tick that has at least one buffered line,
    /// then returns the oldest one. Lines released by the same tick are
    /// handed out one at a time by subsequent calls before this waits on
    /// another tick.
    pub async fn recv(&mut self) -> String {
        loop {
            if let Some(line) = self.buffered.pop_front() {
                return line;
            }
            self.ring.notify.notified().await;
            self.buffered = self.ring.drain();
        }
    }

    /// Non-blocking: returns a line already released by the last flush
    /// tick, if any, without waiting for the next one.
    pub fn try_recv(&mut self) -> Option<String> {
        self.buffered.pop_front()
    }
}
