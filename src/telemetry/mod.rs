//! Diagnostics telemetry collector and helpers.
//!
//! The collector multiplexes gesture, input-rejection and control events into
//! a bounded history plus a broadcast stream. Publishing never blocks the
//! frame loop: with no subscribers the broadcast send is simply dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

use crate::analysis::{GestureEvent, GestureKind};
use crate::error::{ConfigError, ErrorCode};

pub mod events;

pub use events::MetricEvent;

/// Global telemetry hub shared across the crate.
static HUB: Lazy<TelemetryHub> = Lazy::new(TelemetryHub::default);

/// Access the global telemetry hub.
pub fn hub() -> &'static TelemetryHub {
    &HUB
}

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of metrics.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if self.history_capacity > 0 {
            let mut history = lock_recover(&self.history);
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = lock_recover(&self.history);
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Top-level hub wrapping the collector plus per-gesture counters.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    gesture_counts: Mutex<HashMap<GestureKind, u64>>,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            gesture_counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.collector.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.collector.subscribe()
    }

    pub fn record_gesture(&self, event: &GestureEvent) {
        *lock_recover(&self.gesture_counts)
            .entry(event.kind)
            .or_insert(0) += 1;

        self.collector.publish(MetricEvent::Gesture {
            kind: event.kind,
            phase: event.phase,
            timestamp_ms: event.timestamp_ms,
        });
    }

    /// Number of events recorded per gesture kind, all phases included
    pub fn gesture_counts(&self) -> HashMap<GestureKind, u64> {
        lock_recover(&self.gesture_counts).clone()
    }

    pub fn record_rejected_sample(&self, timestamp_ms: u64, total_rejected: u64) {
        self.collector.publish(MetricEvent::SampleRejected {
            timestamp_ms,
            total_rejected,
        });
    }

    pub fn record_recalibration(&self) {
        self.collector.publish(MetricEvent::Recalibrated {
            timestamp_ms: now_timestamp_ms(),
        });
    }

    pub fn record_reconfigured(&self) {
        self.collector.publish(MetricEvent::Reconfigured {
            timestamp_ms: now_timestamp_ms(),
        });
    }

    pub fn record_config_rejected(&self, err: &ConfigError) {
        self.collector.publish(MetricEvent::ConfigRejected {
            code: err.code(),
            message: err.message(),
        });
    }

    pub fn record_tracking(&self, active: bool) {
        self.collector.publish(MetricEvent::TrackingToggled {
            active,
            timestamp_ms: now_timestamp_ms(),
        });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

// Telemetry must keep flowing after a panicked publisher.
fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::GesturePhase;

    #[test]
    fn collector_preserves_order_within_history() {
        let collector = TelemetryCollector::new(8, 3);
        collector.publish(MetricEvent::Recalibrated { timestamp_ms: 1 });
        collector.publish(MetricEvent::SampleRejected {
            timestamp_ms: 2,
            total_rejected: 1,
        });
        collector.publish(MetricEvent::TrackingToggled {
            active: false,
            timestamp_ms: 3,
        });

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 3);
        assert_eq!(snapshot.recent[0], MetricEvent::Recalibrated { timestamp_ms: 1 });
        assert!(matches!(
            snapshot.recent[2],
            MetricEvent::TrackingToggled { active: false, .. }
        ));
    }

    #[test]
    fn collector_drops_history_when_full() {
        let collector = TelemetryCollector::new(8, 2);
        for t in 0..3 {
            collector.publish(MetricEvent::Reconfigured { timestamp_ms: t });
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.total_events, 3);
        assert_eq!(snapshot.dropped_events, 1);
        assert_eq!(snapshot.recent[0], MetricEvent::Reconfigured { timestamp_ms: 1 });
    }

    #[test]
    fn subscribers_receive_published_events() {
        let collector = TelemetryCollector::new(8, 8);
        let mut rx = collector.subscribe();
        collector.publish(MetricEvent::Recalibrated { timestamp_ms: 5 });

        assert_eq!(
            rx.try_recv().unwrap(),
            MetricEvent::Recalibrated { timestamp_ms: 5 }
        );
    }

    #[test]
    fn hub_counts_gestures_per_kind() {
        let hub = TelemetryHub::new(8, 8);
        hub.record_gesture(&GestureEvent::fired(GestureKind::NodLeft, 10));
        hub.record_gesture(&GestureEvent::fired(GestureKind::NodLeft, 20));
        hub.record_gesture(&GestureEvent::new(
            GestureKind::HoldDown,
            GesturePhase::HoldStart,
            30,
        ));

        let counts = hub.gesture_counts();
        assert_eq!(counts.get(&GestureKind::NodLeft), Some(&2));
        assert_eq!(counts.get(&GestureKind::HoldDown), Some(&1));
        assert_eq!(counts.get(&GestureKind::Fist), None);
        assert_eq!(hub.snapshot().total_events, 3);
    }

    #[test]
    fn hub_reports_config_rejection_code() {
        let hub = TelemetryHub::new(8, 8);
        hub.record_config_rejected(&ConfigError::InvalidWindow {
            field: "smoothing_window",
            value: 0,
        });

        let snapshot = hub.snapshot();
        assert!(matches!(
            &snapshot.recent[0],
            MetricEvent::ConfigRejected { code: 3003, .. }
        ));
    }

    #[test]
    fn metric_event_serializes_with_type_tag() {
        let json = serde_json::to_value(MetricEvent::Gesture {
            kind: GestureKind::SwipeLeft,
            phase: GesturePhase::Fired,
            timestamp_ms: 7,
        })
        .unwrap();
        assert_eq!(json["type"], "gesture");
        assert_eq!(json["payload"]["kind"], "swipe_left");
    }
}
