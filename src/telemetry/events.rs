//! Telemetry event types describing engine activity exposed to the CLI and
//! any host-side diagnostics stream.

use serde::{Deserialize, Serialize};

use crate::analysis::{GestureKind, GesturePhase};

/// Metric events covering emitted gestures, rejected input and control changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    Gesture {
        kind: GestureKind,
        phase: GesturePhase,
        timestamp_ms: u64,
    },
    SampleRejected {
        timestamp_ms: u64,
        total_rejected: u64,
    },
    Recalibrated {
        timestamp_ms: u64,
    },
    Reconfigured {
        timestamp_ms: u64,
    },
    ConfigRejected {
        code: i32,
        message: String,
    },
    TrackingToggled {
        active: bool,
        timestamp_ms: u64,
    },
}
