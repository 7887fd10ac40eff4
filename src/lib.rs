// Gesture Control Core - head and hand gesture recognition
// Turns per-frame pose samples into nod, hold, fist and swipe events

// Module declarations
pub mod analysis;
pub mod bindings;
pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod ipc;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::{EventBatch, GestureEvent, GestureKind, GesturePhase, HandShape, PoseSample};
pub use bindings::{Action, GestureBindings};
pub use config::{AppConfig, DetectionConfig, MediapipeConfig};
pub use engine::{EngineHandle, GestureEngine};
pub use error::{ConfigError, EngineError};
pub use ipc::{ControlCommand, WireMessage};
