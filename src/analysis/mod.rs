// Analysis module - per-frame pose analysis pipeline
//
// Components, leaves first:
// - pose: PoseSample handed over by the vision pipeline
// - smoother: rolling mean per axis
// - axis: nod/hold state machine (one instance per head axis)
// - hand: fist and swipe-left detection
// - events: GestureEvent values and the inline EventBatch
//
// The engine module wires these together behind GestureEngine::tick.

pub mod axis;
pub mod events;
pub mod hand;
pub mod pose;
pub mod smoother;

pub use axis::{Axis, AxisGestureDetector, AxisState, AxisThresholds, Direction};
pub use events::{EventBatch, GestureEvent, GestureKind, GesturePhase, MAX_EVENTS_PER_TICK};
pub use hand::{HandGestureDetector, HandTuning, SwipeTrack};
pub use pose::{HandShape, PoseSample};
pub use smoother::Smoother;
