// Gesture events - discrete output of the recognition pipeline
//
// Events are plain Copy values. The engine keeps no reference to an event
// once it has been returned from `tick`.

use serde::{Deserialize, Serialize};

use super::axis::{Axis, Direction};

/// Upper bound on events a single tick can produce
///
/// Pitch and yaw can each emit an exit event plus a same-tick re-entry hold
/// start on a direction flip (2 each); the hand detector emits at most one.
pub const MAX_EVENTS_PER_TICK: usize = 8;

/// Gesture identifiers, matching the keys of the host's `gestures` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    NodUp,
    NodDown,
    NodLeft,
    NodRight,
    HoldUp,
    HoldDown,
    HoldLeft,
    HoldRight,
    Fist,
    SwipeLeft,
}

impl GestureKind {
    /// Every gesture key, in table order
    pub const ALL: [GestureKind; 10] = [
        GestureKind::NodRight,
        GestureKind::NodLeft,
        GestureKind::NodUp,
        GestureKind::NodDown,
        GestureKind::HoldDown,
        GestureKind::HoldUp,
        GestureKind::HoldLeft,
        GestureKind::HoldRight,
        GestureKind::Fist,
        GestureKind::SwipeLeft,
    ];

    /// Nod gesture for an axis excursion
    pub fn nod(axis: Axis, direction: Direction) -> Self {
        match (axis, direction) {
            (Axis::Pitch, Direction::Positive) => GestureKind::NodUp,
            (Axis::Pitch, Direction::Negative) => GestureKind::NodDown,
            (Axis::Yaw, Direction::Positive) => GestureKind::NodRight,
            (Axis::Yaw, Direction::Negative) => GestureKind::NodLeft,
        }
    }

    /// Hold gesture for an axis excursion
    pub fn hold(axis: Axis, direction: Direction) -> Self {
        match (axis, direction) {
            (Axis::Pitch, Direction::Positive) => GestureKind::HoldUp,
            (Axis::Pitch, Direction::Negative) => GestureKind::HoldDown,
            (Axis::Yaw, Direction::Positive) => GestureKind::HoldRight,
            (Axis::Yaw, Direction::Negative) => GestureKind::HoldLeft,
        }
    }

    /// Key used in config tables and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::NodUp => "nod_up",
            GestureKind::NodDown => "nod_down",
            GestureKind::NodLeft => "nod_left",
            GestureKind::NodRight => "nod_right",
            GestureKind::HoldUp => "hold_up",
            GestureKind::HoldDown => "hold_down",
            GestureKind::HoldLeft => "hold_left",
            GestureKind::HoldRight => "hold_right",
            GestureKind::Fist => "fist",
            GestureKind::SwipeLeft => "swipe_left",
        }
    }

    /// Head gestures come from the axis detectors, the rest from the hand
    pub fn is_head(&self) -> bool {
        !matches!(self, GestureKind::Fist | GestureKind::SwipeLeft)
    }

    pub fn is_nod(&self) -> bool {
        matches!(
            self,
            GestureKind::NodUp | GestureKind::NodDown | GestureKind::NodLeft | GestureKind::NodRight
        )
    }

    pub fn is_hold(&self) -> bool {
        matches!(
            self,
            GestureKind::HoldUp
                | GestureKind::HoldDown
                | GestureKind::HoldLeft
                | GestureKind::HoldRight
        )
    }
}

/// Lifecycle phase of an emitted gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    /// One-shot gesture (nod, fist, swipe)
    #[default]
    Fired,
    /// Hold threshold reached
    HoldStart,
    /// Hold still active on this tick
    HoldRepeat,
    /// Head returned to neutral after a hold
    HoldEnd,
}

/// A recognized gesture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub phase: GesturePhase,
    /// Timestamp of the sample that produced the event
    pub timestamp_ms: u64,
}

impl GestureEvent {
    pub fn new(kind: GestureKind, phase: GesturePhase, timestamp_ms: u64) -> Self {
        Self {
            kind,
            phase,
            timestamp_ms,
        }
    }

    pub fn fired(kind: GestureKind, timestamp_ms: u64) -> Self {
        Self::new(kind, GesturePhase::Fired, timestamp_ms)
    }
}

/// Fixed-capacity event list returned by a single tick
///
/// Lives inline on the stack so the per-frame path never allocates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EventBatch {
    events: [Option<GestureEvent>; MAX_EVENTS_PER_TICK],
    len: usize,
}

impl EventBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event; returns false (and drops it) when the batch is full
    pub fn push(&mut self, event: GestureEvent) -> bool {
        if self.len == MAX_EVENTS_PER_TICK {
            tracing::warn!("[EventBatch] Dropping {:?}: batch full", event);
            return false;
        }
        self.events[self.len] = Some(event);
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<&GestureEvent> {
        self.events.get(index).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureEvent> {
        self.events[..self.len].iter().flatten()
    }

    pub fn to_vec(&self) -> Vec<GestureEvent> {
        self.iter().copied().collect()
    }
}

impl IntoIterator for EventBatch {
    type Item = GestureEvent;
    type IntoIter = std::iter::Flatten<std::array::IntoIter<Option<GestureEvent>, MAX_EVENTS_PER_TICK>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter().flatten()
    }
}

impl<'a> IntoIterator for &'a EventBatch {
    type Item = &'a GestureEvent;
    type IntoIter = std::iter::Flatten<std::slice::Iter<'a, Option<GestureEvent>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events[..self.len].iter().flatten()
    }
}
