// HandGestureDetector - fist and swipe-left recognition
//
// Fist is edge-triggered: it fires once the fist shape has persisted for the
// debounce frame count and rearms as soon as any other shape is seen, which
// rejects single-frame misclassifications.
//
// Swipe-left tracks the hand centroid only while the palm is open. The first
// open-palm sample anchors the track; the swipe fires once the hand has moved
// left by the distance threshold within the time window. When the window
// elapses first, the track re-anchors at the current position, so slow drift
// never accumulates enough travel while a palm that rested before moving can
// still swipe. After firing, the track is spent until the palm streak ends.
//
// Fist and swipe share one cooldown: a gesture completed within it of the
// last emitted hand gesture is consumed without firing.

use tracing::debug;

use super::events::{EventBatch, GestureEvent, GestureKind};
use super::pose::HandShape;

/// Validated hand-gesture tunables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandTuning {
    /// Consecutive fist samples required before firing
    pub fist_debounce_frames: u32,
    /// Leftward travel required, as a fraction of frame width
    pub swipe_threshold: f64,
    /// Time allowed for the travel
    pub swipe_max_ms: u64,
    /// Quiet period after a fist or swipe (0 = none)
    pub cooldown_ms: u64,
}

/// Swipe tracking state for the current open-palm streak
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwipeTrack {
    /// No open palm in view
    Idle,
    /// Anchored at the first open-palm sample, or re-anchored when the
    /// window elapsed
    Tracking { start_x: f64, start_ms: u64 },
    /// Swipe fired; waits for the streak to end
    Spent,
}

#[derive(Debug, Clone)]
pub struct HandGestureDetector {
    previous_shape: HandShape,
    fist_streak: u32,
    fist_fired: bool,
    swipe: SwipeTrack,
    last_fired_ms: Option<u64>,
}

impl Default for HandGestureDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl HandGestureDetector {
    pub fn new() -> Self {
        Self {
            previous_shape: HandShape::None,
            fist_streak: 0,
            fist_fired: false,
            swipe: SwipeTrack::Idle,
            last_fired_ms: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn previous_shape(&self) -> HandShape {
        self.previous_shape
    }

    pub fn swipe_track(&self) -> SwipeTrack {
        self.swipe
    }

    fn cooling_down(&self, now_ms: u64, tuning: &HandTuning) -> bool {
        self.last_fired_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < tuning.cooldown_ms)
    }

    /// Emit `kind` unless the shared cooldown is running; either way the
    /// gesture is consumed
    fn fire(
        &mut self,
        kind: GestureKind,
        now_ms: u64,
        tuning: &HandTuning,
        out: &mut EventBatch,
    ) {
        if self.cooling_down(now_ms, tuning) {
            debug!(
                "[HandDetector] {} at {}ms suppressed by cooldown",
                kind.as_str(),
                now_ms
            );
            return;
        }
        out.push(GestureEvent::fired(kind, now_ms));
        self.last_fired_ms = Some(now_ms);
    }

    /// Feed one hand observation
    pub fn update(
        &mut self,
        shape: HandShape,
        hand_x: Option<f64>,
        now_ms: u64,
        tuning: &HandTuning,
        out: &mut EventBatch,
    ) {
        self.update_fist(shape, now_ms, tuning, out);
        self.update_swipe(shape, hand_x, now_ms, tuning, out);
        self.previous_shape = shape;
    }

    fn update_fist(
        &mut self,
        shape: HandShape,
        now_ms: u64,
        tuning: &HandTuning,
        out: &mut EventBatch,
    ) {
        if shape != HandShape::Fist {
            self.fist_streak = 0;
            self.fist_fired = false;
            return;
        }

        self.fist_streak = self.fist_streak.saturating_add(1);
        if !self.fist_fired && self.fist_streak >= tuning.fist_debounce_frames.max(1) {
            self.fist_fired = true;
            self.fire(GestureKind::Fist, now_ms, tuning, out);
        }
    }

    fn update_swipe(
        &mut self,
        shape: HandShape,
        hand_x: Option<f64>,
        now_ms: u64,
        tuning: &HandTuning,
        out: &mut EventBatch,
    ) {
        if shape != HandShape::OpenPalm {
            if let SwipeTrack::Tracking { .. } = self.swipe {
                debug!("[HandDetector] Palm streak ended without a swipe");
            }
            self.swipe = SwipeTrack::Idle;
            return;
        }

        let Some(x) = hand_x else {
            return;
        };

        match self.swipe {
            SwipeTrack::Idle => {
                self.swipe = SwipeTrack::Tracking {
                    start_x: x,
                    start_ms: now_ms,
                };
            }
            SwipeTrack::Tracking { start_x, start_ms } => {
                let elapsed = now_ms.saturating_sub(start_ms);
                if elapsed > tuning.swipe_max_ms {
                    debug!(
                        "[HandDetector] Swipe window elapsed after {}ms (travel {:.3}), re-anchoring",
                        elapsed,
                        start_x - x
                    );
                    self.swipe = SwipeTrack::Tracking {
                        start_x: x,
                        start_ms: now_ms,
                    };
                } else if start_x - x >= tuning.swipe_threshold {
                    self.swipe = SwipeTrack::Spent;
                    self.fire(GestureKind::SwipeLeft, now_ms, tuning, out);
                }
            }
            SwipeTrack::Spent => {}
        }
    }
}
