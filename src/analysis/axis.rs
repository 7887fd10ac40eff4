// AxisGestureDetector - nod/hold state machine for one head axis
//
// The pitch instance reports up/down, the yaw instance right/left. A nod and
// a hold are told apart purely by how long the smoothed angle stays past the
// threshold:
//
//   Neutral --(|v| >= threshold)--> Above(d)
//   Above(d) --(|v| < threshold * (1 - hysteresis))--> Neutral
//
// Leaving Above(d) emits Nod(d) when no hold fired and the excursion lasted
// at most nod_max, HoldEnd(d) when a hold fired, and nothing otherwise. While
// in Above(d), HoldStart fires once elapsed >= hold_min, then HoldRepeat on
// every later tick (rate-limited by the repeat interval). A single excursion
// therefore yields one Nod or a run of Hold events, never both. A nod that
// completes within the nod cooldown of the previous one on the same axis is
// dropped; holds are not affected.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::events::{EventBatch, GestureEvent, GestureKind, GesturePhase};

/// Head rotation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Pitch,
    Yaw,
}

/// Side of neutral an excursion went to (positive = up/right)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn of(value: f64) -> Self {
        if value < 0.0 {
            Direction::Negative
        } else {
            Direction::Positive
        }
    }
}

/// Validated per-axis thresholds and timings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisThresholds {
    /// Entry threshold in degrees
    pub threshold: f64,
    /// Fraction of the threshold forming the exit band
    pub hysteresis_ratio: f64,
    pub nod_max_ms: u64,
    pub hold_min_ms: u64,
    /// Minimum spacing between HoldRepeat events (0 = every tick)
    pub repeat_interval_ms: u64,
    /// Quiet period after a nod on this axis (0 = none)
    pub nod_cooldown_ms: u64,
}

impl AxisThresholds {
    /// Magnitude below which an excursion is over
    pub fn exit_level(&self) -> f64 {
        self.threshold * (1.0 - self.hysteresis_ratio)
    }
}

/// Detector state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisState {
    Neutral,
    Above {
        direction: Direction,
        since_ms: u64,
        fired_hold: bool,
        last_repeat_ms: u64,
    },
}

/// Nod/hold detector for one axis
#[derive(Debug, Clone)]
pub struct AxisGestureDetector {
    axis: Axis,
    state: AxisState,
    last_nod_ms: Option<u64>,
}

impl AxisGestureDetector {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            state: AxisState::Neutral,
            last_nod_ms: None,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn state(&self) -> AxisState {
        self.state
    }

    /// Force the detector back to Neutral without emitting anything
    pub fn reset(&mut self) {
        self.state = AxisState::Neutral;
        self.last_nod_ms = None;
    }

    /// Feed one smoothed relative angle
    pub fn update(
        &mut self,
        smoothed: f64,
        now_ms: u64,
        thresholds: &AxisThresholds,
        out: &mut EventBatch,
    ) {
        if let AxisState::Above { direction, .. } = self.state {
            let magnitude = smoothed.abs();
            let returned = magnitude < thresholds.exit_level();
            // Swung to the other side without passing back through the band.
            let flipped =
                Direction::of(smoothed) != direction && magnitude >= thresholds.exit_level();
            if returned || flipped {
                self.exit(now_ms, thresholds, out);
            }
        }

        if self.state == AxisState::Neutral && smoothed.abs() >= thresholds.threshold {
            self.enter(Direction::of(smoothed), now_ms);
        }

        self.advance_hold(now_ms, thresholds, out);
    }

    fn enter(&mut self, direction: Direction, now_ms: u64) {
        debug!(
            "[AxisDetector] {:?} entered {:?} at {}ms",
            self.axis, direction, now_ms
        );
        self.state = AxisState::Above {
            direction,
            since_ms: now_ms,
            fired_hold: false,
            last_repeat_ms: now_ms,
        };
    }

    fn exit(&mut self, now_ms: u64, thresholds: &AxisThresholds, out: &mut EventBatch) {
        if let AxisState::Above {
            direction,
            since_ms,
            fired_hold,
            ..
        } = self.state
        {
            let elapsed = now_ms.saturating_sub(since_ms);
            if fired_hold {
                out.push(GestureEvent::new(
                    GestureKind::hold(self.axis, direction),
                    GesturePhase::HoldEnd,
                    now_ms,
                ));
            } else if elapsed <= thresholds.nod_max_ms {
                let cooling = self.last_nod_ms.is_some_and(|last| {
                    now_ms.saturating_sub(last) < thresholds.nod_cooldown_ms
                });
                if cooling {
                    debug!(
                        "[AxisDetector] {:?} nod at {}ms suppressed by cooldown",
                        self.axis, now_ms
                    );
                } else {
                    out.push(GestureEvent::fired(
                        GestureKind::nod(self.axis, direction),
                        now_ms,
                    ));
                    self.last_nod_ms = Some(now_ms);
                }
            } else {
                debug!(
                    "[AxisDetector] {:?} excursion of {}ms too slow for a nod",
                    self.axis, elapsed
                );
            }
        }
        self.state = AxisState::Neutral;
    }

    fn advance_hold(&mut self, now_ms: u64, thresholds: &AxisThresholds, out: &mut EventBatch) {
        let axis = self.axis;
        if let AxisState::Above {
            direction,
            since_ms,
            fired_hold,
            last_repeat_ms,
        } = &mut self.state
        {
            let kind = GestureKind::hold(axis, *direction);
            if !*fired_hold {
                if now_ms.saturating_sub(*since_ms) >= thresholds.hold_min_ms {
                    out.push(GestureEvent::new(kind, GesturePhase::HoldStart, now_ms));
                    *fired_hold = true;
                    *last_repeat_ms = now_ms;
                }
            } else if now_ms.saturating_sub(*last_repeat_ms) >= thresholds.repeat_interval_ms {
                out.push(GestureEvent::new(kind, GesturePhase::HoldRepeat, now_ms));
                *last_repeat_ms = now_ms;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK_MS: u64 = 33;

    fn thresholds() -> AxisThresholds {
        AxisThresholds {
            threshold: 20.0,
            hysteresis_ratio: 0.15,
            nod_max_ms: 1000,
            hold_min_ms: 1000,
            repeat_interval_ms: 0,
            nod_cooldown_ms: 0,
        }
    }

    /// Drive the detector with (timestamp, value) pairs and collect events
    fn run(
        detector: &mut AxisGestureDetector,
        th: &AxisThresholds,
        input: &[(u64, f64)],
    ) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        for &(t, v) in input {
            let mut batch = EventBatch::new();
            detector.update(v, t, th, &mut batch);
            events.extend(batch);
        }
        events
    }

    fn count(events: &[GestureEvent], kind: GestureKind, phase: GesturePhase) -> usize {
        events
            .iter()
            .filter(|e| e.kind == kind && e.phase == phase)
            .count()
    }

    #[test]
    fn test_below_threshold_never_emits() {
        let th = thresholds();
        let mut detector = AxisGestureDetector::new(Axis::Pitch);
        let input: Vec<_> = (0..200)
            .map(|i| (i * TICK_MS, 19.99 * ((i as f64) * 0.3).sin()))
            .collect();
        assert!(run(&mut detector, &th, &input).is_empty());
        assert_eq!(detector.state(), AxisState::Neutral);
    }

    #[test]
    fn test_quick_excursion_is_a_nod() {
        let th = thresholds();
        let mut detector = AxisGestureDetector::new(Axis::Yaw);
        let events = run(&mut detector, &th, &[(0, 0.0), (100, 25.0), (600, 0.0)]);
        assert_eq!(events, vec![GestureEvent::fired(GestureKind::NodRight, 600)]);

        let events = run(&mut detector, &th, &[(1000, -25.0), (1500, 0.0)]);
        assert_eq!(events, vec![GestureEvent::fired(GestureKind::NodLeft, 1500)]);
    }

    #[test]
    fn test_sustained_excursion_is_a_hold() {
        let th = thresholds();
        let mut detector = AxisGestureDetector::new(Axis::Pitch);
        let mut input: Vec<_> = (0..=33).map(|i| (i * TICK_MS, -25.0)).collect();
        input.push((34 * TICK_MS, 0.0));

        let events = run(&mut detector, &th, &input);
        assert_eq!(count(&events, GestureKind::HoldDown, GesturePhase::HoldStart), 1);
        assert!(count(&events, GestureKind::HoldDown, GesturePhase::HoldRepeat) >= 2);
        assert_eq!(count(&events, GestureKind::HoldDown, GesturePhase::HoldEnd), 1);
        assert!(events.iter().all(|e| !e.kind.is_nod()));
        assert_eq!(events.first().map(|e| e.phase), Some(GesturePhase::HoldStart));
        assert_eq!(events.last().map(|e| e.phase), Some(GesturePhase::HoldEnd));
    }

    #[test]
    fn test_slow_excursion_without_hold_is_silent() {
        let mut th = thresholds();
        th.nod_max_ms = 500;
        th.hold_min_ms = 2000;
        let mut detector = AxisGestureDetector::new(Axis::Yaw);
        let events = run(&mut detector, &th, &[(0, 30.0), (800, 30.0), (1200, 0.0)]);
        assert!(events.is_empty());
        assert_eq!(detector.state(), AxisState::Neutral);
    }

    #[test]
    fn test_hold_suppresses_nod_when_hold_is_shorter() {
        let mut th = thresholds();
        th.hold_min_ms = 300;
        th.nod_max_ms = 1000;
        let mut detector = AxisGestureDetector::new(Axis::Pitch);
        let events = run(&mut detector, &th, &[(0, 25.0), (350, 25.0), (600, 0.0)]);
        assert_eq!(
            events,
            vec![
                GestureEvent::new(GestureKind::HoldUp, GesturePhase::HoldStart, 350),
                GestureEvent::new(GestureKind::HoldUp, GesturePhase::HoldEnd, 600),
            ]
        );
    }

    #[test]
    fn test_hysteresis_prevents_chatter() {
        let th = thresholds();
        let mut detector = AxisGestureDetector::new(Axis::Yaw);
        let input: Vec<_> = (0..30)
            .map(|i| {
                let v = if i % 2 == 0 { 20.1 } else { 19.9 };
                (i * TICK_MS, v)
            })
            .collect();
        let events = run(&mut detector, &th, &input);
        assert!(events.is_empty());
        assert!(matches!(
            detector.state(),
            AxisState::Above {
                direction: Direction::Positive,
                ..
            }
        ));

        // Dropping below the exit band ends the excursion exactly once.
        let events = run(&mut detector, &th, &[(990, 16.9), (1023, 16.0)]);
        assert_eq!(events, vec![GestureEvent::fired(GestureKind::NodRight, 990)]);
        assert_eq!(detector.state(), AxisState::Neutral);
    }

    #[test]
    fn test_direction_flip_exits_and_reenters() {
        let th = thresholds();
        let mut detector = AxisGestureDetector::new(Axis::Pitch);
        let events = run(&mut detector, &th, &[(0, 25.0), (200, -25.0), (400, 0.0)]);
        assert_eq!(
            events,
            vec![
                GestureEvent::fired(GestureKind::NodUp, 200),
                GestureEvent::fired(GestureKind::NodDown, 400),
            ]
        );
    }

    #[test]
    fn test_small_opposite_swing_is_a_plain_return() {
        let th = thresholds();
        let mut detector = AxisGestureDetector::new(Axis::Pitch);
        let events = run(&mut detector, &th, &[(0, 25.0), (100, -5.0), (200, -5.0)]);
        assert_eq!(events, vec![GestureEvent::fired(GestureKind::NodUp, 100)]);
        assert_eq!(detector.state(), AxisState::Neutral);
    }

    #[test]
    fn test_direction_flip_ends_hold() {
        let mut th = thresholds();
        th.hold_min_ms = 100;
        let mut detector = AxisGestureDetector::new(Axis::Yaw);
        let events = run(&mut detector, &th, &[(0, -30.0), (150, -30.0), (200, 30.0)]);
        assert_eq!(
            events,
            vec![
                GestureEvent::new(GestureKind::HoldLeft, GesturePhase::HoldStart, 150),
                GestureEvent::new(GestureKind::HoldLeft, GesturePhase::HoldEnd, 200),
            ]
        );
        assert!(matches!(
            detector.state(),
            AxisState::Above {
                direction: Direction::Positive,
                since_ms: 200,
                fired_hold: false,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_hold_time_starts_on_entry() {
        let mut th = thresholds();
        th.hold_min_ms = 0;
        let mut detector = AxisGestureDetector::new(Axis::Pitch);
        let events = run(&mut detector, &th, &[(0, 25.0), (33, 25.0)]);
        assert_eq!(
            events,
            vec![
                GestureEvent::new(GestureKind::HoldUp, GesturePhase::HoldStart, 0),
                GestureEvent::new(GestureKind::HoldUp, GesturePhase::HoldRepeat, 33),
            ]
        );
    }

    #[test]
    fn test_repeat_interval_throttles_repeats() {
        let mut th = thresholds();
        th.hold_min_ms = 0;
        th.repeat_interval_ms = 100;
        let mut detector = AxisGestureDetector::new(Axis::Pitch);
        let input: Vec<_> = (0..10).map(|i| (i * 40, 25.0)).collect();
        let events = run(&mut detector, &th, &input);
        let repeats: Vec<u64> = events
            .iter()
            .filter(|e| e.phase == GesturePhase::HoldRepeat)
            .map(|e| e.timestamp_ms)
            .collect();
        assert_eq!(repeats, vec![120, 240, 360]);
    }

    #[test]
    fn test_nod_cooldown_suppresses_second_nod() {
        let mut th = thresholds();
        th.nod_cooldown_ms = 1000;
        let mut detector = AxisGestureDetector::new(Axis::Yaw);
        let events = run(
            &mut detector,
            &th,
            &[
                (0, 25.0),
                (200, 0.0),
                (400, -25.0),
                (600, 0.0),
                (1300, 25.0),
                (1500, 0.0),
            ],
        );
        assert_eq!(
            events,
            vec![
                GestureEvent::fired(GestureKind::NodRight, 200),
                GestureEvent::fired(GestureKind::NodRight, 1500),
            ]
        );
    }

    #[test]
    fn test_nod_cooldown_leaves_holds_alone() {
        let mut th = thresholds();
        th.nod_cooldown_ms = 5000;
        th.hold_min_ms = 300;
        let mut detector = AxisGestureDetector::new(Axis::Pitch);
        let events = run(
            &mut detector,
            &th,
            &[(0, 25.0), (100, 0.0), (200, 25.0), (500, 25.0), (600, 0.0)],
        );
        assert_eq!(
            events,
            vec![
                GestureEvent::fired(GestureKind::NodUp, 100),
                GestureEvent::new(GestureKind::HoldUp, GesturePhase::HoldStart, 500),
                GestureEvent::new(GestureKind::HoldUp, GesturePhase::HoldEnd, 600),
            ]
        );
    }

    #[test]
    fn test_reset_discards_excursion_silently() {
        let th = thresholds();
        let mut detector = AxisGestureDetector::new(Axis::Yaw);
        run(&mut detector, &th, &[(0, 25.0)]);
        detector.reset();
        assert_eq!(detector.state(), AxisState::Neutral);
        let events = run(&mut detector, &th, &[(100, 0.0)]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_clock_regression_is_saturated() {
        let th = thresholds();
        let mut detector = AxisGestureDetector::new(Axis::Yaw);
        let events = run(&mut detector, &th, &[(500, 25.0), (400, 0.0)]);
        assert_eq!(events, vec![GestureEvent::fired(GestureKind::NodRight, 400)]);
    }
}
