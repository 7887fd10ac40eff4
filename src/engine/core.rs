//! GestureEngine: the single-threaded recognition core.
//!
//! One `tick` per camera frame runs the fixed pipeline
//! calibrate -> smooth -> pitch axis -> yaw axis -> hand and returns the
//! emitted events in that order. All per-frame state lives in fixed-size
//! buffers allocated at construction, so `tick` does constant work and never
//! allocates. Thread-safe access goes through `EngineHandle`.

use tracing::{debug, info};

use crate::analysis::{
    Axis, AxisGestureDetector, AxisState, AxisThresholds, EventBatch, HandGestureDetector,
    HandTuning, PoseSample, Smoother,
};
use crate::calibration::{CalibrationBaseline, Calibrator};
use crate::config::{secs_to_ms, DetectionConfig};
use crate::error::{log_config_error, ConfigError};

/// Validated, engine-ready form of `DetectionConfig`
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub pitch: AxisThresholds,
    pub yaw: AxisThresholds,
    pub hand: HandTuning,
    pub smoothing_window: usize,
    pub calibration_frames: u32,
    /// Passed through for the action dispatcher
    pub scroll_amount: u32,
}

impl EngineSettings {
    /// Validate a config and convert its timings to milliseconds
    pub fn from_config(config: &DetectionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let axis = |threshold: f64| AxisThresholds {
            threshold,
            hysteresis_ratio: config.hysteresis_ratio,
            nod_max_ms: secs_to_ms(config.nod_max_time),
            hold_min_ms: secs_to_ms(config.hold_min_time),
            repeat_interval_ms: secs_to_ms(config.scroll_cooldown),
            nod_cooldown_ms: secs_to_ms(config.cooldown_time),
        };

        Ok(Self {
            pitch: axis(config.pitch_threshold),
            yaw: axis(config.yaw_threshold),
            hand: HandTuning {
                fist_debounce_frames: config.fist_debounce_frames,
                swipe_threshold: config.swipe_threshold,
                swipe_max_ms: secs_to_ms(config.swipe_max_time),
                cooldown_ms: secs_to_ms(config.hand_cooldown),
            },
            smoothing_window: config.smoothing_window,
            calibration_frames: config.calibration_frames,
            scroll_amount: config.scroll_amount,
        })
    }
}

/// Stateful gesture classifier over a stream of pose samples
#[derive(Debug, Clone)]
pub struct GestureEngine {
    settings: EngineSettings,
    calibrator: Calibrator,
    pitch_smoother: Smoother,
    yaw_smoother: Smoother,
    pitch_axis: AxisGestureDetector,
    yaw_axis: AxisGestureDetector,
    hand: HandGestureDetector,
    last_smoothed: Option<(f64, f64)>,
    rejected_samples: u64,
}

impl GestureEngine {
    /// Build an engine from a detection config
    ///
    /// # Errors
    /// Returns the first validation failure; no engine is created.
    pub fn new(config: &DetectionConfig) -> Result<Self, ConfigError> {
        let settings = EngineSettings::from_config(config).inspect_err(|err| {
            log_config_error(err, "GestureEngine::new");
        })?;
        Ok(Self::from_settings(settings))
    }

    /// Build an engine from already-validated settings
    pub fn from_settings(settings: EngineSettings) -> Self {
        Self {
            calibrator: Calibrator::with_warmup(settings.calibration_frames),
            pitch_smoother: Smoother::new(settings.smoothing_window),
            yaw_smoother: Smoother::new(settings.smoothing_window),
            pitch_axis: AxisGestureDetector::new(Axis::Pitch),
            yaw_axis: AxisGestureDetector::new(Axis::Yaw),
            hand: HandGestureDetector::new(),
            last_smoothed: None,
            rejected_samples: 0,
            settings,
        }
    }

    /// Process one pose sample and return the gestures it completed
    ///
    /// A sample with a non-finite head angle is rejected: nothing enters the
    /// smoothing windows, no detector advances and no event is emitted.
    pub fn tick(&mut self, sample: &PoseSample) -> EventBatch {
        let mut events = EventBatch::new();

        if !sample.has_valid_angles() {
            self.rejected_samples += 1;
            debug!(
                "[GestureEngine] Rejected sample at {}ms: pitch={}, yaw={}",
                sample.timestamp_ms, sample.pitch_deg, sample.yaw_deg
            );
            return events;
        }

        let now_ms = sample.timestamp_ms;
        let (rel_pitch, rel_yaw) = self.calibrator.observe(sample.pitch_deg, sample.yaw_deg);
        let pitch = self.pitch_smoother.push(rel_pitch);
        let yaw = self.yaw_smoother.push(rel_yaw);
        self.last_smoothed = Some((pitch, yaw));

        self.pitch_axis
            .update(pitch, now_ms, &self.settings.pitch, &mut events);
        self.yaw_axis
            .update(yaw, now_ms, &self.settings.yaw, &mut events);
        self.hand.update(
            sample.hand_shape,
            sample.valid_hand_x(),
            now_ms,
            &self.settings.hand,
            &mut events,
        );

        for event in &events {
            debug!(
                "[GestureEngine] {} {:?} at {}ms",
                event.kind.as_str(),
                event.phase,
                event.timestamp_ms
            );
        }

        events
    }

    /// Replace thresholds and timings, effective from the next tick
    ///
    /// In-flight excursions are kept and judged against the new values.
    ///
    /// # Errors
    /// Returns the validation failure and keeps the current settings.
    pub fn reconfigure(&mut self, config: &DetectionConfig) -> Result<(), ConfigError> {
        let settings = EngineSettings::from_config(config).inspect_err(|err| {
            log_config_error(err, "GestureEngine::reconfigure");
        })?;

        if settings.smoothing_window != self.settings.smoothing_window {
            self.pitch_smoother.resize(settings.smoothing_window);
            self.yaw_smoother.resize(settings.smoothing_window);
        }
        self.calibrator
            .set_warmup_frames(settings.calibration_frames);
        self.settings = settings;

        info!("[GestureEngine] Reconfigured: {:?}", self.settings);
        Ok(())
    }

    /// Recenter: the next sample becomes the neutral pose
    ///
    /// Any excursion in progress is dropped without emitting a nod or
    /// hold end, since the relative-angle frame changes discontinuously.
    pub fn recalibrate(&mut self) {
        self.calibrator.reset();
        self.reset_head_tracking();
        info!("[GestureEngine] Recalibration requested; next sample is neutral");
    }

    /// Recenter on an explicit raw pose
    pub fn recalibrate_to(&mut self, raw_pitch: f64, raw_yaw: f64) {
        self.calibrator.recalibrate(raw_pitch, raw_yaw);
        self.reset_head_tracking();
    }

    fn reset_head_tracking(&mut self) {
        self.pitch_smoother.clear();
        self.yaw_smoother.clear();
        self.pitch_axis.reset();
        self.yaw_axis.reset();
        self.last_smoothed = None;
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn baseline(&self) -> Option<CalibrationBaseline> {
        self.calibrator.baseline()
    }

    pub fn axis_state(&self, axis: Axis) -> AxisState {
        match axis {
            Axis::Pitch => self.pitch_axis.state(),
            Axis::Yaw => self.yaw_axis.state(),
        }
    }

    /// Most recent valid smoothed (pitch, yaw), if any since recalibration
    pub fn last_smoothed(&self) -> Option<(f64, f64)> {
        self.last_smoothed
    }

    /// Samples dropped for non-finite angles
    pub fn rejected_samples(&self) -> u64 {
        self.rejected_samples
    }
}
