// Calibrator - neutral head pose and baseline-relative angles
//
// The first observed sample becomes the neutral pose, so tracking works
// without an explicit calibration step. With a warm-up of N frames the
// baseline is refined to the running mean of the first N samples after
// (re)initialisation, which absorbs jitter in the very first frame.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Neutral head pose in raw degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBaseline {
    pub pitch0: f64,
    pub yaw0: f64,
}

/// Converts raw head angles into baseline-relative angles
#[derive(Debug, Clone)]
pub struct Calibrator {
    baseline: Option<CalibrationBaseline>,
    warmup_frames: u32,
    warmup_seen: u32,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calibrator {
    /// Calibrator that takes the first sample as the baseline
    pub fn new() -> Self {
        Self::with_warmup(1)
    }

    /// Calibrator averaging the first `frames` samples (minimum 1)
    pub fn with_warmup(frames: u32) -> Self {
        Self {
            baseline: None,
            warmup_frames: frames.max(1),
            warmup_seen: 0,
        }
    }

    /// Change the warm-up length for future (re)initialisations
    pub fn set_warmup_frames(&mut self, frames: u32) {
        self.warmup_frames = frames.max(1);
    }

    /// Convert a raw sample to relative angles, initialising on first use
    pub fn observe(&mut self, raw_pitch: f64, raw_yaw: f64) -> (f64, f64) {
        match self.baseline.as_mut() {
            None => {
                self.baseline = Some(CalibrationBaseline {
                    pitch0: raw_pitch,
                    yaw0: raw_yaw,
                });
                self.warmup_seen = 1;
                info!(
                    "[Calibrator] Baseline initialised: pitch={:.1}, yaw={:.1}",
                    raw_pitch, raw_yaw
                );
                return (0.0, 0.0);
            }
            Some(baseline) if self.warmup_seen < self.warmup_frames => {
                self.warmup_seen += 1;
                let n = self.warmup_seen as f64;
                baseline.pitch0 += (raw_pitch - baseline.pitch0) / n;
                baseline.yaw0 += (raw_yaw - baseline.yaw0) / n;
                if self.warmup_seen == self.warmup_frames {
                    info!(
                        "[Calibrator] Warm-up complete: pitch={:.1}, yaw={:.1}",
                        baseline.pitch0, baseline.yaw0
                    );
                }
            }
            Some(_) => {}
        }

        match self.baseline {
            Some(b) => (raw_pitch - b.pitch0, raw_yaw - b.yaw0),
            None => (0.0, 0.0),
        }
    }

    /// Overwrite the baseline with the given raw angles
    pub fn recalibrate(&mut self, raw_pitch: f64, raw_yaw: f64) {
        self.baseline = Some(CalibrationBaseline {
            pitch0: raw_pitch,
            yaw0: raw_yaw,
        });
        self.warmup_seen = self.warmup_frames;
        info!(
            "[Calibrator] Baseline set: pitch={:.1}, yaw={:.1}",
            raw_pitch, raw_yaw
        );
    }

    /// Forget the baseline; the next observed sample becomes neutral
    pub fn reset(&mut self) {
        self.baseline = None;
        self.warmup_seen = 0;
    }

    pub fn baseline(&self) -> Option<CalibrationBaseline> {
        self.baseline
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn is_warming_up(&self) -> bool {
        self.baseline.is_some() && self.warmup_seen < self.warmup_frames
    }
}
