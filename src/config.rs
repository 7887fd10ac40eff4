//! Configuration management for gesture detection tuning
//!
//! This module mirrors the host addon's JSON config file. Every section is
//! `#[serde(default)]`, so a partial file is merged over the defaults, and
//! keys the engine does not consume (shortcuts, behaviour flags) are
//! ignored. Validation is separate from parsing: a config that parses can
//! still be rejected by `validate`, in which case the engine keeps whatever
//! it was running with.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::bindings::GestureBindings;
use crate::error::ConfigError;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub mediapipe: MediapipeConfig,
    pub gestures: GestureBindings,
}

/// Gesture detection thresholds and timings
///
/// Durations are in seconds, angles in degrees, distances as a fraction of
/// frame width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Relative pitch needed to start a vertical excursion
    pub pitch_threshold: f64,
    /// Relative yaw needed to start a horizontal excursion
    pub yaw_threshold: f64,
    /// Longest excursion still reported as a nod
    pub nod_max_time: f64,
    /// Excursion length at which a hold starts
    pub hold_min_time: f64,
    /// Scroll distance per hold repeat (applied by the action dispatcher)
    pub scroll_amount: u32,
    /// Rolling-mean window length in frames
    pub smoothing_window: usize,
    /// Frames averaged into the baseline after (re)calibration
    pub calibration_frames: u32,
    /// Exit band below the threshold, as a fraction of it
    pub hysteresis_ratio: f64,
    /// Minimum spacing between hold repeats (0 = every frame)
    pub scroll_cooldown: f64,
    /// Consecutive fist frames required before `fist` fires
    pub fist_debounce_frames: u32,
    /// Leftward palm travel required for `swipe_left`
    pub swipe_threshold: f64,
    /// Time allowed for the swipe travel
    pub swipe_max_time: f64,
    /// Quiet period after a nod before the same axis can nod again
    pub cooldown_time: f64,
    /// Quiet period after a fist or swipe before another hand gesture
    pub hand_cooldown: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            pitch_threshold: 12.0,
            yaw_threshold: 20.0,
            nod_max_time: 1.0,
            hold_min_time: 1.0,
            scroll_amount: 20,
            smoothing_window: 5,
            calibration_frames: 1,
            hysteresis_ratio: 0.15,
            scroll_cooldown: 0.0,
            fist_debounce_frames: 2,
            // Must exceed the travel a slow (2x window) full-width sweep
            // covers inside one window, i.e. 0.4 of the frame.
            swipe_threshold: 0.5,
            swipe_max_time: 0.5,
            cooldown_time: 0.0,
            hand_cooldown: 0.0,
        }
    }
}

impl DetectionConfig {
    /// Check every field; the first violation is returned
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_threshold("pitch_threshold", self.pitch_threshold)?;
        positive_threshold("yaw_threshold", self.yaw_threshold)?;
        non_negative_duration("nod_max_time", self.nod_max_time)?;
        non_negative_duration("hold_min_time", self.hold_min_time)?;
        non_negative_duration("scroll_cooldown", self.scroll_cooldown)?;
        non_negative_duration("cooldown_time", self.cooldown_time)?;
        non_negative_duration("hand_cooldown", self.hand_cooldown)?;

        if self.smoothing_window == 0 {
            return Err(ConfigError::InvalidWindow {
                field: "smoothing_window",
                value: 0,
            });
        }
        if self.calibration_frames == 0 {
            return Err(ConfigError::InvalidWindow {
                field: "calibration_frames",
                value: 0,
            });
        }
        if self.fist_debounce_frames == 0 {
            return Err(ConfigError::InvalidWindow {
                field: "fist_debounce_frames",
                value: 0,
            });
        }

        if !(self.hysteresis_ratio.is_finite() && (0.0..1.0).contains(&self.hysteresis_ratio)) {
            return Err(ConfigError::InvalidRatio {
                field: "hysteresis_ratio",
                value: self.hysteresis_ratio,
            });
        }
        if !(self.swipe_threshold.is_finite()
            && self.swipe_threshold > 0.0
            && self.swipe_threshold <= 1.0)
        {
            return Err(ConfigError::InvalidRatio {
                field: "swipe_threshold",
                value: self.swipe_threshold,
            });
        }
        if !(self.swipe_max_time.is_finite() && self.swipe_max_time > 0.0) {
            return Err(ConfigError::InvalidDuration {
                field: "swipe_max_time",
                value: self.swipe_max_time,
            });
        }

        Ok(())
    }
}

fn positive_threshold(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { field, value })
    }
}

fn non_negative_duration(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDuration { field, value })
    }
}

/// Convert a validated duration in seconds to whole milliseconds
pub fn secs_to_ms(secs: f64) -> u64 {
    (secs * 1000.0).round().max(0.0) as u64
}

/// Landmark detector settings consumed by the vision pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediapipeConfig {
    pub face_mesh: DetectorConfig,
    pub hands: DetectorConfig,
}

impl Default for MediapipeConfig {
    fn default() -> Self {
        Self {
            face_mesh: DetectorConfig {
                min_detection_confidence: 0.5,
                min_tracking_confidence: 0.5,
            },
            hands: DetectorConfig {
                min_detection_confidence: 0.7,
                min_tracking_confidence: 0.5,
            },
        }
    }
}

impl MediapipeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        confidence("face_mesh.min_detection_confidence", self.face_mesh.min_detection_confidence)?;
        confidence("face_mesh.min_tracking_confidence", self.face_mesh.min_tracking_confidence)?;
        confidence("hands.min_detection_confidence", self.hands.min_detection_confidence)?;
        confidence("hands.min_tracking_confidence", self.hands.min_tracking_confidence)?;
        Ok(())
    }
}

fn confidence(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidConfidence { field, value })
    }
}

/// Confidence floors for one landmark detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file is missing or
    /// does not parse (a warning is logged).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load(&path) {
            Ok(config) => {
                log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                config
            }
            Err(err) => {
                log::warn!(
                    "[Config] Failed to load {:?}: {:#}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from JSON file, reporting read/parse failures
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Validate every section the engine and the vision pipeline consume
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detection.validate()?;
        self.mediapipe.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection.pitch_threshold, 12.0);
        assert_eq!(config.detection.yaw_threshold, 20.0);
        assert_eq!(config.detection.smoothing_window, 5);
        assert_eq!(config.mediapipe.hands.min_detection_confidence, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_merges_over_defaults() {
        let json = r#"{
            "detection": { "pitch_threshold": 15, "scroll_amount": 40 },
            "behavior": { "show_preview": false },
            "shortcuts": { "toggle": "Ctrl+Shift+G" }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.detection.pitch_threshold, 15.0);
        assert_eq!(config.detection.scroll_amount, 40);
        assert_eq!(config.detection.yaw_threshold, 20.0);
        assert_eq!(config.mediapipe, MediapipeConfig::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let mut config = DetectionConfig::default();
        config.pitch_threshold = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold {
                field: "pitch_threshold",
                ..
            })
        ));

        let mut config = DetectionConfig::default();
        config.yaw_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_timings_and_windows() {
        let mut config = DetectionConfig::default();
        config.hold_min_time = -0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                field: "hold_min_time",
                ..
            })
        ));

        let mut config = DetectionConfig::default();
        config.smoothing_window = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindow {
                field: "smoothing_window",
                value: 0
            })
        ));

        let mut config = DetectionConfig::default();
        config.hysteresis_ratio = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRatio { .. })
        ));

        let mut config = DetectionConfig::default();
        config.swipe_max_time = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_cooldowns() {
        let mut config = DetectionConfig::default();
        config.cooldown_time = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                field: "cooldown_time",
                ..
            })
        ));

        let mut config = DetectionConfig::default();
        config.hand_cooldown = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                field: "hand_cooldown",
                ..
            })
        ));
    }

    #[test]
    fn test_cooldowns_parse_from_host_keys() {
        let json = r#"{ "detection": { "cooldown_time": 1.0, "hand_cooldown": 0.5 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.detection.cooldown_time, 1.0);
        assert_eq!(config.detection.hand_cooldown, 0.5);
        assert_eq!(DetectionConfig::default().cooldown_time, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_hold_time_is_valid() {
        let mut config = DetectionConfig::default();
        config.hold_min_time = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_confidence() {
        let mut config = AppConfig::default();
        config.mediapipe.hands.min_detection_confidence = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfidence {
                field: "hands.min_detection_confidence",
                ..
            })
        ));
    }

    #[test]
    fn test_secs_to_ms() {
        assert_eq!(secs_to_ms(1.0), 1000);
        assert_eq!(secs_to_ms(0.5), 500);
        assert_eq!(secs_to_ms(0.0333), 33);
        assert_eq!(secs_to_ms(0.0), 0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"detection": {{"yaw_threshold": 25}}}}"#).unwrap();
        let config = AppConfig::load_from_file(file.path());
        assert_eq!(config.detection.yaw_threshold, 25.0);
    }

    #[test]
    fn test_missing_or_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert_eq!(AppConfig::load_from_file(&missing), AppConfig::default());
        assert!(AppConfig::try_load(&missing).is_err());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert_eq!(AppConfig::load_from_file(&broken), AppConfig::default());
    }
}
