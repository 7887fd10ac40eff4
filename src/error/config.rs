// Configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Single source of truth for the codes shared with the host addon.
///
/// Error code range: 3001-3005
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// Angle or distance threshold is not a positive finite number
    pub const INVALID_THRESHOLD: i32 = 3001;

    /// Timing value is negative or not finite
    pub const INVALID_DURATION: i32 = 3002;

    /// Window or frame count is zero
    pub const INVALID_WINDOW: i32 = 3003;

    /// Ratio outside its allowed range
    pub const INVALID_RATIO: i32 = 3004;

    /// Detector confidence outside [0, 1]
    pub const INVALID_CONFIDENCE: i32 = 3005;
}

/// Log a configuration error with structured context
///
/// Emits a single error line carrying the numeric code, the component and
/// the human-readable message. Never panics.
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=DetectionConfig, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration validation errors
///
/// Raised at construction or `reconfigure` time. The engine keeps its
/// previous settings whenever one of these is returned.
///
/// Error code range: 3001-3005
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Threshold must be finite and greater than zero
    InvalidThreshold { field: &'static str, value: f64 },

    /// Duration (seconds) must be finite and within range
    InvalidDuration { field: &'static str, value: f64 },

    /// Window size or frame count must be at least 1
    InvalidWindow { field: &'static str, value: usize },

    /// Ratio must lie in [0, 1)
    InvalidRatio { field: &'static str, value: f64 },

    /// Confidence must lie in [0, 1]
    InvalidConfidence { field: &'static str, value: f32 },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::InvalidThreshold { .. } => ConfigErrorCodes::INVALID_THRESHOLD,
            ConfigError::InvalidDuration { .. } => ConfigErrorCodes::INVALID_DURATION,
            ConfigError::InvalidWindow { .. } => ConfigErrorCodes::INVALID_WINDOW,
            ConfigError::InvalidRatio { .. } => ConfigErrorCodes::INVALID_RATIO,
            ConfigError::InvalidConfidence { .. } => ConfigErrorCodes::INVALID_CONFIDENCE,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::InvalidThreshold { field, value } => {
                format!("{} must be greater than 0 (got {})", field, value)
            }
            ConfigError::InvalidDuration { field, value } => {
                format!("{} is not a valid duration (got {})", field, value)
            }
            ConfigError::InvalidWindow { field, value } => {
                format!("{} must be at least 1 (got {})", field, value)
            }
            ConfigError::InvalidRatio { field, value } => {
                format!("{} must be in [0, 1) (got {})", field, value)
            }
            ConfigError::InvalidConfidence { field, value } => {
                format!("{} must be in [0, 1] (got {})", field, value)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_codes() {
        assert_eq!(
            ConfigError::InvalidThreshold {
                field: "pitch_threshold",
                value: 0.0
            }
            .code(),
            ConfigErrorCodes::INVALID_THRESHOLD
        );
        assert_eq!(
            ConfigError::InvalidDuration {
                field: "hold_min_time",
                value: -1.0
            }
            .code(),
            ConfigErrorCodes::INVALID_DURATION
        );
        assert_eq!(
            ConfigError::InvalidWindow {
                field: "smoothing_window",
                value: 0
            }
            .code(),
            ConfigErrorCodes::INVALID_WINDOW
        );
        assert_eq!(
            ConfigError::InvalidRatio {
                field: "hysteresis_ratio",
                value: 1.5
            }
            .code(),
            ConfigErrorCodes::INVALID_RATIO
        );
        assert_eq!(
            ConfigError::InvalidConfidence {
                field: "hands.min_detection_confidence",
                value: 2.0
            }
            .code(),
            ConfigErrorCodes::INVALID_CONFIDENCE
        );
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::InvalidThreshold {
            field: "yaw_threshold",
            value: -3.0,
        };
        assert_eq!(err.message(), "yaw_threshold must be greater than 0 (got -3)");

        let err = ConfigError::InvalidWindow {
            field: "smoothing_window",
            value: 0,
        };
        assert!(err.message().contains("at least 1"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidRatio {
            field: "hysteresis_ratio",
            value: 1.0,
        };
        let display = format!("{}", err);
        assert!(display.contains("ConfigError"));
        assert!(display.contains("3004"));
    }
}
