// Pose types - per-frame measurements handed over by the vision pipeline
//
// One PoseSample is produced per processed camera frame and consumed exactly
// once by the engine. Samples below the detector confidence floor are
// expected to be dropped (or have their hand demoted) before they get here.

use serde::{Deserialize, Serialize};

/// Hand-shape classification for the tracked hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandShape {
    /// No hand visible, or the hand matched no known shape
    #[default]
    None,
    /// Open palm facing the camera (swipe tracking)
    OpenPalm,
    /// Closed fist
    Fist,
}

/// One frame's pose measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    /// Raw head pitch in degrees (positive = up)
    pub pitch_deg: f64,
    /// Raw head yaw in degrees (positive = right)
    pub yaw_deg: f64,
    /// Classified hand shape
    #[serde(default)]
    pub hand_shape: HandShape,
    /// Hand centroid x, normalized to frame width (0.0 = left edge)
    #[serde(default)]
    pub hand_x: Option<f64>,
    /// Monotonic capture timestamp in milliseconds
    pub timestamp_ms: u64,
}

impl PoseSample {
    /// Head-only sample with no hand in view
    pub fn head(pitch_deg: f64, yaw_deg: f64, timestamp_ms: u64) -> Self {
        Self {
            pitch_deg,
            yaw_deg,
            hand_shape: HandShape::None,
            hand_x: None,
            timestamp_ms,
        }
    }

    /// Attach a hand observation to the sample
    pub fn with_hand(mut self, hand_shape: HandShape, hand_x: Option<f64>) -> Self {
        self.hand_shape = hand_shape;
        self.hand_x = hand_x;
        self
    }

    /// Whether both head angles are usable numbers
    pub fn has_valid_angles(&self) -> bool {
        self.pitch_deg.is_finite() && self.yaw_deg.is_finite()
    }

    /// Hand x position, with non-finite readings treated as absent
    pub fn valid_hand_x(&self) -> Option<f64> {
        self.hand_x.filter(|x| x.is_finite())
    }
}
