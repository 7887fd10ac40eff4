// Calibration module - neutral head pose tracking
//
// Calibrator owns the CalibrationBaseline and converts raw head angles into
// baseline-relative angles. Recentering either sets an explicit baseline or
// clears it so the next sample becomes neutral.

pub mod baseline;

pub use baseline::{CalibrationBaseline, Calibrator};
