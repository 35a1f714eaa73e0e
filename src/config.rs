//! Analysis configuration
//!
//! Timing constants and thresholds used by every stage. All fields have
//! defaults matching the 60 Hz looking-time paradigm, so a partial JSON
//! document is enough to override a single value.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// Tolerance for converting millisecond thresholds into sample counts.
/// `2000 / (1000 / 60)` evaluates to 119.99999999999999 in f64.
const SAMPLE_COUNT_EPSILON: f64 = 1e-9;

/// Thresholds and timing constants for gaze analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Tracker sampling rate (Hz)
    pub frame_rate_hz: f64,
    /// Longest run of invalid samples that is interpolated (ms)
    pub max_gap_ms: f64,
    /// Minimum duration of a gaze (ms)
    pub min_gaze_ms: f64,
    /// Gazes starting later than this after the reference time are not ranked (ms)
    pub response_window_ms: f64,
    /// Rank-1 latency below this marks an initial gaze (ms)
    pub initial_gaze_threshold_ms: f64,
    /// Test windows open this long before the logged test start (ms)
    pub early_response_offset_ms: f64,
    /// Minimum onscreen proportion for a valid trial or pre-trial phase series
    pub min_onscreen_proportion: f64,
    /// Number of ordinal slots in the gaze structure (1..=3)
    pub ranked_slots: usize,
    /// Minimum number of trials for a session
    pub min_trials: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60.0,
            max_gap_ms: 100.0,
            min_gaze_ms: 134.0,
            response_window_ms: 2000.0,
            initial_gaze_threshold_ms: 33.0,
            early_response_offset_ms: 339.0,
            min_onscreen_proportion: 0.6,
            ranked_slots: 2,
            min_trials: 2,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Same configuration with a different sampling rate
    pub fn with_frame_rate(mut self, frame_rate_hz: f64) -> Self {
        self.frame_rate_hz = frame_rate_hz;
        self
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if !self.frame_rate_hz.is_finite() || self.frame_rate_hz <= 0.0 {
            return Err(ComputeError::InvalidConfig(format!(
                "frame_rate_hz must be positive, got {}",
                self.frame_rate_hz
            )));
        }

        let durations = [
            ("max_gap_ms", self.max_gap_ms),
            ("min_gaze_ms", self.min_gaze_ms),
            ("response_window_ms", self.response_window_ms),
            ("initial_gaze_threshold_ms", self.initial_gaze_threshold_ms),
            ("early_response_offset_ms", self.early_response_offset_ms),
        ];
        for (name, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(ComputeError::InvalidConfig(format!(
                    "{} must be a non-negative duration, got {}",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.min_onscreen_proportion) {
            return Err(ComputeError::InvalidConfig(format!(
                "min_onscreen_proportion must be within [0, 1], got {}",
                self.min_onscreen_proportion
            )));
        }

        if !(1..=3).contains(&self.ranked_slots) {
            return Err(ComputeError::InvalidConfig(format!(
                "ranked_slots must be 1, 2 or 3, got {}",
                self.ranked_slots
            )));
        }

        Ok(())
    }

    /// Milliseconds between two samples
    pub fn sample_interval_ms(&self) -> f64 {
        1000.0 / self.frame_rate_hz
    }

    /// Minimum number of samples in a gaze
    pub fn min_gaze_samples(&self) -> usize {
        samples_in(self.min_gaze_ms, self.sample_interval_ms())
    }

    /// Longest interpolated gap in samples
    pub fn max_gap_samples(&self) -> usize {
        samples_in(self.max_gap_ms, self.sample_interval_ms())
    }
}

/// `floor(duration_ms / interval_ms)`
pub fn samples_in(duration_ms: f64, interval_ms: f64) -> usize {
    if interval_ms <= 0.0 || duration_ms <= 0.0 {
        return 0;
    }
    (duration_ms / interval_ms + SAMPLE_COUNT_EPSILON).floor() as usize
}
