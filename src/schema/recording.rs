//! gaze.recording.v1 input types

use crate::types::{AoiConfig, GazePoint, Rect, Sample, Tag, TimeWindow};
use serde::{Deserialize, Serialize};

/// Schema version identifier
pub const SCHEMA_VERSION: &str = "gaze.recording.v1";

/// Tobii exports lost samples as `(-1, -1)`
const MISSING_COORDINATE: f64 = -1.0;

/// One sample as written by the tracker export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Milliseconds since recording start
    #[serde(alias = "t", alias = "TimeStamp")]
    pub timestamp: f64,
    #[serde(default, alias = "GazePointX")]
    pub x: Option<f64>,
    #[serde(default, alias = "GazePointY")]
    pub y: Option<f64>,
}

impl RawSample {
    pub fn new(timestamp: f64, x: Option<f64>, y: Option<f64>) -> Self {
        Self { timestamp, x, y }
    }

    /// Check structural rules of a single sample
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.timestamp.is_finite() {
            return Err(ValidationError::NonFiniteTimestamp {
                value: self.timestamp,
            });
        }

        match (self.x, self.y) {
            (Some(x), Some(y)) if !x.is_finite() || !y.is_finite() => {
                Err(ValidationError::NonFiniteCoordinate)
            }
            (Some(_), None) | (None, Some(_)) => Err(ValidationError::PartialCoordinate),
            _ => Ok(()),
        }
    }

    /// Convert to a pipeline sample. Missing coordinates and the `(-1, -1)`
    /// sentinel both become an invalid sample.
    pub fn to_sample(&self) -> Sample {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x == MISSING_COORDINATE && y == MISSING_COORDINATE => {
                Sample::invalid(self.timestamp)
            }
            (Some(x), Some(y)) => Sample {
                timestamp: self.timestamp,
                point: Some(GazePoint::new(x, y)),
            },
            _ => Sample::invalid(self.timestamp),
        }
    }
}

/// Phase timestamps and AOIs of one preferential-looking trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSpec {
    #[serde(default)]
    pub label: Option<String>,
    pub aoi: AoiConfig,
    /// Rectangle of the attention getter shown before the test phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attention_getter: Option<Rect>,
    pub baseline_start: f64,
    pub attention_start: f64,
    pub test_start: f64,
    pub test_end: f64,
    /// Object the first gaze is expected to land on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Tag>,
}

impl TrialSpec {
    /// Phases must be finite and in order
    pub fn validate(&self) -> Result<(), ValidationError> {
        let phases = [
            ("baseline_start", self.baseline_start),
            ("attention_start", self.attention_start),
            ("test_start", self.test_start),
            ("test_end", self.test_end),
        ];

        for (name, value) in phases {
            if !value.is_finite() {
                return Err(ValidationError::UnorderedPhases {
                    reason: format!("{} is not finite", name),
                });
            }
        }

        for pair in phases.windows(2) {
            let (earlier, a) = pair[0];
            let (later, b) = pair[1];
            if b < a {
                return Err(ValidationError::UnorderedPhases {
                    reason: format!("{} ({}) precedes {} ({})", later, b, earlier, a),
                });
            }
        }

        Ok(())
    }

    /// `[baseline_start, attention_start)`
    pub fn baseline_window(&self) -> TimeWindow {
        TimeWindow::new(self.baseline_start, self.attention_start)
    }

    /// `(attention_start, test_start)`
    pub fn attention_window(&self) -> TimeWindow {
        TimeWindow::new(self.attention_start, self.test_start)
    }

    /// `[test_start, test_end)`
    pub fn test_window(&self) -> TimeWindow {
        TimeWindow::new(self.test_start, self.test_end)
    }

    /// Test period opened early to catch anticipatory looks
    pub fn looking_window(&self, early_offset_ms: f64) -> TimeWindow {
        TimeWindow::new(self.test_start - early_offset_ms, self.test_end)
    }

    /// Window scanned for the first, second and third gaze
    pub fn gaze_window(&self, early_offset_ms: f64, response_window_ms: f64) -> TimeWindow {
        TimeWindow::new(
            self.test_start - early_offset_ms,
            self.test_start + response_window_ms,
        )
    }
}

/// An introduction or familiarisation phase: objects are presented, then
/// named. Only the subject's attention to the screen is checked, plus the
/// interesting-object share when an AOI is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpec {
    #[serde(default)]
    pub label: Option<String>,
    pub presentation_start: f64,
    pub presentation_end: f64,
    pub labeling_start: f64,
    pub labeling_end: f64,
    /// Objects on screen during the presentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aoi: Option<AoiConfig>,
}

impl PhaseSpec {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let bounds = [
            ("presentation_start", self.presentation_start),
            ("presentation_end", self.presentation_end),
            ("labeling_start", self.labeling_start),
            ("labeling_end", self.labeling_end),
        ];

        for (name, value) in bounds {
            if !value.is_finite() {
                return Err(ValidationError::UnorderedPhases {
                    reason: format!("{} is not finite", name),
                });
            }
        }

        for pair in bounds.chunks(2) {
            let (start_name, start) = pair[0];
            let (end_name, end) = pair[1];
            if end < start {
                return Err(ValidationError::UnorderedPhases {
                    reason: format!("{} ({}) precedes {} ({})", end_name, end, start_name, start),
                });
            }
        }

        Ok(())
    }

    /// `[presentation_start, presentation_end)`
    pub fn presentation_window(&self) -> TimeWindow {
        TimeWindow::new(self.presentation_start, self.presentation_end)
    }

    /// `[labeling_start, labeling_end)`
    pub fn labeling_window(&self) -> TimeWindow {
        TimeWindow::new(self.labeling_start, self.labeling_end)
    }
}

/// One subject's recording with its trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    pub subject_id: String,
    /// Overrides the configured sampling rate when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate_hz: Option<f64>,
    pub samples: Vec<RawSample>,
    #[serde(default)]
    pub trials: Vec<TrialSpec>,
    /// Familiar objects introduced before the trials
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub introduction: Vec<PhaseSpec>,
    /// New objects taught before the trials
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub familiarisation: Vec<PhaseSpec>,
}

impl Recording {
    /// Check schema version, samples and trial phases
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(version) = &self.schema_version {
            if version != SCHEMA_VERSION {
                return Err(ValidationError::InvalidSchemaVersion {
                    expected: SCHEMA_VERSION.to_string(),
                    actual: version.clone(),
                });
            }
        }

        if let Some(rate) = self.frame_rate_hz {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ValidationError::InvalidFrameRate { value: rate });
            }
        }

        for (index, sample) in self.samples.iter().enumerate() {
            sample.validate().map_err(|e| ValidationError::AtSample {
                index,
                source: Box::new(e),
            })?;
        }

        for (index, trial) in self.trials.iter().enumerate() {
            trial.validate().map_err(|e| ValidationError::AtTrial {
                index,
                source: Box::new(e),
            })?;
        }

        for (index, phase) in self
            .introduction
            .iter()
            .chain(&self.familiarisation)
            .enumerate()
        {
            phase.validate().map_err(|e| ValidationError::AtPhase {
                index,
                source: Box::new(e),
            })?;
        }

        Ok(())
    }
}

/// Validation error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Invalid frame rate: {value}")]
    InvalidFrameRate { value: f64 },

    #[error("Timestamp is not finite: {value}")]
    NonFiniteTimestamp { value: f64 },

    #[error("Coordinate is not finite")]
    NonFiniteCoordinate,

    #[error("Only one of x and y is present")]
    PartialCoordinate,

    #[error("Timestamp {current} is earlier than the previous sample ({previous})")]
    NonMonotonic { previous: f64, current: f64 },

    #[error("Trial phases out of order: {reason}")]
    UnorderedPhases { reason: String },

    #[error("sample {index}: {source}")]
    AtSample {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("trial {index}: {source}")]
    AtTrial {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("phase {index}: {source}")]
    AtPhase {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial() -> TrialSpec {
        TrialSpec {
            label: Some("t1".to_string()),
            aoi: AoiConfig::new(
                Rect::new(480.0, 300.0, 520.0, 520.0),
                Rect::new(1440.0, 900.0, 520.0, 520.0),
            ),
            attention_getter: Some(Rect::new(960.0, 600.0, 320.0, 320.0)),
            baseline_start: 0.0,
            attention_start: 1000.0,
            test_start: 2000.0,
            test_end: 6000.0,
            target: None,
        }
    }

    #[test]
    fn test_timestamp_aliases() {
        let a: RawSample = serde_json::from_str(r#"{"t": 16.7, "x": 1.0, "y": 2.0}"#).unwrap();
        let b: RawSample =
            serde_json::from_str(r#"{"TimeStamp": 16.7, "GazePointX": 1.0, "GazePointY": 2.0}"#)
                .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.timestamp, 16.7);
    }

    #[test]
    fn test_missing_coordinates_are_invalid() {
        let raw: RawSample = serde_json::from_str(r#"{"timestamp": 5.0}"#).unwrap();
        assert!(raw.validate().is_ok());
        assert!(!raw.to_sample().is_valid());
    }

    #[test]
    fn test_tobii_sentinel_is_invalid() {
        let sentinel = RawSample::new(0.0, Some(-1.0), Some(-1.0));
        assert!(!sentinel.to_sample().is_valid());

        let edge = RawSample::new(0.0, Some(-1.0), Some(0.0));
        assert!(edge.to_sample().is_valid());
    }

    #[test]
    fn test_partial_coordinate_rejected() {
        let raw = RawSample::new(0.0, Some(1.0), None);
        assert_eq!(raw.validate(), Err(ValidationError::PartialCoordinate));
    }

    #[test]
    fn test_non_finite_rejected() {
        let raw = RawSample::new(f64::NAN, None, None);
        assert!(matches!(
            raw.validate(),
            Err(ValidationError::NonFiniteTimestamp { .. })
        ));

        let raw = RawSample::new(0.0, Some(f64::INFINITY), Some(1.0));
        assert_eq!(raw.validate(), Err(ValidationError::NonFiniteCoordinate));
    }

    #[test]
    fn test_trial_phase_order() {
        assert!(trial().validate().is_ok());

        let mut bad = trial();
        bad.test_start = 500.0;
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::UnorderedPhases { .. })
        ));
    }

    #[test]
    fn test_trial_windows() {
        let t = trial();
        assert_eq!(t.baseline_window(), TimeWindow::new(0.0, 1000.0));
        assert_eq!(t.attention_window(), TimeWindow::new(1000.0, 2000.0));
        assert_eq!(t.looking_window(339.0), TimeWindow::new(1661.0, 6000.0));
        assert_eq!(t.gaze_window(339.0, 2000.0), TimeWindow::new(1661.0, 4000.0));
    }

    #[test]
    fn test_recording_schema_version() {
        let recording = Recording {
            schema_version: Some("gaze.recording.v0".to_string()),
            subject_id: "s01".to_string(),
            frame_rate_hz: None,
            samples: vec![],
            trials: vec![],
            introduction: vec![],
            familiarisation: vec![],
        };
        assert!(matches!(
            recording.validate(),
            Err(ValidationError::InvalidSchemaVersion { .. })
        ));
    }

    #[test]
    fn test_recording_reports_sample_index() {
        let recording = Recording {
            schema_version: None,
            subject_id: "s01".to_string(),
            frame_rate_hz: Some(60.0),
            samples: vec![
                RawSample::new(0.0, None, None),
                RawSample::new(16.7, None, Some(3.0)),
            ],
            trials: vec![trial()],
            introduction: vec![],
            familiarisation: vec![],
        };
        let err = recording.validate().unwrap_err();
        assert_eq!(err.to_string(), "sample 1: Only one of x and y is present");
    }

    #[test]
    fn test_phases_default_to_empty() {
        let json = r#"{"subject_id": "s01", "samples": []}"#;
        let recording: Recording = serde_json::from_str(json).unwrap();
        assert!(recording.introduction.is_empty());
        assert!(recording.familiarisation.is_empty());
    }

    #[test]
    fn test_phase_windows_and_order() {
        let phase = PhaseSpec {
            label: None,
            presentation_start: 100.0,
            presentation_end: 2100.0,
            labeling_start: 2100.0,
            labeling_end: 3100.0,
            aoi: None,
        };
        assert!(phase.validate().is_ok());
        assert_eq!(phase.presentation_window(), TimeWindow::new(100.0, 2100.0));
        assert_eq!(phase.labeling_window(), TimeWindow::new(2100.0, 3100.0));

        let recording = Recording {
            schema_version: None,
            subject_id: "s01".to_string(),
            frame_rate_hz: None,
            samples: vec![],
            trials: vec![],
            introduction: vec![phase.clone()],
            familiarisation: vec![PhaseSpec {
                labeling_end: 2000.0,
                ..phase
            }],
        };
        let err = recording.validate().unwrap_err();
        assert!(err.to_string().starts_with("phase 1: Trial phases out of order"));
    }
}
