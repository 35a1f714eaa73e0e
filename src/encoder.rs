//! Report encoding
//!
//! Wraps per-trial metrics into a session report with producer metadata and
//! serializes it to JSON.

use crate::error::ComputeError;
use crate::types::{PhaseReport, Producer, SessionReport, SessionSummary, TrialMetrics};
use crate::{GAZEFLUX_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "gaze.report.v1";

/// Encoder for session reports
#[derive(Debug, Clone)]
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build a session report stamped with the current time
    pub fn encode(
        &self,
        subject_id: &str,
        frame_rate_hz: f64,
        trials: Vec<TrialMetrics>,
        phases: PhaseReport,
        summary: SessionSummary,
    ) -> SessionReport {
        SessionReport {
            report_version: REPORT_VERSION.to_string(),
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: GAZEFLUX_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            subject_id: subject_id.to_string(),
            frame_rate_hz,
            trials,
            phases,
            summary,
        }
    }

    /// Encode to compact JSON
    pub fn encode_to_json(&self, report: &SessionReport) -> Result<String, ComputeError> {
        serde_json::to_string(report).map_err(ComputeError::JsonError)
    }

    /// Encode to pretty-printed JSON
    pub fn encode_to_json_pretty(&self, report: &SessionReport) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(report).map_err(ComputeError::JsonError)
    }
}
