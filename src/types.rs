//! Gaze data types
//!
//! This module defines the types that flow through the gaze pipeline: raw
//! samples, AOI rectangles and tags, gaze events, and the metric records
//! produced for each analysis window.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A screen coordinate reported by the eye tracker (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazePoint {
    pub x: f64,
    pub y: f64,
}

impl GazePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One eye-tracker sample. `point` is `None` when the tracker lost the eyes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Sample timestamp in milliseconds
    pub timestamp: f64,
    /// Gaze coordinate, or `None` for an invalid sample
    pub point: Option<GazePoint>,
}

impl Sample {
    /// Create a valid sample
    pub fn valid(timestamp: f64, x: f64, y: f64) -> Self {
        Self {
            timestamp,
            point: Some(GazePoint::new(x, y)),
        }
    }

    /// Create an invalid sample
    pub fn invalid(timestamp: f64) -> Self {
        Self {
            timestamp,
            point: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.point.is_some()
    }
}

/// Area-of-interest tag assigned to each sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// Interesting object
    #[serde(rename = "INT")]
    Interesting,
    /// Boring object
    #[serde(rename = "BOR")]
    Boring,
    /// Either familiar object
    #[serde(rename = "FAM")]
    Familiar,
    /// Attention getter
    #[serde(rename = "ATT")]
    AttentionGetter,
    /// Invalid sample or outside every rectangle
    #[serde(rename = "OUT")]
    Out,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Interesting => "INT",
            Tag::Boring => "BOR",
            Tag::Familiar => "FAM",
            Tag::AttentionGetter => "ATT",
            Tag::Out => "OUT",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned rectangle given by its center and size (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub center: GazePoint,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            center: GazePoint::new(center_x, center_y),
            width,
            height,
        }
    }

    /// Closed-interval containment test (edges count as inside)
    pub fn contains(&self, point: &GazePoint) -> bool {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        (self.center.x - half_w) <= point.x
            && point.x <= (self.center.x + half_w)
            && (self.center.y - half_h) <= point.y
            && point.y <= (self.center.y + half_h)
    }
}

/// Named AOI rectangles for one analysis window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiConfig {
    pub interesting: Rect,
    pub boring: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub familiar1: Option<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub familiar2: Option<Rect>,
    /// Only consulted while the attention getter is on screen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attention_getter: Option<Rect>,
}

impl AoiConfig {
    /// Two-object configuration without familiar objects
    pub fn new(interesting: Rect, boring: Rect) -> Self {
        Self {
            interesting,
            boring,
            familiar1: None,
            familiar2: None,
            attention_getter: None,
        }
    }

    pub fn with_familiar(mut self, familiar1: Option<Rect>, familiar2: Option<Rect>) -> Self {
        self.familiar1 = familiar1;
        self.familiar2 = familiar2;
        self
    }

    pub fn with_attention_getter(mut self, rect: Option<Rect>) -> Self {
        self.attention_getter = rect;
        self
    }
}

/// Inclusion rule for the edges of a time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bounds {
    /// `[start, end]`
    Closed,
    /// `[start, end)`
    HalfOpen,
    /// `(start, end)`
    Open,
}

/// A time window in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// A sample timestamp with its AOI tag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaggedSample {
    pub timestamp: f64,
    pub tag: Tag,
}

/// A sustained look at one AOI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeEvent {
    /// 1-based position in time order
    pub rank: usize,
    /// Never `Tag::Out`
    pub tag: Tag,
    /// Timestamp of the first sample of the run (ms)
    pub onset: f64,
    /// Number of samples in the run
    pub duration: usize,
}

/// Share of object-directed gaze per object class
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OnObjectProportions {
    pub interesting: f64,
    pub boring: f64,
    pub familiar: f64,
}

/// Result of a ranked gaze lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedGaze {
    pub tag: Tag,
    /// Onset relative to the reference time (ms)
    pub latency_ms: f64,
    /// Duration in samples
    pub duration: usize,
}

/// Slot names of the gaze structure table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GazeSlotKind {
    #[serde(rename = "Initial gaze")]
    Initial,
    #[serde(rename = "1st gaze")]
    First,
    #[serde(rename = "2nd gaze")]
    Second,
    #[serde(rename = "3rd gaze")]
    Third,
}

impl GazeSlotKind {
    /// Ordinal slots in order
    pub const ORDINALS: [GazeSlotKind; 3] =
        [GazeSlotKind::First, GazeSlotKind::Second, GazeSlotKind::Third];

    pub fn label(&self) -> &'static str {
        match self {
            GazeSlotKind::Initial => "Initial gaze",
            GazeSlotKind::First => "1st gaze",
            GazeSlotKind::Second => "2nd gaze",
            GazeSlotKind::Third => "3rd gaze",
        }
    }
}

/// One row of the gaze structure table; all fields are `None` when empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeSlot {
    pub object: Option<Tag>,
    pub latency_ms: Option<f64>,
    pub duration_ms: Option<f64>,
}

impl GazeSlot {
    pub fn is_empty(&self) -> bool {
        self.object.is_none()
    }
}

/// First/second/third gaze after a reference time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeStructure {
    /// Slots in table order, starting with the initial-gaze slot
    pub slots: Vec<(GazeSlotKind, GazeSlot)>,
    /// Whether a rank-1 gaze started inside the response window
    pub responded: bool,
}

impl GazeStructure {
    pub fn slot(&self, kind: GazeSlotKind) -> Option<&GazeSlot> {
        self.slots.iter().find(|(k, _)| *k == kind).map(|(_, s)| s)
    }

    pub fn has_initial_gaze(&self) -> bool {
        self.slot(GazeSlotKind::Initial)
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    }
}

/// Whether the first gaze of a trial landed on the expected object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstGazeOutcome {
    Target,
    Other,
    NoResponse,
}

/// Single-window analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub window: TimeWindow,
    pub bounds: Bounds,
    pub sample_count: usize,
    /// `None` for a window without samples
    pub onscreen_proportion: Option<f64>,
    pub gazes: Vec<GazeEvent>,
    pub on_object: OnObjectProportions,
}

/// Quality flags attached to a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialFlag {
    /// No `ATT` gaze while the attention getter was shown
    MissedAttentionGetter,
    /// Baseline onscreen proportion below threshold or undefined
    LowBaselineOnscreen,
    /// Test onscreen proportion below threshold or undefined
    LowTestOnscreen,
    /// No gaze started inside the response window
    NoResponse,
}

/// Per-trial looking-time and gaze-structure metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialMetrics {
    pub label: String,
    pub baseline_onscreen: Option<f64>,
    pub test_onscreen: Option<f64>,
    pub gazed_at_attention_getter: bool,
    pub baseline: OnObjectProportions,
    pub test: OnObjectProportions,
    pub baseline_corrected: OnObjectProportions,
    pub gaze_structure: GazeStructure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_gaze: Option<FirstGazeOutcome>,
    /// Per-sample tags of the gaze-structure window
    pub time_course: Vec<Tag>,
    pub valid: bool,
    pub flags: Vec<TrialFlag>,
}

/// Aggregate over the trials of one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub trial_count: usize,
    pub valid_trials: usize,
    /// Mean baseline-corrected proportions over valid trials
    pub mean_baseline_corrected: Option<OnObjectProportions>,
}

/// Attention measures of one introduction or familiarisation phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    pub label: String,
    pub presentation_onscreen: Option<f64>,
    pub labeling_onscreen: Option<f64>,
    /// Object shares of the presentation, when the phase has an AOI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_object: Option<OnObjectProportions>,
}

/// Reasons a subject is excluded on the pre-trial phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectFlag {
    LowIntroductionOnscreen,
    LowIntroductionLabelingOnscreen,
    LowFamiliarisationOnscreen,
    LowFamiliarisationLabelingOnscreen,
}

/// Pre-trial phases and the subject-level validity they decide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub introduction: Vec<PhaseMetrics>,
    pub familiarisation: Vec<PhaseMetrics>,
    pub subject_valid: bool,
    pub flags: Vec<SubjectFlag>,
}

/// Producer metadata embedded in every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Full report for one recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub report_version: String,
    pub producer: Producer,
    /// RFC3339
    pub computed_at_utc: String,
    pub subject_id: String,
    pub frame_rate_hz: f64,
    pub trials: Vec<TrialMetrics>,
    pub phases: PhaseReport,
    pub summary: SessionSummary,
}
