//! Pipeline orchestration
//!
//! This module provides the public API for gazeflux. It runs a recording
//! through interpolation, AOI classification, gaze segmentation and the
//! metric stages, trial by trial, and assembles the session report.

use crate::baseline::{baseline_correct, mean_proportions};
use crate::classify::tag_samples;
use crate::config::AnalysisConfig;
use crate::encoder::ReportEncoder;
use crate::error::ComputeError;
use crate::interpolate::GapInterpolator;
use crate::metrics::{first_gaze_outcome, on_object_proportions, GazeMetrics};
use crate::schema::{PhaseSpec, Recording, SampleAdapter, TrialSpec};
use crate::segment::{GazeCollection, GazeSegmenter};
use crate::stream::SampleStream;
use crate::types::{
    AoiConfig, Bounds, GazePoint, PhaseMetrics, PhaseReport, Rect, SessionReport,
    SessionSummary, SubjectFlag, Tag, TaggedSample, TimeWindow, TrialFlag, TrialMetrics,
    WindowMetrics,
};
use tracing::{info, warn};

/// Attention getter used when a trial does not specify one: a 320 px square
/// at the center of a 1920x1200 display.
pub const DEFAULT_ATTENTION_GETTER: Rect = Rect {
    center: GazePoint { x: 960.0, y: 600.0 },
    width: 320.0,
    height: 320.0,
};

/// Analyze a recording JSON document and return the report as JSON.
///
/// # Arguments
/// * `json` - A `gaze.recording.v1` document
/// * `config` - Analysis thresholds; the recording's frame rate overrides
///   `config.frame_rate_hz` when present
///
/// # Example
/// ```ignore
/// let report_json = analyze_session_json(&recording_json, &AnalysisConfig::default())?;
/// ```
pub fn analyze_session_json(json: &str, config: &AnalysisConfig) -> Result<String, ComputeError> {
    let recording = SampleAdapter::parse_recording(json)?;
    let analyzer = GazeAnalyzer::new(config.clone())?;
    let report = analyzer.analyze_session(&recording)?;
    analyzer.encoder.encode_to_json(&report)
}

/// Analyze a parsed recording with the given configuration
pub fn analyze_recording(
    recording: &Recording,
    config: &AnalysisConfig,
) -> Result<SessionReport, ComputeError> {
    GazeAnalyzer::new(config.clone())?.analyze_session(recording)
}

/// Gaze analysis engine bound to one configuration.
///
/// Every stage is stateless; the analyzer only carries the thresholds and
/// the report encoder so that reports from one instance share an ID.
#[derive(Debug, Clone)]
pub struct GazeAnalyzer {
    config: AnalysisConfig,
    encoder: ReportEncoder,
}

impl Default for GazeAnalyzer {
    fn default() -> Self {
        Self {
            config: AnalysisConfig::default(),
            encoder: ReportEncoder::new(),
        }
    }
}

impl GazeAnalyzer {
    /// Create an analyzer after validating `config`
    pub fn new(config: AnalysisConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: ReportEncoder::new(),
        })
    }

    /// Replace the report encoder (fixed instance IDs in tests)
    pub fn with_encoder(mut self, encoder: ReportEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn encoder(&self) -> &ReportEncoder {
        &self.encoder
    }

    /// Analyzer for data recorded at `frame_rate_hz`; `None` keeps the
    /// configured rate
    pub fn at_frame_rate(&self, frame_rate_hz: Option<f64>) -> Result<Self, ComputeError> {
        match frame_rate_hz {
            Some(rate) if rate != self.config.frame_rate_hz => {
                let config = self.config.clone().with_frame_rate(rate);
                config.validate()?;
                Ok(Self {
                    config,
                    encoder: self.encoder.clone(),
                })
            }
            _ => Ok(self.clone()),
        }
    }

    /// Interpolate short gaps in a raw stream
    pub fn interpolate(&self, stream: &SampleStream) -> SampleStream {
        GapInterpolator::from_config(&self.config).interpolate(stream)
    }

    /// Segment the samples of `window` into gaze events
    pub fn collect_gazes(
        &self,
        stream: &SampleStream,
        window: TimeWindow,
        bounds: Bounds,
        aoi: &AoiConfig,
    ) -> GazeCollection {
        let tagged = tag_samples(stream.window(window, bounds), aoi);
        GazeSegmenter::from_config(&self.config).segment(&tagged)
    }

    /// Onscreen proportion, gaze events and on-object proportions of one
    /// window. The stream is used as given, so interpolate it first.
    ///
    /// `bounds` selects the samples that are segmented. The onscreen
    /// proportion is always taken over `[start, end)`.
    pub fn analyze_window(
        &self,
        stream: &SampleStream,
        window: TimeWindow,
        bounds: Bounds,
        aoi: &AoiConfig,
    ) -> Result<WindowMetrics, ComputeError> {
        check_window(window)?;

        let samples = stream.window(window, bounds);
        let tagged = tag_samples(samples, aoi);
        let gazes = GazeSegmenter::from_config(&self.config).segment(&tagged);

        Ok(WindowMetrics {
            window,
            bounds,
            sample_count: samples.len(),
            onscreen_proportion: stream.onscreen_proportion(window),
            on_object: on_object_proportions(&gazes),
            gazes: gazes.into_events(),
        })
    }

    /// Per-trial looking-time metrics over an interpolated stream
    pub fn analyze_trial(&self, stream: &SampleStream, trial: &TrialSpec) -> TrialMetrics {
        let config = &self.config;
        let offset = config.early_response_offset_ms;
        let label = trial.label.clone().unwrap_or_default();

        let baseline_onscreen = stream.onscreen_proportion(trial.baseline_window());
        let test_onscreen = stream.onscreen_proportion(trial.test_window());

        // Attention check is the only stage that knows about the attention getter
        let attention_rect = trial
            .attention_getter
            .or(trial.aoi.attention_getter)
            .unwrap_or(DEFAULT_ATTENTION_GETTER);
        let attention_aoi = trial.aoi.clone().with_attention_getter(Some(attention_rect));
        let object_aoi = trial.aoi.clone().with_attention_getter(None);

        let gazed_at_attention_getter = self
            .collect_gazes(
                stream,
                trial.attention_window(),
                Bounds::Open,
                &attention_aoi,
            )
            .contains_tag(Tag::AttentionGetter);

        let baseline = on_object_proportions(&self.collect_gazes(
            stream,
            trial.baseline_window(),
            Bounds::Open,
            &object_aoi,
        ));
        let test = on_object_proportions(&self.collect_gazes(
            stream,
            trial.looking_window(offset),
            Bounds::Closed,
            &object_aoi,
        ));
        let baseline_corrected = baseline_correct(&test, &baseline);

        let gaze_window = trial.gaze_window(offset, config.response_window_ms);
        let tagged: Vec<TaggedSample> =
            tag_samples(stream.window(gaze_window, Bounds::Closed), &object_aoi);
        let gazes = GazeSegmenter::from_config(config).segment(&tagged);
        let gaze_structure =
            GazeMetrics::from_config(config).gaze_structure(&gazes, gaze_window.start);
        let time_course = tagged.iter().map(|t| t.tag).collect();
        let first_gaze = trial
            .target
            .map(|target| first_gaze_outcome(&gaze_structure, target));

        let min_onscreen = config.min_onscreen_proportion;
        let mut flags = Vec::new();
        if !gazed_at_attention_getter {
            flags.push(TrialFlag::MissedAttentionGetter);
        }
        if !baseline_onscreen.is_some_and(|p| p >= min_onscreen) {
            flags.push(TrialFlag::LowBaselineOnscreen);
        }
        if !test_onscreen.is_some_and(|p| p >= min_onscreen) {
            flags.push(TrialFlag::LowTestOnscreen);
        }
        if !gaze_structure.responded {
            flags.push(TrialFlag::NoResponse);
        }

        let valid = !flags.iter().any(|f| {
            matches!(
                f,
                TrialFlag::MissedAttentionGetter
                    | TrialFlag::LowBaselineOnscreen
                    | TrialFlag::LowTestOnscreen
            )
        });

        if valid {
            info!(
                trial = %label,
                interesting = test.interesting,
                boring = test.boring,
                responded = gaze_structure.responded,
                "analyzed trial"
            );
        } else {
            warn!(trial = %label, ?flags, "trial excluded");
        }

        TrialMetrics {
            label,
            baseline_onscreen,
            test_onscreen,
            gazed_at_attention_getter,
            baseline,
            test,
            baseline_corrected,
            gaze_structure,
            first_gaze,
            time_course,
            valid,
            flags,
        }
    }

    /// Onscreen proportions of an introduction or familiarisation phase.
    /// With an AOI, the interesting/boring shares of the presentation
    /// `(start, end)` are added; familiar objects are not on screen then.
    pub fn analyze_phase(
        &self,
        stream: &SampleStream,
        phase: &PhaseSpec,
    ) -> Result<PhaseMetrics, ComputeError> {
        let presentation = phase.presentation_window();
        let on_object = match &phase.aoi {
            Some(aoi) => {
                let aoi = aoi
                    .clone()
                    .with_familiar(None, None)
                    .with_attention_getter(None);
                let metrics = self.analyze_window(stream, presentation, Bounds::Open, &aoi)?;
                Some(metrics.on_object)
            }
            None => None,
        };

        Ok(PhaseMetrics {
            label: phase.label.clone().unwrap_or_default(),
            presentation_onscreen: stream.onscreen_proportion(presentation),
            labeling_onscreen: stream.onscreen_proportion(phase.labeling_window()),
            on_object,
        })
    }

    /// Analyze the pre-trial phases of a recording and decide whether the
    /// subject attended to them well enough
    pub fn analyze_phases(
        &self,
        stream: &SampleStream,
        recording: &Recording,
    ) -> Result<PhaseReport, ComputeError> {
        let introduction =
            self.analyze_phase_list(stream, &recording.introduction, "introduction")?;
        let familiarisation =
            self.analyze_phase_list(stream, &recording.familiarisation, "familiarisation")?;

        let min_onscreen = self.config.min_onscreen_proportion;
        let checks = [
            (&introduction, false, SubjectFlag::LowIntroductionOnscreen),
            (&introduction, true, SubjectFlag::LowIntroductionLabelingOnscreen),
            (&familiarisation, false, SubjectFlag::LowFamiliarisationOnscreen),
            (&familiarisation, true, SubjectFlag::LowFamiliarisationLabelingOnscreen),
        ];
        let flags: Vec<SubjectFlag> = checks
            .into_iter()
            .filter(|(phases, labeling, _)| {
                mean_onscreen(phases, *labeling).is_some_and(|m| m < min_onscreen)
            })
            .map(|(_, _, flag)| flag)
            .collect();

        let subject_valid = flags.is_empty();
        if !subject_valid {
            warn!(subject = %recording.subject_id, ?flags, "subject excluded on pre-trial phases");
        }

        Ok(PhaseReport {
            introduction,
            familiarisation,
            subject_valid,
            flags,
        })
    }

    fn analyze_phase_list(
        &self,
        stream: &SampleStream,
        phases: &[PhaseSpec],
        kind: &str,
    ) -> Result<Vec<PhaseMetrics>, ComputeError> {
        phases
            .iter()
            .enumerate()
            .map(|(index, phase)| {
                let mut metrics = self.analyze_phase(stream, phase)?;
                if metrics.label.is_empty() {
                    metrics.label = format!("{}_{}", kind, index + 1);
                }
                Ok(metrics)
            })
            .collect()
    }

    /// Analyze every trial of a recording and build the session report
    pub fn analyze_session(&self, recording: &Recording) -> Result<SessionReport, ComputeError> {
        recording.validate()?;

        let analyzer = self.at_frame_rate(recording.frame_rate_hz)?;

        let expected = analyzer.config.min_trials;
        let actual = recording.trials.len();
        if actual < expected {
            warn!(
                subject = %recording.subject_id,
                expected,
                actual,
                "not enough trials"
            );
            return Err(ComputeError::InsufficientTrials { expected, actual });
        }

        let raw = SampleAdapter::to_stream(&recording.samples)?;
        let stream = analyzer.interpolate(&raw);

        let phases = analyzer.analyze_phases(&stream, recording)?;
        let trials: Vec<TrialMetrics> = recording
            .trials
            .iter()
            .enumerate()
            .map(|(index, trial)| {
                let mut metrics = analyzer.analyze_trial(&stream, trial);
                if metrics.label.is_empty() {
                    metrics.label = format!("trial_{}", index + 1);
                }
                metrics
            })
            .collect();

        let summary = summarize(&trials);
        info!(
            subject = %recording.subject_id,
            trials = summary.trial_count,
            valid = summary.valid_trials,
            subject_valid = phases.subject_valid,
            "analyzed session"
        );

        Ok(analyzer.encoder.encode(
            &recording.subject_id,
            analyzer.config.frame_rate_hz,
            trials,
            phases,
            summary,
        ))
    }
}

/// Trial counts and mean baseline-corrected proportions over valid trials
pub fn summarize(trials: &[TrialMetrics]) -> SessionSummary {
    let valid = trials.iter().filter(|t| t.valid);
    SessionSummary {
        trial_count: trials.len(),
        valid_trials: valid.clone().count(),
        mean_baseline_corrected: mean_proportions(valid.map(|t| &t.baseline_corrected)),
    }
}

/// Mean onscreen proportion over a list of phases; a phase without samples
/// counts as 0. `None` when the list is empty.
fn mean_onscreen(phases: &[PhaseMetrics], labeling: bool) -> Option<f64> {
    if phases.is_empty() {
        return None;
    }
    let total: f64 = phases
        .iter()
        .map(|p| {
            let onscreen = if labeling {
                p.labeling_onscreen
            } else {
                p.presentation_onscreen
            };
            onscreen.unwrap_or(0.0)
        })
        .sum();
    Some(total / phases.len() as f64)
}

fn check_window(window: TimeWindow) -> Result<(), ComputeError> {
    if !window.start.is_finite() || !window.end.is_finite() {
        return Err(ComputeError::InvalidWindow(format!(
            "bounds must be finite, got [{}, {}]",
            window.start, window.end
        )));
    }
    if window.end < window.start {
        return Err(ComputeError::InvalidWindow(format!(
            "end {} precedes start {}",
            window.end, window.start
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PhaseSpec, RawSample};
    use crate::types::{FirstGazeOutcome, GazeSlotKind, OnObjectProportions, Sample, SubjectFlag};
    use pretty_assertions::assert_eq;

    const INTERVAL_60HZ: f64 = 1000.0 / 60.0;

    const INT: (f64, f64) = (480.0, 300.0);
    const BOR: (f64, f64) = (1440.0, 900.0);
    const CENTER: (f64, f64) = (960.0, 600.0);

    fn two_object_aoi() -> AoiConfig {
        AoiConfig::new(
            Rect::new(INT.0, INT.1, 520.0, 520.0),
            Rect::new(BOR.0, BOR.1, 520.0, 520.0),
        )
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Where the subject looks at `t` within a 6 s trial cycle.
    /// `None` is a tracker dropout.
    fn scripted_gaze(t: f64, attends: bool) -> Option<(f64, f64)> {
        let local = t % 6000.0;
        if local < 600.0 {
            Some(INT)
        } else if local < 1000.0 {
            Some(BOR)
        } else if local < 1700.0 {
            Some(if attends { CENTER } else { BOR })
        } else if local < 2300.0 {
            Some(INT)
        } else if local < 2400.0 {
            None
        } else if local < 3000.0 {
            Some(INT)
        } else {
            Some(BOR)
        }
    }

    /// Two trials at 50 Hz; the subject ignores the attention getter in the second
    fn scripted_recording() -> Recording {
        let samples = (0..600)
            .map(|i| {
                let t = i as f64 * 20.0;
                let attends = t < 6000.0;
                match scripted_gaze(t, attends) {
                    Some((x, y)) => RawSample::new(t, Some(x), Some(y)),
                    None => RawSample::new(t, Some(-1.0), Some(-1.0)),
                }
            })
            .collect();

        let trial = |label: &str, start: f64| TrialSpec {
            label: Some(label.to_string()),
            aoi: two_object_aoi(),
            attention_getter: None,
            baseline_start: start,
            attention_start: start + 1000.0,
            test_start: start + 2000.0,
            test_end: start + 5000.0,
            target: Some(Tag::Interesting),
        };

        Recording {
            schema_version: None,
            subject_id: "s01".to_string(),
            frame_rate_hz: Some(50.0),
            samples,
            trials: vec![trial("t1", 0.0), trial("t2", 6000.0)],
            introduction: Vec::new(),
            familiarisation: Vec::new(),
        }
    }

    fn stream_60hz(points: &[Option<(f64, f64)>]) -> SampleStream {
        let samples = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let t = i as f64 * INTERVAL_60HZ;
                match p {
                    Some((x, y)) => Sample::valid(t, *x, *y),
                    None => Sample::invalid(t),
                }
            })
            .collect();
        SampleStream::new(samples).unwrap()
    }

    #[test]
    fn test_window_two_gazes() {
        let mut points = vec![Some(INT); 12];
        points.push(None);
        points.extend(vec![Some(BOR); 10]);
        let stream = stream_60hz(&points);

        let window = TimeWindow::new(0.0, 22.0 * INTERVAL_60HZ);
        let metrics = GazeAnalyzer::default()
            .analyze_window(&stream, window, Bounds::Closed, &two_object_aoi())
            .unwrap();

        assert_eq!(metrics.sample_count, 23);
        // Onscreen leaves out the sample at the window end
        assert!(close(metrics.onscreen_proportion.unwrap(), 21.0 / 22.0));
        assert_eq!(metrics.gazes.len(), 2);
        assert!((metrics.on_object.interesting - 0.545).abs() < 1e-3);
        assert!((metrics.on_object.boring - 0.455).abs() < 1e-3);
        assert_eq!(metrics.on_object.familiar, 0.0);
    }

    #[test]
    fn test_window_short_run_still_onscreen() {
        let mut points = vec![None, None];
        points.extend(vec![Some(INT); 5]);
        points.extend(vec![None, None]);
        let stream = stream_60hz(&points);

        let window = TimeWindow::new(0.0, 9.0 * INTERVAL_60HZ);
        let metrics = GazeAnalyzer::default()
            .analyze_window(&stream, window, Bounds::HalfOpen, &two_object_aoi())
            .unwrap();

        assert!(metrics.gazes.is_empty());
        assert!(close(metrics.onscreen_proportion.unwrap(), 5.0 / 9.0));
        assert_eq!(metrics.on_object, OnObjectProportions::default());
    }

    #[test]
    fn test_window_degenerate_and_invalid() {
        let stream = stream_60hz(&[Some(INT); 10]);
        let analyzer = GazeAnalyzer::default();

        let empty = analyzer
            .analyze_window(
                &stream,
                TimeWindow::new(5000.0, 6000.0),
                Bounds::Closed,
                &two_object_aoi(),
            )
            .unwrap();
        assert_eq!(empty.sample_count, 0);
        assert!(empty.onscreen_proportion.is_none());

        let reversed = analyzer.analyze_window(
            &stream,
            TimeWindow::new(100.0, 0.0),
            Bounds::Closed,
            &two_object_aoi(),
        );
        assert!(matches!(reversed, Err(ComputeError::InvalidWindow(_))));
    }

    #[test]
    fn test_scripted_trial() {
        let recording = scripted_recording();
        let report = analyze_recording(&recording, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.frame_rate_hz, 50.0);
        let t1 = &report.trials[0];

        assert_eq!(t1.label, "t1");
        assert_eq!(t1.baseline_onscreen, Some(1.0));
        // The 100 ms dropout is interpolated before onscreen is measured
        assert_eq!(t1.test_onscreen, Some(1.0));
        assert!(t1.gazed_at_attention_getter);

        assert!(close(t1.baseline.interesting, 29.0 / 49.0));
        assert!(close(t1.baseline.boring, 20.0 / 49.0));
        assert!(close(t1.test.interesting, 65.0 / 166.0));
        assert!(close(t1.test.boring, 101.0 / 166.0));
        assert!(close(
            t1.baseline_corrected.interesting,
            65.0 / 166.0 - 29.0 / 49.0
        ));

        assert!(t1.gaze_structure.responded);
        assert!(!t1.gaze_structure.has_initial_gaze());
        let first = t1.gaze_structure.slot(GazeSlotKind::First).unwrap();
        assert_eq!(first.object, Some(Tag::Interesting));
        assert!(close(first.latency_ms.unwrap(), 39.0));
        assert!(close(first.duration_ms.unwrap(), 1300.0));
        let second = t1.gaze_structure.slot(GazeSlotKind::Second).unwrap();
        assert_eq!(second.object, Some(Tag::Boring));
        assert!(close(second.latency_ms.unwrap(), 1339.0));
        assert!(close(second.duration_ms.unwrap(), 1020.0));

        assert_eq!(t1.first_gaze, Some(FirstGazeOutcome::Target));
        assert_eq!(t1.time_course.len(), 117);
        assert_eq!(t1.time_course[0], Tag::Out);
        assert!(t1.time_course[1..66].iter().all(|t| *t == Tag::Interesting));

        assert!(t1.valid);
        assert!(t1.flags.is_empty());

        assert!(report.phases.introduction.is_empty());
        assert!(report.phases.subject_valid);
    }

    #[test]
    fn test_pre_trial_phases() {
        let mut recording = scripted_recording();
        // Tracker lost for all of [7000, 8000)
        for sample in &mut recording.samples[350..400] {
            sample.x = None;
            sample.y = None;
        }

        let phase = |label: Option<&str>, presentation: (f64, f64), labeling: (f64, f64)| {
            PhaseSpec {
                label: label.map(str::to_string),
                presentation_start: presentation.0,
                presentation_end: presentation.1,
                labeling_start: labeling.0,
                labeling_end: labeling.1,
                aoi: None,
            }
        };
        recording.introduction = vec![phase(Some("ball"), (0.0, 600.0), (600.0, 1000.0))];
        recording.familiarisation = vec![
            PhaseSpec {
                aoi: Some(two_object_aoi()),
                ..phase(Some("rattle"), (1700.0, 3000.0), (3000.0, 4000.0))
            },
            phase(None, (7000.0, 8000.0), (8000.0, 9000.0)),
        ];

        let report = analyze_recording(&recording, &AnalysisConfig::default()).unwrap();
        let phases = &report.phases;

        let intro = &phases.introduction[0];
        assert_eq!(intro.label, "ball");
        assert_eq!(intro.presentation_onscreen, Some(1.0));
        assert_eq!(intro.labeling_onscreen, Some(1.0));
        assert!(intro.on_object.is_none());

        // The 100 ms dropout is interpolated, so the whole presentation is on INT
        assert_eq!(
            phases.familiarisation[0].on_object,
            Some(OnObjectProportions {
                interesting: 1.0,
                boring: 0.0,
                familiar: 0.0,
            })
        );
        assert_eq!(phases.familiarisation[1].label, "familiarisation_2");
        assert_eq!(phases.familiarisation[1].presentation_onscreen, Some(0.0));
        assert_eq!(phases.familiarisation[1].labeling_onscreen, Some(1.0));

        // Presentation mean is 0.5; labeling mean is 1.0
        assert_eq!(phases.flags, vec![SubjectFlag::LowFamiliarisationOnscreen]);
        assert!(!phases.subject_valid);

        // Trials are still reported for an excluded subject
        assert_eq!(report.trials.len(), 2);
        assert!(report.trials[0].valid);
    }

    #[test]
    fn test_phase_without_samples_counts_as_offscreen() {
        let mut recording = scripted_recording();
        recording.introduction = vec![PhaseSpec {
            label: None,
            presentation_start: 20000.0,
            presentation_end: 21000.0,
            labeling_start: 0.0,
            labeling_end: 600.0,
            aoi: None,
        }];

        let report = analyze_recording(&recording, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.phases.introduction[0].label, "introduction_1");
        assert!(report.phases.introduction[0].presentation_onscreen.is_none());
        assert_eq!(report.phases.flags, vec![SubjectFlag::LowIntroductionOnscreen]);
    }

    #[test]
    fn test_recording_frame_rate_overrides_config() {
        let analyzer = GazeAnalyzer::default();
        assert_eq!(analyzer.config().frame_rate_hz, 60.0);

        let at_50 = analyzer.at_frame_rate(Some(50.0)).unwrap();
        assert_eq!(at_50.config().frame_rate_hz, 50.0);
        assert_eq!(at_50.encoder().instance_id(), analyzer.encoder().instance_id());
        assert_eq!(analyzer.at_frame_rate(None).unwrap().config().frame_rate_hz, 60.0);
        assert!(matches!(
            analyzer.at_frame_rate(Some(0.0)),
            Err(ComputeError::InvalidConfig(_))
        ));

        // OUT, 7 x INT, OUT at 50 Hz: 7 > floor(134 / 20) = 6 but 7 < floor(134 / 16.7) = 8
        let mut points = vec![None];
        points.extend(vec![Some(INT); 7]);
        points.push(None);
        let samples = points
            .iter()
            .enumerate()
            .map(|(i, p)| match p {
                Some((x, y)) => Sample::valid(i as f64 * 20.0, *x, *y),
                None => Sample::invalid(i as f64 * 20.0),
            })
            .collect();
        let stream = SampleStream::new(samples).unwrap();
        let window = TimeWindow::new(0.0, 160.0);

        let at_60 = analyzer
            .analyze_window(&stream, window, Bounds::Closed, &two_object_aoi())
            .unwrap();
        assert!(at_60.gazes.is_empty());

        let at_50 = at_50
            .analyze_window(&stream, window, Bounds::Closed, &two_object_aoi())
            .unwrap();
        assert_eq!(at_50.gazes.len(), 1);
        assert_eq!(at_50.gazes[0].tag, Tag::Interesting);
        assert_eq!(at_50.gazes[0].onset, 20.0);
        assert_eq!(at_50.gazes[0].duration, 7);
    }

    #[test]
    fn test_missed_attention_getter_excludes_trial() {
        let report = analyze_recording(&scripted_recording(), &AnalysisConfig::default()).unwrap();
        let t2 = &report.trials[1];

        assert!(!t2.gazed_at_attention_getter);
        assert!(!t2.valid);
        assert_eq!(t2.flags, vec![TrialFlag::MissedAttentionGetter]);

        assert_eq!(report.summary.trial_count, 2);
        assert_eq!(report.summary.valid_trials, 1);
        assert_eq!(
            report.summary.mean_baseline_corrected,
            Some(report.trials[0].baseline_corrected)
        );
    }

    #[test]
    fn test_low_onscreen_flags() {
        let mut recording = scripted_recording();
        // Lose tracking for most of the first baseline
        for sample in recording.samples.iter_mut().take(40) {
            sample.x = None;
            sample.y = None;
        }
        let report = analyze_recording(&recording, &AnalysisConfig::default()).unwrap();
        let t1 = &report.trials[0];

        assert!(close(t1.baseline_onscreen.unwrap(), 10.0 / 50.0));
        assert_eq!(t1.flags, vec![TrialFlag::LowBaselineOnscreen]);
        assert!(!t1.valid);
        assert_eq!(report.summary.valid_trials, 0);
        assert!(report.summary.mean_baseline_corrected.is_none());
    }

    #[test]
    fn test_insufficient_trials() {
        let mut recording = scripted_recording();
        recording.trials.truncate(1);

        let err = analyze_recording(&recording, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ComputeError::InsufficientTrials {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_unlabelled_trials_are_numbered() {
        let mut recording = scripted_recording();
        for trial in &mut recording.trials {
            trial.label = None;
        }
        let report = analyze_recording(&recording, &AnalysisConfig::default()).unwrap();
        let labels: Vec<&str> = report.trials.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["trial_1", "trial_2"]);
    }

    #[test]
    fn test_analyze_session_json() {
        let json = serde_json::to_string(&scripted_recording()).unwrap();
        let output = analyze_session_json(&json, &AnalysisConfig::default()).unwrap();

        let report: SessionReport = serde_json::from_str(&output).unwrap();
        assert_eq!(report.subject_id, "s01");
        assert_eq!(report.trials.len(), 2);
        assert_eq!(report.producer.name, crate::PRODUCER_NAME);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            ranked_slots: 0,
            ..Default::default()
        };
        assert!(matches!(
            GazeAnalyzer::new(config),
            Err(ComputeError::InvalidConfig(_))
        ));
    }
}
