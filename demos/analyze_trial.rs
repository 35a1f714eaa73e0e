//! Analyze a synthetic two-trial recording and print the report

use gazeflux::schema::{RawSample, Recording, TrialSpec};
use gazeflux::types::{AoiConfig, Rect, Tag};
use gazeflux::{analyze_recording, AnalysisConfig};

fn main() {
    // 50 Hz; look at the attention getter, then the left object, then the right one
    let samples = (0..600)
        .map(|i| {
            let t = i as f64 * 20.0;
            let (x, y) = match t % 6000.0 {
                local if local < 1000.0 => (480.0, 300.0),
                local if local < 2000.0 => (960.0, 600.0),
                local if local < 3200.0 => (480.0, 300.0),
                _ => (1440.0, 900.0),
            };
            RawSample::new(t, Some(x), Some(y))
        })
        .collect();

    let trial = |label: &str, start: f64| TrialSpec {
        label: Some(label.to_string()),
        aoi: AoiConfig::new(
            Rect::new(480.0, 300.0, 520.0, 520.0),
            Rect::new(1440.0, 900.0, 520.0, 520.0),
        ),
        attention_getter: Some(Rect::new(960.0, 600.0, 320.0, 320.0)),
        baseline_start: start,
        attention_start: start + 1000.0,
        test_start: start + 2000.0,
        test_end: start + 5000.0,
        target: Some(Tag::Interesting),
    };

    let recording = Recording {
        schema_version: None,
        subject_id: "demo".to_string(),
        frame_rate_hz: Some(50.0),
        samples,
        trials: vec![trial("first", 0.0), trial("second", 6000.0)],
        introduction: Vec::new(),
        familiarisation: Vec::new(),
    };

    match analyze_recording(&recording, &AnalysisConfig::default()) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error: {e}"),
        },
        Err(e) => eprintln!("Error: {e}"),
    }
}
