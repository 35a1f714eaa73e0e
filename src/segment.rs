//! Gaze segmentation
//!
//! Collapses a tagged sample sequence into discrete gaze events in a single
//! pass. A run of consecutive same-tag samples becomes a gaze only if it is
//! long enough, and the admission rule depends on how the run ends:
//!
//! - tag change: `count >= min_count`
//! - `OUT` sample: `count > min_count`
//! - last sample of the window: `count > min_count`

use crate::config::{samples_in, AnalysisConfig};
use crate::types::{GazeEvent, Tag, TaggedSample};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Run being accumulated by the segmenter
#[derive(Debug, Clone, Copy)]
struct Run {
    tag: Tag,
    onset: f64,
    count: usize,
}

impl Run {
    fn start(sample: &TaggedSample) -> Self {
        Self {
            tag: sample.tag,
            onset: sample.timestamp,
            count: 1,
        }
    }
}

/// Ordered gaze events for one analysis window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeCollection {
    events: Vec<GazeEvent>,
}

impl GazeCollection {
    pub fn events(&self) -> &[GazeEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<GazeEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event by 1-based rank
    pub fn get(&self, rank: usize) -> Option<&GazeEvent> {
        rank.checked_sub(1).and_then(|i| self.events.get(i))
    }

    /// Tags of all events in time order
    pub fn tags(&self) -> Vec<Tag> {
        self.events.iter().map(|e| e.tag).collect()
    }

    pub fn contains_tag(&self, tag: Tag) -> bool {
        self.events.iter().any(|e| e.tag == tag)
    }

    pub fn last(&self) -> Option<&GazeEvent> {
        self.events.last()
    }

    fn push(&mut self, run: Run) {
        let rank = self.events.len() + 1;
        self.events.push(GazeEvent {
            rank,
            tag: run.tag,
            onset: run.onset,
            duration: run.count,
        });
    }
}

/// Gaze segmenter with a minimum-duration admission rule
#[derive(Debug, Clone, Copy)]
pub struct GazeSegmenter {
    min_count: usize,
}

impl GazeSegmenter {
    /// `min_count = floor(min_duration_ms / sample_interval_ms)`
    pub fn new(min_duration_ms: f64, sample_interval_ms: f64) -> Self {
        Self {
            min_count: samples_in(min_duration_ms, sample_interval_ms),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            min_count: config.min_gaze_samples(),
        }
    }

    pub fn min_count(&self) -> usize {
        self.min_count
    }

    /// Segment a tagged sample sequence into gaze events
    pub fn segment(&self, tagged: &[TaggedSample]) -> GazeCollection {
        let mut collection = GazeCollection::default();
        let mut current: Option<Run> = None;
        let last_index = tagged.len().saturating_sub(1);

        for (i, sample) in tagged.iter().enumerate() {
            if sample.tag == Tag::Out {
                if let Some(run) = current.take() {
                    if run.count > self.min_count {
                        collection.push(run);
                    }
                }
                continue;
            }

            current = match current {
                None => Some(Run::start(sample)),
                Some(mut run) if run.tag == sample.tag => {
                    run.count += 1;
                    if i == last_index && run.count > self.min_count {
                        collection.push(run);
                    }
                    Some(run)
                }
                Some(run) => {
                    if run.count >= self.min_count {
                        collection.push(run);
                    }
                    Some(Run::start(sample))
                }
            };
        }

        debug!(
            samples = tagged.len(),
            gazes = collection.len(),
            min_count = self.min_count,
            "segmented gaze window"
        );

        collection
    }
}

/// Convenience wrapper: segment with explicit thresholds
pub fn segment(
    tagged: &[TaggedSample],
    min_duration_ms: f64,
    sample_interval_ms: f64,
) -> GazeCollection {
    GazeSegmenter::new(min_duration_ms, sample_interval_ms).segment(tagged)
}
