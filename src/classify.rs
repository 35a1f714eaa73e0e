//! AOI classification
//!
//! Maps each sample to a tag. Rectangles are tested in a fixed order and the
//! first match wins: interesting, boring, attention getter (only when one is
//! configured), familiar 1, familiar 2.

use crate::types::{AoiConfig, GazePoint, Sample, Tag, TaggedSample};

impl AoiConfig {
    /// Tag for a single coordinate (`None` is an invalid sample)
    pub fn classify_point(&self, point: Option<&GazePoint>) -> Tag {
        let Some(point) = point else {
            return Tag::Out;
        };

        if self.interesting.contains(point) {
            Tag::Interesting
        } else if self.boring.contains(point) {
            Tag::Boring
        } else if self
            .attention_getter
            .as_ref()
            .is_some_and(|r| r.contains(point))
        {
            Tag::AttentionGetter
        } else if self.familiar1.as_ref().is_some_and(|r| r.contains(point)) {
            Tag::Familiar
        } else if self.familiar2.as_ref().is_some_and(|r| r.contains(point)) {
            Tag::Familiar
        } else {
            Tag::Out
        }
    }
}

/// Tag one sample against an AOI configuration
pub fn classify(sample: &Sample, aoi: &AoiConfig) -> Tag {
    aoi.classify_point(sample.point.as_ref())
}

/// Tag every sample of a window
pub fn tag_samples(samples: &[Sample], aoi: &AoiConfig) -> Vec<TaggedSample> {
    samples
        .iter()
        .map(|s| TaggedSample {
            timestamp: s.timestamp,
            tag: classify(s, aoi),
        })
        .collect()
}
