//! Gaze metrics
//!
//! Pure functions over a segmented gaze collection: on-object proportions,
//! ranked gaze lookup within the response window, and the first/second/third
//! gaze table used for latency analysis.

use crate::config::AnalysisConfig;
use crate::segment::GazeCollection;
use crate::types::{
    FirstGazeOutcome, GazeSlot, GazeSlotKind, GazeStructure, OnObjectProportions, RankedGaze, Tag,
};

/// Sum gaze durations per object class and divide by the total.
///
/// `ATT` events are ignored. An empty total yields all zeros.
pub fn on_object_proportions(gazes: &GazeCollection) -> OnObjectProportions {
    let (mut on_int, mut on_bor, mut on_fam) = (0usize, 0usize, 0usize);
    for event in gazes.events() {
        match event.tag {
            Tag::Interesting => on_int += event.duration,
            Tag::Boring => on_bor += event.duration,
            Tag::Familiar => on_fam += event.duration,
            Tag::AttentionGetter | Tag::Out => {}
        }
    }

    let total = on_int + on_bor + on_fam;
    if total == 0 {
        return OnObjectProportions::default();
    }

    let total = total as f64;
    OnObjectProportions {
        interesting: on_int as f64 / total,
        boring: on_bor as f64 / total,
        familiar: on_fam as f64 / total,
    }
}

/// Ranked lookup and gaze-structure extraction
#[derive(Debug, Clone, Copy)]
pub struct GazeMetrics {
    sample_interval_ms: f64,
    response_window_ms: f64,
    initial_gaze_threshold_ms: f64,
    ranked_slots: usize,
}

impl GazeMetrics {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            sample_interval_ms: config.sample_interval_ms(),
            response_window_ms: config.response_window_ms,
            initial_gaze_threshold_ms: config.initial_gaze_threshold_ms,
            ranked_slots: config.ranked_slots.clamp(1, GazeSlotKind::ORDINALS.len()),
        }
    }

    /// Gaze at `rank` with its latency from `reference_time`.
    ///
    /// `None` when the rank does not exist or the gaze started after the
    /// response window closed.
    pub fn ranked(
        &self,
        gazes: &GazeCollection,
        rank: usize,
        reference_time: f64,
    ) -> Option<RankedGaze> {
        let event = gazes.get(rank)?;
        let latency_ms = event.onset - reference_time;
        if latency_ms > self.response_window_ms {
            return None;
        }
        Some(RankedGaze {
            tag: event.tag,
            latency_ms,
            duration: event.duration,
        })
    }

    /// Build the gaze-structure table relative to `reference_time`.
    ///
    /// If the first gaze was already under way at the reference time (latency
    /// below the initial-gaze threshold) it fills the "Initial gaze" slot and
    /// the ordinal slots shift by one rank.
    pub fn gaze_structure(&self, gazes: &GazeCollection, reference_time: f64) -> GazeStructure {
        let kinds: Vec<GazeSlotKind> = std::iter::once(GazeSlotKind::Initial)
            .chain(GazeSlotKind::ORDINALS[..self.ranked_slots].iter().copied())
            .collect();
        let mut slots: Vec<(GazeSlotKind, GazeSlot)> =
            kinds.iter().map(|k| (*k, GazeSlot::default())).collect();

        let Some(first) = self.ranked(gazes, 1, reference_time) else {
            return GazeStructure {
                slots,
                responded: false,
            };
        };

        let skip = if first.latency_ms < self.initial_gaze_threshold_ms {
            0
        } else {
            1
        };

        for (rank, (_, slot)) in (1..).zip(slots.iter_mut().skip(skip)) {
            if let Some(gaze) = self.ranked(gazes, rank, reference_time) {
                *slot = GazeSlot {
                    object: Some(gaze.tag),
                    latency_ms: Some(gaze.latency_ms),
                    duration_ms: Some(gaze.duration as f64 * self.sample_interval_ms),
                };
            }
        }

        GazeStructure {
            slots,
            responded: true,
        }
    }
}

/// Whether the "1st gaze" slot landed on `target`
pub fn first_gaze_outcome(structure: &GazeStructure, target: Tag) -> FirstGazeOutcome {
    match structure
        .slot(GazeSlotKind::First)
        .and_then(|slot| slot.object)
    {
        None => FirstGazeOutcome::NoResponse,
        Some(tag) if tag == target => FirstGazeOutcome::Target,
        Some(_) => FirstGazeOutcome::Other,
    }
}
