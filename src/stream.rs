//! Sample stream
//!
//! A validated, time-ordered table of gaze samples. Every later stage reads
//! windows out of this table; only the interpolator produces a new one.

use crate::error::ComputeError;
use crate::types::{Bounds, Sample, TimeWindow};

/// Validated, time-ordered gaze samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleStream {
    samples: Vec<Sample>,
}

impl SampleStream {
    /// Build a stream, rejecting non-finite values and decreasing timestamps
    pub fn new(samples: Vec<Sample>) -> Result<Self, ComputeError> {
        for (index, sample) in samples.iter().enumerate() {
            if !sample.timestamp.is_finite() {
                return Err(ComputeError::InvalidSample {
                    index,
                    reason: format!("timestamp is not finite ({})", sample.timestamp),
                });
            }
            if let Some(point) = sample.point {
                if !point.x.is_finite() || !point.y.is_finite() {
                    return Err(ComputeError::InvalidSample {
                        index,
                        reason: "coordinate is not finite".to_string(),
                    });
                }
            }
        }

        if let Some(index) = samples
            .windows(2)
            .position(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(ComputeError::NonMonotonicTimestamp {
                index: index + 1,
                previous: samples[index].timestamp,
                current: samples[index + 1].timestamp,
            });
        }

        Ok(Self { samples })
    }

    /// Crate-internal constructor for streams derived from a validated one
    pub(crate) fn from_validated(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_valid()).count()
    }

    /// Contiguous slice of samples inside `window`
    pub fn window(&self, window: TimeWindow, bounds: Bounds) -> &[Sample] {
        let (start, end) = match bounds {
            Bounds::Closed => (
                self.samples.partition_point(|s| s.timestamp < window.start),
                self.samples.partition_point(|s| s.timestamp <= window.end),
            ),
            Bounds::HalfOpen => (
                self.samples.partition_point(|s| s.timestamp < window.start),
                self.samples.partition_point(|s| s.timestamp < window.end),
            ),
            Bounds::Open => (
                self.samples.partition_point(|s| s.timestamp <= window.start),
                self.samples.partition_point(|s| s.timestamp < window.end),
            ),
        };

        if start >= end {
            return &[];
        }
        &self.samples[start..end]
    }

    /// Share of valid samples in `[start, end)`, or `None` for an empty window
    pub fn onscreen_proportion(&self, window: TimeWindow) -> Option<f64> {
        onscreen_proportion(self.window(window, Bounds::HalfOpen))
    }

    /// Onscreen proportion for each window in turn
    pub fn onscreen_proportions(&self, windows: &[TimeWindow]) -> Vec<Option<f64>> {
        windows
            .iter()
            .map(|w| self.onscreen_proportion(*w))
            .collect()
    }
}

/// Share of valid samples, independent of any AOI.
///
/// Returns `None` when `samples` is empty since the ratio is undefined.
pub fn onscreen_proportion(samples: &[Sample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let valid = samples.iter().filter(|s| s.is_valid()).count();
    Some(valid as f64 / samples.len() as f64)
}
