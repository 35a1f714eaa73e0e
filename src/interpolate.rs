//! Gap interpolation
//!
//! Fills short runs of invalid samples with a linear ramp between the valid
//! samples that bracket the run. A run is filled only when it is at most
//! `max_gap_samples` long and the two samples on either side of it are valid.
//! The first two and last two samples of the stream are never filled; they
//! only serve as guard-band context.

use crate::config::{samples_in, AnalysisConfig};
use crate::stream::SampleStream;
use crate::types::GazePoint;
use tracing::debug;

/// Samples on each side of a gap that must be valid
const GUARD_BAND: usize = 2;

/// Gap interpolator parameterised by sampling interval and gap limit
#[derive(Debug, Clone, Copy)]
pub struct GapInterpolator {
    max_gap_samples: usize,
}

impl GapInterpolator {
    /// Create an interpolator from a sampling interval and maximum gap (ms)
    pub fn new(sample_interval_ms: f64, max_gap_ms: f64) -> Self {
        Self {
            max_gap_samples: samples_in(max_gap_ms, sample_interval_ms),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            max_gap_samples: config.max_gap_samples(),
        }
    }

    pub fn max_gap_samples(&self) -> usize {
        self.max_gap_samples
    }

    /// Return a copy of `stream` with qualifying gaps filled.
    ///
    /// Timestamps and valid samples are never changed.
    pub fn interpolate(&self, stream: &SampleStream) -> SampleStream {
        let mut samples = stream.samples().to_vec();
        let len = samples.len();

        if len < 2 * GUARD_BAND + 1 {
            return SampleStream::from_validated(samples);
        }

        let first = GUARD_BAND;
        let last = len - 1 - GUARD_BAND;
        let mut filled_gaps = 0usize;
        let mut skipped_gaps = 0usize;

        let mut i = first;
        while i <= last {
            if samples[i].is_valid() {
                i += 1;
                continue;
            }

            // Run of invalid samples, never extending past `last`
            let start = i;
            let mut end = i + 1;
            while end <= last && !samples[end].is_valid() {
                end += 1;
            }
            let run_len = end - start;

            // `end` is at most `last + 1 = len - 2`, so `end + 1` is in bounds
            let guarded = samples[start - 2].is_valid()
                && samples[start - 1].is_valid()
                && samples[end].is_valid()
                && samples[end + 1].is_valid();

            match (samples[start - 1].point, samples[end].point) {
                (Some(before), Some(after)) if run_len <= self.max_gap_samples && guarded => {
                    for (offset, sample) in samples[start..end].iter_mut().enumerate() {
                        sample.point = Some(fill_value(before, after, offset + 1, run_len));
                    }
                    filled_gaps += 1;
                }
                _ => skipped_gaps += 1,
            }

            i = end + 1;
        }

        debug!(
            filled_gaps,
            skipped_gaps,
            max_gap_samples = self.max_gap_samples,
            "interpolated sample stream"
        );

        SampleStream::from_validated(samples)
    }
}

/// Convenience wrapper: interpolate with an explicit interval and gap limit
pub fn interpolate_gaps(
    stream: &SampleStream,
    sample_interval_ms: f64,
    max_gap_ms: f64,
) -> SampleStream {
    GapInterpolator::new(sample_interval_ms, max_gap_ms).interpolate(stream)
}

/// `step`-th of `run_len` evenly spaced points strictly between `before` and `after`
fn fill_value(before: GazePoint, after: GazePoint, step: usize, run_len: usize) -> GazePoint {
    let divisor = (run_len + 1) as f64;
    let x_step = (after.x - before.x) / divisor;
    let y_step = (after.y - before.y) / divisor;
    GazePoint::new(
        before.x + step as f64 * x_step,
        before.y + step as f64 * y_step,
    )
}
