//! Parsers for tracker exports
//!
//! Turns JSON, NDJSON or Tobii TSV exports into raw samples, and raw samples
//! into a validated [`SampleStream`].

use crate::error::ComputeError;
use crate::schema::recording::*;
use crate::stream::SampleStream;

const TSV_TIMESTAMP: &str = "TimeStamp";
const TSV_EVENT: &str = "Event";
const TSV_GAZE_X: &str = "GazePointX";
const TSV_GAZE_Y: &str = "GazePointY";

/// Adapter for converting tracker exports into sample streams
pub struct SampleAdapter;

impl SampleAdapter {
    /// Parse a full recording document
    pub fn parse_recording(json: &str) -> Result<Recording, ComputeError> {
        let recording: Recording = serde_json::from_str(json)?;
        recording.validate()?;
        Ok(recording)
    }

    /// Parse a JSON string containing an array of samples
    pub fn parse_array(json: &str) -> Result<Vec<RawSample>, ComputeError> {
        let samples: Vec<RawSample> = serde_json::from_str(json)?;
        Ok(samples)
    }

    /// Parse NDJSON (newline-delimited JSON) containing samples
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawSample>, ComputeError> {
        let mut samples = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawSample>(trimmed) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(samples)
    }

    /// Parse a tab-separated Tobii export.
    ///
    /// Rows with a non-empty `Event` cell are log markers, not samples, and
    /// are skipped. Empty coordinate cells mean an invalid sample.
    pub fn parse_tsv(tsv: &str) -> Result<Vec<RawSample>, ComputeError> {
        let mut lines = tsv
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((_, header)) = lines.next() else {
            return Ok(Vec::new());
        };
        let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
        let column = |name: &str| columns.iter().position(|c| *c == name);

        let ts_col = column(TSV_TIMESTAMP).ok_or_else(|| missing_column(TSV_TIMESTAMP))?;
        let x_col = column(TSV_GAZE_X).ok_or_else(|| missing_column(TSV_GAZE_X))?;
        let y_col = column(TSV_GAZE_Y).ok_or_else(|| missing_column(TSV_GAZE_Y))?;
        let event_col = column(TSV_EVENT);

        let mut samples = Vec::new();
        for (line_num, line) in lines {
            let cells: Vec<&str> = line.split('\t').map(str::trim).collect();
            let cell = |col: usize| cells.get(col).copied().unwrap_or("");

            if event_col.is_some_and(|col| !cell(col).is_empty()) {
                continue;
            }

            let timestamp = parse_cell(cell(ts_col), TSV_TIMESTAMP, line_num)?.ok_or_else(|| {
                ComputeError::ParseError(format!("Missing timestamp on line {}", line_num + 1))
            })?;
            let x = parse_cell(cell(x_col), TSV_GAZE_X, line_num)?;
            let y = parse_cell(cell(y_col), TSV_GAZE_Y, line_num)?;

            samples.push(RawSample::new(timestamp, x, y));
        }

        Ok(samples)
    }

    /// Validate raw samples and build a sample stream
    pub fn to_stream(samples: &[RawSample]) -> Result<SampleStream, ComputeError> {
        for (index, sample) in samples.iter().enumerate() {
            sample.validate().map_err(|e| ValidationError::AtSample {
                index,
                source: Box::new(e),
            })?;
        }
        SampleStream::new(samples.iter().map(RawSample::to_sample).collect())
    }

    /// Validate a batch of samples, including timestamp order
    pub fn validate_samples(samples: &[RawSample]) -> Vec<ValidationResult> {
        let mut results: Vec<ValidationResult> = samples
            .iter()
            .enumerate()
            .filter_map(|(index, sample)| {
                sample
                    .validate()
                    .err()
                    .map(|error| ValidationResult { index, error })
            })
            .collect();

        for (i, pair) in samples.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                results.push(ValidationResult {
                    index: i + 1,
                    error: ValidationError::NonMonotonic {
                        previous: pair[0].timestamp,
                        current: pair[1].timestamp,
                    },
                });
            }
        }

        results.sort_by_key(|r| r.index);
        results
    }
}

/// A sample that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub error: ValidationError,
}

fn missing_column(name: &str) -> ComputeError {
    ComputeError::ParseError(format!("TSV header has no {} column", name))
}

fn parse_cell(cell: &str, column: &str, line_num: usize) -> Result<Option<f64>, ComputeError> {
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>().map(Some).map_err(|_| {
        ComputeError::ParseError(format!(
            "Invalid {} value '{}' on line {}",
            column,
            cell,
            line_num + 1
        ))
    })
}
