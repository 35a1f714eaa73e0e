//! gazeflux - Gaze-event segmentation and looking-time metrics for eye-tracker data
//!
//! gazeflux turns raw eye-tracker samples into per-trial looking-time metrics
//! through a deterministic pipeline: gap interpolation → AOI classification
//! → gaze segmentation → gaze metrics → baseline correction → report encoding.
//!
//! ## Modules
//!
//! - **Input**: `schema` parses tracker exports, `stream` windows the samples
//! - **Stages**: `interpolate`, `classify`, `segment`, `metrics`, `baseline`
//! - **Orchestration**: `pipeline` runs trials and sessions, `encoder` emits reports

pub mod baseline;
pub mod classify;
pub mod config;
pub mod encoder;
pub mod error;
pub mod interpolate;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod segment;
pub mod stream;
pub mod types;

// FFI bindings for C interop
pub mod ffi;

pub use config::AnalysisConfig;
pub use error::ComputeError;
pub use pipeline::{analyze_recording, analyze_session_json, GazeAnalyzer};
pub use segment::{GazeCollection, GazeSegmenter};
pub use stream::SampleStream;

// Schema exports
pub use schema::{PhaseSpec, RawSample, Recording, SampleAdapter, TrialSpec, SCHEMA_VERSION};

/// gazeflux version embedded in all reports
pub const GAZEFLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "gazeflux";
