//! gazeflux CLI - Command-line interface for gazeflux
//!
//! Commands:
//! - analyze: Run a recording through the full trial pipeline
//! - segment: Segment one time window of a sample file into gazes
//! - validate: Validate tracker samples
//! - schema: Print input/output schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use gazeflux::encoder::REPORT_VERSION;
use gazeflux::schema::{RawSample, Recording, SampleAdapter, SCHEMA_VERSION};
use gazeflux::types::{AoiConfig, Bounds, TimeWindow};
use gazeflux::{AnalysisConfig, GazeAnalyzer, GAZEFLUX_VERSION};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// gazeflux - Gaze segmentation and looking-time metrics for eye-tracker data
#[derive(Parser)]
#[command(name = "gazeflux")]
#[command(version = GAZEFLUX_VERSION)]
#[command(about = "Segment eye-tracker recordings into gazes and looking-time metrics", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every trial of a recording (gaze.recording.v1)
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Analysis configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Segment one time window into gaze events
    Segment {
        /// Sample file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// AOI configuration JSON file
        #[arg(long)]
        aoi: PathBuf,

        /// Window start (ms)
        #[arg(long)]
        start: f64,

        /// Window end (ms)
        #[arg(long)]
        end: f64,

        /// Inclusion rule for the window edges
        #[arg(long, default_value = "closed")]
        bounds: WindowBounds,

        /// Analysis configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip gap interpolation
        #[arg(long)]
        raw: bool,
    },

    /// Validate tracker samples
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of samples
    Json,
    /// Newline-delimited JSON (one sample per line)
    Ndjson,
    /// Tab-separated tracker export
    Tsv,
    /// Full gaze.recording.v1 document
    Recording,
}

#[derive(Clone, ValueEnum)]
enum WindowBounds {
    /// [start, end]
    Closed,
    /// [start, end)
    HalfOpen,
    /// (start, end)
    Open,
}

impl From<WindowBounds> for Bounds {
    fn from(b: WindowBounds) -> Self {
        match b {
            WindowBounds::Closed => Bounds::Closed,
            WindowBounds::HalfOpen => Bounds::HalfOpen,
            WindowBounds::Open => Bounds::Open,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (gaze.recording.v1)
    Input,
    /// Output schema (gaze.report.v1)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn run(cli: Cli) -> Result<(), GazefluxCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            config,
            pretty,
        } => cmd_analyze(&input, &output, config.as_deref(), pretty),

        Commands::Segment {
            input,
            input_format,
            aoi,
            start,
            end,
            bounds,
            config,
            raw,
        } => cmd_segment(
            &input,
            input_format,
            &aoi,
            TimeWindow::new(start, end),
            bounds.into(),
            config.as_deref(),
            raw,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    pretty: bool,
) -> Result<(), GazefluxCliError> {
    let input_data = read_input(input)?;
    let config = load_config(config)?;

    let recording = SampleAdapter::parse_recording(&input_data)?;
    debug!(
        subject = %recording.subject_id,
        samples = recording.samples.len(),
        trials = recording.trials.len(),
        "loaded recording"
    );

    let analyzer = GazeAnalyzer::new(config)?;
    let report = analyzer.analyze_session(&recording)?;
    let encoded = if pretty {
        analyzer.encoder().encode_to_json_pretty(&report)?
    } else {
        analyzer.encoder().encode_to_json(&report)?
    };

    write_output(output, &encoded)
}

fn cmd_segment(
    input: &Path,
    input_format: InputFormat,
    aoi: &Path,
    window: TimeWindow,
    bounds: Bounds,
    config: Option<&Path>,
    raw: bool,
) -> Result<(), GazefluxCliError> {
    let input_data = read_input(input)?;
    let config = load_config(config)?;
    let aoi: AoiConfig = serde_json::from_str(&fs::read_to_string(aoi)?)?;

    let (samples, frame_rate_hz) = parse_samples(&input_data, &input_format)?;
    if samples.is_empty() {
        return Err(GazefluxCliError::NoSamples);
    }

    let analyzer = GazeAnalyzer::new(config)?.at_frame_rate(frame_rate_hz)?;
    let stream = SampleAdapter::to_stream(&samples)?;
    let stream = if raw {
        stream
    } else {
        analyzer.interpolate(&stream)
    };

    let metrics = analyzer.analyze_window(&stream, window, bounds, &aoi)?;
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), GazefluxCliError> {
    let input_data = read_input(input)?;

    let mut errors = Vec::new();
    let samples = match input_format {
        InputFormat::Recording => {
            // Parse without validating so every problem is reported
            let recording: Recording = serde_json::from_str(&input_data)?;
            for (index, trial) in recording.trials.iter().enumerate() {
                if let Err(e) = trial.validate() {
                    errors.push(ValidationErrorDetail {
                        scope: "trial",
                        index,
                        error: e.to_string(),
                    });
                }
            }
            recording.samples
        }
        ref format => parse_samples(&input_data, format)?.0,
    };

    let sample_results = SampleAdapter::validate_samples(&samples);
    let invalid_samples: BTreeSet<usize> = sample_results.iter().map(|r| r.index).collect();
    errors.extend(sample_results.into_iter().map(|r| ValidationErrorDetail {
        scope: "sample",
        index: r.index,
        error: r.error.to_string(),
    }));

    let report = ValidationReport {
        schema_version: SCHEMA_VERSION,
        total_samples: samples.len(),
        valid_samples: samples.len() - invalid_samples.len(),
        tracked_samples: samples.iter().filter(|s| s.to_sample().is_valid()).count(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total samples:   {}", report.total_samples);
        println!("Valid samples:   {}", report.valid_samples);
        println!("Tracked samples: {}", report.tracked_samples);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {} {}: {}", err.scope, err.index, err.error);
            }
        }
    }

    if report.errors.is_empty() {
        Ok(())
    } else {
        Err(GazefluxCliError::ValidationFailed(report.errors.len()))
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), GazefluxCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("A recording contains:");
                println!();
                println!("- subject_id: Subject identifier");
                println!("- frame_rate_hz: Optional sampling rate, overrides the configuration");
                println!("- samples: Array of {{ timestamp (ms), x, y }}");
                println!("  - missing x/y or (-1, -1) marks a lost sample");
                println!("  - timestamp also accepted as t or TimeStamp");
                println!("- trials: Array of trials containing:");
                println!("  - label, target (INT, BOR, FAM)");
                println!("  - aoi: {{ interesting, boring, familiar1, familiar2 }} rectangles");
                println!("  - attention_getter: Optional rectangle");
                println!("  - baseline_start, attention_start, test_start, test_end (ms)");
                println!("- introduction, familiarisation: Optional arrays of phases containing:");
                println!("  - label, aoi (familiarisation objects)");
                println!("  - presentation_start, presentation_end, labeling_start, labeling_end (ms)");
                println!();
                println!("Rectangles are {{ center: {{ x, y }}, width, height }} in pixels.");
                println!("Sample files for segment/validate may also be NDJSON or Tobii TSV.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: {}", REPORT_VERSION);
                println!();
                println!("- producer: {{ name, version, instance_id }}");
                println!("- computed_at_utc, subject_id, frame_rate_hz");
                println!("- trials: Array of per-trial metrics containing:");
                println!("  - baseline_onscreen, test_onscreen, gazed_at_attention_getter");
                println!("  - baseline, test, baseline_corrected: {{ interesting, boring, familiar }}");
                println!("  - gaze_structure: {{ slots: [Initial gaze, 1st gaze, ...], responded }}");
                println!("  - first_gaze, time_course, valid, flags");
                println!("- phases: {{ introduction, familiarisation, subject_valid, flags }}");
                println!("  - each phase: presentation_onscreen, labeling_onscreen, on_object");
                println!("- summary: {{ trial_count, valid_trials, mean_baseline_corrected }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, GazefluxCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), GazefluxCliError> {
    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, GazefluxCliError> {
    match path {
        Some(p) => Ok(AnalysisConfig::from_json(&fs::read_to_string(p)?)?),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Samples of an input file, with the frame rate a full recording carries
fn parse_samples(
    data: &str,
    format: &InputFormat,
) -> Result<(Vec<RawSample>, Option<f64>), GazefluxCliError> {
    let parsed = match format {
        InputFormat::Json => (SampleAdapter::parse_array(data)?, None),
        InputFormat::Ndjson => (SampleAdapter::parse_ndjson(data)?, None),
        InputFormat::Tsv => (SampleAdapter::parse_tsv(data)?, None),
        InputFormat::Recording => {
            let recording: Recording = serde_json::from_str(data)?;
            (recording.samples, recording.frame_rate_hz)
        }
    };
    Ok(parsed)
}

fn get_input_json_schema() -> String {
    let rect = serde_json::json!({
        "type": "object",
        "required": ["center", "width", "height"],
        "properties": {
            "center": {
                "type": "object",
                "properties": {
                    "x": { "type": "number" },
                    "y": { "type": "number" }
                }
            },
            "width": { "type": "number" },
            "height": { "type": "number" }
        }
    });

    let phase = serde_json::json!({
        "type": "object",
        "required": ["presentation_start", "presentation_end", "labeling_start", "labeling_end"],
        "properties": {
            "label": { "type": "string" },
            "presentation_start": { "type": "number" },
            "presentation_end": { "type": "number" },
            "labeling_start": { "type": "number" },
            "labeling_end": { "type": "number" },
            "aoi": { "type": "object" }
        }
    });

    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$id": "https://gazeflux.dev/schemas/gaze.recording.v1.json",
        "title": "gaze.recording.v1",
        "type": "object",
        "required": ["subject_id", "samples"],
        "properties": {
            "schema_version": { "type": "string", "const": SCHEMA_VERSION },
            "subject_id": { "type": "string" },
            "frame_rate_hz": { "type": "number", "exclusiveMinimum": 0 },
            "samples": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["timestamp"],
                    "properties": {
                        "timestamp": { "type": "number" },
                        "x": { "type": ["number", "null"] },
                        "y": { "type": ["number", "null"] }
                    }
                }
            },
            "trials": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["aoi", "baseline_start", "attention_start", "test_start", "test_end"],
                    "properties": {
                        "label": { "type": "string" },
                        "aoi": {
                            "type": "object",
                            "required": ["interesting", "boring"],
                            "properties": {
                                "interesting": rect,
                                "boring": rect,
                                "familiar1": rect,
                                "familiar2": rect
                            }
                        },
                        "attention_getter": rect,
                        "baseline_start": { "type": "number" },
                        "attention_start": { "type": "number" },
                        "test_start": { "type": "number" },
                        "test_end": { "type": "number" },
                        "target": { "type": "string", "enum": ["INT", "BOR", "FAM"] }
                    }
                }
            },
            "introduction": { "type": "array", "items": phase },
            "familiarisation": { "type": "array", "items": phase }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    let proportions = serde_json::json!({
        "type": "object",
        "properties": {
            "interesting": { "type": "number" },
            "boring": { "type": "number" },
            "familiar": { "type": "number" }
        }
    });

    let phase = serde_json::json!({
        "type": "object",
        "properties": {
            "label": { "type": "string" },
            "presentation_onscreen": { "type": ["number", "null"] },
            "labeling_onscreen": { "type": ["number", "null"] },
            "on_object": proportions
        }
    });

    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$id": "https://gazeflux.dev/schemas/gaze.report.v1.json",
        "title": REPORT_VERSION,
        "type": "object",
        "required": ["report_version", "producer", "computed_at_utc", "subject_id", "trials", "phases", "summary"],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "subject_id": { "type": "string" },
            "frame_rate_hz": { "type": "number" },
            "trials": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "label": { "type": "string" },
                        "baseline_onscreen": { "type": ["number", "null"] },
                        "test_onscreen": { "type": ["number", "null"] },
                        "gazed_at_attention_getter": { "type": "boolean" },
                        "baseline": proportions,
                        "test": proportions,
                        "baseline_corrected": proportions,
                        "gaze_structure": { "type": "object" },
                        "first_gaze": { "type": "string", "enum": ["target", "other", "no_response"] },
                        "time_course": { "type": "array", "items": { "type": "string" } },
                        "valid": { "type": "boolean" },
                        "flags": { "type": "array", "items": { "type": "string" } }
                    }
                }
            },
            "phases": {
                "type": "object",
                "properties": {
                    "introduction": { "type": "array", "items": phase },
                    "familiarisation": { "type": "array", "items": phase },
                    "subject_valid": { "type": "boolean" },
                    "flags": { "type": "array", "items": { "type": "string" } }
                }
            },
            "summary": {
                "type": "object",
                "properties": {
                    "trial_count": { "type": "integer" },
                    "valid_trials": { "type": "integer" },
                    "mean_baseline_corrected": proportions
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum GazefluxCliError {
    Io(io::Error),
    Compute(gazeflux::ComputeError),
    Json(serde_json::Error),
    NoSamples,
    ValidationFailed(usize),
}

impl From<io::Error> for GazefluxCliError {
    fn from(e: io::Error) -> Self {
        GazefluxCliError::Io(e)
    }
}

impl From<gazeflux::ComputeError> for GazefluxCliError {
    fn from(e: gazeflux::ComputeError) -> Self {
        GazefluxCliError::Compute(e)
    }
}

impl From<serde_json::Error> for GazefluxCliError {
    fn from(e: serde_json::Error) -> Self {
        GazefluxCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GazefluxCliError> for CliError {
    fn from(e: GazefluxCliError) -> Self {
        use gazeflux::ComputeError;

        match e {
            GazefluxCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GazefluxCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::InvalidRecording(_)
                    | ComputeError::InvalidSample { .. }
                    | ComputeError::NonMonotonicTimestamp { .. } => (
                        "VALIDATION_ERROR",
                        "Run 'gazeflux validate' for details",
                    ),
                    ComputeError::InvalidConfig(_) => {
                        ("CONFIG_ERROR", "Check the analysis configuration file")
                    }
                    ComputeError::InsufficientTrials { .. } => (
                        "INSUFFICIENT_TRIALS",
                        "Lower min_trials in the configuration or add trials",
                    ),
                    ComputeError::InvalidWindow(_) => {
                        ("WINDOW_ERROR", "Window end must not precede its start")
                    }
                    _ => (
                        "PARSE_ERROR",
                        "Ensure input matches the gaze.recording.v1 schema",
                    ),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            GazefluxCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            GazefluxCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            GazefluxCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} problems found", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    schema_version: &'static str,
    total_samples: usize,
    valid_samples: usize,
    /// Samples with a usable gaze coordinate
    tracked_samples: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    scope: &'static str,
    index: usize,
    error: String,
}
