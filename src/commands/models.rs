use crate::parser::buildx::DuplicatePolicy;
use crate::telemetry::tracer::TracerConfig;
use crate::utils::config::{DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_SLOWEST_STEPS};
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the export command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ExportArgs {
    /// Build log path (None = stdin)
    pub input: Option<PathBuf>,

    /// Exporter configuration
    pub tracer: TracerConfig,

    /// W3C traceparent of the span to attach the build to
    pub traceparent: Option<String>,

    /// Handling of vertexes that complete more than once
    pub duplicates: DuplicatePolicy,

    /// Output path for JSON build report (optional)
    pub report: Option<PathBuf>,

    /// Print every parsed step to stdout
    pub print_steps: bool,

    /// Print build summary to stdout
    pub print_summary: bool,

    /// Number of slowest steps in summary and report
    pub top_steps: usize,

    /// Upper bound on flushing spans before exit
    pub shutdown_timeout: Duration,
}

impl Default for ExportArgs {
    fn default() -> Self {
        Self {
            input: None,
            tracer: TracerConfig::default(),
            traceparent: None,
            duplicates: DuplicatePolicy::default(),
            report: None,
            print_steps: false,
            print_summary: false,
            top_steps: DEFAULT_SLOWEST_STEPS,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// Arguments for the inspect command
#[derive(Debug, Clone)]
pub struct InspectArgs {
    /// Build log path (None = stdin)
    pub input: Option<PathBuf>,

    /// Handling of vertexes that complete more than once
    pub duplicates: DuplicatePolicy,

    /// Output path for JSON build report (optional)
    pub report: Option<PathBuf>,

    /// Print build summary after the step listing
    pub print_summary: bool,

    /// Number of slowest steps in summary and report
    pub top_steps: usize,
}

impl Default for InspectArgs {
    fn default() -> Self {
        Self {
            input: None,
            duplicates: DuplicatePolicy::default(),
            report: None,
            print_summary: false,
            top_steps: DEFAULT_SLOWEST_STEPS,
        }
    }
}

/// What a finished export produced
#[derive(Debug)]
pub struct ExportOutcome {
    /// Lowercase hex trace id of the emitted build trace
    pub trace_id: String,

    /// Number of step spans emitted
    pub steps: usize,

    /// Set when flushing spans at shutdown failed; the trace id is still valid
    pub shutdown_error: Option<crate::utils::error::TelemetryError>,
}
