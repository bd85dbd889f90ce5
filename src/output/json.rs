//! JSON build report writer.
//!
//! Writes BuildReport structs to JSON files with proper formatting.

use crate::aggregator::metrics::{slowest_steps, summarize, BuildSummary, SlowStep};
use crate::parser::schema::BuildStep;
use crate::utils::config::REPORT_VERSION;
use crate::utils::error::OutputError;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Exported trace id, absent when the build was only inspected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    pub summary: BuildSummary,

    /// Longest steps, longest first
    pub slowest: Vec<SlowStep>,

    /// All steps in log order
    pub steps: Vec<ReportStep>,

    /// Timestamp when the report was generated
    pub generated_at: String,
}

/// A build step as it appears in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportStep {
    pub name: String,
    pub started: DateTime<Utc>,
    pub completed: DateTime<Utc>,
    pub duration_ms: u64,
    pub cached: bool,
}

impl From<&BuildStep> for ReportStep {
    fn from(step: &BuildStep) -> Self {
        Self {
            name: step.name.clone(),
            started: step.started,
            completed: step.completed,
            duration_ms: step.duration().as_millis() as u64,
            cached: step.cached,
        }
    }
}

/// Assemble a report from parsed steps
///
/// **Public** - used by commands to create final output
pub fn to_report(steps: &[BuildStep], trace_id: Option<&str>, top_n: usize) -> BuildReport {
    BuildReport {
        version: REPORT_VERSION.to_string(),
        trace_id: trace_id.map(str::to_string),
        summary: summarize(steps),
        slowest: slowest_steps(steps, top_n),
        steps: steps.iter().map(ReportStep::from).collect(),
        generated_at: Utc::now().to_rfc3339(),
    }
}

/// Write a report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_report(report: &BuildReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing build report to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    info!("Build report written ({} steps)", report.steps.len());

    Ok(())
}

/// Read a report from a JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_report(input_path: impl AsRef<Path>) -> Result<BuildReport, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading build report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: BuildReport = serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    debug!("Report loaded: version {}, {} steps", report.version, report.steps.len());

    Ok(report)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
