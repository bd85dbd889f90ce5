//! Export command implementation.
//!
//! The export command:
//! 1. Parses the build log
//! 2. Resolves the optional parent trace context
//! 3. Initializes the OTLP exporter
//! 4. Emits the build trace
//! 5. Flushes spans with a deadline
//! 6. Writes optional listings and report

use super::models::{ExportArgs, ExportOutcome};
use super::utils::read_build_log;
use crate::aggregator::{slowest_steps, summarize};
use crate::output::{format_steps, format_summary, to_report, write_report};
use crate::parser::buildx::ParserConfig;
use crate::telemetry::{parent_context, parse_traceparent, traces_endpoint, BuildTracer};
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::time::Instant;

/// Execute the export command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The trace id and, separately, any failure to flush spans at shutdown
///
/// # Errors
/// * Input file cannot be opened or read
/// * Exporter initialization fails
/// * Report file cannot be written
pub fn execute_export(args: ExportArgs) -> Result<ExportOutcome> {
    let start_time = Instant::now();

    info!("Step 1/4: Parsing build log...");
    let parsed = read_build_log(
        args.input.as_deref(),
        ParserConfig::new().with_duplicates(args.duplicates),
    )?;
    let steps = parsed.steps;

    let traceparent = args
        .traceparent
        .as_deref()
        .map(str::trim)
        .filter(|tp| !tp.is_empty());
    if let Some(tp) = traceparent {
        if parse_traceparent(tp).is_none() {
            warn!("Ignoring malformed traceparent {:?}, starting a new trace", tp);
        }
    }
    let parent = parent_context(traceparent);

    info!("Step 2/4: Initializing tracer...");
    let tracer = BuildTracer::new(args.tracer.clone()).context("Error initializing tracer")?;

    info!("Step 3/4: Exporting {} steps...", steps.len());
    let trace_id = tracer.export_build_traces(&parent, &steps);
    println!("TraceID: {}", trace_id);

    info!("Step 4/4: Flushing spans...");
    let shutdown_error = tracer.shutdown(args.shutdown_timeout).err();
    if let Some(e) = &shutdown_error {
        error!("Error shutting down tracer: {}", e);
    }

    if args.print_steps {
        print!("{}", format_steps(&steps));
    }

    if args.print_summary {
        println!("{}", format_summary(&summarize(&steps), &slowest_steps(&steps, args.top_steps)));
    }

    if let Some(path) = &args.report {
        let report = to_report(&steps, Some(&trace_id), args.top_steps);
        write_report(&report, path).context("Failed to write build report")?;
        info!("✓ Build report written to: {}", path.display());
    }

    info!("Export completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(ExportOutcome {
        trace_id,
        steps: steps.len(),
        shutdown_error,
    })
}

/// Validate export arguments
///
/// **Public** - can be called before execute_export for early validation
pub fn validate_args(args: &ExportArgs) -> Result<()> {
    if args.tracer.endpoint.is_empty() {
        anyhow::bail!("OTLP endpoint cannot be empty");
    }

    traces_endpoint(&args.tracer.endpoint)?;

    if args.tracer.service_name.trim().is_empty() {
        anyhow::bail!("Service name cannot be empty");
    }

    if args.shutdown_timeout.is_zero() {
        anyhow::bail!("Shutdown timeout must be greater than 0");
    }

    validate_top_steps(args.top_steps)
}

/// Shared bound check for the slowest-steps count
pub fn validate_top_steps(top_steps: usize) -> Result<()> {
    if top_steps == 0 {
        anyhow::bail!("top must be greater than 0");
    }

    if top_steps > 1000 {
        anyhow::bail!("top is too large (max 1000)");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TracerConfig;
    use std::time::Duration;

    #[test]
    fn test_validate_args_default() {
        assert!(validate_args(&ExportArgs::default()).is_ok());
    }

    #[test]
    fn test_validate_args_empty_endpoint() {
        let args = ExportArgs {
            tracer: TracerConfig::new().with_endpoint(""),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_grpc_style_endpoint() {
        let args = ExportArgs {
            tracer: TracerConfig::new().with_endpoint("localhost:4317"),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_blank_service_name() {
        let args = ExportArgs {
            tracer: TracerConfig::new().with_service_name("  "),
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_zero_timeout() {
        let args = ExportArgs {
            shutdown_timeout: Duration::ZERO,
            ..Default::default()
        };

        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_top_steps_bounds() {
        assert!(validate_top_steps(0).is_err());
        assert!(validate_top_steps(1).is_ok());
        assert!(validate_top_steps(2000).is_err());
    }
}
