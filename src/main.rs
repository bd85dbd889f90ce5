//! Buildx Trace CLI
//!
//! Turns a finished buildx rawjson progress log into an OpenTelemetry trace.

use anyhow::Result;
use buildx_trace::commands::{
    display_version, execute_export, execute_inspect, validate_args, validate_report_file,
    validate_top_steps, ExportArgs, InspectArgs,
};
use buildx_trace::parser::DuplicatePolicy;
use buildx_trace::telemetry::TracerConfig;
use buildx_trace::utils::config::{
    DEFAULT_OTLP_ENDPOINT, DEFAULT_SERVICE_NAME, DEFAULT_SLOWEST_STEPS,
};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::debug;
use std::path::PathBuf;
use std::time::Duration;

/// Buildx Trace - retroactive tracing for docker builds
#[derive(Parser, Debug)]
#[command(name = "buildx-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Duplicate vertex handling
#[derive(ValueEnum, Clone, Copy, Debug)]
enum DedupArg {
    /// Keep every completed vertex update
    None,
    /// Keep the first completion per vertex digest
    Digest,
}

impl From<DedupArg> for DuplicatePolicy {
    fn from(arg: DedupArg) -> Self {
        match arg {
            DedupArg::None => DuplicatePolicy::KeepAll,
            DedupArg::Digest => DuplicatePolicy::ByDigest,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Export a build log as a trace
    Export {
        /// Input file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// OTLP/HTTP collector URL
        #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", default_value = DEFAULT_OTLP_ENDPOINT)]
        otlp_endpoint: String,

        /// Service name for telemetry
        #[arg(long, env = "OTEL_SERVICE_NAME", default_value = DEFAULT_SERVICE_NAME)]
        service_name: String,

        /// Version recorded on the resource and every span
        #[arg(long)]
        build_version: Option<String>,

        /// W3C traceparent of a parent span (e.g. from CI)
        #[arg(long, env = "TRACEPARENT")]
        traceparent: Option<String>,

        /// Handling of vertexes that complete more than once
        #[arg(long, value_enum, default_value = "none")]
        dedup: DedupArg,

        /// Output path for JSON build report
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Print every parsed step
        #[arg(long)]
        debug: bool,

        /// Print build summary
        #[arg(long)]
        summary: bool,

        /// Number of slowest steps to list
        #[arg(long, default_value_t = DEFAULT_SLOWEST_STEPS)]
        top: usize,

        /// Seconds to wait for spans to flush
        #[arg(long, default_value = "10")]
        shutdown_timeout: u64,
    },

    /// Parse a build log and print its steps without exporting
    Inspect {
        /// Input file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Handling of vertexes that complete more than once
        #[arg(long, value_enum, default_value = "none")]
        dedup: DedupArg,

        /// Output path for JSON build report
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Print build summary
        #[arg(long)]
        summary: bool,

        /// Number of slowest steps to list
        #[arg(long, default_value_t = DEFAULT_SLOWEST_STEPS)]
        top: usize,
    },

    /// Check that a JSON build report is readable
    Validate {
        /// Report file to validate
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Export {
            input,
            otlp_endpoint,
            service_name,
            build_version,
            traceparent,
            dedup,
            report,
            debug,
            summary,
            top,
            shutdown_timeout,
        } => {
            let args = ExportArgs {
                input,
                tracer: TracerConfig::new()
                    .with_endpoint(otlp_endpoint)
                    .with_service_name(service_name)
                    .with_version(build_version),
                traceparent,
                duplicates: dedup.into(),
                report,
                print_steps: debug,
                print_summary: summary,
                top_steps: top,
                shutdown_timeout: Duration::from_secs(shutdown_timeout),
            };

            validate_args(&args)?;

            let outcome = execute_export(args)?;
            debug!("Exported {} steps in trace {}", outcome.steps, outcome.trace_id);

            if let Some(e) = outcome.shutdown_error {
                return Err(e.into());
            }
        }

        Commands::Inspect {
            input,
            dedup,
            report,
            summary,
            top,
        } => {
            validate_top_steps(top)?;

            let stats = execute_inspect(InspectArgs {
                input,
                duplicates: dedup.into(),
                report,
                print_summary: summary,
                top_steps: top,
            })?;
            debug!("Parse stats: {:?}", stats);
        }

        Commands::Validate { file } => {
            validate_report_file(&file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
