use crate::output::json::{read_report, BuildReport};
use crate::parser::buildx::{LogParser, ParsedLog, ParserConfig};
use crate::utils::config::REPORT_VERSION;
use anyhow::{Context, Result};
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Open the build log, falling back to stdin
pub fn open_input(input: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match input {
        Some(path) => {
            debug!("Reading build log from: {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("Error opening file: {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            debug!("Reading build log from stdin");
            Ok(Box::new(io::stdin().lock()))
        }
    }
}

/// Open and parse the build log in one go
pub fn read_build_log(input: Option<&Path>, config: ParserConfig) -> Result<ParsedLog> {
    let reader = open_input(input)?;
    LogParser::with_config(reader, config)
        .parse()
        .context("Error parsing log")
}

/// Load a JSON build report and print what it contains
pub fn validate_report_file(file_path: &Path) -> Result<BuildReport> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(file_path)
        .with_context(|| format!("Invalid build report: {}", file_path.display()))?;

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Trace: {}", report.trace_id.as_deref().unwrap_or("(not exported)"));
    println!("  Steps: {}", report.summary.step_count);
    println!(
        "  Cache Hits: {} ({:.1}%)",
        report.summary.cached_count, report.summary.cache_hit_percentage
    );
    if report.summary.is_mostly_cached() {
        println!("  Mostly served from cache");
    }

    Ok(report)
}

/// Display version information
pub fn display_version() {
    println!("buildx-trace v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", REPORT_VERSION);
    println!();
    println!("Replays docker buildx rawjson progress logs as OpenTelemetry traces.");
}
