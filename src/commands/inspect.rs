//! Inspect command implementation.
//!
//! Parses a build log and prints what would be exported, without
//! contacting a collector.

use super::models::InspectArgs;
use super::utils::read_build_log;
use crate::aggregator::{slowest_steps, summarize};
use crate::output::{format_steps, format_summary, to_report, write_report};
use crate::parser::buildx::{ParseStats, ParserConfig};
use anyhow::{Context, Result};
use log::info;

/// Execute the inspect command
///
/// **Public** - main entry point called from main.rs
pub fn execute_inspect(args: InspectArgs) -> Result<ParseStats> {
    let parsed = read_build_log(
        args.input.as_deref(),
        ParserConfig::new().with_duplicates(args.duplicates),
    )?;

    print!("{}", format_steps(&parsed.steps));

    if args.print_summary {
        println!(
            "{}",
            format_summary(&summarize(&parsed.steps), &slowest_steps(&parsed.steps, args.top_steps))
        );
    }

    if let Some(path) = &args.report {
        let report = to_report(&parsed.steps, None, args.top_steps);
        write_report(&report, path).context("Failed to write build report")?;
        info!("✓ Build report written to: {}", path.display());
    }

    Ok(parsed.stats)
}
