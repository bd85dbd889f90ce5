//! Plain text rendering of build steps for terminal output.

use crate::aggregator::metrics::{BuildSummary, SlowStep};
use crate::parser::schema::BuildStep;
use chrono::SecondsFormat;
use std::fmt::Write;

/// List every step with its timestamps and cache flag
pub fn format_steps(steps: &[BuildStep]) -> String {
    let mut out = String::new();
    for step in steps {
        let _ = write!(
            out,
            "{}\nStarted: {}\nCompleted: {}\nCached: {}\n\n",
            step.name,
            step.started.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            step.completed.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            step.cached
        );
    }
    out
}

/// Render a summary block followed by the slowest steps
pub fn format_summary(summary: &BuildSummary, slowest: &[SlowStep]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Steps:        {}", summary.step_count);
    let _ = writeln!(
        out,
        "Cache hits:   {} ({:.1}%)",
        summary.cached_count, summary.cache_hit_percentage
    );
    let _ = writeln!(out, "Step time:    {:.2}s", summary.total_step_ms as f64 / 1000.0);
    let _ = writeln!(out, "Wall clock:   {:.2}s", summary.wall_clock_ms as f64 / 1000.0);
    if summary.is_mostly_cached() {
        let _ = writeln!(out, "Most steps were served from the build cache");
    }

    if !slowest.is_empty() {
        let _ = writeln!(out, "\nSlowest steps:");
        for (i, step) in slowest.iter().enumerate() {
            let marker = if step.cached { " (cached)" } else { "" };
            let _ = writeln!(
                out,
                "  {}. {:>9.2}s  {}{}",
                i + 1,
                step.duration_ms as f64 / 1000.0,
                step.name,
                marker
            );
        }
    }
    out
}
