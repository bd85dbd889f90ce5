//! Calculate summary metrics from build steps.
//!
//! Slow steps are the build operations that take the longest.
//! These are the primary targets for optimization.

use crate::parser::schema::BuildStep;
use log::debug;
use serde::{Deserialize, Serialize};

/// Summary statistics for a build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Number of completed steps
    pub step_count: usize,

    /// Steps served from the build cache
    pub cached_count: usize,

    /// Percentage of steps that were cache hits
    pub cache_hit_percentage: f64,

    /// Sum of all step durations in milliseconds
    pub total_step_ms: u64,

    /// First start to last completion in milliseconds
    pub wall_clock_ms: u64,
}

impl BuildSummary {
    /// Returns true if more than half of the steps were cache hits
    pub fn is_mostly_cached(&self) -> bool {
        self.cache_hit_percentage > 50.0
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Steps: {} | Cached: {} ({:.1}%) | Step time: {}ms | Wall clock: {}ms",
            self.step_count,
            self.cached_count,
            self.cache_hit_percentage,
            self.total_step_ms,
            self.wall_clock_ms
        )
    }
}

/// A step ranked by duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowStep {
    pub name: String,
    pub duration_ms: u64,
    pub cached: bool,
}

/// Calculate build summary statistics
///
/// **Public** - main entry point for metrics calculation
pub fn summarize(steps: &[BuildStep]) -> BuildSummary {
    if steps.is_empty() {
        return BuildSummary::default();
    }

    let cached_count = steps.iter().filter(|s| s.cached).count();
    let total_step_ms = steps.iter().map(duration_ms).sum();

    let first_started = steps.iter().map(|s| s.started).min();
    let last_completed = steps.iter().map(|s| s.completed).max();
    let wall_clock_ms = match (first_started, last_completed) {
        (Some(start), Some(end)) => (end - start).num_milliseconds().max(0) as u64,
        _ => 0,
    };

    BuildSummary {
        step_count: steps.len(),
        cached_count,
        cache_hit_percentage: (cached_count as f64 / steps.len() as f64) * 100.0,
        total_step_ms,
        wall_clock_ms,
    }
}

/// Return the `top_n` longest steps, longest first
///
/// Ties keep log order.
pub fn slowest_steps(steps: &[BuildStep], top_n: usize) -> Vec<SlowStep> {
    debug!("Ranking top {} of {} steps by duration", top_n, steps.len());

    let mut ranked: Vec<SlowStep> = steps
        .iter()
        .map(|step| SlowStep {
            name: step.name.clone(),
            duration_ms: duration_ms(step),
            cached: step.cached,
        })
        .collect();

    ranked.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms));
    ranked.truncate(top_n);
    ranked
}

fn duration_ms(step: &BuildStep) -> u64 {
    step.duration().as_millis() as u64
}
