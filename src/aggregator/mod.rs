//! Aggregation of build steps into summary metrics.
//!
//! This module turns parsed build steps into:
//! - Step and cache-hit counts
//! - Summed step time versus wall-clock build time
//! - The slowest steps (primary targets for optimization)

pub mod metrics;

// Re-export main types and functions
pub use metrics::{slowest_steps, summarize, BuildSummary, SlowStep};
