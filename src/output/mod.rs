//! Output writers for build data.
//!
//! This module handles writing data in various formats:
//! - JSON build reports
//! - Plain text step listings and summaries

pub mod json;
pub mod text;

// Re-export main functions
pub use json::{read_report, to_report, write_report, BuildReport, ReportStep};
pub use text::{format_steps, format_summary};
