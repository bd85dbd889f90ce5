//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod export;
pub mod inspect;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use export::{execute_export, validate_args, validate_top_steps};
pub use inspect::execute_inspect;
pub use models::{ExportArgs, ExportOutcome, InspectArgs};
pub use utils::{display_version, open_input, read_build_log, validate_report_file};
