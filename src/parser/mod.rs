//! Build log parsing and schema definitions.
//!
//! This module handles:
//! - Decoding rawjson progress lines from buildx
//! - Extracting completed vertexes as build steps
//! - Optional collapsing of repeated vertex completions

pub mod buildx;
pub mod schema;

// Re-export main types
pub use buildx::{parse_log, parse_timestamp, DuplicatePolicy, LogParser, ParseStats, ParsedLog, ParserConfig};
pub use schema::{BuildStep, LogEntry, Vertex};
