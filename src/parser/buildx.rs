//! Streaming parser for buildx rawjson progress logs.
//!
//! Reads the log one line at a time and keeps only vertexes that carry both
//! a start and a completion time. A line that does not decode, or a vertex
//! whose timestamp does not parse, is skipped with a debug note; only a
//! failure of the underlying reader aborts the parse.

use super::schema::{BuildStep, LogEntry, Vertex};
use crate::utils::error::ParseError;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::HashSet;
use std::io::BufRead;

/// What to do when the same vertex completes on more than one line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Emit a step for every completed vertex update
    #[default]
    KeepAll,
    /// Emit only the first completed update per vertex digest.
    /// Vertexes without a digest are never collapsed.
    ByDigest,
}

/// Parser options
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    pub duplicates: DuplicatePolicy,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }
}

/// Aggregate counters collected during a parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines read, blank ones included
    pub lines: usize,
    /// Lines that failed to decode as a log entry
    pub malformed_lines: usize,
    /// Vertex updates seen
    pub vertexes: usize,
    /// Status updates seen
    pub statuses: usize,
    /// Completed vertexes dropped by `DuplicatePolicy::ByDigest`
    pub duplicates_skipped: usize,
    /// Steps emitted
    pub steps: usize,
}

/// Steps and counters collected from a log
#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    /// Completed steps in log order
    pub steps: Vec<BuildStep>,
    pub stats: ParseStats,
}

/// Single-use parser over a buffered reader
pub struct LogParser<R> {
    reader: R,
    config: ParserConfig,
}

impl<R: BufRead> LogParser<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ParserConfig::default())
    }

    pub fn with_config(reader: R, config: ParserConfig) -> Self {
        Self { reader, config }
    }

    /// Consume the stream and collect completed build steps
    ///
    /// # Errors
    /// * `ParseError::Io` - the reader failed; steps collected so far travel
    ///   with the error as its partial log
    pub fn parse(mut self) -> Result<ParsedLog, ParseError> {
        let mut parsed = ParsedLog::default();
        let mut seen_digests = HashSet::new();
        let mut buf = Vec::new();

        debug!("Starting to parse buildx log");

        loop {
            buf.clear();
            match self.reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(source) => {
                    parsed.stats.steps = parsed.steps.len();
                    return Err(ParseError::Io {
                        source,
                        partial: Box::new(parsed),
                    });
                }
            }
            parsed.stats.lines += 1;

            let line = trim_line_ending(&buf);
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let entry: LogEntry = match serde_json::from_slice(line) {
                Ok(entry) => entry,
                Err(e) => {
                    parsed.stats.malformed_lines += 1;
                    debug!("Skipping line {}: {}", parsed.stats.lines, e);
                    continue;
                }
            };

            parsed.stats.statuses += entry.statuses.len();

            for vertex in entry.vertexes {
                parsed.stats.vertexes += 1;

                let Some(step) = to_build_step(&vertex) else {
                    continue;
                };

                if self.config.duplicates == DuplicatePolicy::ByDigest
                    && !vertex.digest.is_empty()
                    && !seen_digests.insert(vertex.digest.clone())
                {
                    parsed.stats.duplicates_skipped += 1;
                    debug!("Dropping repeated completion of {}", vertex.digest);
                    continue;
                }

                debug!(
                    "Parsed build step: {} ({:?}, cached={})",
                    step.name,
                    step.duration(),
                    step.cached
                );
                parsed.steps.push(step);
            }
        }

        parsed.stats.steps = parsed.steps.len();

        info!(
            "Completed parsing build log: {} lines, {} vertexes, {} statuses, {} steps ({} malformed lines)",
            parsed.stats.lines,
            parsed.stats.vertexes,
            parsed.stats.statuses,
            parsed.stats.steps,
            parsed.stats.malformed_lines
        );

        Ok(parsed)
    }
}

/// Parse a log with default options, returning only the steps
pub fn parse_log<R: BufRead>(reader: R) -> Result<Vec<BuildStep>, ParseError> {
    LogParser::new(reader).parse().map(|parsed| parsed.steps)
}

/// Convert a vertex into a step if it has completed
///
/// Returns `None` for in-progress vertexes and for unparsable timestamps.
fn to_build_step(vertex: &Vertex) -> Option<BuildStep> {
    if !vertex.is_completed() {
        return None;
    }

    let started = parse_timestamp(vertex.started.as_deref()?)
        .map_err(|e| debug!("Failed to parse start time of {}: {}", vertex.name, e))
        .ok()?;
    let completed = parse_timestamp(vertex.completed.as_deref()?)
        .map_err(|e| debug!("Failed to parse completion time of {}: {}", vertex.name, e))
        .ok()?;

    Some(BuildStep {
        name: vertex.name.clone(),
        started,
        completed,
        cached: vertex.cached,
    })
}

/// Parse an RFC3339 timestamp with up to nanosecond precision
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
