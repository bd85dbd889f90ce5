//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::parser::buildx::ParsedLog;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while reading a build log
///
/// Undecodable lines and unparsable timestamps are recovered inside the
/// parser and never surface here.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The reader failed; `partial` holds everything parsed before that
    #[error("Failed to read build log after {} steps: {source}", .partial.steps.len())]
    Io {
        #[source]
        source: std::io::Error,
        partial: Box<ParsedLog>,
    },
}

impl ParseError {
    /// Steps and counters collected before the failure
    pub fn partial(&self) -> &ParsedLog {
        match self {
            ParseError::Io { partial, .. } => partial,
        }
    }
}

/// Errors raised by the trace exporter
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid OTLP endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to create OTLP span exporter: {0}")]
    ExporterInit(String),

    #[error("Failed to flush spans on shutdown: {0}")]
    Shutdown(String),

    #[error("Exporter shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
