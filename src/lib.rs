//! Buildx Trace
//!
//! Replays the progress log of a finished `docker buildx build
//! --progress=rawjson` run as an OpenTelemetry trace: one root span for the
//! build and one child span per completed step, each carrying the step's
//! recorded start and completion times.
//!
//! ## Getting Started
//!
//! ```bash
//! docker buildx build --progress=rawjson . 2> build.log
//! buildx-trace export --input build.log --otlp-endpoint http://localhost:4318
//! ```
//!
//! As a library:
//!
//! ```no_run
//! use buildx_trace::parser::parse_log;
//! use buildx_trace::telemetry::{parent_context, BuildTracer, TracerConfig};
//! use std::io::BufReader;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let steps = parse_log(BufReader::new(std::fs::File::open("build.log")?))?;
//! let tracer = BuildTracer::new(TracerConfig::default())?;
//! let trace_id = tracer.export_build_traces(&parent_context(None), &steps);
//! tracer.shutdown(Duration::from_secs(10))?;
//! println!("{trace_id}");
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod telemetry;
pub mod utils;
