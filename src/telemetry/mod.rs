//! OpenTelemetry export of parsed build steps.
//!
//! This module handles:
//! - Decoding an optional W3C `traceparent` to graft onto
//! - Owning the OTLP exporter pipeline
//! - Emitting backdated spans for each build step

pub mod context;
pub mod tracer;

// Re-export main types
pub use context::{parent_context, parse_traceparent, TRACEPARENT_HEADER};
pub use tracer::{span_name, traces_endpoint, BuildTracer, TracerConfig};
