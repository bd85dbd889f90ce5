//! W3C trace-context handling for grafting a build onto a caller's trace.

use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{SpanContext, TraceContextExt};
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use std::collections::HashMap;

/// Header name for the W3C `traceparent` value
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Decode a `version-traceid-spanid-flags` string
///
/// Returns `None` when the value is malformed or carries all-zero ids.
pub fn parse_traceparent(traceparent: &str) -> Option<SpanContext> {
    let traceparent = traceparent.trim();
    if !is_well_formed(traceparent) {
        return None;
    }

    let carrier = HashMap::from([(TRACEPARENT_HEADER.to_string(), traceparent.to_string())]);
    let extracted = TraceContextPropagator::new().extract(&carrier);
    let span_context = extracted.span().span_context().clone();

    span_context.is_valid().then_some(span_context)
}

/// Field widths of `version-traceid-spanid-flags`, all lowercase hex
const FIELD_WIDTHS: [usize; 4] = [2, 32, 16, 2];

/// The propagator zero-pads short ids, so widths are checked up front
fn is_well_formed(traceparent: &str) -> bool {
    let fields: Vec<&str> = traceparent.split('-').collect();
    fields.len() == FIELD_WIDTHS.len()
        && fields.iter().zip(FIELD_WIDTHS).all(|(field, width)| {
            field.len() == width && field.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        })
}

/// Build the parent context for a root span
///
/// A missing or malformed `traceparent` yields an empty context, so the
/// root span starts a new trace.
pub fn parent_context(traceparent: Option<&str>) -> Context {
    match traceparent.and_then(parse_traceparent) {
        Some(span_context) => Context::new().with_remote_span_context(span_context),
        None => Context::new(),
    }
}
