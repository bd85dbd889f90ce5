use buildx_trace::parser::{parse_log, BuildStep};
use buildx_trace::telemetry::{parent_context, BuildTracer, TracerConfig};
use buildx_trace::utils::error::TelemetryError;
use opentelemetry::trace::SpanId;
use opentelemetry::Context;
use opentelemetry_sdk::error::{OTelSdkError, OTelSdkResult};
use opentelemetry_sdk::trace::{
    InMemorySpanExporter, SdkTracerProvider, Span, SpanData, SpanProcessor,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime};

const PARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

const TWO_STEPS: &str = concat!(
    r#"{"vertexes":[{"name":"step1","started":"2023-01-01T00:00:00Z","completed":"2023-01-01T00:00:10Z","cached":false}]}"#,
    "\n",
    r#"{"vertexes":[{"name":"step2","started":"2023-01-01T00:00:10Z","completed":"2023-01-01T00:00:20Z","cached":true}]}"#,
    "\n",
);

fn in_memory_tracer(config: TracerConfig) -> (BuildTracer, InMemorySpanExporter) {
    let exporter = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    (BuildTracer::with_provider(config, provider), exporter)
}

/// Span processor with configurable slowness and shutdown outcome
#[derive(Debug, Default)]
struct RecordingProcessor {
    spans: Arc<Mutex<Vec<SpanData>>>,
    shut_down: Arc<AtomicBool>,
    end_delay: Duration,
    shutdown_delay: Duration,
    fail_shutdown: bool,
}

impl SpanProcessor for RecordingProcessor {
    fn on_start(&self, _span: &mut Span, _cx: &Context) {}

    fn on_end(&self, span: SpanData) {
        thread::sleep(self.end_delay);
        self.spans.lock().unwrap().push(span);
    }

    fn force_flush(&self) -> OTelSdkResult {
        Ok(())
    }

    fn shutdown(&self) -> OTelSdkResult {
        thread::sleep(self.shutdown_delay);
        self.shut_down.store(true, Ordering::SeqCst);
        if self.fail_shutdown {
            return Err(OTelSdkError::InternalFailure("boom".to_string()));
        }
        Ok(())
    }
}

fn processor_tracer(processor: RecordingProcessor) -> BuildTracer {
    let provider = SdkTracerProvider::builder()
        .with_span_processor(processor)
        .build();
    BuildTracer::with_provider(TracerConfig::default(), provider)
}

fn two_steps() -> Vec<BuildStep> {
    parse_log(Cursor::new(TWO_STEPS)).unwrap()
}

#[test]
fn test_export_two_steps() {
    let (tracer, exporter) = in_memory_tracer(TracerConfig::default());
    let steps = two_steps();

    let trace_id = tracer.export_build_traces(&Context::new(), &steps);
    let spans = exporter.get_finished_spans().unwrap();

    assert_eq!(spans.len(), 3);

    let root = spans.iter().find(|s| s.name == "docker-build").unwrap();
    let step1 = spans.iter().find(|s| s.name == "step1").unwrap();
    let step2 = spans.iter().find(|s| s.name == "step2 (cached)").unwrap();

    assert_eq!(root.parent_span_id, SpanId::INVALID);
    assert_eq!(root.span_context.trace_id().to_string(), trace_id);
    assert_eq!(root.start_time, SystemTime::from(steps[0].started));

    for (span, step) in [(step1, &steps[0]), (step2, &steps[1])] {
        assert_eq!(span.parent_span_id, root.span_context.span_id());
        assert_eq!(span.span_context.trace_id(), root.span_context.trace_id());
        assert_eq!(span.start_time, SystemTime::from(step.started));
        assert_eq!(span.end_time, SystemTime::from(step.completed));
    }

    // Record names stay unsuffixed
    assert_eq!(steps[1].name, "step2");
}

#[test]
fn test_trace_id_is_lowercase_hex() {
    let (tracer, _exporter) = in_memory_tracer(TracerConfig::default());

    let trace_id = tracer.export_build_traces(&Context::new(), &two_steps());

    assert_eq!(trace_id.len(), 32);
    assert!(trace_id
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    assert_ne!(trace_id, "0".repeat(32));
}

#[test]
fn test_span_durations_ignore_export_delay() {
    let delay = Duration::from_millis(20);
    let processor = RecordingProcessor {
        end_delay: delay,
        ..Default::default()
    };
    let recorded = Arc::clone(&processor.spans);
    let tracer = processor_tracer(processor);
    let before = SystemTime::now();

    // Each ended step stalls inside the processor before the next one is built
    tracer.export_build_traces(&Context::new(), &two_steps());

    let spans = recorded.lock().unwrap();
    assert_eq!(spans.len(), 3);
    for name in ["step1", "step2 (cached)"] {
        let span = spans.iter().find(|s| s.name == name).unwrap();
        let duration = span.end_time.duration_since(span.start_time).unwrap();
        assert_eq!(duration, Duration::from_secs(10));
    }

    let root = spans.iter().find(|s| s.name == "docker-build").unwrap();
    assert!(root.end_time >= before + delay * 2);
}

#[test]
fn test_root_span_ends_at_export_time() {
    let (tracer, exporter) = in_memory_tracer(TracerConfig::default());
    let before = SystemTime::now();

    tracer.export_build_traces(&Context::new(), &two_steps());

    let spans = exporter.get_finished_spans().unwrap();
    let root = spans.iter().find(|s| s.name == "docker-build").unwrap();
    assert!(root.end_time >= before);
}

#[test]
fn test_valid_parent_is_adopted() {
    let (tracer, exporter) = in_memory_tracer(TracerConfig::default());

    let trace_id = tracer.export_build_traces(&parent_context(Some(PARENT)), &two_steps());
    let spans = exporter.get_finished_spans().unwrap();
    let root = spans.iter().find(|s| s.name == "docker-build").unwrap();

    assert_eq!(trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
    assert_eq!(root.parent_span_id.to_string(), "00f067aa0ba902b7");
    assert!(spans
        .iter()
        .all(|s| s.span_context.trace_id().to_string() == trace_id));
}

#[test]
fn test_malformed_parent_starts_new_trace() {
    let (tracer, exporter) = in_memory_tracer(TracerConfig::default());

    let trace_id = tracer.export_build_traces(&parent_context(Some("00-zz-yy-01")), &two_steps());
    let spans = exporter.get_finished_spans().unwrap();
    let root = spans.iter().find(|s| s.name == "docker-build").unwrap();

    assert!(!trace_id.is_empty());
    assert_ne!(trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
    assert_eq!(root.parent_span_id, SpanId::INVALID);
}

#[test]
fn test_short_trace_id_parent_starts_new_trace() {
    let (tracer, exporter) = in_memory_tracer(TracerConfig::default());
    let short = "00-4bf92f3577b34da6-00f067aa0ba902b7-01";

    let trace_id = tracer.export_build_traces(&parent_context(Some(short)), &two_steps());
    let spans = exporter.get_finished_spans().unwrap();
    let root = spans.iter().find(|s| s.name == "docker-build").unwrap();

    assert!(!trace_id.contains("4bf92f3577b34da6"));
    assert_eq!(root.parent_span_id, SpanId::INVALID);
}

#[test]
fn test_unsampled_parent_keeps_trace_id_without_recording() {
    let (tracer, exporter) = in_memory_tracer(TracerConfig::default());
    let unsampled = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00";

    let trace_id = tracer.export_build_traces(&parent_context(Some(unsampled)), &two_steps());

    assert_eq!(trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
    assert!(exporter.get_finished_spans().unwrap().is_empty());
}

#[test]
fn test_version_attribute_on_every_span() {
    let config = TracerConfig::new().with_version(Some("v1.2.3".to_string()));
    let (tracer, exporter) = in_memory_tracer(config);

    tracer.export_build_traces(&Context::new(), &two_steps());
    let spans = exporter.get_finished_spans().unwrap();

    assert_eq!(spans.len(), 3);
    for span in &spans {
        let version = span
            .attributes
            .iter()
            .find(|kv| kv.key.as_str() == "version")
            .unwrap();
        assert_eq!(version.value.as_str(), "v1.2.3");
    }
}

#[test]
fn test_no_version_attribute_by_default() {
    let (tracer, exporter) = in_memory_tracer(TracerConfig::default());

    tracer.export_build_traces(&Context::new(), &two_steps());
    let spans = exporter.get_finished_spans().unwrap();

    assert!(spans
        .iter()
        .all(|s| s.attributes.iter().all(|kv| kv.key.as_str() != "version")));
}

#[test]
fn test_cached_attribute_on_step_spans() {
    let (tracer, exporter) = in_memory_tracer(TracerConfig::default());

    tracer.export_build_traces(&Context::new(), &two_steps());
    let spans = exporter.get_finished_spans().unwrap();

    let cached = |name: &str| {
        spans
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.attributes.iter().find(|kv| kv.key.as_str() == "build.step.cached"))
            .map(|kv| kv.value.as_str().into_owned())
    };
    assert_eq!(cached("step1").as_deref(), Some("false"));
    assert_eq!(cached("step2 (cached)").as_deref(), Some("true"));
}

#[test]
fn test_custom_root_span_name() {
    let config = TracerConfig::new().with_root_span_name("ci-image-build");
    let (tracer, exporter) = in_memory_tracer(config);

    tracer.export_build_traces(&Context::new(), &two_steps());
    let spans = exporter.get_finished_spans().unwrap();

    assert!(spans.iter().any(|s| s.name == "ci-image-build"));
    assert!(spans.iter().all(|s| s.name != "docker-build"));
}

#[test]
fn test_export_without_steps_emits_root_only() {
    let (tracer, exporter) = in_memory_tracer(TracerConfig::default());

    let trace_id = tracer.export_build_traces(&Context::new(), &[]);
    let spans = exporter.get_finished_spans().unwrap();

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "docker-build");
    assert_eq!(spans[0].span_context.trace_id().to_string(), trace_id);
}

#[test]
fn test_independent_tracers_do_not_interfere() {
    let (first, first_exporter) = in_memory_tracer(TracerConfig::default());
    let (second, second_exporter) = in_memory_tracer(TracerConfig::default());

    let first_id = first.export_build_traces(&Context::new(), &two_steps());
    let second_id = second.export_build_traces(&Context::new(), &[]);

    assert_ne!(first_id, second_id);
    assert_eq!(first_exporter.get_finished_spans().unwrap().len(), 3);
    assert_eq!(second_exporter.get_finished_spans().unwrap().len(), 1);
}

#[test]
fn test_shutdown_succeeds() {
    let (tracer, _exporter) = in_memory_tracer(TracerConfig::default());

    tracer.export_build_traces(&Context::new(), &two_steps());

    assert!(tracer.shutdown(Duration::from_secs(5)).is_ok());
}

#[test]
fn test_shutdown_failure_is_reported() {
    let processor = RecordingProcessor {
        fail_shutdown: true,
        ..Default::default()
    };
    let shut_down = Arc::clone(&processor.shut_down);
    let tracer = processor_tracer(processor);

    tracer.export_build_traces(&Context::new(), &two_steps());
    let result = tracer.shutdown(Duration::from_secs(5));

    match result {
        Err(TelemetryError::Shutdown(message)) => assert!(message.contains("boom")),
        other => panic!("expected shutdown error, got {:?}", other),
    }
    assert!(shut_down.load(Ordering::SeqCst));
}

#[test]
fn test_shutdown_gives_up_after_timeout() {
    let processor = RecordingProcessor {
        shutdown_delay: Duration::from_millis(500),
        ..Default::default()
    };
    let tracer = processor_tracer(processor);

    tracer.export_build_traces(&Context::new(), &two_steps());
    let result = tracer.shutdown(Duration::from_millis(50));

    match result {
        Err(TelemetryError::ShutdownTimeout(timeout)) => {
            assert_eq!(timeout, Duration::from_millis(50))
        }
        other => panic!("expected shutdown timeout, got {:?}", other),
    }
}

#[test]
fn test_drop_without_shutdown_closes_processor() {
    let processor = RecordingProcessor::default();
    let shut_down = Arc::clone(&processor.shut_down);
    let recorded = Arc::clone(&processor.spans);
    let tracer = processor_tracer(processor);

    tracer.export_build_traces(&Context::new(), &two_steps());
    assert!(!shut_down.load(Ordering::SeqCst));

    drop(tracer);

    assert!(shut_down.load(Ordering::SeqCst));
    assert_eq!(recorded.lock().unwrap().len(), 3);
}
