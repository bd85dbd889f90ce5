//! Replays parsed build steps as an OpenTelemetry trace.
//!
//! One root span covers the build and every step becomes a child span whose
//! start and end are the step's own timestamps, so the exported trace
//! reflects when the build ran rather than when it was exported.

use crate::parser::schema::BuildStep;
use crate::utils::config::{
    CACHED_ATTRIBUTE, CACHED_SUFFIX, DEFAULT_EXPORT_TIMEOUT, DEFAULT_OTLP_ENDPOINT,
    DEFAULT_SERVICE_NAME, OTLP_TRACES_PATH, PROGRESS_INTERVAL, ROOT_SPAN_NAME, TRACER_NAME,
    VERSION_ATTRIBUTE,
};
use crate::utils::error::TelemetryError;
use log::{debug, info, warn};
use opentelemetry::trace::{Span as _, SpanKind, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_otlp::{Protocol, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, SystemTime};

/// Tracer configuration
#[derive(Debug, Clone)]
pub struct TracerConfig {
    /// OTLP/HTTP collector base URL (`/v1/traces` is appended when missing)
    pub endpoint: String,

    /// `service.name` resource attribute
    pub service_name: String,

    /// Optional provenance marker put on the resource and on every span
    pub version: Option<String>,

    /// Name of the span wrapping the build
    pub root_span_name: String,

    /// Timeout of each export request
    pub export_timeout: Duration,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            version: None,
            root_span_name: ROOT_SPAN_NAME.to_string(),
            export_timeout: DEFAULT_EXPORT_TIMEOUT,
        }
    }
}

impl TracerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    /// Empty strings are treated as no version
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version.filter(|v| !v.is_empty());
        self
    }

    pub fn with_root_span_name(mut self, name: impl Into<String>) -> Self {
        self.root_span_name = name.into();
        self
    }

    pub fn with_export_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout = timeout;
        self
    }
}

/// Owns an exporter pipeline and turns build steps into spans
///
/// The provider is never registered globally. Call [`BuildTracer::shutdown`]
/// to flush with a deadline; a tracer dropped without it is shut down on drop.
pub struct BuildTracer {
    provider: SdkTracerProvider,
    config: TracerConfig,
    shut_down: bool,
}

impl BuildTracer {
    /// Create a tracer exporting over OTLP/HTTP
    ///
    /// # Errors
    /// * `TelemetryError::InvalidEndpoint` - endpoint is not an http(s) URL
    /// * `TelemetryError::HttpClient` - the HTTP client could not be built
    /// * `TelemetryError::ExporterInit` - the OTLP exporter rejected its configuration
    pub fn new(config: TracerConfig) -> Result<Self, TelemetryError> {
        info!(
            "Initializing OpenTelemetry tracer (endpoint: {}, service: {}, version: {})",
            config.endpoint,
            config.service_name,
            config.version.as_deref().unwrap_or("-")
        );

        let endpoint = traces_endpoint(&config.endpoint)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(config.export_timeout)
            .build()?;

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_http_client(client)
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(endpoint)
            .with_timeout(config.export_timeout)
            .build()
            .map_err(|e| TelemetryError::ExporterInit(e.to_string()))?;

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(build_resource(&config))
            .build();

        info!("OpenTelemetry tracer initialized");

        Ok(Self::with_provider(config, provider))
    }

    /// Wrap an already built provider
    pub fn with_provider(config: TracerConfig, provider: SdkTracerProvider) -> Self {
        Self {
            provider,
            config,
            shut_down: false,
        }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Emit the root span and one child per step, returning the trace id
    ///
    /// `parent` may carry a remote span context (see
    /// [`parent_context`](super::context::parent_context)); the root span then
    /// joins that trace instead of starting a new one.
    pub fn export_build_traces(&self, parent: &Context, steps: &[BuildStep]) -> String {
        info!("Starting to export build traces ({} steps)", steps.len());

        let tracer = self.provider.tracer(TRACER_NAME);

        let parent_span = parent.span();
        let parent_span_context = parent_span.span_context();
        if parent_span_context.is_valid() {
            info!(
                "Creating build span as child of parent span (trace: {}, span: {})",
                parent_span_context.trace_id(),
                parent_span_context.span_id()
            );
        } else {
            info!("Creating new root build span");
        }

        let root_start = steps
            .iter()
            .map(|step| step.started)
            .min()
            .map(SystemTime::from)
            .unwrap_or_else(SystemTime::now);

        let root = tracer
            .span_builder(self.config.root_span_name.clone())
            .with_kind(SpanKind::Internal)
            .with_start_time(root_start)
            .with_attributes(self.version_attribute())
            .start_with_context(&tracer, parent);

        let trace_id = root.span_context().trace_id();
        let build_cx = parent.with_span(root);

        for (index, step) in steps.iter().enumerate() {
            let mut attributes = vec![KeyValue::new(CACHED_ATTRIBUTE, step.cached)];
            attributes.extend(self.version_attribute());

            let mut span = tracer
                .span_builder(span_name(step))
                .with_kind(SpanKind::Internal)
                .with_start_time(SystemTime::from(step.started))
                .with_attributes(attributes)
                .start_with_context(&tracer, &build_cx);
            span.end_with_timestamp(SystemTime::from(step.completed));

            if index > 0 && index % PROGRESS_INTERVAL == 0 {
                debug!("Exported {} of {} step spans", index, steps.len());
            }
        }

        build_cx.span().end();

        info!(
            "Completed exporting build traces (trace: {}, steps: {})",
            trace_id,
            steps.len()
        );

        trace_id.to_string()
    }

    /// Flush pending spans and close the exporter, waiting at most `timeout`
    ///
    /// # Errors
    /// * `TelemetryError::Shutdown` - the flush or exporter close failed
    /// * `TelemetryError::ShutdownTimeout` - the deadline passed first
    pub fn shutdown(mut self, timeout: Duration) -> Result<(), TelemetryError> {
        info!("Shutting down OpenTelemetry tracer");
        self.shut_down = true;

        let provider = self.provider.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(provider.shutdown().map_err(|e| e.to_string()));
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result.map_err(TelemetryError::Shutdown),
            Err(_) => Err(TelemetryError::ShutdownTimeout(timeout)),
        }
    }

    fn version_attribute(&self) -> Option<KeyValue> {
        self.config
            .version
            .as_ref()
            .map(|version| KeyValue::new(VERSION_ATTRIBUTE, version.clone()))
    }
}

impl Drop for BuildTracer {
    fn drop(&mut self) {
        if self.shut_down {
            return;
        }
        if let Err(e) = self.provider.shutdown() {
            warn!("Error shutting down tracer: {}", e);
        }
    }
}

/// Span name for a step, marking cache hits
pub fn span_name(step: &BuildStep) -> String {
    if step.cached {
        format!("{}{}", step.name, CACHED_SUFFIX)
    } else {
        step.name.clone()
    }
}

/// Resolve the full OTLP/HTTP traces URL from a collector base URL
pub fn traces_endpoint(endpoint: &str) -> Result<String, TelemetryError> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| TelemetryError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TelemetryError::InvalidEndpoint(format!(
            "{}: scheme must be http or https",
            endpoint
        )));
    }

    let base = endpoint.trim_end_matches('/');
    if base.ends_with(OTLP_TRACES_PATH) {
        Ok(base.to_string())
    } else {
        Ok(format!("{}{}", base, OTLP_TRACES_PATH))
    }
}

fn build_resource(config: &TracerConfig) -> Resource {
    let mut builder = Resource::builder().with_service_name(config.service_name.clone());
    if let Some(version) = &config.version {
        builder = builder.with_attribute(KeyValue::new("service.version", version.clone()));
    }
    builder.build()
}
