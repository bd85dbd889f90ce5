//! Configuration and constants for the CLI.

use std::time::Duration;

/// Default OTLP/HTTP collector base URL
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4318";

/// Path the OTLP/HTTP trace signal is posted to
pub const OTLP_TRACES_PATH: &str = "/v1/traces";

/// Default `service.name` resource attribute
pub const DEFAULT_SERVICE_NAME: &str = "docker-build-telemetry";

/// Instrumentation scope name for the tracer
pub const TRACER_NAME: &str = "buildx";

/// Name of the root span wrapping a whole build
pub const ROOT_SPAN_NAME: &str = "docker-build";

/// Appended to the span name of steps served from the build cache
pub const CACHED_SUFFIX: &str = " (cached)";

/// Span attribute keys
pub const VERSION_ATTRIBUTE: &str = "version";
pub const CACHED_ATTRIBUTE: &str = "build.step.cached";

/// Emit a progress log line every N exported steps
pub const PROGRESS_INTERVAL: usize = 10;

/// Default timeout for a single OTLP export request
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default upper bound on flushing spans at shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Current build report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Number of slowest steps listed in summaries
pub const DEFAULT_SLOWEST_STEPS: usize = 5;
