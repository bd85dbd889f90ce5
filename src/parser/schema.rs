//! Wire shapes of `docker buildx build --progress=rawjson` output and the
//! normalized build step record.
//!
//! Only the fields the parser consumes are declared; serde ignores the rest,
//! so new fields from upstream never break decoding. Explicit `null`s decode
//! as the field's default instead of failing the whole line.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// One line of the rawjson progress stream
#[derive(Debug, Default, Deserialize)]
pub struct LogEntry {
    /// Build graph node updates
    #[serde(default, deserialize_with = "null_as_default")]
    pub vertexes: Vec<Vertex>,

    /// Progress ticks. Counted, never materialized.
    #[serde(default, deserialize_with = "null_as_default")]
    pub statuses: Vec<IgnoredAny>,
}

/// A vertex (build operation) update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Vertex {
    /// Stable content digest of the operation
    #[serde(default, deserialize_with = "null_as_default")]
    pub digest: String,

    /// Human-readable operation name, e.g. `[2/5] RUN apt-get update`
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// RFC3339 start time, absent until the vertex starts
    #[serde(default)]
    pub started: Option<String>,

    /// RFC3339 completion time, absent while the vertex is running
    #[serde(default)]
    pub completed: Option<String>,

    /// Whether the vertex was satisfied from the build cache
    #[serde(default, deserialize_with = "null_as_default")]
    pub cached: bool,
}

impl Vertex {
    /// Both timestamps are present and non-empty
    pub fn is_completed(&self) -> bool {
        let present = |ts: &Option<String>| ts.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.started) && present(&self.completed)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A fully completed build step
///
/// `completed >= started` is the upstream tool's contract and is not
/// re-checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    pub name: String,
    pub started: DateTime<Utc>,
    pub completed: DateTime<Utc>,
    pub cached: bool,
}

impl BuildStep {
    /// Elapsed time of the step, zero if the timestamps are inverted
    pub fn duration(&self) -> Duration {
        (self.completed - self.started).to_std().unwrap_or_default()
    }
}
