//! Buffered trace events flushed to a JSONL sink.
//!
//! [`TraceRecorder::record`] only touches an in-memory buffer and never
//! fails. [`TraceRecorder::flush`] appends one JSON object per buffered
//! event, in recording order, and clears the buffer. Events still buffered
//! when the process exits are lost.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Errors that can occur while flushing trace events.
#[derive(Debug, Error)]
pub enum TraceError {
    /// Failed to write the trace sink.
    #[error("IO error writing traces to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize an event.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One observable step of an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub timestamp: DateTime<Utc>,
    pub agent: String,
    pub event: String,
    pub detail: Map<String, Value>,
}

impl TraceEvent {
    pub fn new(agent: impl Into<String>, event: impl Into<String>, detail: Map<String, Value>) -> Self {
        Self {
            timestamp: Utc::now(),
            agent: agent.into(),
            event: event.into(),
            detail,
        }
    }

    fn to_line(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Line<'a> {
            timestamp: f64,
            timestamp_iso: String,
            agent: &'a str,
            event: &'a str,
            detail: &'a Map<String, Value>,
        }

        let timestamp = self.timestamp.timestamp_micros() as f64 / 1_000_000.0;
        serde_json::to_string(&Line {
            timestamp,
            timestamp_iso: self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            agent: &self.agent,
            event: &self.event,
            detail: &self.detail,
        })
    }
}

/// Append-only trace buffer with a JSONL sink.
#[derive(Debug)]
pub struct TraceRecorder {
    sink_path: PathBuf,
    buffer: Mutex<Vec<TraceEvent>>,
    flush_lock: tokio::sync::Mutex<()>,
}

impl TraceRecorder {
    pub fn new(sink_path: impl Into<PathBuf>) -> Self {
        Self {
            sink_path: sink_path.into(),
            buffer: Mutex::new(Vec::new()),
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn sink_path(&self) -> &Path {
        &self.sink_path
    }

    fn lock_buffer(&self) -> MutexGuard<'_, Vec<TraceEvent>> {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Buffers an event stamped with the current time.
    pub fn record(&self, agent: &str, event: &str, detail: Map<String, Value>) {
        self.push(TraceEvent::new(agent, event, detail));
    }

    /// Buffers a pre-built event.
    pub fn push(&self, event: TraceEvent) {
        self.lock_buffer().push(event);
    }

    /// Number of events waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.lock_buffer().len()
    }

    /// Snapshot of the buffered events.
    pub fn buffered(&self) -> Vec<TraceEvent> {
        self.lock_buffer().clone()
    }

    /// Appends every buffered event to the sink and clears the buffer.
    ///
    /// On failure the drained events are put back at the front of the
    /// buffer, ahead of anything recorded during the flush.
    pub async fn flush(&self) -> Result<usize, TraceError> {
        let _guard = self.flush_lock.lock().await;

        let events = std::mem::take(&mut *self.lock_buffer());
        if events.is_empty() {
            return Ok(0);
        }

        match self.write_events(&events).await {
            Ok(()) => {
                tracing::debug!(path = ?self.sink_path, count = events.len(), "Flushed trace events");
                Ok(events.len())
            }
            Err(e) => {
                let mut buffer = self.lock_buffer();
                let recorded_since = std::mem::replace(&mut *buffer, events);
                buffer.extend(recorded_since);
                Err(e)
            }
        }
    }

    async fn write_events(&self, events: &[TraceEvent]) -> Result<(), TraceError> {
        let mut payload = String::new();
        for event in events {
            payload.push_str(&event.to_line()?);
            payload.push('\n');
        }

        let io_err = |source| TraceError::Io {
            path: self.sink_path.clone(),
            source,
        };
        if let Some(parent) = self.sink_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.sink_path)
            .await
            .map_err(io_err)?;
        file.write_all(payload.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        Ok(())
    }
}

/// Builds a detail map from `key => value` pairs.
#[macro_export]
macro_rules! trace_detail {
    () => {
        ::serde_json::Map::new()
    };
    ($($key:literal => $value:expr),+ $(,)?) => {{
        let mut detail = ::serde_json::Map::new();
        $(detail.insert($key.to_string(), ::serde_json::json!($value));)+
        detail
    }};
}
