//! Per-process metrics registry exported in Prometheus text format.
//!
//! Metrics are created on first use and looked up by name afterwards, so any
//! agent can ask for `agent_runs_total` without coordinating registration.
//! The registry is constructed explicitly and shared through an `Arc`; there
//! is no global instance.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Local;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur while registering or exporting metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The Prometheus client rejected the metric.
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The name is already registered as a different metric type.
    #[error("Metric '{name}' is already registered as a {existing}")]
    KindMismatch { name: String, existing: &'static str },

    /// Histogram buckets were empty or contained a non-finite bound.
    #[error("Invalid buckets for histogram '{name}': {message}")]
    InvalidBuckets { name: String, message: String },

    /// Failed to write the metrics sink.
    #[error("IO error writing metrics to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoded output was not valid UTF-8.
    #[error("Metrics encoding produced invalid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Clone)]
enum Metric {
    Counter(IntCounter),
    Histogram(Histogram),
}

impl Metric {
    fn kind(&self) -> &'static str {
        match self {
            Metric::Counter(_) => "counter",
            Metric::Histogram(_) => "histogram",
        }
    }
}

/// Counters and histograms with a single file sink.
pub struct MetricsRegistry {
    sink_path: PathBuf,
    registry: Registry,
    metrics: Mutex<HashMap<String, Metric>>,
    emit_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("sink_path", &self.sink_path)
            .field("metrics", &self.lock_metrics().len())
            .finish_non_exhaustive()
    }
}

impl MetricsRegistry {
    /// Creates an empty registry that emits to `sink_path`.
    pub fn new(sink_path: impl Into<PathBuf>) -> Self {
        Self {
            sink_path: sink_path.into(),
            registry: Registry::new(),
            metrics: Mutex::new(HashMap::new()),
            emit_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn sink_path(&self) -> &Path {
        &self.sink_path
    }

    fn lock_metrics(&self) -> MutexGuard<'_, HashMap<String, Metric>> {
        self.metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the counter called `name`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::KindMismatch` if `name` is a histogram, or a
    /// Prometheus error if the name or help text is invalid.
    pub fn counter(&self, name: &str, help: &str) -> Result<IntCounter, MetricsError> {
        let mut metrics = self.lock_metrics();
        match metrics.get(name) {
            Some(Metric::Counter(counter)) => return Ok(counter.clone()),
            Some(other) => {
                return Err(MetricsError::KindMismatch {
                    name: name.to_string(),
                    existing: other.kind(),
                })
            }
            None => {}
        }

        let counter = IntCounter::new(name, help)?;
        self.registry.register(Box::new(counter.clone()))?;
        metrics.insert(name.to_string(), Metric::Counter(counter.clone()));
        tracing::debug!(metric = name, "Registered counter");
        Ok(counter)
    }

    /// Returns the histogram called `name`, creating it with `buckets` on
    /// first use. Later calls return the existing histogram and ignore
    /// `buckets`.
    ///
    /// Buckets are upper bounds; an implicit `+Inf` bucket is always
    /// present and a value equal to a bound is counted in that bound's
    /// bucket.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidBuckets` if `buckets` is empty or holds
    /// a non-finite value.
    pub fn histogram(
        &self,
        name: &str,
        help: &str,
        buckets: &[f64],
    ) -> Result<Histogram, MetricsError> {
        let mut metrics = self.lock_metrics();
        match metrics.get(name) {
            Some(Metric::Histogram(histogram)) => return Ok(histogram.clone()),
            Some(other) => {
                return Err(MetricsError::KindMismatch {
                    name: name.to_string(),
                    existing: other.kind(),
                })
            }
            None => {}
        }

        let buckets = normalize_buckets(name, buckets)?;
        let histogram = Histogram::with_opts(HistogramOpts::new(name, help).buckets(buckets))?;
        self.registry.register(Box::new(histogram.clone()))?;
        metrics.insert(name.to_string(), Metric::Histogram(histogram.clone()));
        tracing::debug!(metric = name, "Registered histogram");
        Ok(histogram)
    }

    /// Encodes every registered metric in Prometheus text format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Overwrites the sink with a timestamp header followed by every metric.
    pub async fn emit(&self) -> Result<(), MetricsError> {
        let _guard = self.emit_lock.lock().await;

        let body = self.render()?;
        let contents = format!(
            "# Metrics emitted at {}\n{}",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.6f"),
            body
        );

        let io_err = |source| MetricsError::Io {
            path: self.sink_path.clone(),
            source,
        };
        if let Some(parent) = self.sink_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }
        tokio::fs::write(&self.sink_path, contents)
            .await
            .map_err(io_err)?;

        tracing::debug!(path = ?self.sink_path, "Metrics emitted");
        Ok(())
    }
}

fn normalize_buckets(name: &str, buckets: &[f64]) -> Result<Vec<f64>, MetricsError> {
    if buckets.is_empty() {
        return Err(MetricsError::InvalidBuckets {
            name: name.to_string(),
            message: "at least one bucket is required".to_string(),
        });
    }
    if let Some(bad) = buckets.iter().find(|b| !b.is_finite()) {
        return Err(MetricsError::InvalidBuckets {
            name: name.to_string(),
            message: format!("bucket bound {} is not finite", bad),
        });
    }

    let mut sorted = buckets.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    Ok(sorted)
}
