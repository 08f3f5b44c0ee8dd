//! Metrics for pipeline runs.
//!
//! ```ignore
//! use climate_concierge::metrics::MetricsRegistry;
//!
//! let metrics = MetricsRegistry::new("run_artifacts/metrics/latest.prom");
//! metrics.counter("agent_runs_total", "Agent executions")?.inc();
//! metrics.emit().await?;
//! ```

pub mod registry;

pub use registry::{MetricsError, MetricsRegistry};
