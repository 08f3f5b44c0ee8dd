//! Error types for the concierge agents.

use thiserror::Error;

use crate::memory::MemoryError;
use crate::metrics::MetricsError;

/// Errors that can occur while an agent runs.
///
/// Any of these aborts the run. Generation failures never appear here
/// because the generator substitutes an offline response instead.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The run request is unusable.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An upstream stage output the agent depends on is absent.
    #[error("Missing required state key '{0}'")]
    MissingState(&'static str),

    /// Long-term memory write failed.
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    /// Metric registration failed.
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for agent operations.
pub type AgentOutcome<T> = Result<T, AgentError>;
