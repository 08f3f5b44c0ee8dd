//! Error types shared across the concierge.
//!
//! Subsystem-specific errors live next to their subsystem (memory, trace,
//! metrics, agents, pipeline). This module holds the errors of the
//! external collaborators:
//! - LLM API interactions
//! - Data-lookup tools (civic metrics, grant catalogue)

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API base URL: LITELLM_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Empty response from model '{0}'")]
    EmptyResponse(String),
}

/// Errors that can occur while loading the data-lookup tools.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to read dataset '{path}': {source}")]
    DatasetRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dataset '{name}': {source}")]
    InvalidDataset {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
