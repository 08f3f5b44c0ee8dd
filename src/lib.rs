//! climate_concierge: a multi-agent planner for community climate action.
//!
//! An organizer's short request passes through six agents that build a
//! persona, research local emissions, find grants, draft a plan with an
//! impact estimate and timeline, prepare outreach, and score the result.
//! Shared session memory, long-term memory, metrics and tracing are
//! constructed once and injected into every run.

pub mod agents;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod metrics;
pub mod pipeline;
pub mod telemetry;
pub mod tools;
pub mod trace;

// Re-export commonly used types
pub use agents::{AgentError, AgentKind, RunRequest};
pub use config::{ConciergeConfig, ConfigError};
pub use error::{LlmError, ToolError};
pub use pipeline::{PipelineError, PipelineOrchestrator, RunResult};
