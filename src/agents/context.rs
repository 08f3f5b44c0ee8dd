//! The run context handed to every agent and the agent trait itself.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::llm::TextGenerator;
use crate::memory::{LongTermMemory, SessionMemory};
use crate::metrics::MetricsRegistry;
use crate::pipeline::RunState;
use crate::trace::TraceRecorder;

use super::error::AgentOutcome;
use super::types::{AgentKind, AgentResult};

/// Counter of generations answered by the offline responder.
pub const FALLBACK_COUNTER: &str = "llm_fallbacks_total";

/// Shared services for one run.
///
/// Built once by the orchestrator and never mutated afterwards. The
/// session belongs to this run; everything else is shared with any other
/// run in the process.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub session: Arc<SessionMemory>,
    pub long_term_memory: Arc<LongTermMemory>,
    pub metrics: Arc<MetricsRegistry>,
    pub tracer: Arc<TraceRecorder>,
    pub llm: Arc<TextGenerator>,
}

impl RunContext {
    /// Logs an agent step and records it as a trace event.
    pub fn log_step(&self, agent: AgentKind, event: &str, detail: Map<String, Value>) {
        let detail_json = Value::Object(detail.clone());
        tracing::info!(
            run_id = %self.run_id,
            agent = %agent,
            detail = %detail_json,
            "[{}] {}",
            agent,
            event
        );
        self.tracer.record(agent.as_str(), event, detail);
    }

    /// Generates text for `agent`, recording any offline substitution.
    pub async fn generate(&self, agent: AgentKind, prompt: &str) -> String {
        let generation = self.llm.generate(prompt, agent).await;

        if let Some(reason) = generation.fallback_reason() {
            self.tracer.record(
                agent.as_str(),
                "generation_fallback",
                crate::trace_detail!("reason" => reason),
            );
            match self.metrics.counter(
                FALLBACK_COUNTER,
                "Generations answered by the offline responder",
            ) {
                Ok(counter) => counter.inc(),
                Err(e) => tracing::warn!(error = %e, "Failed to count generation fallback"),
            }
        }

        generation.into_text()
    }
}

/// One step of the concierge pipeline.
///
/// Agents read the accumulated [`RunState`] and return the output of their
/// own stage. A missing upstream output is a programming error and must be
/// reported as `AgentError::MissingState` rather than defaulted.
#[async_trait]
pub trait Agent: Send + Sync {
    fn kind(&self) -> AgentKind;

    async fn run(&self, ctx: &RunContext, state: &RunState) -> AgentOutcome<AgentResult>;
}
