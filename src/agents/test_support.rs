//! Fixtures shared by the agent tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::config::ModelConfig;
use crate::error::LlmError;
use crate::llm::{GenerationRequest, GenerationResponse, LlmProvider, TextGenerator};
use crate::memory::{LongTermMemory, SessionMemory};
use crate::metrics::MetricsRegistry;
use crate::pipeline::{RunState, Toolkit};
use crate::trace::TraceRecorder;

use super::{AgentKind, RunContext, RunRequest};

/// Mock LLM provider for testing.
pub(crate) struct MockLlmProvider {
    response: Mutex<String>,
}

impl MockLlmProvider {
    pub(crate) fn new(response: impl Into<String>) -> Self {
        Self {
            response: Mutex::new(response.into()),
        }
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let content = self.response.lock().expect("lock not poisoned").clone();
        Ok(GenerationResponse {
            model: "mock-model".to_string(),
            content,
        })
    }
}

pub(crate) fn request() -> RunRequest {
    RunRequest::new(
        "Neighborhood Climate Team",
        "Oakland",
        "CA",
        "Solarize the community center roof",
        "Pilot",
        "Frontline neighborhood with high energy burden.",
    )
}

/// A run context whose sinks live in a temporary directory.
pub(crate) struct TestHarness {
    _dir: TempDir,
    ctx: RunContext,
}

impl TestHarness {
    pub(crate) async fn offline() -> Self {
        Self::build(TextGenerator::offline()).await
    }

    pub(crate) async fn with_response(response: &str) -> Self {
        let provider = Arc::new(MockLlmProvider::new(response));
        Self::build(TextGenerator::with_provider(provider, &ModelConfig::default())).await
    }

    async fn build(llm: TextGenerator) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let memory = LongTermMemory::open(dir.path().join("memory.json"))
            .await
            .expect("memory opens");

        let ctx = RunContext {
            run_id: "testrun00000".to_string(),
            session: Arc::new(SessionMemory::new("testrun00000", 60)),
            long_term_memory: Arc::new(memory),
            metrics: Arc::new(MetricsRegistry::new(dir.path().join("latest.prom"))),
            tracer: Arc::new(TraceRecorder::new(dir.path().join("traces.jsonl"))),
            llm: Arc::new(llm),
        };
        Self { _dir: dir, ctx }
    }

    pub(crate) fn context(&self) -> RunContext {
        self.ctx.clone()
    }
}

/// Runs the default agents in order up to and including `last`.
pub(crate) async fn seeded_through(ctx: &RunContext, last: AgentKind) -> RunState {
    let toolkit = Toolkit::bundled().expect("bundled datasets parse");
    let mut state = RunState::seed(request());

    for agent in toolkit.agents() {
        let kind = agent.kind();
        let result = agent.run(ctx, &state).await.expect("upstream agent succeeds");
        state.merge(result).expect("merge succeeds");
        if kind == last {
            break;
        }
    }
    state
}
