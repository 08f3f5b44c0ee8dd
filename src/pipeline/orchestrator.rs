//! Pipeline orchestrator for concierge runs.
//!
//! The orchestrator owns the shared services and the fixed agent sequence.
//! A run threads one [`RunState`] through every agent, then emits metrics,
//! flushes the trace and writes the plan artifact. Any agent fault aborts
//! the run before anything is flushed or written; memory writes made by
//! agents that already finished are kept.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

use crate::agents::{
    ActionPlannerAgent, Agent, AgentError, AgentKind, CommunicationsCoachAgent,
    CommunityLiaisonAgent, EvaluatorAgent, FundingScoutAgent, PolicyResearcherAgent, RunContext,
    RunRequest,
};
use crate::config::{ConciergeConfig, ConfigError, ToolConfig};
use crate::error::ToolError;
use crate::llm::TextGenerator;
use crate::memory::{LongTermMemory, MemoryError, SessionStore};
use crate::metrics::{MetricsError, MetricsRegistry};
use crate::tools::{
    CalendarTool, CivicDataSource, CivicDataTool, EventScheduler, GrantFinderTool, GrantSearch,
    ImpactEstimator, ImpactSimulatorTool, TimelineBuilderTool, TimelinePlanner,
};
use crate::trace::{TraceError, TraceRecorder};
use crate::trace_detail;

use super::artifacts::{PlanStore, PlanStoreError};
use super::state::{MergeError, PlanArtifact, RunState};

/// Counter incremented after every successful agent step.
pub const AGENT_RUNS_METRIC: &str = "agent_runs_total";
/// Counter incremented when an agent aborts a run.
pub const AGENT_FAILURES_METRIC: &str = "agent_failures_total";
/// Histogram of per-agent wall time.
pub const AGENT_DURATION_METRIC: &str = "agent_duration_seconds";

const DURATION_BUCKETS: [f64; 10] = [0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Length of a run identifier in hex characters.
const RUN_ID_LEN: usize = 12;

/// Errors that can occur during pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A tool dataset could not be loaded.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Long-term memory could not be opened.
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    /// An agent failed and the run was aborted.
    #[error("Agent '{agent}' failed: {source}")]
    Agent {
        agent: AgentKind,
        #[source]
        source: AgentError,
    },

    /// An agent result could not be merged into the run state.
    #[error("State merge failed: {0}")]
    Merge(#[from] MergeError),

    /// The sequence finished without producing every stage.
    #[error("Run finished with an incomplete plan: {0}")]
    IncompletePlan(#[source] AgentError),

    /// Metrics registration or emission failed.
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// The trace could not be flushed.
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    /// The plan artifact could not be written.
    #[error("Plan storage error: {0}")]
    PlanStore(#[from] PlanStoreError),
}

/// Lookup and planning tools behind their capability traits.
#[derive(Clone)]
pub struct Toolkit {
    pub civic_data: Arc<dyn CivicDataSource>,
    pub grants: Arc<dyn GrantSearch>,
    pub impact: Arc<dyn ImpactEstimator>,
    pub timeline: Arc<dyn TimelinePlanner>,
    pub calendar: Arc<dyn EventScheduler>,
}

impl Toolkit {
    /// Loads the datasets named in the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if a dataset file exists but cannot be read or
    /// parsed. Missing files fall back to the bundled samples.
    pub fn from_config(config: &ToolConfig) -> Result<Self, ToolError> {
        Ok(Self::with_sources(
            CivicDataTool::from_path(&config.civic_data_path)?,
            GrantFinderTool::from_path(&config.grant_catalog_path)?,
        ))
    }

    /// The default tools over the bundled sample datasets.
    pub fn bundled() -> Result<Self, ToolError> {
        Ok(Self::with_sources(
            CivicDataTool::bundled()?,
            GrantFinderTool::bundled()?,
        ))
    }

    fn with_sources(civic_data: CivicDataTool, grants: GrantFinderTool) -> Self {
        Self {
            civic_data: Arc::new(civic_data),
            grants: Arc::new(grants),
            impact: Arc::new(ImpactSimulatorTool::new()),
            timeline: Arc::new(TimelineBuilderTool::new()),
            calendar: Arc::new(CalendarTool::new()),
        }
    }

    /// Replaces the timeline planner.
    pub fn with_timeline(mut self, timeline: Arc<dyn TimelinePlanner>) -> Self {
        self.timeline = timeline;
        self
    }

    /// The agents in pipeline order, wired to these tools.
    pub fn agents(&self) -> Vec<Box<dyn Agent>> {
        vec![
            Box::new(CommunityLiaisonAgent::new()),
            Box::new(PolicyResearcherAgent::new(Arc::clone(&self.civic_data))),
            Box::new(FundingScoutAgent::new(Arc::clone(&self.grants))),
            Box::new(ActionPlannerAgent::new(
                Arc::clone(&self.impact),
                Arc::clone(&self.timeline),
            )),
            Box::new(CommunicationsCoachAgent::new(Arc::clone(&self.calendar))),
            Box::new(EvaluatorAgent::new()),
        ]
    }
}

/// Shared components injected into every run.
#[derive(Debug, Clone)]
pub struct PipelineServices {
    pub sessions: Arc<SessionStore>,
    pub long_term_memory: Arc<LongTermMemory>,
    pub metrics: Arc<MetricsRegistry>,
    pub tracer: Arc<TraceRecorder>,
    pub llm: Arc<TextGenerator>,
    pub plans: PlanStore,
}

impl PipelineServices {
    /// Builds every service described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` when no generation backend is
    /// available, or `PipelineError::Memory` if the memory store is corrupt.
    pub async fn from_config(config: &ConciergeConfig) -> Result<Self, PipelineError> {
        let llm = TextGenerator::from_config(config)?;
        Self::with_generator(config, llm).await
    }

    /// Builds the services around an existing generator.
    pub async fn with_generator(
        config: &ConciergeConfig,
        llm: TextGenerator,
    ) -> Result<Self, PipelineError> {
        let long_term_memory = LongTermMemory::open(&config.memory.long_term_path).await?;

        Ok(Self {
            sessions: Arc::new(SessionStore::new(config.memory.session_ttl_minutes)),
            long_term_memory: Arc::new(long_term_memory),
            metrics: Arc::new(MetricsRegistry::new(&config.observability.metrics_path)),
            tracer: Arc::new(TraceRecorder::new(&config.observability.traces_path)),
            llm: Arc::new(llm),
            plans: PlanStore::new(&config.observability.plans_path),
        })
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: String,
    pub state: RunState,
    pub plan: PlanArtifact,
    pub artifact_path: PathBuf,
}

/// Drives the fixed agent sequence.
pub struct PipelineOrchestrator {
    services: PipelineServices,
    agents: Vec<Box<dyn Agent>>,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator from configuration.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if validation fails, no generation backend
    /// is available, or a dataset or the memory store cannot be loaded.
    pub async fn from_config(config: ConciergeConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let services = PipelineServices::from_config(&config).await?;
        let toolkit = Toolkit::from_config(&config.tools)?;
        Ok(Self::new(services, &toolkit))
    }

    pub fn new(services: PipelineServices, toolkit: &Toolkit) -> Self {
        Self::with_agents(services, toolkit.agents())
    }

    /// Creates an orchestrator over a custom agent sequence.
    pub fn with_agents(services: PipelineServices, agents: Vec<Box<dyn Agent>>) -> Self {
        Self { services, agents }
    }

    pub fn services(&self) -> &PipelineServices {
        &self.services
    }

    /// Runs every agent for `request` in a fresh session.
    pub async fn run(&self, request: RunRequest) -> Result<RunResult, PipelineError> {
        self.run_with_session(request, None).await
    }

    /// Runs every agent for `request`.
    ///
    /// The session is looked up by `session_id` when given, otherwise by
    /// the new run id.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Agent` if any agent fails, `Merge` if its
    /// result cannot be merged, or `IncompletePlan` if the sequence leaves a
    /// stage empty. In each case nothing is emitted or flushed, no artifact
    /// is written and buffered trace events stay in memory.
    pub async fn run_with_session(
        &self,
        request: RunRequest,
        session_id: Option<&str>,
    ) -> Result<RunResult, PipelineError> {
        let run_id = new_run_id();
        let services = &self.services;
        let ctx = RunContext {
            run_id: run_id.clone(),
            session: services.sessions.get_session(session_id.unwrap_or(&run_id)),
            long_term_memory: Arc::clone(&services.long_term_memory),
            metrics: Arc::clone(&services.metrics),
            tracer: Arc::clone(&services.tracer),
            llm: Arc::clone(&services.llm),
        };

        let runs = services
            .metrics
            .counter(AGENT_RUNS_METRIC, "Number of agent runs")?;
        let failures = services
            .metrics
            .counter(AGENT_FAILURES_METRIC, "Number of agent runs that aborted a pipeline run")?;
        let durations = services.metrics.histogram(
            AGENT_DURATION_METRIC,
            "Agent wall time in seconds",
            &DURATION_BUCKETS,
        )?;

        tracing::info!(
            run_id = %run_id,
            session_id = ctx.session.session_id(),
            city = %request.city,
            initiative = %request.initiative,
            "Starting concierge run"
        );

        let mut state = RunState::seed(request);
        for agent in &self.agents {
            let kind = agent.kind();
            let started = Instant::now();

            let outcome = agent
                .run(&ctx, &state)
                .await
                .map_err(|source| PipelineError::Agent {
                    agent: kind,
                    source,
                })
                .and_then(|result| state.merge(result).map_err(PipelineError::from));
            if let Err(err) = outcome {
                failures.inc();
                tracing::error!(run_id = %run_id, agent = %kind, error = %err, "Agent step failed; aborting run");
                services.tracer.record(
                    kind.as_str(),
                    "agent_failed",
                    trace_detail!("error" => err.to_string()),
                );
                return Err(err);
            }

            runs.inc();
            durations.observe(started.elapsed().as_secs_f64());
            tracing::debug!(run_id = %run_id, agent = %kind, "Agent step merged");
        }

        let plan = state.to_plan().map_err(PipelineError::IncompletePlan)?;
        services.metrics.emit().await?;
        let flushed = services.tracer.flush().await?;
        let artifact_path = services.plans.save(&run_id, &plan).await?;

        tracing::info!(
            run_id = %run_id,
            trace_events = flushed,
            path = %artifact_path.display(),
            "Concierge run completed"
        );

        Ok(RunResult {
            run_id,
            state,
            plan,
            artifact_path,
        })
    }
}

fn new_run_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(RUN_ID_LEN);
    id
}
