//! Pipeline orchestration for concierge runs.
//!
//! # Pipeline Flow
//!
//! 1. **Run id**: a 12-character hex id is generated for the run
//! 2. **Session**: the caller's session, or a fresh one keyed by the run id
//! 3. **Agents**: liaison, policy research, funding, planning, outreach and
//!    evaluation run in order, each merging one stage into the [`RunState`]
//! 4. **Observability**: metrics are emitted and trace events flushed
//! 5. **Artifact**: the plan is written to `<plans_dir>/<run_id>.json`
//!
//! # Example
//!
//! ```rust,ignore
//! use climate_concierge::agents::RunRequest;
//! use climate_concierge::config::ConciergeConfig;
//! use climate_concierge::pipeline::PipelineOrchestrator;
//!
//! let config = ConciergeConfig::from_env()?.with_allow_stub_llm(true);
//! let orchestrator = PipelineOrchestrator::from_config(config).await?;
//!
//! let request = RunRequest::new(
//!     "Neighborhood Climate Team",
//!     "Oakland",
//!     "CA",
//!     "Solarize the community center roof",
//!     "Pilot",
//!     "Frontline neighborhood seeking resilient infrastructure upgrades.",
//! );
//! let result = orchestrator.run(request).await?;
//! println!("Plan saved to {}", result.artifact_path.display());
//! ```

pub mod artifacts;
pub mod orchestrator;
pub mod state;

pub use artifacts::{PlanStore, PlanStoreError};
pub use orchestrator::{
    PipelineError, PipelineOrchestrator, PipelineServices, RunResult, Toolkit,
    AGENT_DURATION_METRIC, AGENT_FAILURES_METRIC, AGENT_RUNS_METRIC,
};
pub use state::{MergeError, PlanArtifact, RunState};
