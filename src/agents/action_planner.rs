//! Action planner: combines research and funding into a roadmap.

use std::sync::Arc;

use async_trait::async_trait;

use crate::pipeline::RunState;
use crate::tools::{Grant, ImpactEstimate, ImpactEstimator, Milestone, TimelinePlanner};
use crate::trace_detail;

use super::context::{Agent, RunContext};
use super::error::AgentOutcome;
use super::types::{AgentKind, AgentResult, PlanOutput, StagePayload};

/// Estimates impact, lays out a timeline and drafts the plan text.
pub struct ActionPlannerAgent {
    impact: Arc<dyn ImpactEstimator>,
    timeline: Arc<dyn TimelinePlanner>,
}

struct PlanInputs<'a> {
    initiative: &'a str,
    policy_summary: &'a str,
    grants: &'a [Grant],
    funding_summary: &'a str,
    impact: &'a ImpactEstimate,
    timeline: &'a [Milestone],
}

impl ActionPlannerAgent {
    pub fn new(impact: Arc<dyn ImpactEstimator>, timeline: Arc<dyn TimelinePlanner>) -> Self {
        Self { impact, timeline }
    }

    fn build_prompt(inputs: &PlanInputs<'_>) -> AgentOutcome<String> {
        Ok(format!(
            "Create a concise implementation plan based on the following inputs:\n\
             Initiative: {}\n\
             Policy Summary: {}\n\
             Grants: {}\n\
             Funding Summary: {}\n\
             Impact Estimate: {}\n\
             Timeline: {}\n\
             Structure the output with sections for Goals, Key Workstreams, Risks, and Metrics.",
            inputs.initiative,
            inputs.policy_summary,
            serde_json::to_string(inputs.grants)?,
            inputs.funding_summary,
            serde_json::to_string(inputs.impact)?,
            serde_json::to_string(inputs.timeline)?,
        ))
    }
}

#[async_trait]
impl Agent for ActionPlannerAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::ActionPlanner
    }

    async fn run(&self, ctx: &RunContext, state: &RunState) -> AgentOutcome<AgentResult> {
        let persona = state.persona()?;
        let policy_summary = state.policy_summary()?;
        let grants = state.grants()?;
        let funding_summary = state.funding_summary()?;

        ctx.log_step(
            self.kind(),
            "Composing implementation plan",
            trace_detail!("initiative" => persona.initiative),
        );
        let impact = self.impact.estimate(&persona.initiative, &persona.scale);
        let timeline = self.timeline.build(&persona.initiative);

        let prompt = Self::build_prompt(&PlanInputs {
            initiative: &persona.initiative,
            policy_summary,
            grants,
            funding_summary,
            impact: &impact,
            timeline: &timeline,
        })?;
        let plan_text = ctx.generate(self.kind(), &prompt).await;

        Ok(AgentResult::new(
            self.kind(),
            StagePayload::Plan(PlanOutput {
                impact,
                timeline,
                plan_text,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{seeded_through, TestHarness};
    use crate::agents::AgentError;
    use crate::tools::{ImpactSimulatorTool, TimelineBuilderTool};
    use chrono::NaiveDate;

    fn agent() -> ActionPlannerAgent {
        ActionPlannerAgent::new(
            Arc::new(ImpactSimulatorTool::new()),
            Arc::new(TimelineBuilderTool::starting_on(
                NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date"),
            )),
        )
    }

    #[tokio::test]
    async fn test_plan_for_solar_pilot() {
        let harness = TestHarness::offline().await;
        let ctx = harness.context();
        let state = seeded_through(&ctx, AgentKind::FundingScout).await;

        let result = agent().run(&ctx, &state).await.expect("plan run");
        let StagePayload::Plan(output) = result.payload else {
            panic!("unexpected payload");
        };

        assert_eq!(output.impact.co2_reduction_tonnes, 18.75);
        assert_eq!(output.timeline.len(), 7);
        assert_eq!(output.timeline[0].start_date, "2025-03-03");
        assert!(output.plan_text.contains("Workstreams"));
    }

    #[tokio::test]
    async fn test_requires_funding_stage() {
        let harness = TestHarness::offline().await;
        let ctx = harness.context();
        let state = seeded_through(&ctx, AgentKind::PolicyResearcher).await;

        let result = agent().run(&ctx, &state).await;
        assert!(matches!(result, Err(AgentError::MissingState("grants"))));
    }
}
