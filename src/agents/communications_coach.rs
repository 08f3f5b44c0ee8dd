//! Communications coach: outreach copy and volunteer events.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::pipeline::RunState;
use crate::tools::{EventScheduler, Milestone};
use crate::trace_detail;

use super::context::{Agent, RunContext};
use super::error::AgentOutcome;
use super::types::{AgentKind, AgentResult, OutreachOutput, StagePayload};

/// Long-term memory list collecting outreach drafts for an initiative.
pub fn outreach_key(city: &str, initiative: &str) -> String {
    format!("outreach::{}::{}", city.to_lowercase(), initiative.to_lowercase())
}

/// Drafts an email and social post, and schedules volunteer events.
pub struct CommunicationsCoachAgent {
    calendar: Arc<dyn EventScheduler>,
}

impl CommunicationsCoachAgent {
    pub fn new(calendar: Arc<dyn EventScheduler>) -> Self {
        Self { calendar }
    }

    fn build_prompt(initiative: &str, plan_text: &str, timeline: &[Milestone]) -> AgentOutcome<String> {
        Ok(format!(
            "Draft two outreach artifacts for the initiative '{}':\n\
             1. A community email (<=180 words)\n\
             2. A social media post.\n\
             Base it on the following plan summary and timeline.\n\
             Plan:\n{}\nTimeline:\n{}",
            initiative,
            plan_text,
            serde_json::to_string_pretty(timeline)?
        ))
    }
}

#[async_trait]
impl Agent for CommunicationsCoachAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::CommunicationsCoach
    }

    async fn run(&self, ctx: &RunContext, state: &RunState) -> AgentOutcome<AgentResult> {
        let persona = state.persona()?;
        let timeline = state.timeline()?;
        let plan_text = state.plan_text()?;

        let events = self.calendar.create_events(timeline, &persona.city);
        ctx.log_step(
            self.kind(),
            "Drafting outreach collateral",
            trace_detail!("events" => events.len()),
        );

        let prompt = Self::build_prompt(&persona.initiative, plan_text, timeline)?;
        let outreach_copy = ctx.generate(self.kind(), &prompt).await;

        ctx.long_term_memory
            .append_to_list(
                &outreach_key(&persona.city, &persona.initiative),
                json!({ "copy": outreach_copy, "events": events }),
            )
            .await?;

        Ok(AgentResult::new(
            self.kind(),
            StagePayload::Outreach(OutreachOutput {
                events,
                outreach_copy,
            }),
        ))
    }
}
