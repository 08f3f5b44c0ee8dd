//! Community liaison: turns the raw request into a persona.

use async_trait::async_trait;
use serde_json::json;

use crate::pipeline::RunState;
use crate::trace_detail;

use super::context::{Agent, RunContext};
use super::error::AgentOutcome;
use super::types::{AgentKind, AgentResult, LiaisonOutput, Persona, StagePayload};

/// Session key holding the organizer summary.
pub const ORGANIZER_SUMMARY_KEY: &str = "organizer_summary";

/// Long-term memory key for an organizer's profile.
pub fn profile_key(city: &str, organizer: &str) -> String {
    format!("profile::{}::{}", city.to_lowercase(), organizer.to_lowercase())
}

/// Captures organizer intent and remembers the organizer's profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommunityLiaisonAgent;

impl CommunityLiaisonAgent {
    pub fn new() -> Self {
        Self
    }

    fn describe(persona: &Persona) -> String {
        format!(
            "{} is planning a {} initiative in {}, {}: {}. Community notes: {}",
            persona.lead,
            persona.scale.to_lowercase(),
            persona.city,
            persona.state,
            persona.initiative,
            persona.community_profile
        )
    }
}

#[async_trait]
impl Agent for CommunityLiaisonAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Liaison
    }

    async fn run(&self, ctx: &RunContext, state: &RunState) -> AgentOutcome<AgentResult> {
        let request = &state.request;
        ctx.log_step(
            self.kind(),
            "Collecting organizer intent",
            trace_detail!("state" => request),
        );
        request.validate()?;

        let persona = Persona::from(request);
        let description = Self::describe(&persona);
        ctx.session.set(ORGANIZER_SUMMARY_KEY, json!(description));
        ctx.session.append_conversation("organizer", description);

        ctx.long_term_memory
            .set(
                profile_key(&persona.city, &persona.lead),
                serde_json::to_value(&persona)?,
            )
            .await?;

        Ok(AgentResult::new(
            self.kind(),
            StagePayload::Liaison(LiaisonOutput { persona }),
        ))
    }
}
