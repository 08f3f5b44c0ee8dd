//! Funding scout: matches the initiative against the grant catalogue.

use std::sync::Arc;

use async_trait::async_trait;

use crate::pipeline::RunState;
use crate::tools::{Grant, GrantSearch, DEFAULT_MAX_RESULTS};
use crate::trace_detail;

use super::context::{Agent, RunContext};
use super::error::AgentOutcome;
use super::types::{AgentKind, AgentResult, FundingOutput, StagePayload};

/// Initiative substrings and the catalogue tags they imply, checked in order.
const KEYWORD_MAP: [(&str, [&str; 2]); 5] = [
    ("solar", ["solar", "renewables"]),
    ("tree", ["tree canopy", "cooling"]),
    ("bike", ["mobility", "transportation"]),
    ("mobility", ["mobility", "transportation"]),
    ("energy", ["energy efficiency", "buildings"]),
];

/// Finds grants for the initiative and summarizes their fit.
pub struct FundingScoutAgent {
    grants: Arc<dyn GrantSearch>,
}

impl FundingScoutAgent {
    pub fn new(grants: Arc<dyn GrantSearch>) -> Self {
        Self { grants }
    }

    /// Catalogue tags for an initiative description.
    ///
    /// Falls back to the first word of the initiative when no known theme
    /// matches. Tags may repeat when several themes map to them.
    pub fn extract_keywords(initiative: &str) -> Vec<String> {
        let lowered = initiative.to_lowercase();
        let mut keywords: Vec<String> = KEYWORD_MAP
            .iter()
            .filter(|(needle, _)| lowered.contains(needle))
            .flat_map(|(_, tags)| tags.iter().map(|t| t.to_string()))
            .collect();

        if keywords.is_empty() {
            if let Some(first) = lowered.split_whitespace().next() {
                keywords.push(first.to_string());
            }
        }
        keywords
    }

    fn build_prompt(initiative: &str, grants: &[Grant]) -> AgentOutcome<String> {
        Ok(format!(
            "Given the initiative '{}', summarize the following grants highlighting fit:\n{}",
            initiative,
            serde_json::to_string_pretty(grants)?
        ))
    }
}

#[async_trait]
impl Agent for FundingScoutAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::FundingScout
    }

    async fn run(&self, ctx: &RunContext, state: &RunState) -> AgentOutcome<AgentResult> {
        let persona = state.persona()?;
        let keywords = Self::extract_keywords(&persona.initiative);
        ctx.log_step(
            self.kind(),
            "Searching grants",
            trace_detail!("keywords" => keywords),
        );

        let grants = self.grants.search(
            &persona.city,
            &persona.state,
            &keywords,
            DEFAULT_MAX_RESULTS,
        );
        let prompt = Self::build_prompt(&persona.initiative, &grants)?;
        let funding_summary = ctx.generate(self.kind(), &prompt).await;

        Ok(AgentResult::new(
            self.kind(),
            StagePayload::Funding(FundingOutput {
                grants,
                funding_summary,
            }),
        ))
    }
}
