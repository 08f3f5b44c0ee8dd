//! Policy researcher: summarizes local civic metrics.

use std::sync::Arc;

use async_trait::async_trait;

use crate::pipeline::RunState;
use crate::tools::{CivicDataSource, CivicProfile};
use crate::trace_detail;

use super::context::{Agent, RunContext};
use super::error::AgentOutcome;
use super::types::{AgentKind, AgentResult, PolicyOutput, StagePayload};

/// Recommendations kept from a summary.
const MAX_RECOMMENDATIONS: usize = 3;

/// Looks up the city's civic profile and asks for policy considerations.
pub struct PolicyResearcherAgent {
    civic_data: Arc<dyn CivicDataSource>,
}

impl PolicyResearcherAgent {
    pub fn new(civic_data: Arc<dyn CivicDataSource>) -> Self {
        Self { civic_data }
    }

    fn build_prompt(profile: &CivicProfile, community_profile: &str) -> String {
        let metrics_text = profile
            .metrics
            .iter()
            .map(|m| {
                format!(
                    "- {} {}: {} {} ({})",
                    title_case(&m.sector),
                    m.metric.replace('_', " "),
                    m.value,
                    m.unit,
                    m.year
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let metrics_text = if metrics_text.is_empty() {
            "No local metrics available.".to_string()
        } else {
            metrics_text
        };

        format!(
            "Summarize the following civic climate metrics and suggest two policy considerations.\n{}\nCommunity notes: {}",
            metrics_text, community_profile
        )
    }

    /// Bullet lines of the summary, or the whole summary if it has none.
    pub fn extract_recommendations(summary: &str) -> Vec<String> {
        let bullets: Vec<String> = summary
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with('-'))
            .map(|line| line.trim_matches(|c| c == '-' || c == ' ').trim().to_string())
            .take(MAX_RECOMMENDATIONS)
            .collect();

        if bullets.is_empty() {
            vec![summary.to_string()]
        } else {
            bullets
        }
    }
}

fn title_case(text: &str) -> String {
    text.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("_")
}

#[async_trait]
impl Agent for PolicyResearcherAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::PolicyResearcher
    }

    async fn run(&self, ctx: &RunContext, state: &RunState) -> AgentOutcome<AgentResult> {
        let persona = state.persona()?;
        ctx.log_step(
            self.kind(),
            "Fetching civic data",
            trace_detail!("city" => persona.city, "state" => persona.state),
        );

        let civic_profile = self.civic_data.city_profile(&persona.city, &persona.state);
        let prompt = Self::build_prompt(&civic_profile, &persona.community_profile);
        let policy_summary = ctx.generate(self.kind(), &prompt).await;
        let policy_recommendations = Self::extract_recommendations(&policy_summary);

        Ok(AgentResult::new(
            self.kind(),
            StagePayload::Policy(PolicyOutput {
                civic_profile,
                policy_summary,
                policy_recommendations,
            }),
        ))
    }
}
