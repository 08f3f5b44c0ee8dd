//! Shared types for the concierge agents.
//!
//! Every stage of the pipeline produces one typed output. The outputs are
//! carried between agents inside [`StagePayload`] and serialized with the
//! field names downstream consumers read from plan artifacts.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tools::{CivicProfile, EventDraft, Grant, ImpactEstimate, Milestone};

use super::error::AgentError;

/// Identity of an agent in the fixed pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    #[serde(rename = "community-liaison")]
    Liaison,
    #[serde(rename = "policy-researcher")]
    PolicyResearcher,
    #[serde(rename = "funding-scout")]
    FundingScout,
    #[serde(rename = "action-planner")]
    ActionPlanner,
    #[serde(rename = "communications-coach")]
    CommunicationsCoach,
    #[serde(rename = "plan-evaluator")]
    Evaluator,
}

impl AgentKind {
    /// Every agent, in the order the pipeline runs them.
    pub const SEQUENCE: [AgentKind; 6] = [
        AgentKind::Liaison,
        AgentKind::PolicyResearcher,
        AgentKind::FundingScout,
        AgentKind::ActionPlanner,
        AgentKind::CommunicationsCoach,
        AgentKind::Evaluator,
    ];

    /// Stable identifier used in traces, metrics and memory records.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Liaison => "community-liaison",
            AgentKind::PolicyResearcher => "policy-researcher",
            AgentKind::FundingScout => "funding-scout",
            AgentKind::ActionPlanner => "action-planner",
            AgentKind::CommunicationsCoach => "communications-coach",
            AgentKind::Evaluator => "plan-evaluator",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The organizer's request that seeds a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub organizer: String,
    pub city: String,
    pub state: String,
    pub initiative: String,
    pub scale: String,
    pub community_profile: String,
}

impl RunRequest {
    pub fn new(
        organizer: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        initiative: impl Into<String>,
        scale: impl Into<String>,
        community_profile: impl Into<String>,
    ) -> Self {
        Self {
            organizer: organizer.into(),
            city: city.into(),
            state: state.into(),
            initiative: initiative.into(),
            scale: scale.into(),
            community_profile: community_profile.into(),
        }
    }

    /// Rejects requests without a city, state or initiative.
    pub fn validate(&self) -> Result<(), AgentError> {
        let required = [
            ("city", &self.city),
            ("state", &self.state),
            ("initiative", &self.initiative),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AgentError::InvalidRequest(format!("{} cannot be empty", field)));
            }
        }
        Ok(())
    }
}

/// Organizer profile shared with every downstream agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub lead: String,
    pub city: String,
    pub state: String,
    pub initiative: String,
    pub scale: String,
    pub community_profile: String,
}

impl From<&RunRequest> for Persona {
    fn from(request: &RunRequest) -> Self {
        Self {
            lead: request.organizer.clone(),
            city: request.city.clone(),
            state: request.state.clone(),
            initiative: request.initiative.clone(),
            scale: request.scale.clone(),
            community_profile: request.community_profile.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiaisonOutput {
    pub persona: Persona,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyOutput {
    pub civic_profile: CivicProfile,
    pub policy_summary: String,
    pub policy_recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingOutput {
    pub grants: Vec<Grant>,
    pub funding_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutput {
    pub impact: ImpactEstimate,
    pub timeline: Vec<Milestone>,
    pub plan_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachOutput {
    pub events: Vec<EventDraft>,
    pub outreach_copy: String,
}

/// Rubric scores, each in `1..=5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationScores {
    pub feasibility: u8,
    pub equity: u8,
    pub impact: u8,
    pub readiness: u8,
    pub comments: String,
}

impl EvaluationScores {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    pub const DEFAULT: u8 = 3;

    /// Default scores used when the evaluator's answer is unreadable.
    pub fn fallback(comments: impl Into<String>) -> Self {
        Self {
            feasibility: Self::DEFAULT,
            equity: Self::DEFAULT,
            impact: Self::DEFAULT,
            readiness: Self::DEFAULT,
            comments: comments.into(),
        }
    }

    /// Mean of the four scores.
    pub fn average(&self) -> f64 {
        let total = u32::from(self.feasibility)
            + u32::from(self.equity)
            + u32::from(self.impact)
            + u32::from(self.readiness);
        f64::from(total) / 4.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutput {
    pub scores: EvaluationScores,
    pub average_score: f64,
    pub raw_response: String,
}

/// Output of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StagePayload {
    Liaison(LiaisonOutput),
    Policy(PolicyOutput),
    Funding(FundingOutput),
    Plan(PlanOutput),
    Outreach(OutreachOutput),
    Evaluation(EvaluationOutput),
}

impl StagePayload {
    /// The agent that owns this stage.
    pub fn owner(&self) -> AgentKind {
        match self {
            StagePayload::Liaison(_) => AgentKind::Liaison,
            StagePayload::Policy(_) => AgentKind::PolicyResearcher,
            StagePayload::Funding(_) => AgentKind::FundingScout,
            StagePayload::Plan(_) => AgentKind::ActionPlanner,
            StagePayload::Outreach(_) => AgentKind::CommunicationsCoach,
            StagePayload::Evaluation(_) => AgentKind::Evaluator,
        }
    }

    /// State keys this stage adds to the run.
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            StagePayload::Liaison(_) => &["persona"],
            StagePayload::Policy(_) => &["civic_profile", "policy_summary", "policy_recommendations"],
            StagePayload::Funding(_) => &["grants", "funding_summary"],
            StagePayload::Plan(_) => &["impact", "timeline", "plan_text"],
            StagePayload::Outreach(_) => &["events", "outreach_copy"],
            StagePayload::Evaluation(_) => &["scores", "average_score", "raw_response"],
        }
    }
}

/// What an agent hands back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent: AgentKind,
    pub payload: StagePayload,
    /// Short identifier for this invocation.
    pub run_id: String,
}

impl AgentResult {
    pub fn new(agent: AgentKind, payload: StagePayload) -> Self {
        let mut run_id = Uuid::new_v4().simple().to_string();
        run_id.truncate(8);
        Self {
            agent,
            payload,
            run_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RunRequest {
        RunRequest::new(
            "Ana",
            "Oakland",
            "CA",
            "Solarize the community center roof",
            "Pilot",
            "Frontline neighborhood",
        )
    }

    #[test]
    fn test_agent_identifiers_serialize_as_strings() {
        let json = serde_json::to_string(&AgentKind::Evaluator).expect("serialize");
        assert_eq!(json, "\"plan-evaluator\"");
        for agent in AgentKind::SEQUENCE {
            let json = serde_json::to_value(agent).expect("serialize");
            assert_eq!(json, agent.as_str());
        }
    }

    #[test]
    fn test_request_validation() {
        assert!(request().validate().is_ok());

        let mut missing_city = request();
        missing_city.city = "  ".to_string();
        assert!(matches!(
            missing_city.validate(),
            Err(AgentError::InvalidRequest(msg)) if msg.contains("city")
        ));
    }

    #[test]
    fn test_persona_keeps_request_fields_verbatim() {
        let mut padded = request();
        padded.initiative = "  Solarize the community center roof ".to_string();
        assert!(padded.validate().is_ok());

        let persona = Persona::from(&padded);
        assert_eq!(persona.initiative, padded.initiative);
        assert_eq!(persona.lead, "Ana");
        assert_eq!(persona.community_profile, padded.community_profile);
    }

    #[test]
    fn test_scores_average() {
        let scores = EvaluationScores {
            feasibility: 4,
            equity: 4,
            impact: 5,
            readiness: 4,
            comments: String::new(),
        };
        assert_eq!(scores.average(), 4.25);
        assert_eq!(EvaluationScores::fallback("x").average(), 3.0);
    }

    #[test]
    fn test_result_id_is_eight_hex_chars() {
        let result = AgentResult::new(
            AgentKind::Liaison,
            StagePayload::Liaison(LiaisonOutput {
                persona: Persona::from(&request()),
            }),
        );
        assert_eq!(result.run_id.len(), 8);
        assert!(result.run_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_payload_owner_and_keys() {
        let payload = StagePayload::Funding(FundingOutput {
            grants: Vec::new(),
            funding_summary: String::new(),
        });
        assert_eq!(payload.owner(), AgentKind::FundingScout);
        assert_eq!(payload.keys(), &["grants", "funding_summary"]);
    }
}
