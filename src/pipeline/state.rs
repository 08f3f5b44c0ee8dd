//! Accumulated run state and the plan artifact derived from it.
//!
//! The state starts from the request and gains exactly one stage output per
//! agent. Accessors return `AgentError::MissingState` naming the absent key,
//! so an agent run out of order fails fast instead of reading defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agents::{
    AgentError, AgentKind, AgentResult, EvaluationOutput, FundingOutput, LiaisonOutput,
    OutreachOutput, Persona, PlanOutput, PolicyOutput, RunRequest, StagePayload,
};
use crate::tools::{Grant, Milestone};

/// Errors raised when merging an agent result into the state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// The result came from an agent that does not own the stage.
    #[error("Agent '{agent}' returned a stage owned by '{owner}'")]
    StageMismatch { agent: AgentKind, owner: AgentKind },

    /// The stage was already produced earlier in the run.
    #[error("Stage owned by '{owner}' was already produced; refusing to overwrite {keys:?}")]
    AlreadyProduced {
        owner: AgentKind,
        keys: &'static [&'static str],
    },
}

/// State threaded through the agent sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub request: RunRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    liaison: Option<LiaisonOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    policy: Option<PolicyOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    funding: Option<FundingOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plan: Option<PlanOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    outreach: Option<OutreachOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evaluation: Option<EvaluationOutput>,
}

impl RunState {
    /// Seeds a fresh state from the request fields.
    pub fn seed(request: RunRequest) -> Self {
        Self {
            request,
            liaison: None,
            policy: None,
            funding: None,
            plan: None,
            outreach: None,
            evaluation: None,
        }
    }

    /// Adds an agent's stage output.
    ///
    /// # Errors
    ///
    /// Returns `MergeError` if the payload does not belong to the agent
    /// that produced it, or if that stage is already filled.
    pub fn merge(&mut self, result: AgentResult) -> Result<(), MergeError> {
        let owner = result.payload.owner();
        if owner != result.agent {
            return Err(MergeError::StageMismatch {
                agent: result.agent,
                owner,
            });
        }
        let keys = result.payload.keys();
        let already = || MergeError::AlreadyProduced { owner, keys };

        match result.payload {
            StagePayload::Liaison(output) => fill(&mut self.liaison, output, already),
            StagePayload::Policy(output) => fill(&mut self.policy, output, already),
            StagePayload::Funding(output) => fill(&mut self.funding, output, already),
            StagePayload::Plan(output) => fill(&mut self.plan, output, already),
            StagePayload::Outreach(output) => fill(&mut self.outreach, output, already),
            StagePayload::Evaluation(output) => fill(&mut self.evaluation, output, already),
        }
    }

    /// Whether every stage has been produced.
    pub fn is_complete(&self) -> bool {
        self.liaison.is_some()
            && self.policy.is_some()
            && self.funding.is_some()
            && self.plan.is_some()
            && self.outreach.is_some()
            && self.evaluation.is_some()
    }

    pub fn persona(&self) -> Result<&Persona, AgentError> {
        self.liaison
            .as_ref()
            .map(|output| &output.persona)
            .ok_or(AgentError::MissingState("persona"))
    }

    pub fn policy(&self) -> Result<&PolicyOutput, AgentError> {
        self.policy
            .as_ref()
            .ok_or(AgentError::MissingState("policy_summary"))
    }

    pub fn policy_summary(&self) -> Result<&str, AgentError> {
        self.policy().map(|output| output.policy_summary.as_str())
    }

    pub fn funding(&self) -> Result<&FundingOutput, AgentError> {
        self.funding
            .as_ref()
            .ok_or(AgentError::MissingState("grants"))
    }

    pub fn grants(&self) -> Result<&[Grant], AgentError> {
        self.funding().map(|output| output.grants.as_slice())
    }

    pub fn funding_summary(&self) -> Result<&str, AgentError> {
        self.funding
            .as_ref()
            .map(|output| output.funding_summary.as_str())
            .ok_or(AgentError::MissingState("funding_summary"))
    }

    pub fn plan(&self) -> Result<&PlanOutput, AgentError> {
        self.plan
            .as_ref()
            .ok_or(AgentError::MissingState("plan_text"))
    }

    pub fn timeline(&self) -> Result<&[Milestone], AgentError> {
        self.plan
            .as_ref()
            .map(|output| output.timeline.as_slice())
            .ok_or(AgentError::MissingState("timeline"))
    }

    pub fn plan_text(&self) -> Result<&str, AgentError> {
        self.plan().map(|output| output.plan_text.as_str())
    }

    pub fn outreach(&self) -> Result<&OutreachOutput, AgentError> {
        self.outreach
            .as_ref()
            .ok_or(AgentError::MissingState("outreach_copy"))
    }

    pub fn evaluation(&self) -> Result<&EvaluationOutput, AgentError> {
        self.evaluation
            .as_ref()
            .ok_or(AgentError::MissingState("scores"))
    }

    /// Assembles the plan artifact from a complete state.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::MissingState` naming the first absent stage.
    pub fn to_plan(&self) -> Result<PlanArtifact, AgentError> {
        Ok(PlanArtifact {
            liaison: self
                .liaison
                .clone()
                .ok_or(AgentError::MissingState("persona"))?,
            policy: self.policy()?.clone(),
            funding: self.funding()?.clone(),
            plan: self.plan()?.clone(),
            outreach: self.outreach()?.clone(),
            evaluation: self.evaluation()?.clone(),
        })
    }
}

fn fill<T>(
    slot: &mut Option<T>,
    output: T,
    already: impl FnOnce() -> MergeError,
) -> Result<(), MergeError> {
    if slot.is_some() {
        return Err(already());
    }
    *slot = Some(output);
    Ok(())
}

/// Every stage output of a completed run, flattened into one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanArtifact {
    #[serde(flatten)]
    pub liaison: LiaisonOutput,
    #[serde(flatten)]
    pub policy: PolicyOutput,
    #[serde(flatten)]
    pub funding: FundingOutput,
    #[serde(flatten)]
    pub plan: PlanOutput,
    #[serde(flatten)]
    pub outreach: OutreachOutput,
    #[serde(flatten)]
    pub evaluation: EvaluationOutput,
}

impl PlanArtifact {
    /// Every key of a serialized plan, in pipeline order.
    pub const KEYS: [&'static str; 14] = [
        "persona",
        "civic_profile",
        "policy_summary",
        "policy_recommendations",
        "grants",
        "funding_summary",
        "impact",
        "timeline",
        "plan_text",
        "events",
        "outreach_copy",
        "scores",
        "average_score",
        "raw_response",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::EvaluationScores;
    use crate::tools::{CivicProfile, ImpactEstimate};

    fn request() -> RunRequest {
        RunRequest::new("Ana", "Oakland", "CA", "Solar roof", "Pilot", "Frontline")
    }

    fn stage(agent: AgentKind, state: &RunState) -> AgentResult {
        let payload = match agent {
            AgentKind::Liaison => StagePayload::Liaison(LiaisonOutput {
                persona: Persona::from(&state.request),
            }),
            AgentKind::PolicyResearcher => StagePayload::Policy(PolicyOutput {
                civic_profile: CivicProfile {
                    city: "Oakland".to_string(),
                    state: "CA".to_string(),
                    metrics: Vec::new(),
                    notes: None,
                },
                policy_summary: "summary".to_string(),
                policy_recommendations: vec!["summary".to_string()],
            }),
            AgentKind::FundingScout => StagePayload::Funding(FundingOutput {
                grants: Vec::new(),
                funding_summary: "funding".to_string(),
            }),
            AgentKind::ActionPlanner => StagePayload::Plan(PlanOutput {
                impact: ImpactEstimate {
                    co2_reduction_tonnes: 18.75,
                    households_benefiting: 90,
                    equity_score: "High".to_string(),
                    assumptions: String::new(),
                },
                timeline: Vec::new(),
                plan_text: "plan".to_string(),
            }),
            AgentKind::CommunicationsCoach => StagePayload::Outreach(OutreachOutput {
                events: Vec::new(),
                outreach_copy: "copy".to_string(),
            }),
            AgentKind::Evaluator => StagePayload::Evaluation(EvaluationOutput {
                scores: EvaluationScores::fallback(""),
                average_score: 3.0,
                raw_response: "{}".to_string(),
            }),
        };
        AgentResult::new(agent, payload)
    }

    fn complete_state() -> RunState {
        let mut state = RunState::seed(request());
        for agent in AgentKind::SEQUENCE {
            let result = stage(agent, &state);
            state.merge(result).expect("merge");
        }
        state
    }

    #[test]
    fn test_seeded_state_has_no_stages() {
        let state = RunState::seed(request());
        assert!(!state.is_complete());
        assert!(matches!(
            state.persona(),
            Err(AgentError::MissingState("persona"))
        ));
        assert!(matches!(
            state.timeline(),
            Err(AgentError::MissingState("timeline"))
        ));
    }

    #[test]
    fn test_merge_fills_stages() {
        let state = complete_state();
        assert!(state.is_complete());
        assert_eq!(state.persona().expect("persona").lead, "Ana");
        assert_eq!(state.plan_text().expect("plan"), "plan");
    }

    #[test]
    fn test_merge_rejects_overwrite() {
        let mut state = complete_state();
        let again = stage(AgentKind::FundingScout, &state);

        assert_eq!(
            state.merge(again),
            Err(MergeError::AlreadyProduced {
                owner: AgentKind::FundingScout,
                keys: &["grants", "funding_summary"],
            })
        );
        assert_eq!(state.funding_summary().expect("funding"), "funding");
    }

    #[test]
    fn test_merge_rejects_foreign_stage() {
        let mut state = RunState::seed(request());
        let mut result = stage(AgentKind::Liaison, &state);
        result.agent = AgentKind::Evaluator;

        assert!(matches!(
            state.merge(result),
            Err(MergeError::StageMismatch { .. })
        ));
    }

    #[test]
    fn test_plan_has_exactly_the_stage_keys() {
        let plan = complete_state().to_plan().expect("complete");
        let value = serde_json::to_value(&plan).expect("serialize");

        let mut keys: Vec<_> = value
            .as_object()
            .expect("object")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        let mut expected: Vec<_> = PlanArtifact::KEYS.iter().map(|k| k.to_string()).collect();
        expected.sort();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_incomplete_state_has_no_plan() {
        let mut state = RunState::seed(request());
        let liaison = stage(AgentKind::Liaison, &state);
        state.merge(liaison).expect("merge");

        assert!(matches!(
            state.to_plan(),
            Err(AgentError::MissingState("policy_summary"))
        ));
    }
}
