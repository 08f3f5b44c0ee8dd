//! The concierge agents.
//!
//! Six agents run in a fixed order, each reading the stages produced before
//! it and adding its own:
//!
//! | Agent | Reads | Produces |
//! |---|---|---|
//! | [`CommunityLiaisonAgent`] | request | `persona` |
//! | [`PolicyResearcherAgent`] | `persona` | `civic_profile`, `policy_summary`, `policy_recommendations` |
//! | [`FundingScoutAgent`] | `persona` | `grants`, `funding_summary` |
//! | [`ActionPlannerAgent`] | `persona`, `policy_summary`, `grants`, `funding_summary` | `impact`, `timeline`, `plan_text` |
//! | [`CommunicationsCoachAgent`] | `persona`, `timeline`, `plan_text` | `events`, `outreach_copy` |
//! | [`EvaluatorAgent`] | `plan_text` | `scores`, `average_score`, `raw_response` |

pub mod action_planner;
pub mod communications_coach;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod funding_scout;
pub mod liaison;
pub mod policy_researcher;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use action_planner::ActionPlannerAgent;
pub use communications_coach::{outreach_key, CommunicationsCoachAgent};
pub use context::{Agent, RunContext, FALLBACK_COUNTER};
pub use error::{AgentError, AgentOutcome};
pub use evaluator::{EvaluatorAgent, EVALUATIONS_KEY};
pub use funding_scout::FundingScoutAgent;
pub use liaison::{profile_key, CommunityLiaisonAgent, ORGANIZER_SUMMARY_KEY};
pub use policy_researcher::PolicyResearcherAgent;
pub use types::{
    AgentKind, AgentResult, EvaluationOutput, EvaluationScores, FundingOutput, LiaisonOutput,
    OutreachOutput, Persona, PlanOutput, PolicyOutput, RunRequest, StagePayload,
};
