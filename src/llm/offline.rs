//! Deterministic offline responses, keyed by agent.
//!
//! Used when no model endpoint is configured or when a model call fails,
//! so every agent always receives usable text.

use crate::agents::AgentKind;

/// Returns the canned response for `agent`.
pub fn offline_response(agent: AgentKind) -> String {
    match agent {
        AgentKind::PolicyResearcher => concat!(
            "Policy insights:\n",
            "- Prioritize frontline neighborhoods impacted by energy burden.\n",
            "- Coordinate with city sustainability office for streamlined permits."
        )
        .to_string(),
        AgentKind::FundingScout => concat!(
            "Top grants:\n",
            "- Community Solar Acceleration Microgrant is a strong fit (low match).\n",
            "- Urban Heat Island Fund supports cooling co-benefits."
        )
        .to_string(),
        AgentKind::ActionPlanner => concat!(
            "Goals:\n",
            "- Install rooftop solar to offset 25 tonnes CO2 annually.\n",
            "Workstreams: Site prep, contractor selection, community outreach.\n",
            "Risks: Permitting delays, volunteer capacity.\n",
            "Metrics: kWh generated, households served."
        )
        .to_string(),
        AgentKind::CommunicationsCoach => concat!(
            "Email:\n",
            "Neighbors,\n",
            "Join us to solarize the community center!\n",
            "\n",
            "Social post:\n",
            "Our neighborhood is going solar! Volunteer sign-up link coming soon."
        )
        .to_string(),
        AgentKind::Evaluator => serde_json::json!({
            "feasibility": 4,
            "equity": 4,
            "impact": 5,
            "readiness": 4,
            "comments": "Strong alignment with community goals."
        })
        .to_string(),
        AgentKind::Liaison => "Summary not available in stub mode.".to_string(),
    }
}
