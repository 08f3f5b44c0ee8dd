//! Plan evaluator: rubric scores for the finished plan.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use crate::pipeline::RunState;

use super::context::{Agent, RunContext};
use super::error::AgentOutcome;
use super::types::{AgentKind, AgentResult, EvaluationOutput, EvaluationScores, StagePayload};

/// Long-term memory list of every evaluation.
pub const EVALUATIONS_KEY: &str = "evaluations";

/// Plan text stored with an evaluation is cut to this many characters.
const STORED_PLAN_CHARS: usize = 5000;

/// Comments kept from an unparseable response.
const FALLBACK_COMMENT_CHARS: usize = 200;

const EVALUATOR_PROMPT: &str = r#"You are an evaluator scoring community climate action plans.
Score each category from 1 (poor) to 5 (excellent) and justify briefly.

Plan Summary:
{plan}

Scoring rubric:
- Feasibility: Is the plan realistic and resourced?
- Equity: Does it prioritize frontline communities?
- Climate Impact: Are emissions reductions or resilience benefits clear?
- Readiness: Are next steps and owner assignments concrete?

Respond in JSON with fields: feasibility, equity, impact, readiness, comments.
"#;

/// Scores the plan against a fixed rubric.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluatorAgent;

impl EvaluatorAgent {
    pub fn new() -> Self {
        Self
    }

    /// Parses the model's JSON scores.
    ///
    /// A JSON object inside a markdown code fence is accepted. Missing
    /// fields default to 3 and every score is clamped to `1..=5`. Text that
    /// is not a JSON object yields default scores with the first 200
    /// characters of the text as comments.
    pub fn parse_scores(raw: &str) -> EvaluationScores {
        let data = match serde_json::from_str::<Value>(unfence(raw)) {
            Ok(Value::Object(data)) => data,
            Ok(_) | Err(_) => {
                tracing::warn!("Evaluator returned non-JSON scores; using defaults");
                return EvaluationScores::fallback(truncate_chars(raw, FALLBACK_COMMENT_CHARS));
            }
        };

        let score = |field: &str| {
            data.get(field)
                .and_then(score_value)
                .map(|v| v.clamp(i64::from(EvaluationScores::MIN), i64::from(EvaluationScores::MAX)))
                .and_then(|v| u8::try_from(v).ok())
                .unwrap_or(EvaluationScores::DEFAULT)
        };
        let comments = match data.get("comments") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        EvaluationScores {
            feasibility: score("feasibility"),
            equity: score("equity"),
            impact: score("impact"),
            readiness: score("readiness"),
            comments,
        }
    }
}

static JSON_FENCE: OnceLock<Option<Regex>> = OnceLock::new();

/// The object inside a markdown code fence, or the trimmed text.
fn unfence(raw: &str) -> &str {
    let fence = JSON_FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").ok())
        .as_ref();

    fence
        .and_then(|re| re.captures(raw))
        .and_then(|caps| caps.get(1))
        .map_or_else(|| raw.trim(), |m| m.as_str())
}

/// Accepts integers, floats (truncated) and numeric strings.
fn score_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl Agent for EvaluatorAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Evaluator
    }

    async fn run(&self, ctx: &RunContext, state: &RunState) -> AgentOutcome<AgentResult> {
        let plan_text = state.plan_text()?;
        ctx.log_step(self.kind(), "Scoring plan against rubric", serde_json::Map::new());

        let prompt = EVALUATOR_PROMPT.replace("{plan}", plan_text);
        let raw_response = ctx.generate(self.kind(), &prompt).await;
        let scores = Self::parse_scores(&raw_response);

        ctx.long_term_memory
            .append_to_list(
                EVALUATIONS_KEY,
                json!({
                    "plan_text": truncate_chars(plan_text, STORED_PLAN_CHARS),
                    "scores": scores,
                }),
            )
            .await?;

        let average_score = round2(scores.average());
        Ok(AgentResult::new(
            self.kind(),
            StagePayload::Evaluation(EvaluationOutput {
                scores,
                average_score,
                raw_response,
            }),
        ))
    }
}
