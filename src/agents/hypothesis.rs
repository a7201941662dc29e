use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use super::{AgentError, JsonObject, ask_object, pretty, require_array};
use crate::llm::TextModel;

pub const AI_SUGGESTED: &str = "AI Suggested";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisInput {
    pub canvas: JsonValue,
    pub project_description: String,
    pub sector: String,
}

pub fn prompt(input: &HypothesisInput) -> String {
    format!(
        r#"You are a business validation expert.

Using the Business Model Canvas below, identify the riskiest assumptions and convert them into 4-6 precise, testable hypotheses.

Guidelines:
- Base each hypothesis on a specific element of the canvas (Value Proposition, Customer Segment, Channels, Revenue Streams, Key Resources/Partners/Activities, Cost Structure).
- Make every hypothesis discrete, measurable, and framed as a single statement that can be validated or invalidated.
- Each must address one risk type: desirability (customers want it), feasibility (we can build/deliver it) or viability (it can make money).
- Assign a risk_weight between 10 and 30. The SUM of all risk_weight values MUST be exactly 100.
- All hypotheses are "AI Suggested" unless human entries are added later.

Department: {sector}
Project: {description}

Business Model Canvas:
{canvas}

STRICTLY return only valid JSON with this exact structure, no markdown, no commentary:
{{
    "total_hypotheses": <number>,
    "ai_suggested": <number>,
    "human_added": <number>,
    "risk_weight_total": "100%",
    "hypotheses": [
        {{
            "category": "<Canvas category>",
            "hypothesis": "<specific, testable hypothesis>",
            "risk_weight": <number between 10 and 30>,
            "type": "AI Suggested" | "Human Added",
            "ai_doable": "Yes" | "No"
        }}
    ]
}}
"#,
        sector = input.sector,
        description = input.project_description,
        canvas = pretty(&input.canvas),
    )
}

/// Asks for hypotheses and recomputes the summary counters from the list.
pub async fn generate(
    model: &dyn TextModel,
    input: &HypothesisInput,
) -> Result<JsonObject, AgentError> {
    let mut reply = ask_object(model, "hypothesis", &prompt(input)).await?;
    fix_totals(&mut reply)?;
    Ok(reply)
}

/// Overwrites `total_hypotheses`, `ai_suggested`, `human_added`,
/// `risk_weight_total` and `ai_doable` with values derived from `hypotheses`.
pub fn fix_totals(reply: &mut JsonObject) -> Result<(), AgentError> {
    let hypotheses = require_array(reply, "hypotheses")?;

    let total = hypotheses.len();
    let ai_suggested = hypotheses
        .iter()
        .filter(|h| field(h, "type") == Some(AI_SUGGESTED))
        .count();
    let all_doable = hypotheses.iter().all(|h| field(h, "ai_doable") == Some("Yes"));

    reply.insert("total_hypotheses".into(), json!(total));
    reply.insert("ai_suggested".into(), json!(ai_suggested));
    reply.insert("human_added".into(), json!(total - ai_suggested));
    reply.insert("risk_weight_total".into(), json!("100%"));
    reply.insert("ai_doable".into(), json!(if all_doable { "Yes" } else { "No" }));
    Ok(())
}

fn field<'a>(item: &'a JsonValue, key: &str) -> Option<&'a str> {
    item.get(key).and_then(JsonValue::as_str)
}
