use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{AgentError, JsonObject, ask_object};
use crate::llm::TextModel;

/// The nine Business Model Canvas sections, as the model is asked to key them.
pub const CANVAS_KEYS: [&str; 9] = [
    "key-partners",
    "key-activities",
    "key-resources",
    "value-propositions",
    "customer-relationships",
    "channels",
    "customer-segments",
    "cost-structure",
    "revenue-streams",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasInput {
    pub project_name: String,
    pub project_description: String,
    pub sector: String,
    pub funding_stage: String,
    pub team_size: u32,
    pub project_document: String,
    #[serde(default)]
    pub cost_structure: Option<String>,
    #[serde(default)]
    pub revenue_potential: Option<String>,
}

pub fn prompt(input: &CanvasInput) -> String {
    format!(
        "You are an expert business consultant.
Create a detailed Business Model Canvas for the following project idea.

STRICTLY return only valid JSON (no explanations, no markdown, no extra text).
The JSON must have these keys:
{keys}.
- Each key must contain 3 to 5 concise items.
- Ensure 'cost-structure' aligns with provided cost inputs.
- Ensure 'revenue-streams' aligns with provided revenue potential.

Project name: {name}
Sector: {sector}
Project idea: {description}
Funding stage: {stage}
Team size: {team}
Project document: {document}
Cost Structure (input): {cost}
Revenue Potential (input): {revenue}
",
        keys = CANVAS_KEYS.join(", "),
        name = input.project_name,
        sector = input.sector,
        description = input.project_description,
        stage = input.funding_stage,
        team = input.team_size,
        document = input.project_document,
        cost = input.cost_structure.as_deref().unwrap_or("not provided"),
        revenue = input.revenue_potential.as_deref().unwrap_or("not provided"),
    )
}

/// Asks for a canvas. The reply must be a JSON object; absent sections are
/// logged, not rejected.
pub async fn generate(
    model: &dyn TextModel,
    input: &CanvasInput,
) -> Result<JsonObject, AgentError> {
    let canvas = ask_object(model, "canvas", &prompt(input)).await?;

    let missing: Vec<_> = CANVAS_KEYS
        .iter()
        .filter(|key| !canvas.contains_key(**key))
        .collect();
    if !missing.is_empty() {
        warn!(project = %input.project_name, ?missing, "canvas reply lacks sections");
    }
    Ok(canvas)
}
