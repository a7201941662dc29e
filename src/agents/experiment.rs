use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use super::{AgentError, JsonObject, ask_object, pretty, require_array};
use crate::llm::TextModel;

/// Fields every designed experiment is asked to carry.
pub const EXPERIMENT_FIELDS: [&str; 12] = [
    "hypothesis",
    "experiment_type",
    "ai_confidence",
    "experiment_name",
    "testing_statement",
    "measurement",
    "description",
    "cost_range",
    "runtime",
    "success_metric",
    "priority",
    "ai_doable",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentInput {
    pub hypotheses: JsonValue,
    pub project_description: String,
    pub sector: String,
}

pub fn prompt(input: &ExperimentInput) -> String {
    format!(
        r#"You are a startup experimentation expert.
Based on these hypotheses, design discovery and validation experiments.

Rules:
- Draw experiments from the standard experiment library (customer/problem interviews, surveys, search-trend analysis, smoke tests, landing pages, concierge/Wizard-of-Oz MVP, pre-sales, A/B tests, technical spikes, cost simulations, partner pilots).
- Choose experiments that best reduce the riskiest hypotheses for this specific project; high risk_weight hypotheses have higher priority.
- Discovery experiments explore unknowns; Validation experiments generate measurable proof.
- Link each experiment to its hypothesis and the risk type it reduces: desirability, feasibility or viability.
- Each experiment must include a cost estimate under 1000 USD, a runtime, a success metric and an AI confidence score (50-100).
- Emphasize small, rapid, low-cost tests.

Department: {sector}
Project: {description}

Hypotheses:
{hypotheses}

STRICTLY return only valid JSON with this structure, no markdown, no commentary:
{{
    "experiment_count": <number>,
    "experiments": [
        {{
            "hypothesis": "<linked hypothesis>",
            "experiment_type": "Discovery" | "Validation",
            "ai_confidence": <integer between 50 and 100>,
            "experiment_name": "<short title>",
            "testing_statement": "<1 sentence describing what is being tested>",
            "measurement": "<1 phrase describing how it will be measured>",
            "description": "<2-3 sentence overview of how the experiment will run>",
            "cost_range": "<expected cost in USD>",
            "runtime": "<expected duration in days or weeks>",
            "success_metric": "<quantitative measure of validation>",
            "priority": "High" | "Medium" | "Low",
            "ai_doable": "Yes" | "No"
        }}
    ]
}}
"#,
        sector = input.sector,
        description = input.project_description,
        hypotheses = pretty(&input.hypotheses),
    )
}

/// Asks for experiments and recomputes `experiment_count`.
pub async fn generate(
    model: &dyn TextModel,
    input: &ExperimentInput,
) -> Result<JsonObject, AgentError> {
    let mut reply = ask_object(model, "experiment", &prompt(input)).await?;
    fix_count(&mut reply)?;
    Ok(reply)
}

pub fn fix_count(reply: &mut JsonObject) -> Result<(), AgentError> {
    let count = require_array(reply, "experiments")?.len();
    reply.insert("experiment_count".into(), json!(count));
    Ok(())
}
