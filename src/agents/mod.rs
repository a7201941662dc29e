//! Prompt templates around the text model.
//!
//! Each agent renders a prompt, asks the model, pulls a JSON object out of the
//! reply and fixes up the fields the model is known to get wrong.

pub mod canvas;
pub mod experiment;
pub mod hypothesis;

pub use canvas::{CANVAS_KEYS, CanvasInput};
pub use experiment::ExperimentInput;
pub use hypothesis::HypothesisInput;

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tracing::debug;

use crate::json::{JsonError, extract_object};
use crate::llm::{LlmError, TextModel};

pub type JsonObject = Map<String, JsonValue>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] LlmError),

    #[error(transparent)]
    Json(#[from] JsonError),
}

async fn ask_object(
    model: &dyn TextModel,
    agent: &str,
    prompt: &str,
) -> Result<JsonObject, AgentError> {
    let reply = model.complete(prompt).await?;
    let object = extract_object(&reply)?;
    debug!(agent, keys = object.len(), "agent reply parsed");
    Ok(object)
}

/// Pretty JSON for embedding in a prompt.
fn pretty(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// The array under `key`, or a malformed-response error naming it.
fn require_array<'a>(object: &'a JsonObject, key: &str) -> Result<&'a Vec<JsonValue>, AgentError> {
    object
        .get(key)
        .and_then(JsonValue::as_array)
        .ok_or_else(|| JsonError::MalformedResponse(format!("missing \"{key}\" array")).into())
}
