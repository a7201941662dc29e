//! JSON extraction from free model text.
//!
//! Models asked for "only JSON" still wrap answers in markdown fences or a
//! sentence of preamble. [`extract`] peels that off and parses what is left.

use super::error::{JsonError, JsonResult};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;

lazy_static! {
    /// Opening fence with an optional language tag: "```", "```json", "```JSON5".
    static ref LEADING_FENCE: Regex = Regex::new(r"^```[A-Za-z0-9_+.-]*[ \t]*\r?\n?").unwrap();
    static ref TRAILING_FENCE: Regex = Regex::new(r"\r?\n?[ \t]*```$").unwrap();
    static ref INNER_FENCE: Regex =
        Regex::new(r"(?s)```[A-Za-z0-9_+.-]*[ \t]*\r?\n?(.*?)```").unwrap();
}

/// Removes one surrounding code fence, if present.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let start = LEADING_FENCE.find(trimmed).map_or(0, |m| m.end());
    let rest = &trimmed[start..];
    let end = TRAILING_FENCE.find(rest).map_or(rest.len(), |m| m.start());
    rest[..end].trim()
}

/// Parses a model response as JSON.
///
/// Tries, in order: the text with its surrounding fence removed, the first
/// fenced block anywhere in the text, and each `{...}` or `[...]` span from
/// left to right. Fails with [`JsonError::MalformedResponse`] carrying the
/// parse error of the first attempt.
pub fn extract(text: &str) -> JsonResult<JsonValue> {
    let stripped = strip_fences(text);
    let primary = match serde_json::from_str::<JsonValue>(stripped) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    if let Some(block) = INNER_FENCE.captures(text).and_then(|c| c.get(1))
        && let Ok(value) = serde_json::from_str::<JsonValue>(block.as_str().trim())
    {
        return Ok(value);
    }

    if let Some(value) =
        bracketed_spans(text).find_map(|span| serde_json::from_str::<JsonValue>(span).ok())
    {
        return Ok(value);
    }

    Err(JsonError::MalformedResponse(primary.to_string()))
}

/// Like [`extract`], but the result must be a JSON object.
pub fn extract_object(text: &str) -> JsonResult<serde_json::Map<String, JsonValue>> {
    match extract(text)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(JsonError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            kind(&other)
        ))),
    }
}

/// Every `{...}` or `[...]` span that runs from an opening bracket to the last
/// matching closer, leftmost opening first.
fn bracketed_spans(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices(['{', '[']).filter_map(|(start, open)| {
        let close = if open == "{" { '}' } else { ']' };
        let end = text.rfind(close)?;
        (end > start).then(|| &text[start..=end])
    })
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_passes_through() {
        assert_eq!(extract(r#"  {"a": 1}  "#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn fence_tag_does_not_matter() {
        let bare = r#"{"channels": ["web", "retail"]}"#;
        let expected = extract(bare).unwrap();
        for tag in ["", "json", "JSON", "json5", "javascript"] {
            let fenced = format!("```{tag}\n{bare}\n```");
            assert_eq!(extract(&fenced).unwrap(), expected, "tag {tag:?}");
        }
    }

    #[test]
    fn stripping_is_idempotent() {
        let fenced = "```json\n[1, 2]\n```";
        let once = strip_fences(fenced);
        assert_eq!(strip_fences(once), once);
    }

    #[test]
    fn fence_on_same_line() {
        assert_eq!(extract("```json{\"a\":true}```").unwrap(), json!({"a": true}));
    }

    #[test]
    fn conversational_preamble() {
        let text = "Sure! Here is the canvas:\n```json\n{\"x\": 1}\n```\nLet me know.";
        assert_eq!(extract(text).unwrap(), json!({"x": 1}));

        let unfenced = "Result: {\"hypotheses\": []} hope this helps";
        assert_eq!(extract(unfenced).unwrap(), json!({"hypotheses": []}));

        let bracketed = "Sure [as requested]: {\"channels\": [\"web\"]}";
        assert_eq!(extract(bracketed).unwrap(), json!({"channels": ["web"]}));
        assert_eq!(extract_object(bracketed).unwrap()["channels"], json!(["web"]));
    }

    #[test]
    fn malformed_fails_loudly() {
        let err = extract("```json\n{not json}\n```").unwrap_err();
        assert!(matches!(err, JsonError::MalformedResponse(_)));
        assert!(extract("").is_err());
    }

    #[test]
    fn extract_object_rejects_arrays() {
        let err = extract_object("[1]").unwrap_err();
        assert_eq!(
            err,
            JsonError::MalformedResponse("expected a JSON object, got an array".into())
        );
    }
}
