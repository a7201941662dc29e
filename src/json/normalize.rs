//! JSON to row conversion.
//!
//! Every stored value is text: strings are kept verbatim, anything else is
//! JSON-encoded. Field names are sanitized into column identifiers.

use super::error::JsonResult;
use super::validator::sanitize_column_name;
use crate::core::Row;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// Column used when a record is not a mapping.
pub const PAYLOAD_COLUMN: &str = "json_payload";

/// Normalizes any serializable record.
///
/// Fails with [`JsonError::Serialization`](super::JsonError::Serialization)
/// when the record cannot be represented as JSON.
pub fn normalize<T: Serialize + ?Sized>(data: &T) -> JsonResult<Vec<Row>> {
    let value = serde_json::to_value(data)?;
    Ok(normalize_value(&value))
}

/// Normalizes an already-parsed JSON value: an object yields one row, an
/// array one row per element, anything else a single `json_payload` row.
pub fn normalize_value(value: &JsonValue) -> Vec<Row> {
    match value {
        JsonValue::Array(items) => items.iter().map(normalize_record).collect(),
        other => vec![normalize_record(other)],
    }
}

/// Normalizes a single record; a non-object is wrapped in `json_payload`.
pub fn normalize_record(value: &JsonValue) -> Row {
    match value {
        JsonValue::Object(map) => normalize_map(map),
        other => {
            let mut row = Row::new();
            row.insert(PAYLOAD_COLUMN.to_string(), encode(other));
            row
        }
    }
}

fn normalize_map(map: &Map<String, JsonValue>) -> Row {
    let mut row = Row::with_capacity(map.len());
    for (key, value) in map {
        row.insert(sanitize_column_name(key), encode(value));
    }
    row
}

/// Text stays as-is; everything else is compact JSON.
pub fn encode(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Rebuilds a JSON object from a stored row. Cells holding a JSON object or
/// array are decoded; every other cell stays a string.
pub fn denormalize(row: &Row) -> JsonValue {
    let map = row
        .iter()
        .map(|(key, text)| {
            let value = match serde_json::from_str::<JsonValue>(text) {
                Ok(decoded @ (JsonValue::Object(_) | JsonValue::Array(_))) => decoded,
                _ => JsonValue::String(text.clone()),
            };
            (key.clone(), value)
        })
        .collect::<Map<String, JsonValue>>();
    JsonValue::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonError;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn object_becomes_one_text_row() {
        let rows = normalize_value(&json!({
            "project-id": "7",
            "team_size": 4,
            "channels": ["web", "retail"],
            "funded": false,
            "notes": null
        }));

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["project_id"], "7");
        assert_eq!(row["team_size"], "4");
        assert_eq!(row["channels"], r#"["web","retail"]"#);
        assert_eq!(row["funded"], "false");
        assert_eq!(row["notes"], "null");
    }

    #[test]
    fn key_order_is_preserved() {
        let rows = normalize_value(&json!({"zeta": 1, "alpha": 2, "mid.key": 3}));
        let keys: Vec<_> = rows[0].keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid_key"]);
    }

    #[test]
    fn arrays_yield_rows_in_order() {
        let rows = normalize_value(&json!([{"n": "a"}, "loose", {"n": "b"}]));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["n"], "a");
        assert_eq!(rows[1][PAYLOAD_COLUMN], "\"loose\"");
        assert_eq!(rows[2]["n"], "b");
    }

    #[test]
    fn bare_scalar_is_wrapped() {
        let rows = normalize(&"just text").unwrap();
        assert_eq!(rows[0][PAYLOAD_COLUMN], "\"just text\"");
    }

    #[test]
    fn non_text_values_round_trip() {
        let original = json!({"n": 3.5, "list": [1, {"k": "v"}], "flag": true});
        let row = &normalize_value(&original)[0];
        for (key, value) in original.as_object().unwrap() {
            let decoded: JsonValue = serde_json::from_str(&row[key.as_str()]).unwrap();
            assert_eq!(&decoded, value);
        }
    }

    #[test]
    fn unserializable_record_fails() {
        let mut bad: HashMap<(u8, u8), &str> = HashMap::new();
        bad.insert((1, 2), "tuple keys are not JSON");
        let err = normalize(&bad).unwrap_err();
        assert!(matches!(err, JsonError::Serialization(_)));
    }

    #[test]
    fn denormalize_decodes_containers_only() {
        let row = &normalize_value(&json!({
            "project-id": "7",
            "channels": ["web"],
            "count": 3
        }))[0];
        assert_eq!(
            denormalize(row),
            json!({"project_id": "7", "channels": ["web"], "count": "3"})
        );
    }
}
