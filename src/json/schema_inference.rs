//! Schema Inference Module
//!
//! A table's schema is decided once, from the first row written to it. Every
//! inferred column is text. Later rows are checked against that schema by the
//! warehouse according to its [`SchemaPolicy`].

use super::normalize::PAYLOAD_COLUMN;
use crate::core::{Column, Row};
use crate::storage::TableSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What to do when a row carries columns the table does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPolicy {
    /// Fail the row with a schema mismatch.
    #[default]
    Strict,
    /// Append the missing columns as text, then write.
    Widen,
}

impl FromStr for SchemaPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "widen" => Ok(Self::Widen),
            _ => Err(format!("schema policy must be one of: strict, widen (got {raw:?})")),
        }
    }
}

/// Derives the creation schema for `table_name` from the batch's first row.
///
/// An absent or empty row yields the single `json_payload` column.
pub fn infer_schema(table_name: &str, first_row: Option<&Row>) -> TableSchema {
    let columns = match first_row {
        Some(row) if !row.is_empty() => row.keys().map(Column::text).collect(),
        _ => vec![Column::text(PAYLOAD_COLUMN)],
    };
    TableSchema::new(table_name, columns)
}

/// Columns of `row` that `schema` lacks, in row order.
pub fn widen_columns(schema: &TableSchema, row: &Row) -> Vec<Column> {
    row.keys()
        .filter(|name| !schema.schema().contains(name))
        .map(Column::text)
        .collect()
}
