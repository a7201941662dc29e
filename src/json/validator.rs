//! Identifier rules for table and column names.

use super::error::{JsonError, JsonResult};

/// Maximum table name length accepted from callers.
pub const MAX_TABLE_NAME_LEN: usize = 64;

/// Turns an arbitrary field name into a column identifier.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_` (so `project-id` and
/// `project.id` both map to `project_id`); a leading digit gets a `_` prefix.
pub fn sanitize_column_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if sanitized.is_empty() || sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }
    sanitized
}

/// Validates a caller-supplied table name.
pub fn validate_table_name(name: &str) -> JsonResult<()> {
    if name.is_empty() {
        return Err(JsonError::InvalidTableName("Table name cannot be empty".to_string()));
    }

    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err(JsonError::InvalidTableName(
            "Table name must start with a letter or underscore".to_string(),
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(JsonError::InvalidTableName(
            "Table name can only contain letters, numbers, and underscores".to_string(),
        ));
    }

    if name.len() > MAX_TABLE_NAME_LEN {
        return Err(JsonError::InvalidTableName(format!(
            "Table name too long (max {} characters)",
            MAX_TABLE_NAME_LEN
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_separators() {
        assert_eq!(sanitize_column_name("project-id"), "project_id");
        assert_eq!(sanitize_column_name("meta.source"), "meta_source");
        assert_eq!(sanitize_column_name("cost structure"), "cost_structure");
        assert_eq!(sanitize_column_name("already_ok"), "already_ok");
    }

    #[test]
    fn sanitizes_leading_digit_and_empty() {
        assert_eq!(sanitize_column_name("1st"), "_1st");
        assert_eq!(sanitize_column_name(""), "_");
    }

    #[test]
    fn table_names() {
        assert!(validate_table_name("BMC").is_ok());
        assert!(validate_table_name("_scratch_2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2fast").is_err());
        assert!(validate_table_name("bmc; DROP").is_err());
        assert!(validate_table_name(&"x".repeat(65)).is_err());
    }
}
