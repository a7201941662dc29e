use serde::{Deserialize, Serialize};

use crate::core::Row;

/// One row that could not be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertFailure {
    /// Position of the record in the submitted batch.
    pub index: usize,
    /// The normalized row, absent when normalization itself failed.
    pub row: Option<Row>,
    pub error: String,
}

/// Outcome of an upsert batch.
///
/// Serializes as `{"status":"ok","processed_count":N}` or
/// `{"status":"error","errors":[...]}`. Rows written before a failure stay
/// written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UpsertReport {
    Ok { processed_count: usize },
    Error { errors: Vec<UpsertFailure> },
}

impl UpsertReport {
    pub(crate) fn from_outcome(processed: usize, errors: Vec<UpsertFailure>) -> Self {
        if errors.is_empty() {
            Self::Ok {
                processed_count: processed,
            }
        } else {
            Self::Error { errors }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn errors(&self) -> &[UpsertFailure] {
        match self {
            Self::Ok { .. } => &[],
            Self::Error { errors } => errors,
        }
    }
}
