use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Dataset '{0}' not found")]
    DatasetNotFound(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Table '{0}' has no identifier column")]
    NoIdentifierColumn(String),

    #[error("Schema mismatch on table '{table}': unknown columns {columns:?}")]
    SchemaMismatch { table: String, columns: Vec<String> },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
