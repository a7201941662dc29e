//! Row-oriented table store.
//!
//! [`TableStore`] is the seam between the warehouse layer and whatever holds
//! the rows. [`MemoryStore`] is the in-process implementation, optionally
//! backed by an on-disk snapshot.

pub mod catalog;
pub mod memory;
pub mod persistence;
pub mod table;

pub use catalog::Catalog;
pub use memory::MemoryStore;
pub use table::{Table, TableSchema, Undo};

use crate::core::{Column, Filter, Result, Row, TableRef};
use async_trait::async_trait;

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Creates a dataset; a dataset that already exists is not an error.
    async fn create_dataset(&self, dataset: &str) -> Result<()>;

    /// Existence check. `Ok(None)` when the table is absent.
    async fn get_table(&self, table: &TableRef) -> Result<Option<TableSchema>>;

    /// Creates a table; when it already exists the existing schema is returned
    /// and `schema` is ignored.
    async fn create_table(&self, table: &TableRef, schema: TableSchema) -> Result<TableSchema>;

    /// Appends columns to an existing table.
    async fn add_columns(&self, table: &TableRef, columns: Vec<Column>) -> Result<TableSchema>;

    /// `SELECT COUNT(1) WHERE filter`.
    async fn count(&self, table: &TableRef, filter: &Filter) -> Result<u64>;

    /// `UPDATE SET assignments WHERE filter`; returns affected rows.
    async fn update(&self, table: &TableRef, filter: &Filter, assignments: &Row) -> Result<u64>;

    /// Batch insert.
    async fn insert_rows(&self, table: &TableRef, rows: &[Row]) -> Result<()>;

    /// `SELECT *` with an optional equality filter, in store order.
    async fn select(&self, table: &TableRef, filter: Option<&Filter>) -> Result<Vec<Row>>;
}
