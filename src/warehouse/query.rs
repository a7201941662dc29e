use tracing::debug;

use super::{TableSpec, Warehouse};
use crate::core::{Filter, Result, Row, StoreError};

impl Warehouse {
    /// Reads a table, optionally restricted to rows whose identifier column
    /// equals `identifier`.
    pub async fn query(
        &self,
        table: impl Into<TableSpec>,
        identifier: Option<&str>,
    ) -> Result<Vec<Row>> {
        let spec = table.into();
        let table_ref = self.table_ref(&spec.name)?;
        let schema = self
            .store
            .get_table(&table_ref)
            .await?
            .ok_or_else(|| StoreError::TableNotFound(table_ref.to_string()))?;

        let filter = match identifier {
            None => None,
            Some(value) => {
                let column = spec
                    .identifier_in(schema.column_names())
                    .ok_or_else(|| StoreError::NoIdentifierColumn(table_ref.to_string()))?;
                Some(Filter::eq(column, value))
            }
        };

        let rows = self.store.select(&table_ref, filter.as_ref()).await?;
        debug!(table = %table_ref, filtered = filter.is_some(), rows = rows.len(), "query");
        Ok(rows)
    }
}
