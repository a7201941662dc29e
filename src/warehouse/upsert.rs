use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use super::{TableSpec, UpsertFailure, UpsertReport, Warehouse};
use crate::core::{Filter, Result, Row, StoreError, TableRef};
use crate::json::{
    JsonError, SchemaPolicy, infer_schema, normalize_record, normalize_value, widen_columns,
};
use crate::storage::TableSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Inserted,
    Updated,
}

impl Warehouse {
    /// Upserts a JSON object (one row) or array (one row per element).
    pub async fn upsert(&self, table: impl Into<TableSpec>, data: &JsonValue) -> UpsertReport {
        let rows = normalize_value(data).into_iter().map(Ok).collect();
        self.write_batch(table.into(), rows).await
    }

    /// Upserts typed records. A record that fails to serialize is reported at
    /// its index; the rest of the batch is still written.
    pub async fn upsert_records<T: Serialize>(
        &self,
        table: impl Into<TableSpec>,
        records: &[T],
    ) -> UpsertReport {
        let rows = records
            .iter()
            .map(|record| {
                serde_json::to_value(record)
                    .map(|value| normalize_record(&value))
                    .map_err(JsonError::from)
            })
            .collect();
        self.write_batch(table.into(), rows).await
    }

    async fn write_batch(
        &self,
        spec: TableSpec,
        rows: Vec<std::result::Result<Row, JsonError>>,
    ) -> UpsertReport {
        let table_ref = match self.table_ref(&spec.name) {
            Ok(table_ref) => table_ref,
            Err(err) => {
                warn!(table = %spec.name, error = %err, "rejecting upsert batch");
                let errors = rows
                    .into_iter()
                    .enumerate()
                    .map(|(index, row)| UpsertFailure {
                        index,
                        row: row.ok(),
                        error: err.to_string(),
                    })
                    .collect();
                return UpsertReport::from_outcome(0, errors);
            }
        };

        let first_row = rows.iter().find_map(|row| row.as_ref().ok());
        let creation_schema = infer_schema(&spec.name, first_row);

        let mut processed = 0;
        let mut inserted = 0;
        let mut errors = Vec::new();

        for (index, row) in rows.into_iter().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    warn!(table = %table_ref, index, error = %err, "record not serializable");
                    errors.push(UpsertFailure {
                        index,
                        row: None,
                        error: err.to_string(),
                    });
                    continue;
                }
            };

            match self.upsert_row(&spec, &table_ref, &creation_schema, &row).await {
                Ok(outcome) => {
                    processed += 1;
                    if outcome == RowOutcome::Inserted {
                        inserted += 1;
                    }
                }
                Err(err) => {
                    warn!(table = %table_ref, index, error = %err, "row upsert failed");
                    errors.push(UpsertFailure {
                        index,
                        row: Some(row),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            table = %table_ref,
            processed,
            inserted,
            updated = processed - inserted,
            failed = errors.len(),
            "upsert batch finished"
        );
        UpsertReport::from_outcome(processed, errors)
    }

    async fn upsert_row(
        &self,
        spec: &TableSpec,
        table_ref: &TableRef,
        creation_schema: &TableSchema,
        row: &Row,
    ) -> Result<RowOutcome> {
        self.store.create_dataset(&self.dataset).await?;

        let schema = match self.store.get_table(table_ref).await? {
            Some(schema) => schema,
            None => {
                debug!(
                    table = %table_ref,
                    columns = ?creation_schema.column_names(),
                    "creating table"
                );
                self.store.create_table(table_ref, creation_schema.clone()).await?
            }
        };
        self.conform(table_ref, &schema, row).await?;

        let Some((column, value)) = spec.identifier_of(row) else {
            self.store.insert_rows(table_ref, std::slice::from_ref(row)).await?;
            return Ok(RowOutcome::Inserted);
        };

        let _guard = self.locks.lock(&table_ref.to_string(), value).await?;
        let filter = Filter::eq(column, value);

        if self.store.count(table_ref, &filter).await? > 0 {
            self.store.update(table_ref, &filter, row).await?;
            Ok(RowOutcome::Updated)
        } else {
            self.store.insert_rows(table_ref, std::slice::from_ref(row)).await?;
            Ok(RowOutcome::Inserted)
        }
    }

    /// Applies the schema policy to a row carrying unknown columns.
    async fn conform(&self, table_ref: &TableRef, schema: &TableSchema, row: &Row) -> Result<()> {
        let missing = widen_columns(schema, row);
        if missing.is_empty() {
            return Ok(());
        }

        match self.policy {
            SchemaPolicy::Strict => Err(StoreError::SchemaMismatch {
                table: table_ref.to_string(),
                columns: missing.into_iter().map(|c| c.name).collect(),
            }),
            SchemaPolicy::Widen => {
                debug!(
                    table = %table_ref,
                    columns = ?missing.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                    "widening schema"
                );
                self.store.add_columns(table_ref, missing).await?;
                Ok(())
            }
        }
    }
}
