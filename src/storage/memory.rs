use async_trait::async_trait;
use std::path::Path;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use super::catalog::{Catalog, TableHandle};
use super::persistence::{SnapshotManager, StoreSnapshot};
use super::{Table, TableSchema, TableStore, Undo};
use crate::core::{Column, Filter, Result, Row, StoreError, TableRef};

/// In-process implementation of [`TableStore`].
///
/// The catalog sits under a store-wide lock that is only held for directory
/// changes; every table carries its own lock. When opened with a snapshot path,
/// a mutation becomes visible only after the snapshot containing it has been
/// written; a failed write rolls the mutation back.
pub struct MemoryStore {
    catalog: RwLock<Catalog>,
    snapshots: Option<SnapshotManager>,
    persist_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(Catalog::new()),
            snapshots: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Opens a snapshot-backed store, restoring any existing snapshot.
    pub fn open<P: AsRef<Path>>(snapshot_path: P) -> Result<Self> {
        let manager = SnapshotManager::new(snapshot_path);
        let mut catalog = Catalog::new();

        if let Some(snapshot) = manager.load()? {
            info!(
                path = %manager.path().display(),
                tables = snapshot.metadata.table_count,
                rows = snapshot.metadata.row_count,
                "restoring store snapshot"
            );
            for dataset in &snapshot.datasets {
                catalog = catalog.with_dataset(dataset);
            }
            for (table_ref, table) in snapshot.tables {
                catalog = catalog.with_dataset(&table_ref.dataset);
                let (next, _) = catalog.with_table(&table_ref, table)?;
                catalog = next;
            }
        }

        Ok(Self {
            catalog: RwLock::new(catalog),
            snapshots: Some(manager),
            persist_lock: Mutex::new(()),
        })
    }

    pub async fn list_tables(&self, dataset: &str) -> Vec<String> {
        let catalog = self.catalog.read().await;
        let mut names: Vec<String> = catalog
            .tables()
            .into_iter()
            .filter(|(table_ref, _)| table_ref.dataset == dataset)
            .map(|(table_ref, _)| table_ref.table)
            .collect();
        names.sort();
        names
    }

    async fn handle(&self, table: &TableRef) -> Result<TableHandle> {
        self.catalog.read().await.get_table(table)
    }

    /// Serializes snapshot-backed mutations so snapshots land in commit order.
    /// Taken before any catalog or table lock.
    async fn writer(&self) -> Option<MutexGuard<'_, ()>> {
        match self.snapshots {
            Some(_) => Some(self.persist_lock.lock().await),
            None => None,
        }
    }

    /// Writes `catalog` to the snapshot, reading `staged` in place of the live
    /// table it names. Callers hold [`Self::writer`].
    async fn save(&self, catalog: &Catalog, staged: Option<(&TableRef, &Table)>) -> Result<()> {
        let Some(manager) = &self.snapshots else {
            return Ok(());
        };

        let datasets = catalog.list_datasets().into_iter().map(String::from).collect();
        let mut tables = Vec::new();
        for (table_ref, handle) in catalog.tables() {
            let table = match staged {
                Some((staged_ref, staged)) if *staged_ref == table_ref => staged.clone(),
                _ => handle.read().await.clone(),
            };
            tables.push((table_ref, table));
        }

        let snapshot = StoreSnapshot::new(datasets, tables);
        debug!(rows = snapshot.metadata.row_count, "writing store snapshot");
        manager.save(&snapshot)
    }

    /// Makes a staged table change durable, or reverts it.
    async fn commit(&self, table_ref: &TableRef, table: &mut Table, undo: Undo) -> Result<usize> {
        if self.snapshots.is_none() {
            return Ok(undo.affected());
        }
        let catalog = self.catalog.read().await.clone();
        if let Err(err) = self.save(&catalog, Some((table_ref, &*table))).await {
            warn!(table = %table_ref, error = %err, "snapshot failed, rolling back");
            table.rollback(undo);
            return Err(err);
        }
        Ok(undo.affected())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn create_dataset(&self, dataset: &str) -> Result<()> {
        let _writer = self.writer().await;
        let mut catalog = self.catalog.write().await;
        if catalog.dataset_exists(dataset) {
            return Ok(());
        }

        let next = catalog.clone().with_dataset(dataset);
        self.save(&next, None).await?;
        *catalog = next;
        debug!(dataset, "created dataset");
        Ok(())
    }

    async fn get_table(&self, table: &TableRef) -> Result<Option<TableSchema>> {
        match self.handle(table).await {
            Ok(handle) => Ok(Some(handle.read().await.schema().clone())),
            Err(StoreError::TableNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_table(&self, table: &TableRef, schema: TableSchema) -> Result<TableSchema> {
        let _writer = self.writer().await;
        let mut catalog = self.catalog.write().await;
        if let Ok(existing) = catalog.get_table(table) {
            drop(catalog);
            return Ok(existing.read().await.schema().clone());
        }

        let (next, handle) = catalog.clone().with_table(table, Table::new(schema))?;
        self.save(&next, None).await?;
        *catalog = next;

        let effective = handle.read().await.schema().clone();
        debug!(table = %table, columns = ?effective.column_names(), "table ready");
        Ok(effective)
    }

    async fn add_columns(&self, table: &TableRef, columns: Vec<Column>) -> Result<TableSchema> {
        let _writer = self.writer().await;
        let handle = self.handle(table).await?;
        let mut guard = handle.write().await;
        let undo = guard.add_columns(columns);
        self.commit(table, &mut guard, undo).await?;
        Ok(guard.schema().clone())
    }

    async fn count(&self, table: &TableRef, filter: &Filter) -> Result<u64> {
        let handle = self.handle(table).await?;
        let count = handle.read().await.count_where(filter)?;
        Ok(count as u64)
    }

    async fn update(&self, table: &TableRef, filter: &Filter, assignments: &Row) -> Result<u64> {
        let _writer = self.writer().await;
        let handle = self.handle(table).await?;
        let mut guard = handle.write().await;
        let undo = guard.update_where(filter, assignments)?;
        let updated = self.commit(table, &mut guard, undo).await?;
        Ok(updated as u64)
    }

    async fn insert_rows(&self, table: &TableRef, rows: &[Row]) -> Result<()> {
        let _writer = self.writer().await;
        let handle = self.handle(table).await?;
        let mut guard = handle.write().await;
        let undo = guard.insert_all(rows)?;
        self.commit(table, &mut guard, undo).await?;
        Ok(())
    }

    async fn select(&self, table: &TableRef, filter: Option<&Filter>) -> Result<Vec<Row>> {
        let handle = self.handle(table).await?;
        let rows = handle.read().await.scan(filter)?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn schema() -> TableSchema {
        TableSchema::new("Projects", vec![Column::text("project_id"), Column::text("name")])
    }

    #[tokio::test]
    async fn create_table_needs_dataset() {
        let store = MemoryStore::new();
        let err = store
            .create_table(&TableRef::new("ds", "Projects"), schema())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DatasetNotFound("ds".into()));
    }

    #[tokio::test]
    async fn create_table_keeps_first_schema() {
        let store = MemoryStore::new();
        let table = TableRef::new("ds", "Projects");
        store.create_dataset("ds").await.unwrap();
        store.create_table(&table, schema()).await.unwrap();

        let second = TableSchema::new("Projects", vec![Column::text("other")]);
        let effective = store.create_table(&table, second).await.unwrap();
        assert_eq!(effective.column_names(), vec!["project_id", "name"]);
    }

    #[tokio::test]
    async fn insert_rows_is_all_or_nothing() {
        let store = MemoryStore::new();
        let table = TableRef::new("ds", "Projects");
        store.create_dataset("ds").await.unwrap();
        store.create_table(&table, schema()).await.unwrap();

        let result = store
            .insert_rows(&table, &[row(&[("name", "ok")]), row(&[("bogus", "x")])])
            .await;
        assert!(result.is_err());
        assert!(store.select(&table, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_table_reports_absence() {
        let store = MemoryStore::new();
        store.create_dataset("ds").await.unwrap();
        assert!(store.get_table(&TableRef::new("ds", "nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.snapshot");
        let table = TableRef::new("ds", "Projects");

        {
            let store = MemoryStore::open(&path).unwrap();
            store.create_dataset("ds").await.unwrap();
            store.create_table(&table, schema()).await.unwrap();
            store
                .insert_rows(&table, &[row(&[("project_id", "7"), ("name", "Acme")])])
                .await
                .unwrap();
        }

        let reopened = MemoryStore::open(&path).unwrap();
        let rows = reopened.select(&table, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Acme");
        assert_eq!(reopened.list_tables("ds").await, vec!["Projects"]);
    }

    #[tokio::test]
    async fn failed_snapshot_rolls_back_every_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_dir = dir.path().join("snapshots");
        let table = TableRef::new("ds", "Projects");

        let store = MemoryStore::open(snapshot_dir.join("store.snapshot")).unwrap();
        store.create_dataset("ds").await.unwrap();
        store.create_table(&table, schema()).await.unwrap();
        store
            .insert_rows(&table, &[row(&[("project_id", "7"), ("name", "Acme")])])
            .await
            .unwrap();

        // A regular file where the snapshot directory should be.
        std::fs::remove_dir_all(&snapshot_dir).unwrap();
        std::fs::write(&snapshot_dir, b"not a directory").unwrap();

        let err = store
            .insert_rows(&table, &[row(&[("project_id", "8"), ("name", "Globex")])])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::IoError(_)));

        let filter = Filter::eq("project_id", "7");
        assert!(store.update(&table, &filter, &row(&[("name", "Initech")])).await.is_err());
        assert!(store.add_columns(&table, vec![Column::text("sector")]).await.is_err());
        assert!(store.create_dataset("other").await.is_err());
        assert!(
            store
                .create_table(&TableRef::new("ds", "Notes"), schema())
                .await
                .is_err()
        );

        let rows = store.select(&table, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Acme");
        let current = store.get_table(&table).await.unwrap().unwrap();
        assert_eq!(current.column_names(), vec!["project_id", "name"]);
        assert!(store.get_table(&TableRef::new("ds", "Notes")).await.unwrap().is_none());
        assert_eq!(store.list_tables("ds").await, vec!["Projects"]);
    }
}
