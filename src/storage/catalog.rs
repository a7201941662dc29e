use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::Table;
use crate::core::{Result, StoreError, TableRef};

pub type TableHandle = Arc<RwLock<Table>>;

type Dataset = Arc<HashMap<String, TableHandle>>;

/// Dataset and table directory.
///
/// Copy-on-write: adding a dataset or table produces a new `Catalog` and leaves
/// readers of the old one untouched. Table contents live behind their own
/// lock, so cloning a catalog never copies rows.
#[derive(Clone, Default)]
pub struct Catalog {
    datasets: Arc<HashMap<String, Dataset>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a catalog containing `name`. Existing datasets are kept as-is.
    pub fn with_dataset(self, name: &str) -> Self {
        if self.datasets.contains_key(name) {
            return self;
        }

        let mut datasets = (*self.datasets).clone();
        datasets.insert(name.to_string(), Arc::new(HashMap::new()));
        Self {
            datasets: Arc::new(datasets),
        }
    }

    /// Returns a catalog with `table` registered. If the table already exists
    /// the catalog is returned unchanged together with the existing handle.
    pub fn with_table(self, table_ref: &TableRef, table: Table) -> Result<(Self, TableHandle)> {
        let dataset = self
            .datasets
            .get(&table_ref.dataset)
            .ok_or_else(|| StoreError::DatasetNotFound(table_ref.dataset.clone()))?;

        if let Some(existing) = dataset.get(&table_ref.table) {
            let handle = Arc::clone(existing);
            return Ok((self, handle));
        }

        let handle = Arc::new(RwLock::new(table));
        let mut tables = (**dataset).clone();
        tables.insert(table_ref.table.clone(), Arc::clone(&handle));

        let mut datasets = (*self.datasets).clone();
        datasets.insert(table_ref.dataset.clone(), Arc::new(tables));

        Ok((
            Self {
                datasets: Arc::new(datasets),
            },
            handle,
        ))
    }

    pub fn dataset_exists(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    pub fn get_table(&self, table_ref: &TableRef) -> Result<TableHandle> {
        self.datasets
            .get(&table_ref.dataset)
            .and_then(|tables| tables.get(&table_ref.table))
            .cloned()
            .ok_or_else(|| StoreError::TableNotFound(table_ref.to_string()))
    }

    pub fn list_datasets(&self) -> Vec<&str> {
        self.datasets.keys().map(|s| s.as_str()).collect()
    }

    /// Every table as `(address, handle)`.
    pub fn tables(&self) -> Vec<(TableRef, TableHandle)> {
        self.datasets
            .iter()
            .flat_map(|(dataset, tables)| {
                tables
                    .iter()
                    .map(move |(name, handle)| (TableRef::new(dataset, name), Arc::clone(handle)))
            })
            .collect()
    }
}
