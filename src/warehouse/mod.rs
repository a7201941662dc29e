//! Schema-inferring upsert engine over a [`TableStore`].
//!
//! - `upsert.rs` - per-row create/validate/merge-or-insert
//! - `query.rs` - read-back with an optional identifier filter
//! - `table_spec.rs` - target table and identifier column rules
//! - `locks.rs` - per `(table, identifier)` serialization of check-then-act
//! - `report.rs` - batch outcome

pub mod locks;
mod query;
pub mod report;
pub mod table_spec;
mod upsert;

pub use report::{UpsertFailure, UpsertReport};
pub use table_spec::{IdentifierColumn, TableSpec};

use std::sync::Arc;

use crate::core::{StoreError, TableRef};
use crate::json::{SchemaPolicy, validate_table_name};
use crate::storage::TableStore;
use locks::KeyedLocks;

/// Entry point for writes and reads against one dataset.
///
/// Cheap to clone; clones share the store and the lock table.
#[derive(Clone)]
pub struct Warehouse {
    store: Arc<dyn TableStore>,
    dataset: String,
    policy: SchemaPolicy,
    locks: Arc<KeyedLocks>,
}

impl Warehouse {
    pub fn new(store: Arc<dyn TableStore>, dataset: impl Into<String>) -> Self {
        Self {
            store,
            dataset: dataset.into(),
            policy: SchemaPolicy::default(),
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    pub fn with_schema_policy(mut self, policy: SchemaPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn schema_policy(&self) -> SchemaPolicy {
        self.policy
    }

    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    fn table_ref(&self, name: &str) -> Result<TableRef, StoreError> {
        validate_table_name(name).map_err(|err| StoreError::InvalidIdentifier(err.to_string()))?;
        Ok(TableRef::new(self.dataset.as_str(), name))
    }
}

impl std::fmt::Debug for Warehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Warehouse")
            .field("dataset", &self.dataset)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
