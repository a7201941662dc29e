//! On-disk snapshots for the memory store.

use crate::core::{Result, StoreError, TableRef};
use crate::storage::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub datasets: Vec<String>,
    pub tables: Vec<(TableRef, Table)>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub row_count: usize,
    pub table_count: usize,
}

impl StoreSnapshot {
    pub fn new(datasets: Vec<String>, tables: Vec<(TableRef, Table)>) -> Self {
        let row_count = tables.iter().map(|(_, t)| t.row_count()).sum();
        let table_count = tables.len();

        Self {
            version: SNAPSHOT_VERSION,
            datasets,
            tables,
            metadata: SnapshotMetadata {
                created_at: Utc::now(),
                row_count,
                table_count,
            },
        }
    }
}

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Writes the snapshot to a temp file in the target directory, then renames
    /// it over the previous snapshot.
    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let parent = match self.snapshot_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| {
            StoreError::IoError(format!("Failed to create snapshot directory: {}", e))
        })?;

        let serialized = rmp_serde::to_vec(snapshot)
            .map_err(|e| StoreError::IoError(format!("Failed to serialize snapshot: {}", e)))?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent)
            .map_err(|e| StoreError::IoError(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(&serialized)
            .map_err(|e| StoreError::IoError(format!("Failed to write snapshot: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| StoreError::IoError(format!("Failed to sync snapshot: {}", e)))?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| StoreError::IoError(format!("Failed to replace snapshot: {}", e)))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.snapshot_path)
            .map_err(|e| StoreError::IoError(format!("Failed to read snapshot: {}", e)))?;
        let snapshot: StoreSnapshot = rmp_serde::from_slice(&data)
            .map_err(|e| StoreError::IoError(format!("Failed to deserialize snapshot: {}", e)))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::IoError(format!(
                "Unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(Some(snapshot))
    }
}
