use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ColumnDef, Store, TableData, WriteMode};
use crate::error::StorageError;

/// Keeps tables in process memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, TableData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the stored table, if any.
    pub fn table(&self, name: &str) -> Option<TableData> {
        self.lock().get(name).cloned()
    }

    pub fn row_count(&self, name: &str) -> usize {
        self.lock().get(name).map_or(0, TableData::len)
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, TableData>> {
        // A poisoned lock only means another writer panicked; the map is still usable.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn write_table(&self, table: &TableData, mode: WriteMode) -> Result<u64, StorageError> {
        let mut tables = self.lock();
        match (mode, tables.get_mut(&table.name)) {
            (WriteMode::Append, Some(existing)) => {
                if existing.columns != table.columns {
                    return Err(StorageError::SchemaMismatch {
                        table: table.name.clone(),
                    });
                }
                existing.rows.extend(table.rows.iter().cloned());
            }
            _ => {
                tables.insert(table.name.clone(), table.clone());
            }
        }
        Ok(table.len() as u64)
    }

    async fn reset_table(&self, name: &str, columns: &'static [ColumnDef]) -> Result<(), StorageError> {
        self.lock().insert(
            name.to_string(),
            TableData {
                name: name.to_string(),
                columns,
                rows: Vec::new(),
            },
        );
        Ok(())
    }
}
