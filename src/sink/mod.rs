//! Persistence of transaction and report tables.
//!
//! [`Store`] is the seam between the pipeline and the relational store.
//! [`PostgresStore`] is the production backend, [`MemoryStore`] backs dry
//! runs and tests. Report files are written by [`export`].

pub mod export;
mod memory;
mod postgres;
pub mod rows;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use rows::{ColumnDef, SqlType, TableData, TableRow, Value};

use crate::error::StorageError;

/// How a write treats rows already stored under the same table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Keep existing rows and add the new ones. Creates the table if needed.
    Append,
    /// Drop whatever is stored and write the new rows in its place.
    Replace,
}

/// A relational store the pipeline writes its tables to.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Writes `table` according to `mode` and returns the number of rows written.
    async fn write_table(&self, table: &TableData, mode: WriteMode) -> Result<u64, StorageError>;

    /// Drops the named table if it exists and recreates it empty with the
    /// given columns.
    async fn reset_table(&self, name: &str, columns: &'static [ColumnDef]) -> Result<(), StorageError>;
}
