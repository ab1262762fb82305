//! Error types for the pipeline.
//!
//! Only table-level failures are represented here. Malformed individual
//! values and failed reference lookups are absorbed where they happen and
//! tallied instead (see [`crate::coerce::CoercionTally`] and
//! [`crate::linkage::LinkageStats`]).

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Source dataset `{dataset}` unavailable: {source}")]
    SourceUnavailable {
        dataset: &'static str,
        #[source]
        source: SourceError,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

/// Why a source dataset could not be turned into a table.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("line {line} has {found} fields, header has {expected}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },
}

/// Errors raised by a [`crate::sink::Store`] or by the report exporter.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Column layout of `{table}` does not match the stored table")]
    SchemaMismatch { table: String },

    #[error("Failed to export {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading a [`crate::config::PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}
