//! Run configuration: where the source CSVs live, where reports go, which
//! tables to write and how to reach the database.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_BASE_PATH: &str = "/opt/airflow/";

/// Everything a pipeline run needs to know about its surroundings.
///
/// Can be loaded from a JSON file where every section is optional:
/// ```json
/// {
///   "base_path": "/data/etl",
///   "database": { "host": "localhost", "password": "secret" },
///   "tables": { "report_route": "report_route_v2" }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub base_path: PathBuf,
    /// Defaults to `<base_path>/data_source`.
    pub source_dir: Option<PathBuf>,
    /// Defaults to `<base_path>/output`.
    pub output_dir: Option<PathBuf>,
    pub sources: SourceFiles,
    pub tables: TableNames,
    pub database: DatabaseConfig,
}

/// File names of the five input datasets, relative to the source directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub routes: String,
    pub shelter_corridor: String,
    pub realisasi_bus: String,
    pub transaksi_halte: String,
    pub transaksi_bus: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub transaksi_halte: String,
    pub transaksi_bus: String,
    pub report_card_type: String,
    pub report_route: String,
    pub report_fare: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection URL. Takes precedence over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
    pub port: u16,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            source_dir: None,
            output_dir: None,
            sources: SourceFiles::default(),
            tables: TableNames::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            routes: "dummy_routes.csv".to_string(),
            shelter_corridor: "dummy_shelter_corridor.csv".to_string(),
            realisasi_bus: "dummy_realisasi_bus.csv".to_string(),
            transaksi_halte: "dummy_transaksi_halte.csv".to_string(),
            transaksi_bus: "dummy_transaksi_bus.csv".to_string(),
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            transaksi_halte: "dummy_transaksi_halte".to_string(),
            transaksi_bus: "dummy_transaksi_bus".to_string(),
            report_card_type: "report_card_type".to_string(),
            report_route: "report_route".to_string(),
            report_fare: "report_fare".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "postgres".to_string(),
            user: "airflow".to_string(),
            password: "airflow".to_string(),
            name: "transport_db".to_string(),
            port: 5432,
        }
    }
}

impl DatabaseConfig {
    /// Returns the PostgreSQL connection URL.
    pub fn url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgresql://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`. Missing keys fall back to
    /// their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the config from the defaults overridden by environment variables.
    ///
    /// Recognised variables: `ETL_BASE_PATH`, `ETL_SOURCE_DIR`, `ETL_OUTPUT_DIR`,
    /// `POSTGRES_HOST`, `POSTGRES_USER`, `POSTGRES_PASSWORD`, `POSTGRES_DB`,
    /// `POSTGRES_PORT` and `DATABASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(base) = lookup("ETL_BASE_PATH") {
            config.base_path = PathBuf::from(base);
        }
        config.source_dir = lookup("ETL_SOURCE_DIR").map(PathBuf::from);
        config.output_dir = lookup("ETL_OUTPUT_DIR").map(PathBuf::from);

        let db = &mut config.database;
        db.url = lookup("DATABASE_URL");
        if let Some(host) = lookup("POSTGRES_HOST") {
            db.host = host;
        }
        if let Some(user) = lookup("POSTGRES_USER") {
            db.user = user;
        }
        if let Some(password) = lookup("POSTGRES_PASSWORD") {
            db.password = password;
        }
        if let Some(name) = lookup("POSTGRES_DB") {
            db.name = name;
        }
        if let Some(port) = lookup("POSTGRES_PORT") {
            db.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "POSTGRES_PORT",
                value: port,
            })?;
        }

        Ok(config)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.source_dir
            .clone()
            .unwrap_or_else(|| self.base_path.join("data_source"))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.base_path.join("output"))
    }
}
