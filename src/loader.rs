//! Loading of the five source datasets.
//!
//! A dataset either loads completely or the run fails. Individual cell
//! values are not interpreted here, see [`crate::normalize`].

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, info};

use crate::config::{PipelineConfig, SourceFiles};
use crate::error::{EtlError, SourceError};
use crate::records::{
    RawBusRealization, RawBusTransaction, RawHalteTransaction, RouteReference, ShelterCorridor,
};

const TRANSACTION_COLUMNS: &[&str] = &[
    "uuid",
    "waktu_transaksi",
    "card_number_var",
    "card_type_var",
    "balance_before_int",
    "fare_int",
    "balance_after_int",
    "transcode_txt",
    "gate_in_boo",
    "p_latitude_flo",
    "p_longitude_flo",
    "status_var",
    "free_service_boo",
    "insert_on_dtm",
];

/// The named source datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Routes,
    ShelterCorridor,
    RealisasiBus,
    TransaksiHalte,
    TransaksiBus,
}

impl Dataset {
    pub fn name(self) -> &'static str {
        match self {
            Dataset::Routes => "routes",
            Dataset::ShelterCorridor => "shelter_corridor",
            Dataset::RealisasiBus => "realisasi_bus",
            Dataset::TransaksiHalte => "transaksi_halte",
            Dataset::TransaksiBus => "transaksi_bus",
        }
    }

    /// Columns that must be present in the header. Extra columns are ignored.
    pub fn required_columns(self) -> Vec<&'static str> {
        match self {
            Dataset::Routes => vec!["route_code", "route_name"],
            Dataset::ShelterCorridor => vec!["shelter_name_var", "corridor_code"],
            Dataset::RealisasiBus => vec!["tanggal_realisasi", "bus_body_no", "rute_realisasi"],
            Dataset::TransaksiHalte => {
                let mut cols = TRANSACTION_COLUMNS.to_vec();
                cols.extend(["shelter_name_var", "terminal_name_var"]);
                cols
            }
            Dataset::TransaksiBus => {
                let mut cols = TRANSACTION_COLUMNS.to_vec();
                cols.extend(["armada_id_var", "no_body_var"]);
                cols
            }
        }
    }
}

/// Produces source datasets as in-memory tables.
pub trait DatasetSource {
    fn load<T: DeserializeOwned>(&self, dataset: Dataset) -> Result<Vec<T>, EtlError>;
}

/// Reads each dataset from a CSV file in one directory.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
    files: SourceFiles,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>, files: SourceFiles) -> Self {
        Self {
            dir: dir.into(),
            files,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.source_dir(), config.sources.clone())
    }

    pub fn path(&self, dataset: Dataset) -> PathBuf {
        let file = match dataset {
            Dataset::Routes => &self.files.routes,
            Dataset::ShelterCorridor => &self.files.shelter_corridor,
            Dataset::RealisasiBus => &self.files.realisasi_bus,
            Dataset::TransaksiHalte => &self.files.transaksi_halte,
            Dataset::TransaksiBus => &self.files.transaksi_bus,
        };
        self.dir.join(file)
    }
}

impl DatasetSource for CsvDirectory {
    fn load<T: DeserializeOwned>(&self, dataset: Dataset) -> Result<Vec<T>, EtlError> {
        let path = self.path(dataset);
        let file = File::open(&path).map_err(|e| {
            error!(dataset = dataset.name(), path = %path.display(), error = %e, "Failed to open dataset");
            EtlError::SourceUnavailable {
                dataset: dataset.name(),
                source: SourceError::Csv(e.into()),
            }
        })?;
        let rows = read_csv(file, dataset)?;
        info!(dataset = dataset.name(), path = %path.display(), rows = rows.len(), "Dataset extracted");
        Ok(rows)
    }
}

/// Deserializes every record of a CSV stream, failing when a required column
/// is missing or a record cannot be read.
///
/// Records shorter than the header are padded with nulls. Records longer
/// than the header are rejected.
pub fn read_csv<T: DeserializeOwned, R: Read>(reader: R, dataset: Dataset) -> Result<Vec<T>, EtlError> {
    let unavailable = |source: SourceError| EtlError::SourceUnavailable {
        dataset: dataset.name(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| unavailable(e.into()))?.clone();
    let missing: Vec<String> = dataset
        .required_columns()
        .into_iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(unavailable(SourceError::MissingColumns(missing)));
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| unavailable(e.into()))?;
        if record.len() > headers.len() {
            return Err(unavailable(SourceError::TooManyFields {
                line: record.position().map_or(0, |p| p.line()),
                expected: headers.len(),
                found: record.len(),
            }));
        }
        let row: T = record
            .deserialize(Some(&headers))
            .map_err(|e| unavailable(e.into()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// The five raw tables of one run.
#[derive(Debug, Clone, Default)]
pub struct RawDatasets {
    pub routes: Vec<RouteReference>,
    pub shelter_corridor: Vec<ShelterCorridor>,
    pub realisasi_bus: Vec<RawBusRealization>,
    pub transaksi_halte: Vec<RawHalteTransaction>,
    pub transaksi_bus: Vec<RawBusTransaction>,
}

/// Loads all five datasets, aborting on the first one that fails.
#[tracing::instrument(skip_all)]
pub fn load_all<S: DatasetSource>(source: &S) -> Result<RawDatasets, EtlError> {
    Ok(RawDatasets {
        routes: source.load(Dataset::Routes)?,
        shelter_corridor: source.load(Dataset::ShelterCorridor)?,
        realisasi_bus: source.load(Dataset::RealisasiBus)?,
        transaksi_halte: source.load(Dataset::TransaksiHalte)?,
        transaksi_bus: source.load(Dataset::TransaksiBus)?,
    })
}
