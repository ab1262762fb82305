//! The full daily run: extract, normalize, load transactions, link,
//! aggregate, load and export reports.
//!
//! Steps run strictly in sequence. A fatal error aborts the remainder of the
//! run; writes that already completed are not rolled back.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::coerce::CoercionTally;
use crate::config::{PipelineConfig, TableNames};
use crate::error::EtlError;
use crate::linkage::{LinkageStats, References, link_transactions};
use crate::loader::{DatasetSource, RawDatasets, load_all};
use crate::normalize::{NormalizeReport, normalize_bus, normalize_halte, normalize_realization};
use crate::records::{BusRealization, BusTransaction, HalteTransaction, RouteReference, ShelterCorridor};
use crate::reports::{
    CardTypeReportRow, FareReportRow, ReportKind, Reports, RouteReportRow, build_reports,
};
use crate::sink::export::export_report;
use crate::sink::{Store, TableData, TableRow, WriteMode};

/// All five datasets after normalization.
#[derive(Debug, Clone, Default)]
pub struct NormalizedData {
    pub routes: Vec<RouteReference>,
    pub shelter_corridor: Vec<ShelterCorridor>,
    pub realisasi_bus: Vec<BusRealization>,
    pub transaksi_halte: Vec<HalteTransaction>,
    pub transaksi_bus: Vec<BusTransaction>,
    pub halte_report: NormalizeReport,
    pub bus_report: NormalizeReport,
    pub realization_anomalies: CoercionTally,
}

impl NormalizedData {
    pub fn references(&self) -> References<'_> {
        References {
            routes: &self.routes,
            shelter_corridor: &self.shelter_corridor,
            realisasi_bus: &self.realisasi_bus,
        }
    }
}

/// Normalizes the raw datasets.
#[tracing::instrument(skip_all)]
pub fn transform(raw: RawDatasets) -> NormalizedData {
    let (transaksi_bus, bus_report) = normalize_bus(raw.transaksi_bus);
    let (transaksi_halte, halte_report) = normalize_halte(raw.transaksi_halte);
    let (realisasi_bus, realization_anomalies) = normalize_realization(raw.realisasi_bus);
    info!("Data transformation finished");

    NormalizedData {
        routes: raw.routes,
        shelter_corridor: raw.shelter_corridor,
        realisasi_bus,
        transaksi_halte,
        transaksi_bus,
        halte_report,
        bus_report,
        realization_anomalies,
    }
}

/// Links customers to routes and builds the three reports.
pub fn generate_reports(data: &NormalizedData) -> (Reports, LinkageStats) {
    let linked = link_transactions(&data.transaksi_bus, &data.transaksi_halte, data.references());
    (build_reports(&linked), linked.stats)
}

/// Appends both normalized transaction tables to the store.
#[tracing::instrument(skip_all)]
pub async fn load_transactions<S: Store>(
    store: &S,
    tables: &TableNames,
    data: &NormalizedData,
) -> Result<(), EtlError> {
    for table in [
        TableData::from_rows(&tables.transaksi_halte, &data.transaksi_halte),
        TableData::from_rows(&tables.transaksi_bus, &data.transaksi_bus),
    ] {
        let written = store.write_table(&table, WriteMode::Append).await?;
        info!(table = %table.name, rows = written, "Transactions appended");
    }
    Ok(())
}

async fn load_report<S, T>(
    store: &S,
    table_name: &str,
    output_dir: &Path,
    kind: ReportKind,
    rows: &[T],
) -> Result<PathBuf, EtlError>
where
    S: Store,
    T: TableRow + Serialize + Sync,
{
    let table = TableData::from_rows(table_name, rows);
    let written = store.write_table(&table, WriteMode::Replace).await?;
    info!(table = table_name, rows = written, "Report table replaced");
    Ok(export_report(output_dir, kind, rows)?)
}

/// Replaces the three report tables and exports each one as a CSV file.
#[tracing::instrument(skip_all, fields(output_dir = %output_dir.display()))]
pub async fn load_reports<S: Store>(
    store: &S,
    tables: &TableNames,
    output_dir: &Path,
    reports: &Reports,
) -> Result<Vec<PathBuf>, EtlError> {
    Ok(vec![
        load_report(store, &tables.report_card_type, output_dir, ReportKind::CardType, &reports.card_type).await?,
        load_report(store, &tables.report_route, output_dir, ReportKind::Route, &reports.route).await?,
        load_report(store, &tables.report_fare, output_dir, ReportKind::Fare, &reports.fare).await?,
    ])
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportRowCounts {
    pub card_type: usize,
    pub route: usize,
    pub fare: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub finished_at: DateTime<Utc>,
    pub transaksi_halte: NormalizeReport,
    pub transaksi_bus: NormalizeReport,
    pub realization_anomalies: CoercionTally,
    pub linkage: LinkageStats,
    pub report_rows: ReportRowCounts,
    pub exported: Vec<PathBuf>,
}

/// One configured pipeline: where to read from and where to write to.
pub struct Pipeline<D, S> {
    config: PipelineConfig,
    source: D,
    store: S,
}

impl<D: DatasetSource, S: Store> Pipeline<D, S> {
    pub fn new(config: PipelineConfig, source: D, store: S) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drops and recreates the two transaction tables and the three report
    /// tables with their fixed layouts.
    #[tracing::instrument(skip_all)]
    pub async fn init_schema(&self) -> Result<(), EtlError> {
        let t = &self.config.tables;
        let layouts = [
            (&t.transaksi_halte, HalteTransaction::columns()),
            (&t.transaksi_bus, BusTransaction::columns()),
            (&t.report_card_type, CardTypeReportRow::columns()),
            (&t.report_route, RouteReportRow::columns()),
            (&t.report_fare, FareReportRow::columns()),
        ];
        for (name, columns) in layouts {
            self.store.reset_table(name, columns).await?;
        }
        info!("Transaction and report tables created");
        Ok(())
    }

    /// Runs the whole pipeline once.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self) -> Result<RunSummary, EtlError> {
        let raw = load_all(&self.source)?;
        let data = transform(raw);

        load_transactions(&self.store, &self.config.tables, &data).await?;

        let (reports, linkage) = generate_reports(&data);
        let exported = load_reports(
            &self.store,
            &self.config.tables,
            &self.config.output_dir(),
            &reports,
        )
        .await?;

        info!("Daily ETL run finished");
        Ok(RunSummary {
            finished_at: Utc::now(),
            transaksi_halte: data.halte_report,
            transaksi_bus: data.bus_report,
            realization_anomalies: data.realization_anomalies,
            linkage,
            report_rows: ReportRowCounts {
                card_type: reports.card_type.len(),
                route: reports.route.len(),
                fare: reports.fare.len(),
            },
            exported,
        })
    }
}
