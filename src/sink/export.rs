//! CSV export of report tables.

use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::reports::ReportKind;
use crate::sink::rows::TableRow;

/// Writes `rows` to `<dir>/report_<key>.csv`, replacing any earlier file.
///
/// The header row is always written, so an empty report still produces a
/// file with its column names.
pub fn export_report<T>(dir: &Path, kind: ReportKind, rows: &[T]) -> Result<PathBuf, StorageError>
where
    T: Serialize + TableRow,
{
    std::fs::create_dir_all(dir)?;
    let path = dir.join(kind.file_name());
    debug!(path = %path.display(), rows = rows.len(), "Writing report CSV");

    let export_err = |source: csv::Error| StorageError::Export {
        path: path.clone(),
        source,
    };

    let file = File::create(&path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    writer
        .write_record(T::columns().iter().map(|c| c.name))
        .map_err(export_err)?;
    for row in rows {
        writer.serialize(row).map_err(export_err)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "Report saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{CardTypeReportRow, FareReportRow};
    use chrono::NaiveDate;
    use std::env;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir); // clean up any prior run
        dir
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let dir = temp_dir("transit_etl_test_export_rows");
        let rows = vec![CardTypeReportRow {
            tanggal: NaiveDate::from_ymd_opt(2025, 1, 1),
            card_type_var: Some("flazz".to_string()),
            gate_in_boo: Some(true),
            jumlah_pelanggan: 2,
            total_amount: 7000,
        }];

        let path = export_report(&dir, ReportKind::CardType, &rows).unwrap();
        assert_eq!(path, dir.join("report_card_type.csv"));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "tanggal,card_type_var,gate_in_boo,jumlah_pelanggan,total_amount",
                "2025-01-01,flazz,true,2,7000",
            ]
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_report_still_has_header() {
        let dir = temp_dir("transit_etl_test_export_empty");
        let rows: Vec<FareReportRow> = Vec::new();

        let path = export_report(&dir, ReportKind::Fare, &rows).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), "tanggal,tarif,gate_in_boo,jumlah_pelanggan,total_amount");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_export_overwrites_previous_file() {
        let dir = temp_dir("transit_etl_test_export_overwrite");
        let row = FareReportRow {
            tanggal: None,
            tarif: Some(3500),
            gate_in_boo: None,
            jumlah_pelanggan: 1,
            total_amount: 3500,
        };

        export_report(&dir, ReportKind::Fare, &[row.clone(), row.clone()]).unwrap();
        let path = export_report(&dir, ReportKind::Fare, &[row]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains(",3500,,1,3500"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
