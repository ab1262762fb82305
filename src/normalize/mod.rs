//! Record normalization: deduplication, derived fields and type coercion.

mod bus_body;

pub use bus_body::standardize_bus_body;

use serde::Serialize;
use tracing::{info, warn};

use crate::coerce::{Coercer, CoercionTally};
use crate::records::{
    BusRealization, BusTransaction, HalteTransaction, RawBusRealization, RawBusTransaction,
    RawHalteTransaction, RawTransactionFields, TransactionFields,
};
use crate::table::dedup_by_key;

/// Per-table outcome of a normalization pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub rows_in: usize,
    pub duplicates_removed: usize,
    pub customers: usize,
    pub anomalies: CoercionTally,
}

/// `true` iff the status code is `S`, ignoring case.
pub fn is_pelanggan(status_var: Option<&str>) -> bool {
    status_var.is_some_and(|status| status.to_uppercase() == "S")
}

fn normalize_fields(raw: RawTransactionFields, c: &mut Coercer) -> TransactionFields {
    TransactionFields {
        is_pelanggan: is_pelanggan(raw.status_var.as_deref()),
        waktu_transaksi: c.timestamp("waktu_transaksi", raw.waktu_transaksi.as_deref()),
        balance_before_int: c.int("balance_before_int", raw.balance_before_int.as_deref()),
        fare_int: c.int("fare_int", raw.fare_int.as_deref()),
        balance_after_int: c.int("balance_after_int", raw.balance_after_int.as_deref()),
        gate_in_boo: c.bool("gate_in_boo", raw.gate_in_boo.as_deref()),
        p_latitude_flo: c.float("p_latitude_flo", raw.p_latitude_flo.as_deref()),
        p_longitude_flo: c.float("p_longitude_flo", raw.p_longitude_flo.as_deref()),
        free_service_boo: c.bool("free_service_boo", raw.free_service_boo.as_deref()),
        insert_on_dtm: c.timestamp("insert_on_dtm", raw.insert_on_dtm.as_deref()),
        uuid: raw.uuid,
        card_number_var: raw.card_number_var,
        card_type_var: raw.card_type_var,
        transcode_txt: raw.transcode_txt,
        status_var: raw.status_var,
    }
}

fn log_report(dataset: &'static str, report: &NormalizeReport) {
    info!(
        dataset,
        rows_in = report.rows_in,
        duplicates_removed = report.duplicates_removed,
        customers = report.customers,
        "Normalized transactions"
    );
    if report.anomalies.total() > 0 {
        warn!(
            dataset,
            timestamps = report.anomalies.timestamps,
            integers = report.anomalies.integers,
            floats = report.anomalies.floats,
            booleans = report.anomalies.booleans,
            "Some values failed coercion and were set to null"
        );
    }
}

/// Deduplicates `transaksi_halte` by `uuid` and types every column.
pub fn normalize_halte(raw: Vec<RawHalteTransaction>) -> (Vec<HalteTransaction>, NormalizeReport) {
    let rows_in = raw.len();
    let (raw, duplicates_removed) = dedup_by_key(raw, |r| r.uuid.clone());

    let mut coercer = Coercer::new("transaksi_halte");
    let rows: Vec<HalteTransaction> = raw
        .into_iter()
        .map(|r| {
            let (shared, shelter_name_var, terminal_name_var) = r.split();
            HalteTransaction {
                fields: normalize_fields(shared, &mut coercer),
                shelter_name_var,
                terminal_name_var,
            }
        })
        .collect();

    let report = NormalizeReport {
        rows_in,
        duplicates_removed,
        customers: rows.iter().filter(|r| r.fields.is_pelanggan).count(),
        anomalies: coercer.tally(),
    };
    log_report("transaksi_halte", &report);
    (rows, report)
}

/// Deduplicates `transaksi_bus` by `uuid`, types every column and derives
/// the canonical bus body code.
pub fn normalize_bus(raw: Vec<RawBusTransaction>) -> (Vec<BusTransaction>, NormalizeReport) {
    let rows_in = raw.len();
    let (raw, duplicates_removed) = dedup_by_key(raw, |r| r.uuid.clone());

    let mut coercer = Coercer::new("transaksi_bus");
    let rows: Vec<BusTransaction> = raw
        .into_iter()
        .map(|r| {
            let (shared, armada_id_var, no_body_var) = r.split();
            BusTransaction {
                fields: normalize_fields(shared, &mut coercer),
                armada_id_var,
                no_body_var_std: standardize_bus_body(no_body_var.as_deref()),
                no_body_var,
            }
        })
        .collect();

    let report = NormalizeReport {
        rows_in,
        duplicates_removed,
        customers: rows.iter().filter(|r| r.fields.is_pelanggan).count(),
        anomalies: coercer.tally(),
    };
    log_report("transaksi_bus", &report);
    (rows, report)
}

/// Coerces `tanggal_realisasi` to a plain date. Rows are kept even when the
/// date is unreadable; such rows simply never match a transaction.
pub fn normalize_realization(raw: Vec<RawBusRealization>) -> (Vec<BusRealization>, CoercionTally) {
    let mut coercer = Coercer::new("realisasi_bus");
    let rows = raw
        .into_iter()
        .map(|r| BusRealization {
            tanggal_realisasi: coercer.date("tanggal_realisasi", r.tanggal_realisasi.as_deref()),
            bus_body_no: r.bus_body_no,
            rute_realisasi: r.rute_realisasi,
        })
        .collect();

    let tally = coercer.tally();
    if tally.dates > 0 {
        warn!(
            dataset = "realisasi_bus",
            dates = tally.dates,
            "Some realization dates failed coercion and were set to null"
        );
    }
    (rows, tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw_bus(uuid: &str, status: &str, no_body: &str) -> RawBusTransaction {
        RawBusTransaction {
            uuid: Some(uuid.to_string()),
            waktu_transaksi: Some("2025-01-01 08:00:00".to_string()),
            no_body_var: Some(no_body.to_string()),
            card_type_var: Some("flazz".to_string()),
            fare_int: Some("3500".to_string()),
            gate_in_boo: Some("True".to_string()),
            status_var: Some(status.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_pelanggan_case_insensitive() {
        assert!(is_pelanggan(Some("S")));
        assert!(is_pelanggan(Some("s")));
        assert!(!is_pelanggan(Some("T")));
        assert!(!is_pelanggan(Some("")));
        assert!(!is_pelanggan(Some(" S")));
        assert!(!is_pelanggan(None));
    }

    #[test]
    fn test_dedup_keeps_first_row_fields() {
        let raw = vec![
            raw_bus("u1", "S", "A 1"),
            raw_bus("u2", "S", "B 2"),
            raw_bus("u1", "T", "C 3"),
        ];
        let (rows, report) = normalize_bus(raw);

        assert_eq!(rows.len(), 2);
        assert_eq!(report.rows_in, 3);
        assert_eq!(report.duplicates_removed, 1);
        let first = &rows[0];
        assert_eq!(first.fields.uuid.as_deref(), Some("u1"));
        assert_eq!(first.no_body_var.as_deref(), Some("A 1"));
        assert!(first.fields.is_pelanggan);
    }

    #[test]
    fn test_bus_derived_fields() {
        let (rows, report) = normalize_bus(vec![raw_bus("u1", "s", "b 07")]);
        let bus = &rows[0];

        assert_eq!(bus.no_body_var_std.as_deref(), Some("B-007"));
        assert_eq!(bus.fields.fare_int, Some(3500));
        assert_eq!(bus.fields.gate_in_boo, Some(true));
        assert_eq!(
            bus.fields.tanggal(),
            Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        );
        assert_eq!(report.customers, 1);
        assert_eq!(report.anomalies.total(), 0);
    }

    #[test]
    fn test_bad_timestamp_is_null_not_fatal() {
        let mut raw = raw_bus("u1", "S", "A 1");
        raw.waktu_transaksi = Some("31-31-2025".to_string());
        raw.insert_on_dtm = Some("later".to_string());

        let (rows, report) = normalize_bus(vec![raw]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields.waktu_transaksi, None);
        assert_eq!(rows[0].fields.insert_on_dtm, None);
        assert_eq!(report.anomalies.timestamps, 2);
    }

    #[test]
    fn test_halte_keeps_shelter_columns() {
        let raw = RawHalteTransaction {
            uuid: Some("h1".to_string()),
            shelter_name_var: Some("Blok M".to_string()),
            terminal_name_var: Some("T-01".to_string()),
            status_var: Some("T".to_string()),
            ..Default::default()
        };
        let (rows, report) = normalize_halte(vec![raw]);

        assert_eq!(rows[0].shelter_name_var.as_deref(), Some("Blok M"));
        assert_eq!(rows[0].terminal_name_var.as_deref(), Some("T-01"));
        assert!(!rows[0].fields.is_pelanggan);
        assert_eq!(report.customers, 0);
    }

    #[test]
    fn test_realization_dates_drop_time() {
        let raw = vec![
            RawBusRealization {
                tanggal_realisasi: Some("2025-01-01 05:00:00".to_string()),
                bus_body_no: Some("A-001".to_string()),
                rute_realisasi: Some("A1".to_string()),
            },
            RawBusRealization {
                tanggal_realisasi: Some("unknown".to_string()),
                ..Default::default()
            },
        ];
        let (rows, tally) = normalize_realization(raw);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tanggal_realisasi, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(rows[1].tanggal_realisasi, None);
        assert_eq!(tally.dates, 1);
    }
}
