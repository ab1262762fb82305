//! Record types for the five input datasets, raw and normalized.
//!
//! Raw records mirror the CSV layout with every column read as optional
//! text, so a malformed value can never fail a table load. Typing happens in
//! [`crate::normalize`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::sink::rows::{ColumnDef, SqlType, TableRow, Value, col};

/// A row of `transaksi_halte` as read from the source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHalteTransaction {
    pub uuid: Option<String>,
    pub waktu_transaksi: Option<String>,
    pub shelter_name_var: Option<String>,
    pub terminal_name_var: Option<String>,
    pub card_number_var: Option<String>,
    pub card_type_var: Option<String>,
    pub balance_before_int: Option<String>,
    pub fare_int: Option<String>,
    pub balance_after_int: Option<String>,
    pub transcode_txt: Option<String>,
    pub gate_in_boo: Option<String>,
    pub p_latitude_flo: Option<String>,
    pub p_longitude_flo: Option<String>,
    pub status_var: Option<String>,
    pub free_service_boo: Option<String>,
    pub insert_on_dtm: Option<String>,
}

/// A row of `transaksi_bus` as read from the source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBusTransaction {
    pub uuid: Option<String>,
    pub waktu_transaksi: Option<String>,
    pub armada_id_var: Option<String>,
    pub no_body_var: Option<String>,
    pub card_number_var: Option<String>,
    pub card_type_var: Option<String>,
    pub balance_before_int: Option<String>,
    pub fare_int: Option<String>,
    pub balance_after_int: Option<String>,
    pub transcode_txt: Option<String>,
    pub gate_in_boo: Option<String>,
    pub p_latitude_flo: Option<String>,
    pub p_longitude_flo: Option<String>,
    pub status_var: Option<String>,
    pub free_service_boo: Option<String>,
    pub insert_on_dtm: Option<String>,
}

/// The columns both transaction sources share, still untyped.
#[derive(Debug, Clone, Default)]
pub struct RawTransactionFields {
    pub uuid: Option<String>,
    pub waktu_transaksi: Option<String>,
    pub card_number_var: Option<String>,
    pub card_type_var: Option<String>,
    pub balance_before_int: Option<String>,
    pub fare_int: Option<String>,
    pub balance_after_int: Option<String>,
    pub transcode_txt: Option<String>,
    pub gate_in_boo: Option<String>,
    pub p_latitude_flo: Option<String>,
    pub p_longitude_flo: Option<String>,
    pub status_var: Option<String>,
    pub free_service_boo: Option<String>,
    pub insert_on_dtm: Option<String>,
}

macro_rules! split_shared_fields {
    ($raw:expr) => {
        RawTransactionFields {
            uuid: $raw.uuid,
            waktu_transaksi: $raw.waktu_transaksi,
            card_number_var: $raw.card_number_var,
            card_type_var: $raw.card_type_var,
            balance_before_int: $raw.balance_before_int,
            fare_int: $raw.fare_int,
            balance_after_int: $raw.balance_after_int,
            transcode_txt: $raw.transcode_txt,
            gate_in_boo: $raw.gate_in_boo,
            p_latitude_flo: $raw.p_latitude_flo,
            p_longitude_flo: $raw.p_longitude_flo,
            status_var: $raw.status_var,
            free_service_boo: $raw.free_service_boo,
            insert_on_dtm: $raw.insert_on_dtm,
        }
    };
}

impl RawHalteTransaction {
    /// Returns `(shared fields, shelter_name_var, terminal_name_var)`.
    pub fn split(self) -> (RawTransactionFields, Option<String>, Option<String>) {
        let shelter = self.shelter_name_var;
        let terminal = self.terminal_name_var;
        (split_shared_fields!(self), shelter, terminal)
    }
}

impl RawBusTransaction {
    /// Returns `(shared fields, armada_id_var, no_body_var)`.
    pub fn split(self) -> (RawTransactionFields, Option<String>, Option<String>) {
        let armada = self.armada_id_var;
        let no_body = self.no_body_var;
        (split_shared_fields!(self), armada, no_body)
    }
}

/// Typed form of the shared transaction columns plus the customer flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFields {
    pub uuid: Option<String>,
    pub waktu_transaksi: Option<NaiveDateTime>,
    pub card_number_var: Option<String>,
    pub card_type_var: Option<String>,
    pub balance_before_int: Option<i64>,
    pub fare_int: Option<i64>,
    pub balance_after_int: Option<i64>,
    pub transcode_txt: Option<String>,
    pub gate_in_boo: Option<bool>,
    pub p_latitude_flo: Option<f64>,
    pub p_longitude_flo: Option<f64>,
    pub status_var: Option<String>,
    pub free_service_boo: Option<bool>,
    pub insert_on_dtm: Option<NaiveDateTime>,
    pub is_pelanggan: bool,
}

impl TransactionFields {
    /// Calendar day of the transaction.
    pub fn tanggal(&self) -> Option<NaiveDate> {
        self.waktu_transaksi.map(|ts| ts.date())
    }

    fn card_values(&self) -> [Value; 11] {
        [
            Value::Text(self.card_number_var.clone()),
            Value::Text(self.card_type_var.clone()),
            Value::BigInt(self.balance_before_int),
            Value::BigInt(self.fare_int),
            Value::BigInt(self.balance_after_int),
            Value::Text(self.transcode_txt.clone()),
            Value::Boolean(self.gate_in_boo),
            Value::Double(self.p_latitude_flo),
            Value::Double(self.p_longitude_flo),
            Value::Text(self.status_var.clone()),
            Value::Boolean(self.free_service_boo),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HalteTransaction {
    pub fields: TransactionFields,
    pub shelter_name_var: Option<String>,
    pub terminal_name_var: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusTransaction {
    pub fields: TransactionFields,
    pub armada_id_var: Option<String>,
    pub no_body_var: Option<String>,
    /// Canonical `LETTERS-NNN` form of `no_body_var`.
    pub no_body_var_std: Option<String>,
}

const CARD_COLUMNS: [ColumnDef; 11] = [
    col("card_number_var", SqlType::Text),
    col("card_type_var", SqlType::Text),
    col("balance_before_int", SqlType::BigInt),
    col("fare_int", SqlType::BigInt),
    col("balance_after_int", SqlType::BigInt),
    col("transcode_txt", SqlType::Text),
    col("gate_in_boo", SqlType::Boolean),
    col("p_latitude_flo", SqlType::Double),
    col("p_longitude_flo", SqlType::Double),
    col("status_var", SqlType::Text),
    col("free_service_boo", SqlType::Boolean),
];

const HALTE_COLUMNS: [ColumnDef; 17] = [
    col("uuid", SqlType::Text),
    col("waktu_transaksi", SqlType::Timestamp),
    col("shelter_name_var", SqlType::Text),
    col("terminal_name_var", SqlType::Text),
    CARD_COLUMNS[0],
    CARD_COLUMNS[1],
    CARD_COLUMNS[2],
    CARD_COLUMNS[3],
    CARD_COLUMNS[4],
    CARD_COLUMNS[5],
    CARD_COLUMNS[6],
    CARD_COLUMNS[7],
    CARD_COLUMNS[8],
    CARD_COLUMNS[9],
    CARD_COLUMNS[10],
    col("insert_on_dtm", SqlType::Timestamp),
    col("is_pelanggan", SqlType::Boolean),
];

const BUS_COLUMNS: [ColumnDef; 18] = [
    col("uuid", SqlType::Text),
    col("waktu_transaksi", SqlType::Timestamp),
    col("armada_id_var", SqlType::Text),
    col("no_body_var", SqlType::Text),
    CARD_COLUMNS[0],
    CARD_COLUMNS[1],
    CARD_COLUMNS[2],
    CARD_COLUMNS[3],
    CARD_COLUMNS[4],
    CARD_COLUMNS[5],
    CARD_COLUMNS[6],
    CARD_COLUMNS[7],
    CARD_COLUMNS[8],
    CARD_COLUMNS[9],
    CARD_COLUMNS[10],
    col("insert_on_dtm", SqlType::Timestamp),
    col("is_pelanggan", SqlType::Boolean),
    col("no_body_var_std", SqlType::Text),
];

impl TableRow for HalteTransaction {
    fn columns() -> &'static [ColumnDef] {
        &HALTE_COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        let f = &self.fields;
        let mut values = Vec::with_capacity(HALTE_COLUMNS.len());
        values.push(Value::Text(f.uuid.clone()));
        values.push(Value::Timestamp(f.waktu_transaksi));
        values.push(Value::Text(self.shelter_name_var.clone()));
        values.push(Value::Text(self.terminal_name_var.clone()));
        values.extend(f.card_values());
        values.push(Value::Timestamp(f.insert_on_dtm));
        values.push(Value::Boolean(Some(f.is_pelanggan)));
        values
    }
}

impl TableRow for BusTransaction {
    fn columns() -> &'static [ColumnDef] {
        &BUS_COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        let f = &self.fields;
        let mut values = Vec::with_capacity(BUS_COLUMNS.len());
        values.push(Value::Text(f.uuid.clone()));
        values.push(Value::Timestamp(f.waktu_transaksi));
        values.push(Value::Text(self.armada_id_var.clone()));
        values.push(Value::Text(self.no_body_var.clone()));
        values.extend(f.card_values());
        values.push(Value::Timestamp(f.insert_on_dtm));
        values.push(Value::Boolean(Some(f.is_pelanggan)));
        values.push(Value::Text(self.no_body_var_std.clone()));
        values
    }
}

/// A row of the `routes` reference dataset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RouteReference {
    pub route_code: Option<String>,
    pub route_name: Option<String>,
}

/// A row of the `shelter_corridor` reference dataset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShelterCorridor {
    pub shelter_name_var: Option<String>,
    pub corridor_code: Option<String>,
}

/// A row of `realisasi_bus` as read from the source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBusRealization {
    pub tanggal_realisasi: Option<String>,
    pub bus_body_no: Option<String>,
    pub rute_realisasi: Option<String>,
}

/// Which route a bus body actually ran on a given day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusRealization {
    pub tanggal_realisasi: Option<NaiveDate>,
    pub bus_body_no: Option<String>,
    pub rute_realisasi: Option<String>,
}
