//! Row types of the three report tables.

use chrono::NaiveDate;
use serde::Serialize;

use crate::sink::rows::{ColumnDef, SqlType, TableRow, Value, col};

/// Customers and revenue per day, card type and gate direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardTypeReportRow {
    pub tanggal: Option<NaiveDate>,
    pub card_type_var: Option<String>,
    pub gate_in_boo: Option<bool>,
    pub jumlah_pelanggan: i64,
    pub total_amount: i64,
}

/// Customers and revenue per day, route and gate direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteReportRow {
    pub tanggal: Option<NaiveDate>,
    pub route_code: String,
    pub route_name: String,
    pub gate_in_boo: Option<bool>,
    pub jumlah_pelanggan: i64,
    pub total_amount: i64,
}

/// Customers and revenue per day, fare and gate direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FareReportRow {
    pub tanggal: Option<NaiveDate>,
    pub tarif: Option<i64>,
    pub gate_in_boo: Option<bool>,
    pub jumlah_pelanggan: i64,
    pub total_amount: i64,
}

impl TableRow for CardTypeReportRow {
    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[
            col("tanggal", SqlType::Date),
            col("card_type_var", SqlType::Text),
            col("gate_in_boo", SqlType::Boolean),
            col("jumlah_pelanggan", SqlType::BigInt),
            col("total_amount", SqlType::BigInt),
        ];
        COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Date(self.tanggal),
            Value::Text(self.card_type_var.clone()),
            Value::Boolean(self.gate_in_boo),
            Value::BigInt(Some(self.jumlah_pelanggan)),
            Value::BigInt(Some(self.total_amount)),
        ]
    }
}

impl TableRow for RouteReportRow {
    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[
            col("tanggal", SqlType::Date),
            col("route_code", SqlType::Text),
            col("route_name", SqlType::Text),
            col("gate_in_boo", SqlType::Boolean),
            col("jumlah_pelanggan", SqlType::BigInt),
            col("total_amount", SqlType::BigInt),
        ];
        COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Date(self.tanggal),
            Value::Text(Some(self.route_code.clone())),
            Value::Text(Some(self.route_name.clone())),
            Value::Boolean(self.gate_in_boo),
            Value::BigInt(Some(self.jumlah_pelanggan)),
            Value::BigInt(Some(self.total_amount)),
        ]
    }
}

impl TableRow for FareReportRow {
    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[
            col("tanggal", SqlType::Date),
            col("tarif", SqlType::BigInt),
            col("gate_in_boo", SqlType::Boolean),
            col("jumlah_pelanggan", SqlType::BigInt),
            col("total_amount", SqlType::BigInt),
        ];
        COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Date(self.tanggal),
            Value::BigInt(self.tarif),
            Value::Boolean(self.gate_in_boo),
            Value::BigInt(Some(self.jumlah_pelanggan)),
            Value::BigInt(Some(self.total_amount)),
        ]
    }
}

/// Identifies one of the three reports. The key names the export file
/// (`report_<key>.csv`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    CardType,
    Route,
    Fare,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [ReportKind::CardType, ReportKind::Route, ReportKind::Fare];

    pub fn key(self) -> &'static str {
        match self {
            ReportKind::CardType => "card_type",
            ReportKind::Route => "route",
            ReportKind::Fare => "fare",
        }
    }

    pub fn file_name(self) -> String {
        format!("report_{}.csv", self.key())
    }
}

/// The three report tables of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reports {
    pub card_type: Vec<CardTypeReportRow>,
    pub route: Vec<RouteReportRow>,
    pub fare: Vec<FareReportRow>,
}
