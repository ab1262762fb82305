//! Engine-neutral table representation handed to a [`super::Store`].

use chrono::{NaiveDate, NaiveDateTime};

/// Column type as it is declared in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    BigInt,
    Double,
    Boolean,
    Date,
    Timestamp,
}

impl SqlType {
    pub fn ddl(self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Date => "DATE",
            SqlType::Timestamp => "TIMESTAMP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
}

/// Shorthand for building the static column lists.
pub const fn col(name: &'static str, sql_type: SqlType) -> ColumnDef {
    ColumnDef { name, sql_type }
}

/// A single nullable cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(Option<String>),
    BigInt(Option<i64>),
    Double(Option<f64>),
    Boolean(Option<bool>),
    Date(Option<NaiveDate>),
    Timestamp(Option<NaiveDateTime>),
}

/// A record type that can be persisted as one row of a table.
///
/// `values` must yield exactly one [`Value`] per entry of `columns`, in the
/// same order.
pub trait TableRow {
    fn columns() -> &'static [ColumnDef];
    fn values(&self) -> Vec<Value>;
}

/// A named, materialised table ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub name: String,
    pub columns: &'static [ColumnDef],
    pub rows: Vec<Vec<Value>>,
}

impl TableData {
    pub fn from_rows<T: TableRow>(name: &str, rows: &[T]) -> Self {
        Self {
            name: name.to_string(),
            columns: T::columns(),
            rows: rows.iter().map(TableRow::values).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
