//! Lenient per-field coercion of raw CSV text.
//!
//! A value that fails to parse becomes `None` and is counted, it never fails
//! the run.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::debug;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Slash dates are month first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parses a timestamp in any of the accepted layouts.
///
/// RFC 3339 values keep their wall-clock time and drop the offset. A bare
/// date is read as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.naive_local());
    }
    parse_date_only(raw).map(|date| date.and_time(NaiveTime::MIN))
}

/// Parses a plain date. Timestamps are accepted too and truncated.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    parse_date_only(raw).or_else(|| parse_timestamp(raw).map(|ts| ts.date()))
}

fn parse_date_only(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Parses an integer, also accepting integral floats such as `"3500.0"`.
pub fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

pub fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Count of non-empty values that failed coercion, per target type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoercionTally {
    pub timestamps: usize,
    pub dates: usize,
    pub integers: usize,
    pub floats: usize,
    pub booleans: usize,
}

impl CoercionTally {
    pub fn total(&self) -> usize {
        self.timestamps + self.dates + self.integers + self.floats + self.booleans
    }
}

/// Applies the coercions for one dataset and tallies the anomalies.
pub struct Coercer {
    dataset: &'static str,
    tally: CoercionTally,
}

impl Coercer {
    pub fn new(dataset: &'static str) -> Self {
        Self {
            dataset,
            tally: CoercionTally::default(),
        }
    }

    pub fn tally(&self) -> CoercionTally {
        self.tally
    }

    pub fn timestamp(&mut self, field: &'static str, raw: Option<&str>) -> Option<NaiveDateTime> {
        let dataset = self.dataset;
        coerce(raw, parse_timestamp, &mut self.tally.timestamps, dataset, field)
    }

    pub fn date(&mut self, field: &'static str, raw: Option<&str>) -> Option<NaiveDate> {
        let dataset = self.dataset;
        coerce(raw, parse_date, &mut self.tally.dates, dataset, field)
    }

    pub fn int(&mut self, field: &'static str, raw: Option<&str>) -> Option<i64> {
        let dataset = self.dataset;
        coerce(raw, parse_int, &mut self.tally.integers, dataset, field)
    }

    pub fn float(&mut self, field: &'static str, raw: Option<&str>) -> Option<f64> {
        let dataset = self.dataset;
        coerce(raw, parse_float, &mut self.tally.floats, dataset, field)
    }

    pub fn bool(&mut self, field: &'static str, raw: Option<&str>) -> Option<bool> {
        let dataset = self.dataset;
        coerce(raw, parse_bool, &mut self.tally.booleans, dataset, field)
    }
}

fn coerce<T>(
    raw: Option<&str>,
    parse: fn(&str) -> Option<T>,
    failures: &mut usize,
    dataset: &'static str,
    field: &'static str,
) -> Option<T> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = parse(raw);
    if parsed.is_none() {
        *failures += 1;
        debug!(dataset, field, value = raw, "Value failed coercion, using null");
    }
    parsed
}
