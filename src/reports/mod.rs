//! Report aggregation.
//!
//! Three independent group-and-aggregate passes over the customer stream:
//! by card type, by route and by fare. Each counts transactions and sums
//! fares per group.

pub mod aggregate;
pub mod types;

pub use aggregate::build_reports;
pub use types::{CardTypeReportRow, FareReportRow, ReportKind, Reports, RouteReportRow};
