use tracing::info;

use crate::linkage::{CustomerTransaction, LinkedTransactions, RoutedTransaction};
use crate::reports::types::{CardTypeReportRow, FareReportRow, Reports, RouteReportRow};
use crate::table::group_aggregate;

/// Groups customers by (tanggal, card_type_var, gate_in_boo).
pub fn card_type_report(customers: &[CustomerTransaction]) -> Vec<CardTypeReportRow> {
    group_aggregate(
        customers,
        |c| (c.tanggal, c.card_type_var.clone(), c.gate_in_boo),
        |c| c.fare_int,
    )
    .into_iter()
    .map(|((tanggal, card_type_var, gate_in_boo), totals)| CardTypeReportRow {
        tanggal,
        card_type_var,
        gate_in_boo,
        jumlah_pelanggan: totals.count,
        total_amount: totals.sum,
    })
    .collect()
}

/// Groups routed customers by (tanggal, route_code, route_name, gate_in_boo).
pub fn route_report(routed: &[RoutedTransaction]) -> Vec<RouteReportRow> {
    group_aggregate(
        routed,
        |r| (r.tanggal, r.route_code.clone(), r.route_name.clone(), r.gate_in_boo),
        |r| r.fare_int,
    )
    .into_iter()
    .map(|((tanggal, route_code, route_name, gate_in_boo), totals)| RouteReportRow {
        tanggal,
        route_code,
        route_name,
        gate_in_boo,
        jumlah_pelanggan: totals.count,
        total_amount: totals.sum,
    })
    .collect()
}

/// Groups customers by (tanggal, fare, gate_in_boo).
pub fn fare_report(customers: &[CustomerTransaction]) -> Vec<FareReportRow> {
    group_aggregate(
        customers,
        |c| (c.tanggal, c.fare_int, c.gate_in_boo),
        |c| c.fare_int,
    )
    .into_iter()
    .map(|((tanggal, tarif, gate_in_boo), totals)| FareReportRow {
        tanggal,
        tarif,
        gate_in_boo,
        jumlah_pelanggan: totals.count,
        total_amount: totals.sum,
    })
    .collect()
}

/// Builds all three reports from the linked customer stream.
pub fn build_reports(linked: &LinkedTransactions) -> Reports {
    let reports = Reports {
        card_type: card_type_report(&linked.customers),
        route: route_report(&linked.routed),
        fare: fare_report(&linked.customers),
    };
    info!(
        card_type_rows = reports.card_type.len(),
        route_rows = reports.route.len(),
        fare_rows = reports.fare.len(),
        "Reports generated"
    );
    reports
}
