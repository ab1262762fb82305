//! Route attribution for customer transactions.
//!
//! Bus taps are attributed through the day's bus realization record, halte
//! taps through the shelter's corridor. Both paths end in the route
//! reference table. Rows that cannot be attributed keep their place in the
//! stream with [`UNKNOWN`] route fields so counts and revenue stay complete.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::records::{
    BusRealization, BusTransaction, HalteTransaction, RouteReference, ShelterCorridor,
    TransactionFields,
};
use crate::table::{duplicated_keys, left_join};

/// Route code and name given to rows whose route could not be resolved.
pub const UNKNOWN: &str = "UNKNOWN";

/// Customer transaction projected onto the columns the card-type and fare
/// reports group by.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerTransaction {
    pub tanggal: Option<NaiveDate>,
    pub card_type_var: Option<String>,
    pub fare_int: Option<i64>,
    pub gate_in_boo: Option<bool>,
    pub uuid: Option<String>,
}

/// Customer transaction attributed to a route.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedTransaction {
    pub tanggal: Option<NaiveDate>,
    pub route_code: String,
    pub route_name: String,
    pub gate_in_boo: Option<bool>,
    pub fare_int: Option<i64>,
    pub uuid: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkageStats {
    pub bus_customers: usize,
    pub halte_customers: usize,
    /// Bus rows with no realization for their (date, body) pair.
    pub unmatched_realization: usize,
    /// Halte rows whose shelter has no corridor mapping.
    pub unmatched_shelter: usize,
    pub unknown_route_code: usize,
    pub unknown_route_name: usize,
    /// (date, body) pairs listed more than once in the realization data.
    pub duplicate_realization_keys: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LinkedTransactions {
    /// Bus then halte customers, before any route join.
    pub customers: Vec<CustomerTransaction>,
    /// Bus then halte customers with route fields filled in.
    pub routed: Vec<RoutedTransaction>,
    pub stats: LinkageStats,
}

/// Reference tables consulted during linkage.
#[derive(Debug, Clone, Copy)]
pub struct References<'a> {
    pub routes: &'a [RouteReference],
    pub shelter_corridor: &'a [ShelterCorridor],
    pub realisasi_bus: &'a [BusRealization],
}

/// Joins must not fail on stray whitespace or on codes typed as numbers on
/// one side and text on the other, so keys are compared as trimmed text.
/// An empty key yields `None`, and `None` never matches, not even another `None`.
fn text_key(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn customer_projection(fields: &TransactionFields) -> CustomerTransaction {
    CustomerTransaction {
        tanggal: fields.tanggal(),
        card_type_var: fields.card_type_var.clone(),
        fare_int: fields.fare_int,
        gate_in_boo: fields.gate_in_boo,
        uuid: fields.uuid.clone(),
    }
}

fn attribute_route(
    fields: &TransactionFields,
    route: Option<&RouteReference>,
    stats: &mut LinkageStats,
) -> RoutedTransaction {
    let route_code = route.and_then(|r| r.route_code.clone()).unwrap_or_else(|| {
        stats.unknown_route_code += 1;
        UNKNOWN.to_string()
    });
    let route_name = route.and_then(|r| r.route_name.clone()).unwrap_or_else(|| {
        stats.unknown_route_name += 1;
        UNKNOWN.to_string()
    });
    RoutedTransaction {
        tanggal: fields.tanggal(),
        route_code,
        route_name,
        gate_in_boo: fields.gate_in_boo,
        fare_int: fields.fare_int,
        uuid: fields.uuid.clone(),
    }
}

fn link_bus(
    bus: &[BusTransaction],
    refs: References<'_>,
    stats: &mut LinkageStats,
) -> Vec<RoutedTransaction> {
    let customers: Vec<&BusTransaction> = bus.iter().filter(|b| b.fields.is_pelanggan).collect();
    stats.bus_customers = customers.len();

    stats.duplicate_realization_keys = duplicated_keys(refs.realisasi_bus, |r| {
        Some((r.tanggal_realisasi?, text_key(r.bus_body_no.as_ref())?))
    });
    if stats.duplicate_realization_keys > 0 {
        warn!(
            duplicate_keys = stats.duplicate_realization_keys,
            "Realization data lists some (date, bus body) pairs more than once; matching transactions are counted once per listing"
        );
    }

    let with_realization = left_join(
        customers,
        refs.realisasi_bus,
        |b| Some((b.fields.tanggal()?, text_key(b.no_body_var_std.as_ref())?)),
        |r| Some((r.tanggal_realisasi?, text_key(r.bus_body_no.as_ref())?)),
    );
    stats.unmatched_realization = with_realization.iter().filter(|(_, r)| r.is_none()).count();

    let with_route = left_join(
        with_realization,
        refs.routes,
        |(_, realization)| realization.and_then(|r| text_key(r.rute_realisasi.as_ref())),
        |route| text_key(route.route_code.as_ref()),
    );

    with_route
        .into_iter()
        .map(|((bus, _), route)| attribute_route(&bus.fields, route, stats))
        .collect()
}

fn link_halte(
    halte: &[HalteTransaction],
    refs: References<'_>,
    stats: &mut LinkageStats,
) -> Vec<RoutedTransaction> {
    let customers: Vec<&HalteTransaction> =
        halte.iter().filter(|h| h.fields.is_pelanggan).collect();
    stats.halte_customers = customers.len();

    let with_corridor = left_join(
        customers,
        refs.shelter_corridor,
        |h| text_key(h.shelter_name_var.as_ref()),
        |s| text_key(s.shelter_name_var.as_ref()),
    );
    stats.unmatched_shelter = with_corridor.iter().filter(|(_, s)| s.is_none()).count();

    let with_route = left_join(
        with_corridor,
        refs.routes,
        |(_, shelter)| shelter.and_then(|s| text_key(s.corridor_code.as_ref())),
        |route| text_key(route.route_code.as_ref()),
    );

    with_route
        .into_iter()
        .map(|((halte, _), route)| attribute_route(&halte.fields, route, stats))
        .collect()
}

/// Filters both transaction tables to customers and attributes every
/// customer row to a route.
#[tracing::instrument(skip_all, fields(bus = bus.len(), halte = halte.len()))]
pub fn link_transactions(
    bus: &[BusTransaction],
    halte: &[HalteTransaction],
    refs: References<'_>,
) -> LinkedTransactions {
    let mut stats = LinkageStats::default();

    let customers: Vec<CustomerTransaction> = bus
        .iter()
        .map(|b| &b.fields)
        .chain(halte.iter().map(|h| &h.fields))
        .filter(|f| f.is_pelanggan)
        .map(customer_projection)
        .collect();

    let mut routed = link_bus(bus, refs, &mut stats);
    routed.extend(link_halte(halte, refs, &mut stats));

    info!(
        customers = customers.len(),
        routed = routed.len(),
        unmatched_realization = stats.unmatched_realization,
        unmatched_shelter = stats.unmatched_shelter,
        unknown_route_code = stats.unknown_route_code,
        "Linked customer transactions to routes"
    );

    LinkedTransactions {
        customers,
        routed,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::standardize_bus_body;
    use chrono::NaiveDateTime;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn fields(uuid: &str, d: u32, fare: i64, customer: bool) -> TransactionFields {
        TransactionFields {
            uuid: Some(uuid.to_string()),
            waktu_transaksi: NaiveDateTime::parse_from_str(
                &format!("2025-01-{d:02} 08:15:00"),
                "%Y-%m-%d %H:%M:%S",
            )
            .ok(),
            card_type_var: Some("flazz".to_string()),
            fare_int: Some(fare),
            gate_in_boo: Some(true),
            is_pelanggan: customer,
            ..Default::default()
        }
    }

    fn bus(uuid: &str, d: u32, body: &str, customer: bool) -> BusTransaction {
        BusTransaction {
            fields: fields(uuid, d, 3500, customer),
            no_body_var: Some(body.to_string()),
            no_body_var_std: standardize_bus_body(Some(body)),
            ..Default::default()
        }
    }

    fn halte(uuid: &str, shelter: &str) -> HalteTransaction {
        HalteTransaction {
            fields: fields(uuid, 1, 2000, true),
            shelter_name_var: Some(shelter.to_string()),
            ..Default::default()
        }
    }

    fn route(code: &str, name: &str) -> RouteReference {
        RouteReference {
            route_code: Some(code.to_string()),
            route_name: Some(name.to_string()),
        }
    }

    fn realization(d: u32, body: &str, code: &str) -> BusRealization {
        BusRealization {
            tanggal_realisasi: Some(day(d)),
            bus_body_no: Some(body.to_string()),
            rute_realisasi: Some(code.to_string()),
        }
    }

    #[test]
    fn test_bus_path_resolves_route() {
        let routes = vec![route("A1", "Corridor A1")];
        let realisasi = vec![realization(1, "A-001", "A1")];
        let refs = References {
            routes: &routes,
            shelter_corridor: &[],
            realisasi_bus: &realisasi,
        };

        let linked = link_transactions(&[bus("u1", 1, "A 1", true)], &[], refs);

        assert_eq!(linked.routed.len(), 1);
        assert_eq!(linked.routed[0].route_code, "A1");
        assert_eq!(linked.routed[0].route_name, "Corridor A1");
        assert_eq!(linked.stats.unmatched_realization, 0);
    }

    #[test]
    fn test_realization_must_match_the_same_day() {
        let routes = vec![route("A1", "Corridor A1")];
        let realisasi = vec![realization(2, "A-001", "A1")];
        let refs = References {
            routes: &routes,
            shelter_corridor: &[],
            realisasi_bus: &realisasi,
        };

        let linked = link_transactions(&[bus("u1", 1, "A 1", true)], &[], refs);

        assert_eq!(linked.routed[0].route_code, UNKNOWN);
        assert_eq!(linked.routed[0].route_name, UNKNOWN);
        assert_eq!(linked.stats.unmatched_realization, 1);
    }

    #[test]
    fn test_missing_bus_body_never_matches_missing_realization_body() {
        let routes = vec![route("A1", "Corridor A1")];
        let mut realisasi = vec![realization(1, "", "A1")];
        realisasi[0].bus_body_no = None;
        let refs = References {
            routes: &routes,
            shelter_corridor: &[],
            realisasi_bus: &realisasi,
        };

        let mut no_body = bus("u1", 1, "", true);
        no_body.no_body_var = None;
        no_body.no_body_var_std = None;
        let linked = link_transactions(&[no_body, bus("u2", 1, "   ", true)], &[], refs);

        assert!(linked.routed.iter().all(|r| r.route_code == UNKNOWN));
        assert_eq!(linked.stats.unmatched_realization, 2);
    }

    #[test]
    fn test_non_customers_are_excluded() {
        let refs = References {
            routes: &[],
            shelter_corridor: &[],
            realisasi_bus: &[],
        };
        let linked = link_transactions(
            &[bus("u1", 1, "A 1", false), bus("u2", 1, "A 1", true)],
            &[],
            refs,
        );

        assert_eq!(linked.customers.len(), 1);
        assert_eq!(linked.routed.len(), 1);
        assert_eq!(linked.customers[0].uuid.as_deref(), Some("u2"));
    }

    #[test]
    fn test_halte_path_through_corridor() {
        let routes = vec![route("9", "Corridor 9")];
        let shelters = vec![ShelterCorridor {
            shelter_name_var: Some("Semanggi".to_string()),
            corridor_code: Some(" 9 ".to_string()),
        }];
        let refs = References {
            routes: &routes,
            shelter_corridor: &shelters,
            realisasi_bus: &[],
        };

        let linked = link_transactions(&[], &[halte("h1", "Semanggi"), halte("h2", "Nowhere")], refs);

        assert_eq!(linked.routed[0].route_code, "9");
        assert_eq!(linked.routed[0].route_name, "Corridor 9");
        assert_eq!(linked.routed[1].route_code, UNKNOWN);
        assert_eq!(linked.stats.unmatched_shelter, 1);
        assert_eq!(linked.stats.halte_customers, 2);
    }

    #[test]
    fn test_missing_route_name_falls_back_independently() {
        let routes = vec![RouteReference {
            route_code: Some("B2".to_string()),
            route_name: None,
        }];
        let realisasi = vec![realization(1, "B-002", "B2")];
        let refs = References {
            routes: &routes,
            shelter_corridor: &[],
            realisasi_bus: &realisasi,
        };

        let linked = link_transactions(&[bus("u1", 1, "B2", true)], &[], refs);

        assert_eq!(linked.routed[0].route_code, "B2");
        assert_eq!(linked.routed[0].route_name, UNKNOWN);
        assert_eq!(linked.stats.unknown_route_code, 0);
        assert_eq!(linked.stats.unknown_route_name, 1);
    }

    #[test]
    fn test_duplicate_realization_fans_out() {
        let routes = vec![route("A1", "Corridor A1"), route("A2", "Corridor A2")];
        let realisasi = vec![realization(1, "A-001", "A1"), realization(1, "A-001", "A2")];
        let refs = References {
            routes: &routes,
            shelter_corridor: &[],
            realisasi_bus: &realisasi,
        };

        let linked = link_transactions(&[bus("u1", 1, "A 1", true)], &[], refs);

        assert_eq!(linked.customers.len(), 1);
        assert_eq!(linked.routed.len(), 2);
        assert_eq!(linked.stats.duplicate_realization_keys, 1);
    }

    #[test]
    fn test_customer_projection_covers_both_sources() {
        let refs = References {
            routes: &[],
            shelter_corridor: &[],
            realisasi_bus: &[],
        };
        let linked = link_transactions(&[bus("b1", 1, "A 1", true)], &[halte("h1", "X")], refs);

        let ids: Vec<_> = linked.customers.iter().map(|c| c.uuid.as_deref()).collect();
        assert_eq!(ids, vec![Some("b1"), Some("h1")]);
        assert_eq!(linked.customers[1].fare_int, Some(2000));
        assert_eq!(linked.customers[0].tanggal, Some(day(1)));
    }
}
