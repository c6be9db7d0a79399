use std::time::Instant;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::engine::earnings::estimate_earnings;
use crate::engine::filter::filter_stops;
use crate::engine::sequencer::sequence;
use crate::geo::path_length_km;
use crate::models::coordinate::Coordinate;
use crate::models::preferences::DriverPreferences;
use crate::models::route::{default_title, Route};
use crate::models::stop::DeliveryStop;

/// Filters, sequences and prices `candidate_stops` into a route from `start`.
///
/// Never fails: an invalid start or an empty filtered set gives a zero-stop
/// route whose polyline is just `start`.
pub fn build_route(
    start: Coordinate,
    candidate_stops: &[DeliveryStop],
    prefs: &DriverPreferences,
    price_per_stop: f64,
) -> Route {
    let began = Instant::now();

    if !start.is_valid() {
        debug!(?start, "route start is not a valid coordinate");
        return Route::empty(start);
    }

    let eligible = filter_stops(candidate_stops, prefs);
    if eligible.is_empty() {
        debug!(
            candidates = candidate_stops.len(),
            "no eligible stops after filtering"
        );
        return Route::empty(start);
    }

    let ordered = sequence(start, &eligible);
    let estimated_earnings = estimate_earnings(&ordered, price_per_stop);

    let mut polyline = Vec::with_capacity(ordered.len() + 1);
    polyline.push(start);
    polyline.extend(ordered.iter().map(|stop| stop.pickup_coordinate));
    let total_distance_km = path_length_km(&polyline);

    debug!(
        candidates = candidate_stops.len(),
        stops = ordered.len(),
        total_distance_km,
        elapsed_us = began.elapsed().as_micros() as u64,
        "route assembled"
    );

    Route {
        id: Uuid::new_v4(),
        title: default_title(ordered.len()),
        ordered_stops: ordered.iter().map(|stop| stop.id).collect(),
        polyline,
        estimated_earnings,
        total_distance_km,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::build_route;
    use crate::models::coordinate::Coordinate;
    use crate::models::preferences::DriverPreferences;
    use crate::models::stop::{Cargo, DeliveryStop, StopStatus};

    const COPENHAGEN: Coordinate = Coordinate::new(55.676, 12.568);

    fn stop(address: &str, latitude: f64, longitude: f64) -> DeliveryStop {
        DeliveryStop::new(
            Coordinate::new(latitude, longitude),
            address.to_string(),
            "crates".to_string(),
            Cargo {
                weight_kg: 40.0,
                height_cm: 50.0,
                width_cm: 50.0,
                length_cm: 50.0,
            },
        )
    }

    #[test]
    fn builds_route_over_danish_cities() {
        let aarhus = stop("Aarhus, Denmark", 56.16, 10.20);
        let odense = stop("Odense, Denmark", 55.40, 10.38);
        let esbjerg = stop("Esbjerg, Denmark", 55.47, 8.45);
        let stops = vec![aarhus.clone(), odense.clone(), esbjerg.clone()];

        let route = build_route(
            COPENHAGEN,
            &stops,
            &DriverPreferences::unrestricted("reefer"),
            250.0,
        );

        assert_eq!(route.ordered_stops, vec![odense.id, aarhus.id, esbjerg.id]);
        assert_eq!(
            route.polyline,
            vec![
                COPENHAGEN,
                odense.pickup_coordinate,
                aarhus.pickup_coordinate,
                esbjerg.pickup_coordinate
            ]
        );
        assert_eq!(route.polyline.len(), route.ordered_stops.len() + 1);
        assert_eq!(route.estimated_earnings, 750.0);
        assert!((route.total_distance_km - 359.86).abs() < 0.5);
        assert_eq!(route.title, "Route of 3 stops");
    }

    #[test]
    fn nothing_left_after_filtering_gives_empty_route() {
        let stops = vec![stop("Kiel, Germany", 54.32, 10.13)];
        let prefs = DriverPreferences::unrestricted("reefer").with_countries(["Denmark"]);

        let route = build_route(COPENHAGEN, &stops, &prefs, 250.0);

        assert!(route.ordered_stops.is_empty());
        assert_eq!(route.polyline, vec![COPENHAGEN]);
        assert_eq!(route.estimated_earnings, 0.0);
        assert_eq!(route.total_distance_km, 0.0);
    }

    #[test]
    fn accepted_stops_are_not_rerouted() {
        let mut taken = stop("Odense, Denmark", 55.40, 10.38);
        taken.status = StopStatus::Accepted;
        let open = stop("Aarhus, Denmark", 56.16, 10.20);

        let route = build_route(
            COPENHAGEN,
            &[taken, open.clone()],
            &DriverPreferences::unrestricted("reefer"),
            100.0,
        );

        assert_eq!(route.ordered_stops, vec![open.id]);
        assert_eq!(route.title, "Route of 1 stop");
    }

    #[test]
    fn invalid_start_gives_empty_route() {
        let start = Coordinate::new(91.0, 0.0);
        let route = build_route(
            start,
            &[stop("Odense, Denmark", 55.40, 10.38)],
            &DriverPreferences::unrestricted("reefer"),
            100.0,
        );

        assert!(route.is_empty());
        assert_eq!(route.polyline, vec![start]);
    }
}
