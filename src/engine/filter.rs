use crate::models::preferences::DriverPreferences;
use crate::models::stop::DeliveryStop;

/// Pending stops with usable data whose country the driver accepts, in input order.
///
/// Stops with an out-of-range coordinate or a non-positive cargo dimension are dropped.
pub fn filter_stops(stops: &[DeliveryStop], prefs: &DriverPreferences) -> Vec<DeliveryStop> {
    stops
        .iter()
        .filter(|stop| stop.is_pending() && stop.has_valid_data())
        .filter(|stop| prefs.accepts_country(stop.country_of_pickup.as_deref()))
        .cloned()
        .collect()
}
