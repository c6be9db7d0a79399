use crate::models::stop::DeliveryStop;

/// Flat rate per stop. Negative or non-finite prices count as zero.
pub fn estimate_earnings(ordered_stops: &[DeliveryStop], price_per_stop: f64) -> f64 {
    earnings_for_stop_count(ordered_stops.len(), price_per_stop)
}

pub fn earnings_for_stop_count(stop_count: usize, price_per_stop: f64) -> f64 {
    let price = if price_per_stop.is_finite() {
        price_per_stop.max(0.0)
    } else {
        0.0
    };
    stop_count as f64 * price
}

#[cfg(test)]
mod tests {
    use super::estimate_earnings;
    use crate::models::coordinate::Coordinate;
    use crate::models::stop::{Cargo, DeliveryStop};

    fn stops(count: usize) -> Vec<DeliveryStop> {
        (0..count)
            .map(|i| {
                DeliveryStop::new(
                    Coordinate::new(55.0, 10.0 + i as f64),
                    "Somewhere, Denmark".to_string(),
                    format!("stop {i}"),
                    Cargo {
                        weight_kg: 1.0,
                        height_cm: 1.0,
                        width_cm: 1.0,
                        length_cm: 1.0,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn no_stops_earn_nothing() {
        assert_eq!(estimate_earnings(&[], 250.0), 0.0);
    }

    #[test]
    fn earnings_scale_linearly_with_stops() {
        assert_eq!(estimate_earnings(&stops(3), 250.0), 750.0);
        assert_eq!(estimate_earnings(&stops(1), 99.5), 99.5);
    }

    #[test]
    fn invalid_price_is_treated_as_zero() {
        assert_eq!(estimate_earnings(&stops(2), -10.0), 0.0);
        assert_eq!(estimate_earnings(&stops(2), f64::NAN), 0.0);
        assert_eq!(estimate_earnings(&stops(2), f64::INFINITY), 0.0);
    }
}
