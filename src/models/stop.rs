use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::coordinate::Coordinate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Cargo {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub width_cm: f64,
    pub length_cm: f64,
}

impl Cargo {
    pub fn is_valid(&self) -> bool {
        [self.weight_kg, self.height_cm, self.width_cm, self.length_cm]
            .iter()
            .all(|value| value.is_finite() && *value > 0.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopStatus {
    Pending,
    Accepted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryStop {
    pub id: Uuid,
    pub pickup_coordinate: Coordinate,
    pub pickup_address: String,
    pub country_of_pickup: Option<String>,
    pub details: String,
    pub cargo: Cargo,
    pub route_id: Option<Uuid>,
    pub status: StopStatus,
    pub created_at: DateTime<Utc>,
}

impl DeliveryStop {
    /// A fresh pending stop; the country is derived from `pickup_address`.
    pub fn new(
        pickup_coordinate: Coordinate,
        pickup_address: String,
        details: String,
        cargo: Cargo,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            pickup_coordinate,
            country_of_pickup: country_from_address(&pickup_address),
            pickup_address,
            details,
            cargo,
            route_id: None,
            status: StopStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == StopStatus::Pending
    }

    pub fn has_valid_data(&self) -> bool {
        self.pickup_coordinate.is_valid() && self.cargo.is_valid()
    }
}

/// Country is whatever follows the last comma of a free-form address.
///
/// This mirrors the legacy rule and is locale dependent: "Vesterbrogade 1,
/// 1620 København, Danmark" yields "Danmark", not "Denmark".
pub fn country_from_address(address: &str) -> Option<String> {
    let country = address.rsplit(',').next().unwrap_or_default().trim();
    if country.is_empty() {
        None
    } else {
        Some(country.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{country_from_address, Cargo};

    #[test]
    fn country_is_last_comma_component() {
        assert_eq!(
            country_from_address("Banegårdspladsen 1, 8000 Aarhus C, Denmark").as_deref(),
            Some("Denmark")
        );
    }

    #[test]
    fn address_without_comma_is_taken_whole() {
        assert_eq!(country_from_address("  Germany ").as_deref(), Some("Germany"));
    }

    #[test]
    fn trailing_comma_yields_no_country() {
        assert_eq!(country_from_address("Odense, "), None);
        assert_eq!(country_from_address(""), None);
    }

    #[test]
    fn cargo_rejects_non_positive_dimensions() {
        let cargo = Cargo {
            weight_kg: 10.0,
            height_cm: 0.0,
            width_cm: 20.0,
            length_cm: 30.0,
        };
        assert!(!cargo.is_valid());
    }
}
