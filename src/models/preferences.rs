use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub const MIN_HOURS: u8 = 4;
pub const MAX_HOURS: u8 = 12;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverPreferences {
    #[serde(default)]
    pub preferred_countries: BTreeSet<String>,
    pub truck_type: String,
    pub fuel_economy_km_per_l: f64,
    pub cargo_space_m3: f64,
    pub driving_hours_per_day: u8,
    pub sleep_duration_hours: u8,
}

impl DriverPreferences {
    /// Preferences that let every pending stop through.
    pub fn unrestricted(truck_type: impl Into<String>) -> Self {
        Self {
            preferred_countries: BTreeSet::new(),
            truck_type: truck_type.into(),
            fuel_economy_km_per_l: 1.0,
            cargo_space_m3: 1.0,
            driving_hours_per_day: 8,
            sleep_duration_hours: 8,
        }
    }

    pub fn with_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_countries = countries.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.truck_type.trim().is_empty() {
            return Err("truck_type cannot be empty".to_string());
        }
        if !(self.fuel_economy_km_per_l.is_finite() && self.fuel_economy_km_per_l > 0.0) {
            return Err("fuel_economy_km_per_l must be > 0".to_string());
        }
        if !(self.cargo_space_m3.is_finite() && self.cargo_space_m3 > 0.0) {
            return Err("cargo_space_m3 must be > 0".to_string());
        }
        check_hours("driving_hours_per_day", self.driving_hours_per_day)?;
        check_hours("sleep_duration_hours", self.sleep_duration_hours)?;
        Ok(())
    }

    pub fn accepts_country(&self, country: Option<&str>) -> bool {
        if self.preferred_countries.is_empty() {
            return true;
        }
        country.is_some_and(|country| self.preferred_countries.contains(country))
    }
}

fn check_hours(field: &str, hours: u8) -> Result<(), String> {
    if (MIN_HOURS..=MAX_HOURS).contains(&hours) {
        Ok(())
    } else {
        Err(format!("{field} must be between {MIN_HOURS} and {MAX_HOURS}"))
    }
}

/// Parses "Germany, France" into a set; blank entries are dropped.
pub fn parse_country_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|country| !country.is_empty())
        .map(str::to_string)
        .collect()
}
