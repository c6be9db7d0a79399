use std::path::Path;

use futures::future::{self, BoxFuture};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::geo::distance_km;
use crate::models::coordinate::Coordinate;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location service unavailable: {0}")]
    Unavailable(String),

    #[error("failed to load gazetteer: {0}")]
    Load(String),
}

/// Geocoding seam. `Ok(None)` means the lookup ran but found nothing.
pub trait LocationService: Send + Sync {
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<Option<String>, LocationError>>;

    fn geocode_address<'a>(
        &'a self,
        address: &'a str,
    ) -> BoxFuture<'a, Result<Option<Coordinate>, LocationError>>;
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Fixed list of named places held in memory.
///
/// Addresses resolve by case-insensitive name match; coordinates resolve to
/// the nearest place within `radius_km`.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    places: Vec<Place>,
    radius_km: f64,
}

impl Gazetteer {
    pub fn new(places: Vec<Place>, radius_km: f64) -> Self {
        Self { places, radius_km }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0.0)
    }

    pub fn from_json(raw: &str, radius_km: f64) -> Result<Self, LocationError> {
        let places: Vec<Place> =
            serde_json::from_str(raw).map_err(|err| LocationError::Load(err.to_string()))?;

        if let Some(bad) = places.iter().find(|place| !place.coordinate().is_valid()) {
            return Err(LocationError::Load(format!(
                "place {:?} has an invalid coordinate",
                bad.name
            )));
        }

        Ok(Self::new(places, radius_km))
    }

    pub fn from_file(path: &Path, radius_km: f64) -> Result<Self, LocationError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| LocationError::Load(format!("{}: {err}", path.display())))?;
        let gazetteer = Self::from_json(&raw, radius_km)?;
        info!(
            path = %path.display(),
            places = gazetteer.places.len(),
            "gazetteer loaded"
        );
        Ok(gazetteer)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    fn lookup_name(&self, address: &str) -> Option<Coordinate> {
        let wanted = address.trim();
        self.places
            .iter()
            .find(|place| place.name.eq_ignore_ascii_case(wanted))
            .map(Place::coordinate)
    }

    fn nearest_name(&self, coordinate: &Coordinate) -> Option<String> {
        self.places
            .iter()
            .map(|place| (place, distance_km(coordinate, &place.coordinate())))
            .filter(|(_, distance)| *distance <= self.radius_km)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(place, _)| place.name.clone())
    }
}

impl LocationService for Gazetteer {
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<Option<String>, LocationError>> {
        let found = self.nearest_name(&coordinate);
        debug!(?coordinate, found = found.is_some(), "reverse geocode");
        Box::pin(future::ready(Ok(found)))
    }

    fn geocode_address<'a>(
        &'a self,
        address: &'a str,
    ) -> BoxFuture<'a, Result<Option<Coordinate>, LocationError>> {
        let found = self.lookup_name(address);
        debug!(address, found = found.is_some(), "geocode address");
        Box::pin(future::ready(Ok(found)))
    }
}
