use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::coordinate::Coordinate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub title: String,
    pub ordered_stops: Vec<Uuid>,
    pub polyline: Vec<Coordinate>,
    pub estimated_earnings: f64,
    pub total_distance_km: f64,
    pub created_at: DateTime<Utc>,
}

impl Route {
    /// The "nothing to do" outcome: no stops, the start as the only point.
    pub fn empty(start: Coordinate) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: default_title(0),
            ordered_stops: Vec::new(),
            polyline: vec![start],
            estimated_earnings: 0.0,
            total_distance_km: 0.0,
            created_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_stops.is_empty()
    }
}

pub fn default_title(stop_count: usize) -> String {
    match stop_count {
        1 => "Route of 1 stop".to_string(),
        n => format!("Route of {n} stops"),
    }
}
