use std::sync::Arc;

use crate::config::Config;
use crate::location::LocationService;
use crate::observability::metrics::Metrics;
use crate::store::DataStore;

pub struct AppState {
    pub store: Arc<DataStore>,
    pub location: Arc<dyn LocationService>,
    pub price_per_stop: f64,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config, location: Arc<dyn LocationService>) -> Self {
        Self {
            store: Arc::new(DataStore::new(config.event_buffer_size)),
            location,
            price_per_stop: config.price_per_stop,
            metrics: Metrics::new(),
        }
    }
}
