use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub routes_built_total: IntCounterVec,
    pub route_build_latency_seconds: HistogramVec,
    pub stops_sequenced: Histogram,
    pub deliveries_created_total: IntCounter,
    pub store_subscribers: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let routes_built_total = IntCounterVec::new(
            Opts::new("routes_built_total", "Routes built by outcome"),
            &["outcome"],
        )
        .expect("valid routes_built_total metric");

        let route_build_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "route_build_latency_seconds",
                "Time spent filtering, sequencing and pricing a route",
            )
            .buckets(vec![0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["outcome"],
        )
        .expect("valid route_build_latency_seconds metric");

        let stops_sequenced = Histogram::with_opts(
            HistogramOpts::new("stops_sequenced", "Number of stops on each built route")
                .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0]),
        )
        .expect("valid stops_sequenced metric");

        let deliveries_created_total =
            IntCounter::new("deliveries_created_total", "Delivery stops created")
                .expect("valid deliveries_created_total metric");

        let store_subscribers = IntGauge::new(
            "store_subscribers",
            "Currently connected change-feed subscribers",
        )
        .expect("valid store_subscribers metric");

        registry
            .register(Box::new(routes_built_total.clone()))
            .expect("register routes_built_total");
        registry
            .register(Box::new(route_build_latency_seconds.clone()))
            .expect("register route_build_latency_seconds");
        registry
            .register(Box::new(stops_sequenced.clone()))
            .expect("register stops_sequenced");
        registry
            .register(Box::new(deliveries_created_total.clone()))
            .expect("register deliveries_created_total");
        registry
            .register(Box::new(store_subscribers.clone()))
            .expect("register store_subscribers");

        Self {
            registry,
            routes_built_total,
            route_build_latency_seconds,
            stops_sequenced,
            deliveries_created_total,
            store_subscribers,
        }
    }

    pub fn record_route(&self, outcome: &str, stops: usize, elapsed_seconds: f64) {
        self.routes_built_total.with_label_values(&[outcome]).inc();
        self.route_build_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed_seconds);
        self.stops_sequenced.observe(stops as f64);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
