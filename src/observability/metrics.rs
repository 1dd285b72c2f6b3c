use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_created_total: IntCounter,
    pub dispatches_total: IntCounterVec,
    pub dispatch_latency_seconds: HistogramVec,
    pub points_adjustments_total: IntCounterVec,
    pub points_awarded_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_created_total =
            IntCounter::new("orders_created_total", "Total orders created")
                .expect("valid orders_created_total metric");

        let dispatches_total = IntCounterVec::new(
            Opts::new("dispatches_total", "Total dispatch attempts by outcome"),
            &["outcome"],
        )
        .expect("valid dispatches_total metric");

        let dispatch_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "dispatch_latency_seconds",
                "Latency of dispatch attempts in seconds",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_latency_seconds metric");

        let points_adjustments_total = IntCounterVec::new(
            Opts::new(
                "points_adjustments_total",
                "Total ledger adjustments by outcome",
            ),
            &["outcome"],
        )
        .expect("valid points_adjustments_total metric");

        let points_awarded_total = IntCounter::new(
            "points_awarded_total",
            "Total points credited across all drivers",
        )
        .expect("valid points_awarded_total metric");

        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(dispatches_total.clone()))
            .expect("register dispatches_total");
        registry
            .register(Box::new(dispatch_latency_seconds.clone()))
            .expect("register dispatch_latency_seconds");
        registry
            .register(Box::new(points_adjustments_total.clone()))
            .expect("register points_adjustments_total");
        registry
            .register(Box::new(points_awarded_total.clone()))
            .expect("register points_awarded_total");

        Self {
            registry,
            orders_created_total,
            dispatches_total,
            dispatch_latency_seconds,
            points_adjustments_total,
            points_awarded_total,
        }
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
