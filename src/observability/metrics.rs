use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub dispatch_attempts_total: IntCounterVec,
    pub dispatch_latency_seconds: HistogramVec,
    pub decisions_total: IntCounterVec,
    pub notification_failures_total: IntCounter,
    pub offers_expired_total: IntCounter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let dispatch_attempts_total = IntCounterVec::new(
            Opts::new(
                "dispatch_attempts_total",
                "Dispatch calls by outcome (pending, failed, existing)",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_attempts_total metric");

        let dispatch_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "dispatch_latency_seconds",
                "Latency of dispatch calls in seconds",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_latency_seconds metric");

        let decisions_total = IntCounterVec::new(
            Opts::new("decisions_total", "Rider decisions applied"),
            &["decision"],
        )
        .expect("valid decisions_total metric");

        let notification_failures_total = IntCounter::new(
            "notification_failures_total",
            "Notifications that failed or timed out",
        )
        .expect("valid notification_failures_total metric");

        let offers_expired_total = IntCounter::new(
            "offers_expired_total",
            "Pending offers dismissed by the timeout sweep",
        )
        .expect("valid offers_expired_total metric");

        registry
            .register(Box::new(dispatch_attempts_total.clone()))
            .expect("register dispatch_attempts_total");
        registry
            .register(Box::new(dispatch_latency_seconds.clone()))
            .expect("register dispatch_latency_seconds");
        registry
            .register(Box::new(decisions_total.clone()))
            .expect("register decisions_total");
        registry
            .register(Box::new(notification_failures_total.clone()))
            .expect("register notification_failures_total");
        registry
            .register(Box::new(offers_expired_total.clone()))
            .expect("register offers_expired_total");

        Self {
            registry,
            dispatch_attempts_total,
            dispatch_latency_seconds,
            decisions_total,
            notification_failures_total,
            offers_expired_total,
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
