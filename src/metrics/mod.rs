//! Prometheus metrics for the trading loop and the status server.

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub trading_cycles_total: IntCounterVec,
    pub orders_placed_total: IntCounterVec,
    pub llm_failures_total: IntCounter,
    pub cycle_duration_seconds: Histogram,
    pub last_cycle_timestamp_seconds: Gauge,
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let trading_cycles_total = IntCounterVec::new(
            Opts::new("trading_cycles_total", "Completed trading cycles by outcome"),
            &["outcome"],
        )?;
        let orders_placed_total = IntCounterVec::new(
            Opts::new("orders_placed_total", "Orders accepted by the exchange by side"),
            &["side"],
        )?;
        let llm_failures_total =
            IntCounter::new("llm_failures_total", "Advisor calls that failed or timed out")?;
        let cycle_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("cycle_duration_seconds", "Wall time of one trading cycle")
                .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;
        let last_cycle_timestamp_seconds = Gauge::new(
            "last_cycle_timestamp_seconds",
            "Unix time the last cycle finished",
        )?;
        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Status server requests by method and status class"),
            &["method", "status"],
        )?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "Status server request latency",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "Status server requests in flight")?;

        registry.register(Box::new(trading_cycles_total.clone()))?;
        registry.register(Box::new(orders_placed_total.clone()))?;
        registry.register(Box::new(llm_failures_total.clone()))?;
        registry.register(Box::new(cycle_duration_seconds.clone()))?;
        registry.register(Box::new(last_cycle_timestamp_seconds.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;

        Ok(Self {
            registry,
            trading_cycles_total,
            orders_placed_total,
            llm_failures_total,
            cycle_duration_seconds,
            last_cycle_timestamp_seconds,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
        })
    }

    /// Text exposition format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
