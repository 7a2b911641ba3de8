//! Metrics collection for the API service.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Service metrics, registered in a registry owned by this instance
#[derive(Debug)]
pub struct ServiceMetrics {
    registry: Registry,

    // HTTP request metrics
    pub http_requests_total: IntCounterVec,
    pub http_request_duration: Histogram,

    // Queue operation metrics
    pub messages_submitted_total: IntCounter,
    pub messages_delivered_total: IntCounter,
    pub messages_acknowledged_total: IntCounter,
    pub acknowledgements_rejected_total: IntCounterVec,
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "status"],
        )?;
        let http_request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request processing time",
            )
            .buckets(vec![0.0005, 0.001, 0.01, 0.1, 1.0]),
        )?;
        let messages_submitted_total = IntCounter::new(
            "messages_submitted_total",
            "Messages accepted from producers",
        )?;
        let messages_delivered_total = IntCounter::new(
            "messages_delivered_total",
            "Messages leased to consumers, including redeliveries",
        )?;
        let messages_acknowledged_total = IntCounter::new(
            "messages_acknowledged_total",
            "Messages acknowledged and removed",
        )?;
        let acknowledgements_rejected_total = IntCounterVec::new(
            Opts::new(
                "acknowledgements_rejected_total",
                "Acknowledgements rejected by reason",
            ),
            &["reason"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;
        registry.register(Box::new(messages_submitted_total.clone()))?;
        registry.register(Box::new(messages_delivered_total.clone()))?;
        registry.register(Box::new(messages_acknowledged_total.clone()))?;
        registry.register(Box::new(acknowledgements_rejected_total.clone()))?;

        Ok(Arc::new(Self {
            registry,
            http_requests_total,
            http_request_duration,
            messages_submitted_total,
            messages_delivered_total,
            messages_acknowledged_total,
            acknowledgements_rejected_total,
        }))
    }

    pub fn record_http_request(&self, method: &str, status: u16, duration: std::time::Duration) {
        let status = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, status.as_str()])
            .inc();
        self.http_request_duration.observe(duration.as_secs_f64());
    }

    pub fn record_rejected_acknowledgement(&self, reason: &str) {
        self.acknowledgements_rejected_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
