//! Prometheus metrics for the gateway.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metrics configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Metric name prefix
    pub namespace: String,
    /// Histogram buckets for request duration, in seconds
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: "gateway".to_string(),
            duration_buckets: vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0],
        }
    }
}

/// Mode label for requests refused before their body was read
pub const UNKNOWN_MODE: &str = "unknown";

/// How the client asked to receive the completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Server-sent events
    Streaming,
    /// One aggregated JSON body
    Aggregate,
}

impl ResponseMode {
    /// Label value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Aggregate => "aggregate",
        }
    }

    /// Mode selected by the request's `stream` flag
    #[must_use]
    pub fn from_stream_flag(stream: bool) -> Self {
        if stream {
            Self::Streaming
        } else {
            Self::Aggregate
        }
    }
}

/// Gateway metrics backed by a private registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    events: IntCounterVec,
    duration: HistogramVec,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create and register the gateway metrics
    ///
    /// # Errors
    /// Returns error if a metric cannot be created or registered
    pub fn new(config: &MetricsConfig) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("chat_requests_total", "Chat requests by response mode and outcome")
                .namespace(config.namespace.clone()),
            &["mode", "outcome"],
        )?;
        let events = IntCounterVec::new(
            Opts::new("chat_events_total", "Normalized events emitted by kind")
                .namespace(config.namespace.clone()),
            &["kind"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "chat_duration_seconds",
                "Time from request admission to terminal event",
            )
            .namespace(config.namespace.clone())
            .buckets(config.duration_buckets.clone()),
            &["mode"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(events.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            events,
            duration,
        })
    }

    /// Count a finished or rejected request
    pub fn record_request(&self, mode: ResponseMode, outcome: &str) {
        self.requests
            .with_label_values(&[mode.as_str(), outcome])
            .inc();
    }

    /// Count a request refused before its response mode was known
    pub fn record_early_rejection(&self) {
        self.requests
            .with_label_values(&[UNKNOWN_MODE, "rejected"])
            .inc();
    }

    /// Count one normalized event
    pub fn record_event(&self, kind: &str) {
        self.events.with_label_values(&[kind]).inc();
    }

    /// Observe the duration of a completed exchange
    pub fn observe_duration(&self, mode: ResponseMode, elapsed: Duration) {
        self.duration
            .with_label_values(&[mode.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    /// Current value of a request counter
    #[must_use]
    pub fn request_count(&self, mode: ResponseMode, outcome: &str) -> u64 {
        self.requests
            .with_label_values(&[mode.as_str(), outcome])
            .get()
    }

    /// Current value of an event counter
    #[must_use]
    pub fn event_count(&self, kind: &str) -> u64 {
        self.events.with_label_values(&[kind]).get()
    }

    /// Encode all metrics in the Prometheus text format
    #[must_use]
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
