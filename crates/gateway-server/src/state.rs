//! Shared application state.

use gateway_config::GatewayConfig;
use gateway_core::{GatewayError, GatewayResult};
use gateway_providers::{ChatUpstream, StreamlakeClient, StreamlakeConfig};
use gateway_telemetry::{Metrics, MetricsConfig};
use std::sync::Arc;

use crate::gate::RequestGate;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<GatewayConfig>,
    /// Upstream provider
    pub upstream: Arc<dyn ChatUpstream>,
    /// Admission gate
    pub gate: Arc<RequestGate>,
    /// Prometheus metrics
    pub metrics: Metrics,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("upstream", &self.upstream.id())
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create a state builder
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }
}

/// Builder for [`AppState`]
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<GatewayConfig>,
    upstream: Option<Arc<dyn ChatUpstream>>,
    metrics: Option<Metrics>,
}

impl AppStateBuilder {
    /// Set the configuration
    #[must_use]
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the upstream; defaults to a Streamlake client built from the
    /// upstream settings
    #[must_use]
    pub fn upstream(mut self, upstream: Arc<dyn ChatUpstream>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Set the metrics
    #[must_use]
    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the state
    ///
    /// # Errors
    /// Returns error if the default upstream client or metrics cannot be
    /// created
    pub fn build(self) -> GatewayResult<AppState> {
        let config = self.config.unwrap_or_default();

        let upstream = match self.upstream {
            Some(upstream) => upstream,
            None => {
                let client_config = StreamlakeConfig::new(&config.upstream.base_url)
                    .with_secret(config.upstream.api_key.clone())
                    .with_read_timeout(config.upstream.read_timeout);
                Arc::new(StreamlakeClient::new(client_config)?)
            }
        };

        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Metrics::new(&MetricsConfig::default())
                .map_err(|e| GatewayError::internal(format!("Failed to create metrics: {e}")))?,
        };

        let gate = RequestGate::from_settings(&config.security);

        Ok(AppState {
            config: Arc::new(config),
            upstream,
            gate: Arc::new(gate),
            metrics,
        })
    }
}
