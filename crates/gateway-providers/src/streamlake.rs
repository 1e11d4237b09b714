//! Streamlake provider transport.
//!
//! Opens one `POST {base_url}/chat/completions` per completion with
//! `stream: true` and yields the response body line by line as it arrives.

use async_stream::try_stream;
use futures_util::StreamExt;
use gateway_core::{GatewayError, UpstreamRequest, PROVIDER_ID};
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::lines::LineSplitter;
use crate::upstream::{ChatUpstream, LineStream};

/// Default upstream base URL
pub const DEFAULT_BASE_URL: &str = "https://api.streamlake.ai/v1";

/// Default read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest upstream error body echoed back in an error message
const MAX_ERROR_BODY: usize = 512;

/// Streamlake provider configuration
#[derive(Debug, Clone)]
pub struct StreamlakeConfig {
    /// Provider instance ID
    pub id: String,
    /// API base URL
    pub base_url: String,
    /// Bearer credential
    pub api_key: Option<SecretString>,
    /// Longest wait for the response head or any body chunk
    pub read_timeout: Duration,
}

impl StreamlakeConfig {
    /// Create a configuration for the given base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            id: PROVIDER_ID.to_string(),
            base_url: base_url.into(),
            api_key: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Set the API key; an empty key leaves the integration unconfigured
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then(|| SecretString::new(api_key));
        self
    }

    /// Set an already wrapped API key
    #[must_use]
    pub fn with_secret(mut self, api_key: Option<SecretString>) -> Self {
        self.api_key = api_key.filter(|key| !key.expose_secret().is_empty());
        self
    }

    /// Set the read timeout
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Completions endpoint URL
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl Default for StreamlakeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Streamlake streaming client
#[derive(Debug, Clone)]
pub struct StreamlakeClient {
    config: StreamlakeConfig,
    client: Client,
}

impl StreamlakeClient {
    /// Create a new client
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created
    pub fn new(config: StreamlakeConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(config.read_timeout)
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Provider configuration
    #[must_use]
    pub fn config(&self) -> &StreamlakeConfig {
        &self.config
    }
}

impl ChatUpstream for StreamlakeClient {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn stream_lines(&self, request: UpstreamRequest) -> Result<LineStream, GatewayError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            GatewayError::configuration(format!(
                "{} API key is not configured",
                self.config.id
            ))
        })?;

        let url = self.config.completions_url();
        let request_builder = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .header(header::ACCEPT, "text/event-stream")
            .json(&request);

        let provider = self.config.id.clone();
        let read_timeout = self.config.read_timeout;

        let stream = try_stream! {
            debug!(
                provider = %provider,
                url = %url,
                messages = request.messages.len(),
                "Opening upstream stream"
            );

            let response = tokio::time::timeout(read_timeout, request_builder.send())
                .await
                .map_err(|_| GatewayError::timeout(&provider, read_timeout))?
                .map_err(|e| {
                    warn!(provider = %provider, error = %e, "Upstream request failed");
                    GatewayError::transport(&provider, format!("Request failed: {e}"), None)
                })?;

            let status = response.status();
            let mut body = if status.is_success() {
                response.bytes_stream()
            } else {
                let text = tokio::time::timeout(read_timeout, response.text())
                    .await
                    .ok()
                    .and_then(Result::ok)
                    .unwrap_or_default();
                warn!(provider = %provider, status = %status, "Upstream returned error status");
                Err(GatewayError::transport(
                    &provider,
                    format!("Upstream returned {status}: {}", truncate(text.trim(), MAX_ERROR_BODY)),
                    Some(status.as_u16()),
                ))?;
                return;
            };

            let mut splitter = LineSplitter::new();

            loop {
                let next = tokio::time::timeout(read_timeout, body.next())
                    .await
                    .map_err(|_| {
                        warn!(provider = %provider, timeout = ?read_timeout, "Upstream read timed out");
                        GatewayError::timeout(&provider, read_timeout)
                    })?;

                let chunk = match next {
                    Some(chunk) => chunk,
                    None => break,
                };
                let chunk = chunk.map_err(|e| {
                    warn!(provider = %provider, error = %e, "Upstream stream interrupted");
                    GatewayError::transport(&provider, format!("Stream error: {e}"), None)
                })?;

                for line in splitter.push(&chunk)? {
                    trace!(provider = %provider, line = %line, "Upstream line");
                    yield line;
                }
            }

            if let Some(line) = splitter.finish() {
                yield line;
            }

            debug!(provider = %provider, "Upstream stream closed");
        };

        Ok(Box::pin(stream))
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
