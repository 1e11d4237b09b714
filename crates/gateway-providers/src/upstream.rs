//! The upstream seam between the gateway and a streaming provider.

use futures::stream::BoxStream;
use gateway_core::{GatewayError, UpstreamRequest};

/// Raw text lines read from an upstream response body, in arrival order
pub type LineStream = BoxStream<'static, Result<String, GatewayError>>;

/// A provider that serves chat completions as a line-oriented stream
pub trait ChatUpstream: Send + Sync {
    /// Provider identifier
    fn id(&self) -> &str;

    /// Whether the integration has a usable credential
    fn is_configured(&self) -> bool;

    /// Open a lazy line stream for one completion.
    ///
    /// Nothing is sent until the stream is first polled. An `Err` here means
    /// the request could not be attempted at all; failures after the request
    /// is sent surface as an `Err` item on the stream.
    fn stream_lines(&self, request: UpstreamRequest) -> Result<LineStream, GatewayError>;
}
