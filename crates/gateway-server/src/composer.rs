//! Response composition.
//!
//! A normalized event stream is either relayed to the client as SSE frames
//! or driven to completion and folded into one [`AggregatedResult`]. Both
//! modes consume the same [`EventStream`].

use axum::response::sse::{Event, Sse};
use futures::{Stream, StreamExt};
use gateway_core::{AggregatedResult, EventStream, GatewayError, GatewayResult, NormalizedEvent};
use gateway_telemetry::{Metrics, ResponseMode};
use std::time::Instant;
use tracing::{debug, info};

/// Records metrics for one chat exchange.
///
/// The outcome is recorded once, on the first terminal event. Dropping the
/// recorder before that (client went away) records `cancelled`.
#[derive(Debug)]
pub struct ExchangeRecorder {
    metrics: Metrics,
    mode: ResponseMode,
    request_id: String,
    started: Instant,
    finished: bool,
}

impl ExchangeRecorder {
    /// Start recording an admitted exchange
    #[must_use]
    pub fn new(metrics: Metrics, mode: ResponseMode, request_id: impl Into<String>) -> Self {
        Self {
            metrics,
            mode,
            request_id: request_id.into(),
            started: Instant::now(),
            finished: false,
        }
    }

    /// Observe one normalized event
    pub fn observe(&mut self, event: &NormalizedEvent) {
        self.metrics.record_event(event.kind());
        match event {
            NormalizedEvent::Done { .. } => self.finish("ok"),
            NormalizedEvent::Error { .. } => self.finish("upstream_error"),
            NormalizedEvent::Chunk { .. } => {}
        }
    }

    fn finish(&mut self, outcome: &str) {
        if self.finished {
            return;
        }
        self.finished = true;

        let elapsed = self.started.elapsed();
        self.metrics.record_request(self.mode, outcome);
        self.metrics.observe_duration(self.mode, elapsed);

        info!(
            request_id = %self.request_id,
            mode = self.mode.as_str(),
            outcome,
            duration_ms = elapsed.as_millis(),
            "Chat exchange finished"
        );
    }
}

impl Drop for ExchangeRecorder {
    fn drop(&mut self) {
        if !self.finished {
            debug!(request_id = %self.request_id, "Client disconnected before terminal event");
            self.finish("cancelled");
        }
    }
}

/// Relay events as SSE frames, one `data: <json>` frame per event.
///
/// No keep-alive comments are interleaved. Dropping the response body
/// drops the event stream and the upstream connection behind it.
pub fn stream(
    events: EventStream,
    mut recorder: ExchangeRecorder,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>> + Send + 'static> {
    let frames = events.map(move |event| {
        recorder.observe(&event);
        Event::default().json_data(&event)
    });

    Sse::new(frames)
}

/// Drive events to completion and concatenate chunk content
///
/// # Errors
/// Returns `UpstreamProtocol` carrying the upstream's text when the stream
/// ends with an error event
pub async fn aggregate(
    mut events: EventStream,
    provider: &str,
    mut recorder: ExchangeRecorder,
) -> GatewayResult<AggregatedResult> {
    let mut content = String::new();

    while let Some(event) = events.next().await {
        recorder.observe(&event);
        match event {
            NormalizedEvent::Chunk {
                content: Some(text),
                ..
            } => content.push_str(&text),
            NormalizedEvent::Chunk { content: None, .. } => {}
            NormalizedEvent::Done { .. } => break,
            NormalizedEvent::Error { message } => {
                return Err(GatewayError::upstream_protocol(message));
            }
        }
    }

    Ok(AggregatedResult::new(content, provider))
}
