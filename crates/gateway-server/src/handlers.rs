//! HTTP request handlers for the gateway API.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::{ChatRequest, HealthResponse, UpstreamRequest};
use gateway_providers::LineNormalizer;
use gateway_telemetry::ResponseMode;
use tracing::{debug, instrument, Span};

use crate::{
    composer::{self, ExchangeRecorder},
    error::ApiError,
    extractors::{Authorized, JsonBody, RequestId},
    state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = state.metrics.gather();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics,
    )
}

/// Chat completion endpoint.
///
/// Streams SSE frames when `stream` is true, otherwise answers with the
/// aggregated content.
#[instrument(skip_all, fields(request_id = %request_id, stream = tracing::field::Empty))]
pub async fn chat_completion(
    State(state): State<AppState>,
    _auth: Authorized,
    RequestId(request_id): RequestId,
    body: Result<JsonBody<ChatRequest>, ApiError>,
) -> Result<Response, ApiError> {
    let request = match body {
        Ok(JsonBody(request)) => request,
        Err(e) => {
            state.metrics.record_early_rejection();
            return Err(e);
        }
    };
    Span::current().record("stream", request.stream);

    let mode = ResponseMode::from_stream_flag(request.stream);

    if let Err(e) = state.gate.admit(&request, state.upstream.as_ref()) {
        state.metrics.record_request(mode, "rejected");
        return Err(e.into());
    }

    debug!(
        request_id = %request_id,
        messages = request.messages.len(),
        temperature = request.temperature,
        max_tokens = ?request.max_tokens,
        session_id = ?request.session_id,
        "Processing chat request"
    );

    let lines = match state.upstream.stream_lines(UpstreamRequest::from(&request)) {
        Ok(lines) => lines,
        Err(e) => {
            state.metrics.record_request(mode, "rejected");
            return Err(e.into());
        }
    };

    let provider = state.upstream.id().to_string();
    let events = LineNormalizer::new(provider.clone()).normalize(lines);
    let recorder = ExchangeRecorder::new(state.metrics.clone(), mode, request_id);

    match mode {
        ResponseMode::Streaming => Ok(composer::stream(events, recorder).into_response()),
        ResponseMode::Aggregate => {
            let result = composer::aggregate(events, &provider, recorder).await?;
            Ok(Json(result).into_response())
        }
    }
}
