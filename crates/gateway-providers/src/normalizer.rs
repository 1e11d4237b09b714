//! Upstream line normalization.
//!
//! Each raw upstream line maps to at most one [`NormalizedEvent`]. The
//! normalized sequence always ends with exactly one terminal event: an
//! explicit `[DONE]`/`DONE` marker, an error from the line stream, or a
//! `Done` synthesized when the upstream closes without a marker.

use async_stream::stream;
use futures_util::StreamExt;
use gateway_core::{provider_metadata, EventStream, NormalizedEvent};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::upstream::LineStream;

/// SSE data field prefix
const DATA_PREFIX: &str = "data:";

/// Classifies upstream lines into normalized events
#[derive(Debug, Clone)]
pub struct LineNormalizer {
    provider: String,
}

impl LineNormalizer {
    /// Create a normalizer tagging events with the given provider
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    /// Provider used in default metadata
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Classify one raw line; blank lines yield nothing
    #[must_use]
    pub fn classify(&self, line: &str) -> Option<NormalizedEvent> {
        let mut text = line.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(rest) = text.strip_prefix(DATA_PREFIX) {
            text = rest.trim();
            if text.is_empty() {
                return None;
            }
        }

        if text == "[DONE]" || text == "DONE" {
            return Some(NormalizedEvent::done(&self.provider));
        }

        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(frame)) => Some(self.chunk_from_frame(&frame)),
            _ => Some(NormalizedEvent::chunk(
                Some(text.to_string()),
                provider_metadata(&self.provider),
            )),
        }
    }

    fn chunk_from_frame(&self, frame: &Map<String, Value>) -> NormalizedEvent {
        let metadata = frame
            .get("metadata")
            .and_then(Value::as_object)
            .filter(|m| !m.is_empty())
            .cloned()
            .unwrap_or_else(|| provider_metadata(&self.provider));

        NormalizedEvent::chunk(extract_content(frame), metadata)
    }

    /// Normalize a line stream into an event stream.
    ///
    /// Lines are pulled one at a time. Reading stops at the first terminal
    /// event, which drops the line stream and with it the upstream
    /// connection.
    #[must_use]
    pub fn normalize(self, lines: LineStream) -> EventStream {
        Box::pin(stream! {
            let mut lines = lines;
            let mut chunks = 0usize;

            while let Some(item) = lines.next().await {
                match item {
                    Ok(line) => {
                        let event = match self.classify(&line) {
                            Some(event) => event,
                            None => continue,
                        };
                        if event.is_terminal() {
                            debug!(provider = %self.provider, chunks, "Upstream sent end marker");
                            yield event;
                            return;
                        }
                        chunks += 1;
                        yield event;
                    }
                    Err(e) => {
                        warn!(provider = %self.provider, chunks, error = %e, "Upstream stream failed");
                        yield NormalizedEvent::error(e.message());
                        return;
                    }
                }
            }

            debug!(provider = %self.provider, chunks, "Upstream closed without end marker");
            yield NormalizedEvent::done(&self.provider);
        })
    }
}

/// Content precedence: a non-empty top-level `content` string, then
/// `delta.content`, then `choices[0].delta.content`.
fn extract_content(frame: &Map<String, Value>) -> Option<String> {
    if let Some(content) = frame
        .get("content")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
    {
        return Some(content.to_string());
    }

    if let Some(content) = frame
        .get("delta")
        .and_then(|d| d.get("content"))
        .and_then(Value::as_str)
    {
        return Some(content.to_string());
    }

    frame
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(Value::as_str)
        .map(String::from)
}
