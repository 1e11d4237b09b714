//! Normalized streaming events.
//!
//! Upstream lines are classified into [`NormalizedEvent`]s. Every event
//! sequence the gateway produces ends with exactly one terminal event,
//! either [`NormalizedEvent::Done`] or [`NormalizedEvent::Error`].

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A lazily produced sequence of normalized events
pub type EventStream = BoxStream<'static, NormalizedEvent>;

/// One normalized event, serialized with a `type` tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NormalizedEvent {
    /// An incremental piece of assistant output
    Chunk {
        /// Content delta, absent when the upstream frame carried none
        content: Option<String>,
        /// Frame metadata
        metadata: Map<String, Value>,
    },
    /// Successful end of the stream
    Done {
        /// Stream metadata
        metadata: Map<String, Value>,
    },
    /// Upstream or transport failure; nothing follows it
    Error {
        /// Failure description
        #[serde(rename = "error")]
        message: String,
    },
}

impl NormalizedEvent {
    /// Create a chunk event
    #[must_use]
    pub fn chunk(content: Option<String>, metadata: Map<String, Value>) -> Self {
        Self::Chunk { content, metadata }
    }

    /// Create a done event tagged with the provider
    #[must_use]
    pub fn done(provider: &str) -> Self {
        Self::Done {
            metadata: provider_metadata(provider),
        }
    }

    /// Create an error event
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this event closes the sequence
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// Content carried by a chunk event
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Chunk { content, .. } => content.as_deref(),
            _ => None,
        }
    }

    /// Label used for logging and metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

/// Default metadata map `{"provider": <id>}`
#[must_use]
pub fn provider_metadata(provider: &str) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("provider".to_string(), Value::String(provider.to_string()));
    metadata
}
