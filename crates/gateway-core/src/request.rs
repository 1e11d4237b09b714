//! Request types for the gateway.
//!
//! This module defines the inbound chat request accepted from clients and the
//! outbound payload sent to the upstream completions endpoint.

use crate::error::GatewayError;
use crate::PROVIDER_ID;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Inclusive lower bound for temperature
pub const MIN_TEMPERATURE: f64 = 0.0;

/// Inclusive upper bound for temperature
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Inbound chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation, oldest message first
    pub messages: Vec<ChatMessage>,

    /// Target provider identifier
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Opaque client session identifier
    #[serde(default, alias = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Opaque prompt identifier
    #[serde(default, alias = "promptId", skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<String>,

    /// Free-form metadata forwarded to the upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum tokens to generate
    #[serde(default, alias = "maxTokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Whether the client wants a streamed response
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_provider() -> String {
    PROVIDER_ID.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_stream() -> bool {
    true
}

impl ChatRequest {
    /// Create a streaming request with default sampling parameters
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            provider: default_provider(),
            session_id: None,
            prompt_id: None,
            metadata: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            stream: true,
        }
    }

    /// Set the provider
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the token bound
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the streaming flag
    #[must_use]
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Attach a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Validate the request body invariants
    ///
    /// # Errors
    /// Returns the first violated invariant as a validation error
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.messages.is_empty() {
            return Err(GatewayError::validation(
                "messages cannot be empty",
                Some("messages".to_string()),
                "empty_messages",
            ));
        }

        if let Some(index) = self.messages.iter().position(|m| m.content.is_empty()) {
            return Err(GatewayError::validation(
                format!("messages[{index}].content cannot be empty"),
                Some(format!("messages[{index}].content")),
                "empty_content",
            ));
        }

        if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(GatewayError::validation(
                format!(
                    "temperature must be between {MIN_TEMPERATURE} and {MAX_TEMPERATURE}, got {}",
                    self.temperature
                ),
                Some("temperature".to_string()),
                "invalid_temperature",
            ));
        }

        if self.max_tokens == Some(0) {
            return Err(GatewayError::validation(
                "max_tokens must be a positive integer",
                Some("max_tokens".to_string()),
                "invalid_max_tokens",
            ));
        }

        Ok(())
    }
}

/// Chat message with role and content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author
    pub role: MessageRole,

    /// Text content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an explicit role
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message
    System,
    /// User message
    User,
    /// Assistant message
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// Payload sent to the upstream completions endpoint
///
/// `stream` is always `true`: aggregation for non-streaming clients happens
/// inside the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamRequest {
    /// Conversation passed through verbatim
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f64,
    /// Always `true`
    pub stream: bool,
    /// Token bound, omitted when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Client metadata, omitted when unset or empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl From<&ChatRequest> for UpstreamRequest {
    fn from(request: &ChatRequest) -> Self {
        Self {
            messages: request.messages.clone(),
            temperature: request.temperature,
            stream: true,
            max_tokens: request.max_tokens,
            metadata: request.metadata.clone().filter(|m| !m.is_empty()),
        }
    }
}
