//! Request admission checks.
//!
//! Every check here runs before the upstream is contacted. A rejected
//! request never produces an outbound call.

use gateway_config::SecuritySettings;
use gateway_core::{ChatRequest, GatewayError, GatewayResult, PROVIDER_ID};
use gateway_providers::ChatUpstream;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

/// Header carrying the gateway credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// Admission gate for chat requests
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    api_key: Option<SecretString>,
}

impl RequestGate {
    /// Create a gate; `None` or an empty key leaves the gateway open
    #[must_use]
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.expose_secret().is_empty()),
        }
    }

    /// Create a gate from the security settings
    #[must_use]
    pub fn from_settings(settings: &SecuritySettings) -> Self {
        Self::new(settings.gateway_api_key.clone())
    }

    /// Whether a gateway credential is enforced
    #[must_use]
    pub fn requires_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Check the caller's credential
    ///
    /// # Errors
    /// Returns `Authentication` when a credential is configured and the
    /// provided value is missing or different
    pub fn authorize(&self, provided: Option<&str>) -> GatewayResult<()> {
        let Some(expected) = &self.api_key else {
            return Ok(());
        };

        match provided {
            Some(value) if constant_time_eq(value.as_bytes(), expected.expose_secret().as_bytes()) => {
                Ok(())
            }
            _ => {
                debug!(present = provided.is_some(), "Gateway credential mismatch");
                Err(GatewayError::authentication("Invalid gateway API key"))
            }
        }
    }

    /// Check an authorized request before any upstream call
    ///
    /// # Errors
    /// Returns `Validation` for an unsupported provider or invalid fields,
    /// and `Configuration` when the upstream has no credential
    pub fn admit(&self, request: &ChatRequest, upstream: &dyn ChatUpstream) -> GatewayResult<()> {
        if request.provider != PROVIDER_ID {
            return Err(GatewayError::validation(
                format!("Unsupported provider: {}", request.provider),
                Some("provider".to_string()),
                "unsupported_provider",
            ));
        }

        request.validate()?;

        if !upstream.is_configured() {
            return Err(GatewayError::configuration(format!(
                "{} integration is not configured",
                upstream.id()
            )));
        }

        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
