use parley_types::{Attachment, ParleyError};

use crate::{PreparedRequest, ProviderDescriptor, Response};

// ---------------------------------------------------------------------------
// ProviderAdapter
// ---------------------------------------------------------------------------

/// Request/response shaping for one provider.
///
/// Adapters are pure: they never touch the network. The dispatcher hands the
/// [`PreparedRequest`] to an `HttpTransport` and feeds the decoded body back
/// into [`parse_response`](ProviderAdapter::parse_response).
pub trait ProviderAdapter: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    fn build_request(
        &self,
        message: &str,
        attachments: &[Attachment],
        token: &str,
    ) -> PreparedRequest;

    fn parse_response(&self, body: &serde_json::Value) -> Result<Response, ParleyError>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn model(&self) -> &str {
        &self.descriptor().model
    }

    /// Whether image attachments reach the provider.
    fn supports_attachments(&self) -> bool {
        false
    }

    /// Translate a non-2xx reply into an error.
    fn map_error(&self, status: u16, body: &str) -> ParleyError {
        map_http_error(self.name(), status, body)
    }
}

// ---------------------------------------------------------------------------
// DynProvider
// ---------------------------------------------------------------------------

pub struct DynProvider(Box<dyn ProviderAdapter>);

impl DynProvider {
    pub fn new(provider: impl ProviderAdapter + 'static) -> Self {
        Self(Box::new(provider))
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        self.0.descriptor()
    }

    pub fn build_request(
        &self,
        message: &str,
        attachments: &[Attachment],
        token: &str,
    ) -> PreparedRequest {
        self.0.build_request(message, attachments, token)
    }

    pub fn parse_response(&self, body: &serde_json::Value) -> Result<Response, ParleyError> {
        self.0.parse_response(body)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn model(&self) -> &str {
        self.0.model()
    }

    pub fn supports_attachments(&self) -> bool {
        self.0.supports_attachments()
    }

    pub fn map_error(&self, status: u16, body: &str) -> ParleyError {
        self.0.map_error(status, body)
    }
}

impl std::fmt::Debug for DynProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DynProvider").field(self.descriptor()).finish()
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

pub(crate) fn map_http_error(provider: &str, status: u16, body: &str) -> ParleyError {
    match status {
        401 | 403 => ParleyError::AuthError {
            provider: provider.into(),
        },
        _ => ParleyError::ProviderError {
            provider: provider.into(),
            status,
            message: extract_error_message(body),
        },
    }
}

/// Pull `error.message` out of a JSON error body, else return the raw body.
pub(crate) fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

pub(crate) fn malformed(provider: &str, message: impl Into<String>) -> ParleyError {
    ParleyError::MalformedResponse {
        provider: provider.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
