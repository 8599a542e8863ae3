use std::sync::Arc;

use parley_types::{Attachment, ParleyError};

use crate::{HttpTransport, PreparedRequest, ProviderRegistry, Response};

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

pub trait Middleware: Send + Sync {
    fn before(&self, _request: &PreparedRequest) {}
    fn after(&self, _request: &PreparedRequest, _response: &Response) {}
}

// ---------------------------------------------------------------------------
// Built-in middleware: LoggingMiddleware
// ---------------------------------------------------------------------------

/// Logs request and reply summaries. Header values are never logged.
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn before(&self, request: &PreparedRequest) {
        tracing::info!(
            provider = %request.provider,
            url = %request.url,
            model = request.body["model"].as_str().unwrap_or(""),
            "LLM request"
        );
    }

    fn after(&self, request: &PreparedRequest, response: &Response) {
        tracing::info!(
            provider = %request.provider,
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM response"
        );
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes one prompt to a named provider and returns its parsed reply.
pub struct Dispatcher {
    registry: ProviderRegistry,
    transport: Arc<dyn HttpTransport>,
    middleware: Vec<Box<dyn Middleware>>,
}

impl Dispatcher {
    pub fn new(registry: ProviderRegistry, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            registry,
            transport,
            middleware: Vec::new(),
        }
    }

    pub fn with_middleware(mut self, m: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(m));
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Build the request the named provider would receive, without sending it.
    pub fn prepare(
        &self,
        provider: &str,
        token: &str,
        message: &str,
        attachments: &[Attachment],
    ) -> Result<PreparedRequest, ParleyError> {
        let adapter = self
            .registry
            .get(provider)
            .ok_or_else(|| ParleyError::UnknownProvider(provider.to_string()))?;
        Ok(adapter.build_request(message, attachments, token))
    }

    pub async fn dispatch(
        &self,
        provider: &str,
        token: &str,
        message: &str,
        attachments: &[Attachment],
    ) -> Result<Response, ParleyError> {
        let adapter = self
            .registry
            .get(provider)
            .ok_or_else(|| ParleyError::UnknownProvider(provider.to_string()))?;

        let request = adapter.build_request(message, attachments, token);
        tracing::debug!(?request, attachments = attachments.len(), "shaped request");

        for m in &self.middleware {
            m.before(&request);
        }

        let reply = self.transport.post(&request).await?;
        if !reply.is_success() {
            return Err(adapter.map_error(reply.status, &reply.body));
        }

        let json: serde_json::Value = serde_json::from_str(&reply.body).map_err(|e| {
            ParleyError::MalformedResponse {
                provider: provider.to_string(),
                message: format!("Failed to parse response JSON: {e}"),
            }
        })?;

        let response = adapter.parse_response(&json)?;

        for m in &self.middleware {
            m.after(&request, &response);
        }

        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
