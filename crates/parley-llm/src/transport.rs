use std::time::Duration;

use async_trait::async_trait;
use parley_types::ParleyError;

use crate::PreparedRequest;

/// Status and raw body of a provider reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// Executes a [`PreparedRequest`] as an HTTP POST.
///
/// Non-2xx statuses are returned as replies, not errors; only failures to
/// obtain a reply at all are reported as `ParleyError::Transport`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(&self, request: &PreparedRequest) -> Result<HttpReply, ParleyError>;
}

// ---------------------------------------------------------------------------
// ReqwestTransport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Client with an overall per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ParleyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ParleyError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: &PreparedRequest) -> Result<HttpReply, ParleyError> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = builder.json(&request.body);

        let resp = builder.send().await.map_err(|e| ParleyError::Transport {
            provider: request.provider.clone(),
            message: e.to_string(),
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| ParleyError::Transport {
            provider: request.provider.clone(),
            message: e.to_string(),
        })?;

        Ok(HttpReply { status, body })
    }
}
