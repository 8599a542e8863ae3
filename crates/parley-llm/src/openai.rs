use parley_types::{Attachment, ParleyError};
use serde_json::json;

use crate::provider::malformed;
use crate::{
    Message, PreparedRequest, ProviderAdapter, ProviderDescriptor, Request, Response, Usage,
};

/// System preamble sent ahead of every chat-completions prompt.
pub const SYSTEM_PREAMBLE: &str = "You are a helpful assistant.";

// ---------------------------------------------------------------------------
// ChatCompletionsAdapter
// ---------------------------------------------------------------------------

/// Adapter for OpenAI-compatible `chat/completions` endpoints
/// (DeepSeek, Gemini's OpenAI shim, OpenAI, xAI).
#[derive(Debug)]
pub struct ChatCompletionsAdapter {
    descriptor: ProviderDescriptor,
}

impl ChatCompletionsAdapter {
    pub fn new(descriptor: ProviderDescriptor) -> Self {
        Self { descriptor }
    }

    fn build_request_body(&self, request: &Request) -> serde_json::Value {
        let messages: Vec<serde_json::Value> =
            request.messages.iter().map(convert_message).collect();

        let mut body = json!({
            "model": request.model,
            "messages": messages,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }
}

// ---------------------------------------------------------------------------
// Message conversion helpers
// ---------------------------------------------------------------------------

/// Flat `{role, content}` form; image parts are not forwarded.
fn convert_message(msg: &Message) -> serde_json::Value {
    json!({
        "role": msg.role.as_str(),
        "content": msg.text(),
    })
}

// ---------------------------------------------------------------------------
// ProviderAdapter implementation
// ---------------------------------------------------------------------------

impl ProviderAdapter for ChatCompletionsAdapter {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn build_request(
        &self,
        message: &str,
        attachments: &[Attachment],
        token: &str,
    ) -> PreparedRequest {
        if !attachments.is_empty() {
            tracing::debug!(
                provider = %self.descriptor.name,
                dropped = attachments.len(),
                "attachments are not forwarded by chat-completions providers"
            );
        }

        let request = Request::prompt(&self.descriptor.model, Some(SYSTEM_PREAMBLE), message, &[]);

        PreparedRequest {
            provider: self.descriptor.name.clone(),
            url: self.descriptor.endpoint.clone(),
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("Authorization".into(), format!("Bearer {token}")),
            ],
            body: self.build_request_body(&request),
        }
    }

    fn parse_response(&self, body: &serde_json::Value) -> Result<Response, ParleyError> {
        let text = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| malformed(&self.descriptor.name, "missing choices[0].message.content"))?;

        let usage_obj = &body["usage"];
        let usage = Usage {
            input_tokens: usage_obj["prompt_tokens"].as_u64().unwrap_or(0),
            output_tokens: usage_obj["completion_tokens"].as_u64().unwrap_or(0),
        };

        Ok(Response {
            id: body["id"].as_str().unwrap_or("").to_string(),
            text: text.trim().to_string(),
            model: body["model"]
                .as_str()
                .unwrap_or(&self.descriptor.model)
                .to_string(),
            usage,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
