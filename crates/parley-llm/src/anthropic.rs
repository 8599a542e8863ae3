use parley_types::{Attachment, ParleyError};
use serde_json::json;

use crate::provider::malformed;
use crate::{
    ContentPart, Message, PreparedRequest, ProviderAdapter, ProviderDescriptor, Request, Response,
    Role, Usage,
};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

// ---------------------------------------------------------------------------
// AnthropicAdapter
// ---------------------------------------------------------------------------

/// Adapter for the Messages API, the only shape that carries image blocks.
#[derive(Debug)]
pub struct AnthropicAdapter {
    descriptor: ProviderDescriptor,
    max_tokens: u32,
}

impl AnthropicAdapter {
    pub fn new(descriptor: ProviderDescriptor) -> Self {
        Self {
            descriptor,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

// ---------------------------------------------------------------------------
// Request translation (Unified → Anthropic JSON)
// ---------------------------------------------------------------------------

fn build_request_body(request: &Request) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(convert_message)
        .collect();

    json!({
        "model": request.model,
        "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "messages": messages,
    })
}

/// Text-only turns collapse to a plain string; anything with images
/// becomes an ordered block array.
fn convert_message(msg: &Message) -> serde_json::Value {
    let content = if msg.image_count() == 0 {
        json!(msg.text())
    } else {
        json!(convert_content_parts(&msg.content))
    };
    json!({ "role": msg.role.as_str(), "content": content })
}

fn convert_content_parts(parts: &[ContentPart]) -> Vec<serde_json::Value> {
    parts
        .iter()
        .map(|p| match p {
            ContentPart::Text { text } => json!({
                "type": "text",
                "text": text
            }),
            ContentPart::Image { media_type, data } => json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": media_type,
                    "data": data
                }
            }),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Response translation (Anthropic JSON → Unified Response)
// ---------------------------------------------------------------------------

fn parse_response(provider: &str, body: &serde_json::Value) -> Result<Response, ParleyError> {
    let text = body["content"][0]["text"]
        .as_str()
        .ok_or_else(|| malformed(provider, "missing content[0].text"))?;

    let usage_obj = &body["usage"];
    let usage = Usage {
        input_tokens: usage_obj["input_tokens"].as_u64().unwrap_or(0),
        output_tokens: usage_obj["output_tokens"].as_u64().unwrap_or(0),
    };

    Ok(Response {
        id: body["id"].as_str().unwrap_or("").to_string(),
        text: text.trim().to_string(),
        model: body["model"].as_str().unwrap_or("").to_string(),
        usage,
    })
}

// ---------------------------------------------------------------------------
// ProviderAdapter implementation
// ---------------------------------------------------------------------------

impl ProviderAdapter for AnthropicAdapter {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn build_request(
        &self,
        message: &str,
        attachments: &[Attachment],
        token: &str,
    ) -> PreparedRequest {
        let request = Request::prompt(&self.descriptor.model, None, message, attachments)
            .with_max_tokens(self.max_tokens);

        PreparedRequest {
            provider: self.descriptor.name.clone(),
            url: self.descriptor.endpoint.clone(),
            headers: vec![
                ("content-type".into(), "application/json".into()),
                ("x-api-key".into(), token.to_string()),
                ("anthropic-version".into(), ANTHROPIC_VERSION.into()),
            ],
            body: build_request_body(&request),
        }
    }

    fn parse_response(&self, body: &serde_json::Value) -> Result<Response, ParleyError> {
        let mut resp = parse_response(&self.descriptor.name, body)?;
        if resp.model.is_empty() {
            resp.model = self.descriptor.model.clone();
        }
        Ok(resp)
    }

    fn supports_attachments(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
