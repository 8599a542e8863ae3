use parley_types::Attachment;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

// ---------------------------------------------------------------------------
// ContentPart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    /// Inline image; `data` is already base64-encoded.
    Image {
        media_type: String,
        data: String,
    },
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// A user message with one text part followed by one image part per attachment.
    pub fn user_with_attachments(text: impl Into<String>, attachments: &[Attachment]) -> Self {
        let mut content = vec![ContentPart::Text { text: text.into() }];
        content.extend(attachments.iter().map(|att| ContentPart::Image {
            media_type: att.media_type.clone(),
            data: att.base64_data(),
        }));
        Self {
            role: Role::User,
            content,
        }
    }

    /// Concatenated text parts.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn image_count(&self) -> usize {
        self.content
            .iter()
            .filter(|p| matches!(p, ContentPart::Image { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Provider-neutral request for a single prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
}

impl Request {
    /// Build a one-shot request: optional system preamble, then the user turn.
    pub fn prompt(
        model: impl Into<String>,
        preamble: Option<&str>,
        text: &str,
        attachments: &[Attachment],
    ) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(preamble) = preamble {
            messages.push(Message::system(preamble));
        }
        messages.push(Message::user_with_attachments(text, attachments));
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub text: String,
    pub model: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

// ---------------------------------------------------------------------------
// PreparedRequest — a fully shaped HTTP call
// ---------------------------------------------------------------------------

/// An outgoing POST built by a provider adapter, ready for the transport.
#[derive(Clone)]
pub struct PreparedRequest {
    pub provider: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

const SECRET_HEADERS: [&str; 2] = ["authorization", "x-api-key"];

impl std::fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                let redacted = SECRET_HEADERS.iter().any(|s| k.eq_ignore_ascii_case(s));
                (k.as_str(), if redacted { "<redacted>" } else { v.as_str() })
            })
            .collect();
        f.debug_struct("PreparedRequest")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("headers", &headers)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_puts_preamble_first() {
        let req = Request::prompt("m", Some("be nice"), "hi", &[]);
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[0].text(), "be nice");
        assert_eq!(req.messages[1].role, Role::User);
        assert_eq!(req.messages[1].text(), "hi");
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn prompt_without_preamble_has_single_user_turn() {
        let req = Request::prompt("m", None, "hi", &[]).with_max_tokens(64);
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.max_tokens, Some(64));
    }

    #[test]
    fn user_with_attachments_orders_text_before_images() {
        let atts = vec![
            Attachment::new("a.png", "image/png", vec![1, 2, 3]),
            Attachment::new("b.jpg", "image/jpeg", vec![4, 5]),
        ];
        let msg = Message::user_with_attachments("look", &atts);
        assert_eq!(msg.content.len(), 3);
        assert_eq!(msg.content[0], ContentPart::Text { text: "look".into() });
        assert_eq!(
            msg.content[1],
            ContentPart::Image {
                media_type: "image/png".into(),
                data: "AQID".into()
            }
        );
        assert_eq!(msg.image_count(), 2);
    }

    #[test]
    fn content_part_serializes_with_type_tag() {
        let part = ContentPart::Text { text: "x".into() };
        let v = serde_json::to_value(&part).unwrap();
        assert_eq!(v["type"], "text");
    }

    #[test]
    fn prepared_request_debug_redacts_credentials() {
        let req = PreparedRequest {
            provider: "OpenAI".into(),
            url: "https://example.test".into(),
            headers: vec![
                ("Authorization".into(), "Bearer sk-secret".into()),
                ("x-api-key".into(), "sk-ant-secret".into()),
                ("Content-Type".into(), "application/json".into()),
            ],
            body: serde_json::json!({}),
        };
        let rendered = format!("{req:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("application/json"));
        assert_eq!(req.header("authorization"), Some("Bearer sk-secret"));
    }

    #[test]
    fn usage_total() {
        let usage = Usage {
            input_tokens: 9,
            output_tokens: 12,
        };
        assert_eq!(usage.total_tokens(), 21);
    }
}
