//! Shared types and errors for the Parley chat client.
//!
//! This crate provides the foundational types used across all other Parley crates:
//! - `ParleyError` — unified error taxonomy
//! - `Configuration` — selected provider plus per-provider tokens
//! - `Attachment` — a file inlined into an outgoing message

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as B64_ENGINE;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Unified error type for all Parley subsystems.
#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    // === Provider Errors ===
    #[error("Provider {provider} returned HTTP {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthError { provider: String },

    #[error("Request to {provider} failed: {message}")]
    Transport { provider: String, message: String },

    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    // === Local State Errors ===
    #[error("Stored configuration is unreadable: {0}")]
    ConfigUnreadable(String),

    #[error("Failed to read attachment {path}: {message}")]
    AttachmentError { path: String, message: String },

    #[error("Settings panel is not open")]
    SettingsClosed,

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ParleyError {
    /// Returns `true` when the provider rejected the credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ParleyError::AuthError { .. })
    }

    /// HTTP status attached to the error, if the provider answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ParleyError::AuthError { .. } => Some(401),
            ParleyError::ProviderError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, ParleyError>`.
pub type Result<T> = std::result::Result<T, ParleyError>;

// ---------------------------------------------------------------------------
// Configuration — selected provider plus per-provider tokens
// ---------------------------------------------------------------------------

/// Per-provider settings. Only the token is stored today.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub token: String,
}

/// User configuration persisted as a single JSON blob.
///
/// The serialized shape is `{"sel": "<provider>", "configs": {"<provider>": {"token": "..."}}}`.
/// Every known provider has an entry and `selected` always names one of them;
/// [`Configuration::normalize`] restores that invariant for values read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(rename = "sel")]
    pub selected: String,
    #[serde(rename = "configs")]
    pub providers: BTreeMap<String, ProviderSettings>,
}

impl Configuration {
    /// Default configuration: the first provider selected, every token empty.
    pub fn with_providers<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let selected = names.first().cloned().unwrap_or_default();
        let providers = names
            .into_iter()
            .map(|name| (name, ProviderSettings::default()))
            .collect();
        Self {
            selected,
            providers,
        }
    }

    /// Token stored for `provider`, `None` when the provider is not known.
    pub fn token(&self, provider: &str) -> Option<&str> {
        self.providers.get(provider).map(|p| p.token.as_str())
    }

    /// Token of the currently selected provider (empty when unset).
    pub fn selected_token(&self) -> &str {
        self.token(&self.selected).unwrap_or_default()
    }

    pub fn is_known(&self, provider: &str) -> bool {
        self.providers.contains_key(provider)
    }

    /// Overwrite the token for a known provider.
    pub fn set_token(&mut self, provider: &str, token: impl Into<String>) -> Result<()> {
        let entry = self
            .providers
            .get_mut(provider)
            .ok_or_else(|| ParleyError::UnknownProvider(provider.to_string()))?;
        entry.token = token.into();
        Ok(())
    }

    /// Change the selected provider. Unknown names are rejected.
    pub fn select(&mut self, provider: &str) -> Result<()> {
        if !self.is_known(provider) {
            return Err(ParleyError::UnknownProvider(provider.to_string()));
        }
        self.selected = provider.to_string();
        Ok(())
    }

    /// Reconcile a stored value with the current provider list.
    ///
    /// Missing providers get empty tokens and unknown entries are dropped.
    /// Returns `None` when the selection names a provider outside `names`.
    pub fn normalize(mut self, names: &[&str]) -> Option<Self> {
        if !names.contains(&self.selected.as_str()) {
            return None;
        }
        let providers = names
            .iter()
            .map(|name| {
                let settings = self.providers.remove(*name).unwrap_or_default();
                (name.to_string(), settings)
            })
            .collect();
        Some(Self {
            selected: self.selected,
            providers,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Attachment — a file inlined into an outgoing message
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data,
        }
    }

    /// Standard (padded) base64 encoding of the payload.
    pub fn base64_data(&self) -> String {
        B64_ENGINE.encode(&self.data)
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 5] = ["DeepSeek", "Gemini", "OpenAI", "Claude", "XAI"];

    #[test]
    fn error_display_provider_error() {
        let err = ParleyError::ProviderError {
            provider: "OpenAI".into(),
            status: 500,
            message: "internal server error".into(),
        };
        assert_eq!(
            err.to_string(),
            "Provider OpenAI returned HTTP 500: internal server error"
        );
    }

    #[test]
    fn error_display_auth_error() {
        let err = ParleyError::AuthError {
            provider: "Claude".into(),
        };
        assert_eq!(err.to_string(), "Authentication failed for provider Claude");
    }

    #[test]
    fn error_display_malformed_response() {
        let err = ParleyError::MalformedResponse {
            provider: "XAI".into(),
            message: "missing choices[0].message.content".into(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed response from XAI: missing choices[0].message.content"
        );
    }

    #[test]
    fn error_display_unknown_provider() {
        let err = ParleyError::UnknownProvider("Mystery".into());
        assert_eq!(err.to_string(), "Unknown provider 'Mystery'");
    }

    #[test]
    fn error_display_settings_closed() {
        assert_eq!(
            ParleyError::SettingsClosed.to_string(),
            "Settings panel is not open"
        );
        assert_eq!(ParleyError::SettingsClosed.http_status(), None);
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(
            ParleyError::AuthError {
                provider: "x".into()
            }
            .http_status(),
            Some(401)
        );
        assert_eq!(
            ParleyError::ProviderError {
                provider: "x".into(),
                status: 502,
                message: "bad gateway".into(),
            }
            .http_status(),
            Some(502)
        );
        assert_eq!(
            ParleyError::Transport {
                provider: "x".into(),
                message: "connection refused".into(),
            }
            .http_status(),
            None
        );
    }

    #[test]
    fn auth_failure_classification() {
        assert!(ParleyError::AuthError {
            provider: "x".into()
        }
        .is_auth_failure());
        assert!(!ParleyError::Other("nope".into()).is_auth_failure());
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ParleyError = json_err.into();
        assert!(matches!(err, ParleyError::Json(_)));
    }

    // --- Configuration ---

    #[test]
    fn default_configuration_selects_first_and_has_empty_tokens() {
        let config = Configuration::with_providers(NAMES);
        assert_eq!(config.selected, "DeepSeek");
        assert_eq!(config.providers.len(), NAMES.len());
        for name in NAMES {
            assert_eq!(config.token(name), Some(""));
        }
    }

    #[test]
    fn serialized_shape_uses_sel_and_configs() {
        let mut config = Configuration::with_providers(["DeepSeek", "Claude"]);
        config.set_token("Claude", "sk-ant").unwrap();
        let value: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(value["sel"], "DeepSeek");
        assert_eq!(value["configs"]["Claude"]["token"], "sk-ant");
        assert_eq!(value["configs"]["DeepSeek"]["token"], "");
    }

    #[test]
    fn set_token_rejects_unknown_provider() {
        let mut config = Configuration::with_providers(NAMES);
        let err = config.set_token("Mystery", "abc").unwrap_err();
        assert!(matches!(err, ParleyError::UnknownProvider(name) if name == "Mystery"));
    }

    #[test]
    fn select_changes_selected_token() {
        let mut config = Configuration::with_providers(NAMES);
        config.set_token("OpenAI", "sk-openai").unwrap();
        config.select("OpenAI").unwrap();
        assert_eq!(config.selected_token(), "sk-openai");
        assert!(config.select("Nope").is_err());
        assert_eq!(config.selected, "OpenAI");
    }

    #[test]
    fn normalize_fills_missing_and_drops_unknown() {
        let stored = Configuration::from_json(
            r#"{"sel":"Gemini","configs":{"Gemini":{"token":"g"},"Legacy":{"token":"x"}}}"#,
        )
        .unwrap();
        let config = stored.normalize(&NAMES).unwrap();
        assert_eq!(config.selected, "Gemini");
        assert_eq!(config.token("Gemini"), Some("g"));
        assert_eq!(config.token("Claude"), Some(""));
        assert_eq!(config.token("Legacy"), None);
        assert_eq!(config.providers.len(), NAMES.len());
    }

    #[test]
    fn normalize_rejects_unknown_selection() {
        let stored = Configuration::from_json(r#"{"sel":"Legacy","configs":{}}"#).unwrap();
        assert!(stored.normalize(&NAMES).is_none());
    }

    #[test]
    fn missing_token_field_defaults_to_empty() {
        let stored = Configuration::from_json(r#"{"sel":"XAI","configs":{"XAI":{}}}"#).unwrap();
        assert_eq!(stored.token("XAI"), Some(""));
    }

    // --- Attachment ---

    #[test]
    fn attachment_base64_is_standard_padded() {
        let att = Attachment::new("a.png", "image/png", b"hello".to_vec());
        assert_eq!(att.base64_data(), "aGVsbG8=");
    }

    #[test]
    fn attachment_debug_omits_payload() {
        let att = Attachment::new("a.png", "image/png", vec![0u8; 4096]);
        let rendered = format!("{att:?}");
        assert!(rendered.contains("len: 4096"));
        assert!(!rendered.contains("data"));
    }
}
