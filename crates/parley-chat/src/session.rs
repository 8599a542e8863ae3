use std::collections::HashMap;
use std::path::Path;

use parley_llm::{Dispatcher, Response};
use parley_types::{Configuration, ParleyError, Result};

use crate::{
    AttachmentTray, ChatView, ConfigStore, SettingsPanel, Transcript, TranscriptEntry, TrayEntry,
    GENERIC_FAILURE, SYSTEM_SENDER, USER_SENDER,
};

/// Why a send did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The message was empty or whitespace.
    EmptyMessage,
    /// The selected provider has no registered adapter.
    UnknownProvider,
}

/// Result of [`ChatSession::send`].
#[derive(Debug)]
pub enum SendOutcome {
    /// Nothing was rendered and no request was made.
    Skipped(SkipReason),
    /// The provider replied and the reply was rendered.
    Replied(Response),
    /// The attempt failed; the generic failure notice was rendered.
    Failed(ParleyError),
}

impl SendOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SendOutcome::Failed(_))
    }
}

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

/// One chat window: configuration, settings panel, tray and transcript.
///
/// Every mutating operation takes `&mut self`, so a send holds the session
/// until its reply (or failure) has been rendered and a second send cannot
/// overlap it.
pub struct ChatSession {
    config: Configuration,
    store: ConfigStore,
    dispatcher: Dispatcher,
    settings: SettingsPanel,
    tray: AttachmentTray,
    transcript: Transcript,
    fallback_tokens: HashMap<String, String>,
    view: Box<dyn ChatView>,
}

impl ChatSession {
    /// Load the stored configuration and start an empty session.
    pub fn new(store: ConfigStore, dispatcher: Dispatcher, view: Box<dyn ChatView>) -> Self {
        let config = store.load();
        Self {
            config,
            store,
            dispatcher,
            settings: SettingsPanel::new(),
            tray: AttachmentTray::new(),
            transcript: Transcript::new(),
            fallback_tokens: HashMap::new(),
            view,
        }
    }

    /// Tokens used at send time when the stored token is empty. Never persisted.
    pub fn with_fallback_tokens(mut self, tokens: HashMap<String, String>) -> Self {
        self.fallback_tokens = tokens;
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn tray(&self) -> &AttachmentTray {
        &self.tray
    }

    pub fn settings(&self) -> &SettingsPanel {
        &self.settings
    }

    /// Token that would be sent to the selected provider.
    pub fn effective_token(&self) -> &str {
        let stored = self.config.selected_token();
        if stored.is_empty() {
            if let Some(fallback) = self.fallback_tokens.get(&self.config.selected) {
                return fallback;
            }
        }
        stored
    }

    // --- Settings panel ---

    pub fn open_settings(&mut self) {
        self.settings.open(&self.config);
        self.view
            .show_settings(&self.settings, self.store.providers());
    }

    pub fn close_settings(&mut self) {
        self.settings.close();
        self.view.hide_settings();
    }

    pub fn set_token_field(&mut self, token: impl Into<String>) {
        self.settings.set_token_field(token);
        if self.settings.is_open() {
            self.view
                .show_settings(&self.settings, self.store.providers());
        }
    }

    pub fn change_provider(&mut self, provider: &str) -> Result<()> {
        self.settings
            .change_provider(provider, &mut self.config, &self.store)?;
        tracing::info!(provider = %self.config.selected, "provider selected");
        if self.settings.is_open() {
            self.view
                .show_settings(&self.settings, self.store.providers());
        }
        Ok(())
    }

    pub fn save_settings(&mut self) -> Result<()> {
        self.settings.save(&mut self.config, &self.store)?;
        tracing::info!(provider = %self.config.selected, "settings saved");
        self.view.hide_settings();
        Ok(())
    }

    // --- Attachment tray ---

    pub async fn attach(&mut self, path: impl AsRef<Path>) -> Result<TrayEntry> {
        let entry = self.tray.add(path).await?.clone();
        self.view.show_tray(self.tray.entries());
        Ok(entry)
    }

    pub fn detach(&mut self, id: u32) -> bool {
        let removed = self.tray.remove(id);
        if removed {
            self.view.show_tray(self.tray.entries());
        }
        removed
    }

    // --- Sending ---

    /// Send `input` to the selected provider and render the outcome.
    ///
    /// Whitespace-only input and an unregistered provider are no-ops. Any
    /// other attempt appends the user's line, then either the reply or one
    /// generic failure line, and always empties the tray.
    pub async fn send(&mut self, input: &str) -> SendOutcome {
        let message = input.trim();
        if message.is_empty() {
            return SendOutcome::Skipped(SkipReason::EmptyMessage);
        }

        let provider = self.config.selected.clone();
        if !self.dispatcher.registry().contains(&provider) {
            tracing::debug!(%provider, "no adapter for selected provider, ignoring send");
            return SendOutcome::Skipped(SkipReason::UnknownProvider);
        }

        self.append(TranscriptEntry::new(USER_SENDER, message));
        self.view.set_input("");

        let result = match self.tray.read_all().await {
            Ok(attachments) => {
                let token = self.effective_token().to_string();
                self.dispatcher
                    .dispatch(&provider, &token, message, &attachments)
                    .await
            }
            Err(e) => Err(e),
        };

        self.tray.clear();
        self.view.show_tray(self.tray.entries());

        match result {
            Ok(response) => {
                self.append(TranscriptEntry::new(provider, response.text.clone()));
                SendOutcome::Replied(response)
            }
            Err(e) => {
                tracing::error!(%provider, error = %e, "send failed");
                self.append(TranscriptEntry::new(SYSTEM_SENDER, GENERIC_FAILURE));
                SendOutcome::Failed(e)
            }
        }
    }

    fn append(&mut self, entry: TranscriptEntry) {
        let entry = self.transcript.push(entry);
        self.view.append_entry(entry);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
