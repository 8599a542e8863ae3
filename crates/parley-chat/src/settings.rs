use parley_types::{Configuration, ParleyError, Result};

use crate::ConfigStore;

/// Modal form over the [`Configuration`]: a provider selector and a token field.
///
/// Tokens are not validated; an empty token is saved as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPanel {
    open: bool,
    provider_field: String,
    token_field: String,
}

impl SettingsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the panel with fields populated from `config`.
    pub fn open(&mut self, config: &Configuration) {
        self.load_fields(config);
        self.open = true;
    }

    /// Hide the panel and discard unsaved edits.
    pub fn close(&mut self) {
        self.open = false;
        self.provider_field.clear();
        self.token_field.clear();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn provider_field(&self) -> &str {
        &self.provider_field
    }

    pub fn token_field(&self) -> &str {
        &self.token_field
    }

    pub fn set_token_field(&mut self, token: impl Into<String>) {
        self.token_field = token.into();
    }

    /// Provider selector changed.
    ///
    /// The token field is first stored for the outgoing provider and the
    /// configuration persisted; then the new provider becomes selected and its
    /// token is shown. Unknown names leave everything untouched.
    ///
    /// On a closed panel the fields are reloaded from `config` first, so the
    /// outgoing provider keeps its stored token.
    pub fn change_provider(
        &mut self,
        provider: &str,
        config: &mut Configuration,
        store: &ConfigStore,
    ) -> Result<()> {
        if !self.open {
            self.load_fields(config);
        }
        let mut next = config.clone();
        next.select(provider)?;
        let outgoing = config.selected.clone();
        next.set_token(&outgoing, self.token_field.clone())?;
        store.save(&next)?;

        *config = next;
        self.load_fields(config);
        Ok(())
    }

    /// Write the token field to the selected provider, persist, and close.
    ///
    /// Fails with [`ParleyError::SettingsClosed`] when the panel is not open.
    pub fn save(&mut self, config: &mut Configuration, store: &ConfigStore) -> Result<()> {
        if !self.open {
            return Err(ParleyError::SettingsClosed);
        }
        let mut next = config.clone();
        let selected = next.selected.clone();
        next.set_token(&selected, self.token_field.clone())?;
        next.select(&self.provider_field)?;
        store.save(&next)?;

        *config = next;
        self.close();
        Ok(())
    }

    fn load_fields(&mut self, config: &Configuration) {
        self.provider_field = config.selected.clone();
        self.token_field = config.selected_token().to_string();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;
    use std::sync::Arc;

    const NAMES: [&str; 5] = ["DeepSeek", "Gemini", "OpenAI", "Claude", "XAI"];

    fn fixture() -> (ConfigStore, Configuration) {
        let store = ConfigStore::new(Arc::new(MemoryStorage::new()), NAMES);
        let config = store.load();
        (store, config)
    }

    #[test]
    fn open_populates_fields() {
        let (_store, mut config) = fixture();
        config.set_token("DeepSeek", "ds-key").unwrap();

        let mut panel = SettingsPanel::new();
        assert!(!panel.is_open());
        panel.open(&config);

        assert!(panel.is_open());
        assert_eq!(panel.provider_field(), "DeepSeek");
        assert_eq!(panel.token_field(), "ds-key");
    }

    #[test]
    fn select_set_token_save_persists() {
        let (store, mut config) = fixture();
        let mut panel = SettingsPanel::new();
        panel.open(&config);

        panel.change_provider("Claude", &mut config, &store).unwrap();
        panel.set_token_field("sk-ant");
        panel.save(&mut config, &store).unwrap();

        assert!(!panel.is_open());
        let loaded = store.load();
        assert_eq!(loaded.selected, "Claude");
        assert_eq!(loaded.token("Claude"), Some("sk-ant"));
        for other in NAMES.iter().filter(|n| **n != "Claude") {
            assert_eq!(loaded.token(other), Some(""), "{other} must be unchanged");
        }
        assert_eq!(loaded, config);
    }

    #[test]
    fn change_provider_keeps_outgoing_token_and_shows_incoming() {
        let (store, mut config) = fixture();
        config.set_token("Gemini", "g-key").unwrap();

        let mut panel = SettingsPanel::new();
        panel.open(&config);
        panel.set_token_field("ds-typed");

        panel.change_provider("Gemini", &mut config, &store).unwrap();

        assert_eq!(panel.provider_field(), "Gemini");
        assert_eq!(panel.token_field(), "g-key");
        let loaded = store.load();
        assert_eq!(loaded.token("DeepSeek"), Some("ds-typed"));
        assert_eq!(loaded.selected, "Gemini");
    }

    #[test]
    fn change_to_unknown_provider_is_rejected_without_side_effects() {
        let (store, mut config) = fixture();
        let before = config.clone();
        let mut panel = SettingsPanel::new();
        panel.open(&config);
        panel.set_token_field("typed");

        let err = panel
            .change_provider("Mystery", &mut config, &store)
            .unwrap_err();
        assert!(matches!(err, ParleyError::UnknownProvider(_)));
        assert_eq!(config, before);
        assert_eq!(panel.token_field(), "typed");
        assert_eq!(store.load(), before);
    }

    #[test]
    fn empty_token_is_accepted() {
        let (store, mut config) = fixture();
        config.set_token("DeepSeek", "old").unwrap();
        store.save(&config).unwrap();

        let mut panel = SettingsPanel::new();
        panel.open(&config);
        panel.set_token_field("");
        panel.save(&mut config, &store).unwrap();

        assert_eq!(store.load().token("DeepSeek"), Some(""));
    }

    #[test]
    fn close_discards_unsaved_field() {
        let (store, mut config) = fixture();
        let mut panel = SettingsPanel::new();
        panel.open(&config);
        panel.set_token_field("never saved");
        panel.close();

        assert!(!panel.is_open());
        assert_eq!(panel.token_field(), "");

        let err = panel.save(&mut config, &store).unwrap_err();
        assert!(matches!(err, ParleyError::SettingsClosed));
        assert_eq!(config.selected_token(), "");
        assert_eq!(store.load().selected_token(), "");
        assert!(store.try_load().unwrap().is_none());

        panel.open(&config);
        assert_eq!(panel.token_field(), "");
    }

    #[test]
    fn save_on_unopened_panel_is_rejected() {
        let (store, mut config) = fixture();
        let mut panel = SettingsPanel::new();
        panel.set_token_field("typed blind");

        assert!(matches!(
            panel.save(&mut config, &store),
            Err(ParleyError::SettingsClosed)
        ));
        assert_eq!(config.selected_token(), "");
        assert!(store.try_load().unwrap().is_none());
    }

    #[test]
    fn change_provider_on_closed_panel_keeps_stored_token() {
        let (store, mut config) = fixture();
        config.set_token("DeepSeek", "ds-key").unwrap();
        config.set_token("Claude", "sk-ant").unwrap();
        store.save(&config).unwrap();

        let mut panel = SettingsPanel::new();
        panel.change_provider("Claude", &mut config, &store).unwrap();

        assert!(!panel.is_open());
        assert_eq!(panel.token_field(), "sk-ant");
        let loaded = store.load();
        assert_eq!(loaded.selected, "Claude");
        assert_eq!(loaded.token("DeepSeek"), Some("ds-key"));
        assert_eq!(loaded.token("Claude"), Some("sk-ant"));
    }

    #[test]
    fn change_provider_after_close_ignores_discarded_edit() {
        let (store, mut config) = fixture();
        config.set_token("DeepSeek", "ds-key").unwrap();
        store.save(&config).unwrap();

        let mut panel = SettingsPanel::new();
        panel.open(&config);
        panel.set_token_field("abandoned");
        panel.close();
        panel.change_provider("OpenAI", &mut config, &store).unwrap();

        assert_eq!(store.load().token("DeepSeek"), Some("ds-key"));
    }
}
