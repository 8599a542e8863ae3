use std::sync::Arc;

use parley_types::{Configuration, ParleyError, Result};

use crate::KeyValueStorage;

/// Storage key holding the serialized [`Configuration`].
pub const CONFIG_KEY: &str = "chatConfig";

/// Loads and saves the [`Configuration`] blob.
#[derive(Clone)]
pub struct ConfigStore {
    storage: Arc<dyn KeyValueStorage>,
    providers: Vec<String>,
}

impl ConfigStore {
    /// `providers` is the enumerated provider list, in default-selection order.
    pub fn new<I, S>(storage: Arc<dyn KeyValueStorage>, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            storage,
            providers: providers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    pub fn defaults(&self) -> Configuration {
        Configuration::with_providers(self.providers.iter().cloned())
    }

    /// Stored configuration, or the defaults when absent or unreadable.
    pub fn load(&self) -> Configuration {
        match self.try_load() {
            Ok(Some(config)) => config,
            Ok(None) => self.defaults(),
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default configuration");
                self.defaults()
            }
        }
    }

    /// Like [`load`](Self::load) but reports why a stored value was rejected.
    pub fn try_load(&self) -> Result<Option<Configuration>> {
        let Some(raw) = self.storage.get_item(CONFIG_KEY)? else {
            return Ok(None);
        };
        let stored = Configuration::from_json(&raw)
            .map_err(|e| ParleyError::ConfigUnreadable(e.to_string()))?;
        let names: Vec<&str> = self.providers.iter().map(String::as_str).collect();
        stored
            .normalize(&names)
            .map(Some)
            .ok_or_else(|| ParleyError::ConfigUnreadable("selected provider is not known".into()))
    }

    /// Persist the full configuration, overwriting whatever was stored.
    pub fn save(&self, config: &Configuration) -> Result<()> {
        self.storage.set_item(CONFIG_KEY, &config.to_json()?)
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
