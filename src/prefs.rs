use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::KvStore;

const PREFS_KEY: &str = "cinemood_preferences";

/// User viewing preferences, persisted under a fixed key in the same
/// store the response cache uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Preferred streaming services, lowercased service names.
    pub services: Vec<String>,
    /// Two-letter country code for availability lookups.
    pub country: String,
    /// Whether rental offers count as available.
    pub include_rentals: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            country: "us".to_string(),
            include_rentals: true,
        }
    }
}

impl Preferences {
    fn normalized(mut self) -> Self {
        self.country = self.country.trim().to_lowercase();
        if self.country.is_empty() {
            self.country = Preferences::default().country;
        }
        for service in &mut self.services {
            *service = service.trim().to_lowercase();
        }
        self.services.retain(|s| !s.is_empty());
        self
    }
}

pub struct PrefsStore {
    store: Arc<dyn KvStore>,
}

impl PrefsStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Stored preferences, or defaults when absent or unreadable.
    pub async fn load(&self) -> Preferences {
        let Some(raw) = self.store.get(PREFS_KEY).await else {
            return Preferences::default();
        };
        match serde_json::from_str(&raw) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(error = %e, "stored preferences unreadable, using defaults");
                Preferences::default()
            }
        }
    }

    /// Persist preferences, returning the normalized form that was
    /// stored. Best-effort like all cache-store writes.
    pub async fn save(&self, prefs: Preferences) -> Preferences {
        let prefs = prefs.normalized();
        match serde_json::to_string(&prefs) {
            Ok(raw) => self.store.set(PREFS_KEY, &raw).await,
            Err(e) => warn!(error = %e, "failed to serialize preferences"),
        }
        prefs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    fn prefs_store() -> PrefsStore {
        PrefsStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let store = prefs_store();
        let prefs = store.load().await;
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.country, "us");
        assert!(prefs.include_rentals);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let store = prefs_store();
        let saved = store
            .save(Preferences {
                services: vec!["netflix".into(), "hulu".into()],
                country: "gb".into(),
                include_rentals: false,
            })
            .await;

        let loaded = store.load().await;
        assert_eq!(loaded, saved);
        assert_eq!(loaded.country, "gb");
        assert!(!loaded.include_rentals);
    }

    #[tokio::test]
    async fn test_save_normalizes_input() {
        let store = prefs_store();
        let saved = store
            .save(Preferences {
                services: vec![" Netflix ".into(), "".into()],
                country: "GB".into(),
                include_rentals: true,
            })
            .await;

        assert_eq!(saved.services, vec!["netflix"]);
        assert_eq!(saved.country, "gb");
    }

    #[tokio::test]
    async fn test_corrupt_stored_value_yields_defaults() {
        let mem = Arc::new(MemoryStore::new());
        mem.set(PREFS_KEY, "not json").await;

        let store = PrefsStore::new(mem);
        assert_eq!(store.load().await, Preferences::default());
    }
}
