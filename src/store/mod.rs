//! Settings store.
//!
//! A store keeps one JSON value per namespace and broadcasts every change.
//! [`SettingsHandle`] binds a store to the bridge's namespace and defaults
//! and speaks in [`IrcSettings`] instead of raw values.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::config::{IrcSettings, Normalized, StoredSettings};
use crate::error::StoreError;

/// Buffered updates per subscriber before it starts lagging.
pub const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// A namespace's new value, as broadcast by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreUpdate {
    pub namespace: String,
    pub value: Value,
}

/// Persistent, namespaced key-value store with change notifications.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current value of a namespace, `None` if nothing was ever stored.
    async fn load(&self, namespace: &str) -> Result<Option<Value>, StoreError>;

    /// Replace a namespace's value and notify watchers.
    async fn save(&self, namespace: &str, value: Value) -> Result<(), StoreError>;

    /// Receive every update from now on, in the order they were made.
    fn watch(&self) -> broadcast::Receiver<StoreUpdate>;
}

/// A store bound to one namespace with its defaults.
#[derive(Clone)]
pub struct SettingsHandle {
    store: Arc<dyn SettingsStore>,
    namespace: String,
    defaults: IrcSettings,
}

impl std::fmt::Debug for SettingsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsHandle")
            .field("namespace", &self.namespace)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl SettingsHandle {
    pub fn setup(
        store: Arc<dyn SettingsStore>,
        namespace: impl Into<String>,
        defaults: IrcSettings,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            defaults,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn defaults(&self) -> &IrcSettings {
        &self.defaults
    }

    /// The stored record as-is; an empty record when nothing is stored.
    pub async fn get(&self) -> Result<StoredSettings, StoreError> {
        match self.store.load(&self.namespace).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(StoredSettings::default()),
        }
    }

    /// The stored record resolved against the defaults.
    pub async fn load(&self) -> Result<Normalized, StoreError> {
        Ok(self.get().await?.normalize(&self.defaults))
    }

    pub async fn set(&self, settings: &IrcSettings) -> Result<(), StoreError> {
        let value = serde_json::to_value(StoredSettings::from(settings))?;
        self.store.save(&self.namespace, value).await
    }

    /// Subscribe to updates of this namespace. Dropping the subscription cancels it.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            namespace: self.namespace.clone(),
            defaults: self.defaults.clone(),
            rx: self.store.watch(),
        }
    }
}

/// Ordered stream of normalized updates for one namespace.
#[derive(Debug)]
pub struct Subscription {
    namespace: String,
    defaults: IrcSettings,
    rx: broadcast::Receiver<StoreUpdate>,
}

impl Subscription {
    /// Wait for the next update. `None` once the store has gone away.
    ///
    /// A subscriber that falls behind skips the oldest updates; every update
    /// is a full record, so the latest one still converges.
    pub async fn next(&mut self) -> Option<Result<Normalized, StoreError>> {
        loop {
            match self.rx.recv().await {
                Ok(update) if update.namespace == self.namespace => {
                    let normalized = serde_json::from_value::<StoredSettings>(update.value)
                        .map(|stored| stored.normalize(&self.defaults))
                        .map_err(StoreError::from);
                    return Some(normalized);
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(namespace = %self.namespace, skipped, "Settings subscriber lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handle(store: Arc<MemoryStore>) -> SettingsHandle {
        SettingsHandle::setup(store, "corsica-irc", IrcSettings::default())
    }

    #[tokio::test]
    async fn get_returns_empty_record_when_unset() {
        let handle = handle(Arc::new(MemoryStore::new()));
        assert_eq!(handle.get().await.unwrap(), StoredSettings::default());
        assert_eq!(handle.load().await.unwrap().settings, IrcSettings::default());
    }

    #[tokio::test]
    async fn set_then_load_round_trips() {
        let handle = handle(Arc::new(MemoryStore::new()));
        let settings = IrcSettings {
            nick: "corsica2".into(),
            ..IrcSettings::default()
        };
        handle.set(&settings).await.unwrap();
        let loaded = handle.load().await.unwrap();
        assert_eq!(loaded.settings, settings);
        assert!(!loaded.needs_write_back);
    }

    #[tokio::test]
    async fn subscription_filters_other_namespaces() {
        let store = Arc::new(MemoryStore::new());
        let handle = handle(store.clone());
        let mut sub = handle.subscribe();

        store
            .save("other-plugin", json!({"anything": true}))
            .await
            .unwrap();
        store
            .save("corsica-irc", json!({"channels": "#solo"}))
            .await
            .unwrap();

        let update = sub.next().await.unwrap().unwrap();
        assert_eq!(update.settings.channels, vec!["#solo"]);
        assert!(update.needs_write_back);
    }

    #[tokio::test]
    async fn subscription_reports_malformed_values() {
        let store = Arc::new(MemoryStore::new());
        let handle = handle(store.clone());
        let mut sub = handle.subscribe();

        store
            .save("corsica-irc", json!({"port": "not a number"}))
            .await
            .unwrap();

        assert!(matches!(sub.next().await, Some(Err(StoreError::Decode(_)))));
    }

    #[tokio::test]
    async fn subscription_ends_when_store_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        let mut sub = handle(store.clone()).subscribe();
        drop(store);
        assert!(sub.next().await.is_none());
    }
}
