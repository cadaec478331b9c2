//! In-process settings store.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

use super::{SettingsStore, StoreUpdate, UPDATE_CHANNEL_CAPACITY};
use crate::error::StoreError;

/// Settings kept in memory. Used by the `memory` backend and in tests.
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
    updates: broadcast::Sender<StoreUpdate>,
    writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            values: RwLock::new(HashMap::new()),
            updates,
            writes: AtomicUsize::new(0),
        }
    }

    /// A store pre-seeded with one namespace. Seeding is not counted as a write.
    pub fn with_value(namespace: impl Into<String>, value: Value) -> Self {
        let store = Self::new();
        store.values.write().insert(namespace.into(), value);
        store
    }

    /// Current value of a namespace without going through the async API.
    pub fn snapshot(&self, namespace: &str) -> Option<Value> {
        self.values.read().get(namespace).cloned()
    }

    /// Number of `save` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load(&self, namespace: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.snapshot(namespace))
    }

    async fn save(&self, namespace: &str, value: Value) -> Result<(), StoreError> {
        self.values
            .write()
            .insert(namespace.to_string(), value.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        // No subscribers is fine.
        let _ = self.updates.send(StoreUpdate {
            namespace: namespace.to_string(),
            value,
        });
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<StoreUpdate> {
        self.updates.subscribe()
    }
}
