//! TOML-file settings store.
//!
//! Each namespace is a top-level table in the file. Edits made by other
//! processes are picked up by polling ([`FileStore::spawn_watcher`]).

use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::{SettingsStore, StoreUpdate, UPDATE_CHANNEL_CAPACITY};
use crate::error::StoreError;

/// Settings persisted in a TOML file.
pub struct FileStore {
    path: PathBuf,
    /// Last table read from or written to disk.
    cache: Mutex<toml::Table>,
    updates: broadcast::Sender<StoreUpdate>,
}

async fn read_table(path: &Path) -> Result<toml::Table, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(toml::Table::new()),
        Err(e) => Err(e.into()),
    }
}

impl FileStore {
    /// Open the store, reading the file if it exists. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let table = read_table(&path).await?;
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            cache: Mutex::new(table),
            updates,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and broadcast every namespace whose value changed.
    ///
    /// Returns the number of namespaces that changed. Namespaces removed from
    /// the file are forgotten without a notification.
    pub async fn poll(&self) -> Result<usize, StoreError> {
        let fresh = read_table(&self.path).await?;
        let mut cache = self.cache.lock().await;

        let mut changed = 0;
        for (namespace, value) in &fresh {
            if cache.get(namespace) != Some(value) {
                let value = serde_json::to_value(value)?;
                let _ = self.updates.send(StoreUpdate {
                    namespace: namespace.clone(),
                    value,
                });
                changed += 1;
            }
        }

        *cache = fresh;
        Ok(changed)
    }

    /// Poll the file every `every` until the store is dropped.
    pub fn spawn_watcher(store: &Arc<FileStore>, every: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(store);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the file was just read.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                match store.poll().await {
                    Ok(0) => {}
                    Ok(changed) => {
                        debug!(path = %store.path.display(), changed, "Settings file changed");
                    }
                    Err(e) => {
                        warn!(path = %store.path.display(), error = %e, "Failed to re-read settings file");
                    }
                }
            }
        })
    }

    async fn write_table(&self, table: &toml::Table) -> Result<(), StoreError> {
        let content = toml::to_string(table)?;
        let tmp = self.path.with_extension("toml.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileStore {
    async fn load(&self, namespace: &str) -> Result<Option<Value>, StoreError> {
        let cache = self.cache.lock().await;
        match cache.get(namespace) {
            Some(value) => Ok(Some(serde_json::to_value(value)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, namespace: &str, value: Value) -> Result<(), StoreError> {
        let mut cache = self.cache.lock().await;
        let mut table = cache.clone();
        table.insert(namespace.to_string(), toml::Value::try_from(&value)?);
        self.write_table(&table).await?;
        *cache = table;

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
