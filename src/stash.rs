/// Persisted stashes in `storage.local`
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::Result;
use crate::host::{KeyValueStore, TabHost};
use crate::tab_data::{Stash, StashId, Tab, WindowId};

/// The stored collection, in creation order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StashCollection {
    pub stashes: Vec<Stash>,
}

impl StashCollection {
    pub fn new() -> Self {
        StashCollection::default()
    }

    pub fn push(&mut self, stash: Stash) {
        self.stashes.push(stash);
    }

    pub fn remove(&mut self, stash_id: StashId) -> bool {
        let original_len = self.stashes.len();
        self.stashes.retain(|s| s.id != stash_id);
        self.stashes.len() < original_len
    }

    pub fn get(&self, stash_id: StashId) -> Option<&Stash> {
        self.stashes.iter().find(|s| s.id == stash_id)
    }

    /// "<prefix> N" where N is one more than the current count
    pub fn next_name(&self, prefix: &str) -> String {
        format!("{} {}", prefix, self.stashes.len() + 1)
    }

    /// `now`, bumped past the newest stored id so ids stay unique when two
    /// stashes land in the same millisecond
    pub fn next_id(&self, now: StashId) -> StashId {
        match self.stashes.iter().map(|s| s.id).max() {
            Some(latest) if latest >= now => latest + 1,
            _ => now,
        }
    }
}

/// Where a restored stash opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreTarget {
    Window(WindowId),
    NewWindow,
}

/// Read-modify-write access to the stash collection
///
/// Writes are not guarded against concurrent writers; the last write wins.
pub struct StashStore<K> {
    store: K,
    key: String,
    name_prefix: String,
}

impl<K: KeyValueStore> StashStore<K> {
    pub fn new(store: K, settings: &Settings) -> Self {
        StashStore {
            store,
            key: settings.stash_storage_key.clone(),
            name_prefix: settings.stash_name_prefix.clone(),
        }
    }

    /// Current collection; a missing key is an empty collection
    pub async fn load(&self) -> Result<StashCollection> {
        Ok(self
            .store
            .get::<StashCollection>(&self.key)
            .await?
            .unwrap_or_default())
    }

    async fn write(&self, collection: &StashCollection) -> Result<()> {
        self.store.set(&self.key, collection).await
    }

    /// Capture a window's tabs as a new stash and persist it
    pub async fn save(&self, window_tabs: &[Tab], now: StashId) -> Result<Stash> {
        let mut collection = self.load().await?;
        let stash = Stash::capture(
            collection.next_id(now),
            collection.next_name(&self.name_prefix),
            window_tabs,
        );
        collection.push(stash.clone());
        self.write(&collection).await?;
        log::info!("Saved {} ({} tabs)", stash.name, stash.tabs.len());
        Ok(stash)
    }

    /// Append a stash built by the caller
    pub async fn insert(&self, stash: Stash) -> Result<()> {
        let mut collection = self.load().await?;
        log::info!("Saved {} ({} tabs)", stash.name, stash.tabs.len());
        collection.push(stash);
        self.write(&collection).await
    }

    /// Remove a stash; an unknown id leaves storage untouched
    pub async fn delete(&self, stash_id: StashId) -> Result<bool> {
        let mut collection = self.load().await?;
        if !collection.remove(stash_id) {
            log::debug!("Stash {} not found, nothing to delete", stash_id);
            return Ok(false);
        }
        self.write(&collection).await?;
        Ok(true)
    }

    /// Reopen a stored stash's URLs; the stash itself is kept
    ///
    /// Returns how many tabs were opened, or `None` for an unknown id.
    pub async fn restore<T: TabHost>(
        &self,
        tabs: &T,
        stash_id: StashId,
        target: RestoreTarget,
    ) -> Result<Option<usize>> {
        let collection = self.load().await?;
        let Some(stash) = collection.get(stash_id) else {
            log::warn!("Stash {} not found, nothing to restore", stash_id);
            return Ok(None);
        };
        open_stash(tabs, stash, target).await.map(Some)
    }
}

/// Open every URL of a stash, one host call per tab
///
/// A tab that fails to open is logged and skipped.
async fn open_stash<T: TabHost>(tabs: &T, stash: &Stash, target: RestoreTarget) -> Result<usize> {
    match target {
        RestoreTarget::NewWindow => {
            if stash.tabs.is_empty() {
                return Ok(0);
            }
            tabs.create_window(&stash.urls()).await?;
            Ok(stash.tabs.len())
        }
        RestoreTarget::Window(window_id) => {
            let mut opened = 0;
            for tab in &stash.tabs {
                match tabs.create_tab(&tab.url, window_id).await {
                    Ok(()) => opened += 1,
                    Err(err) => log::error!("Could not restore {}: {}", tab.url, err),
                }
            }
            Ok(opened)
        }
    }
}
