use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use crate::error::StoreResult;
use crate::store::FileStore;

// Sidecar document colocated with each workspace folder. Dotfile, so the
// store never surfaces it as an entry.
pub const CONFIG_FILE: &str = ".tauri-md.json";

// Per-folder annotation document. Pins are keyed by display name, not path:
// the annotation is scoped to the containing folder and travels with the
// sidecar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FolderConfig {
    pub pinned_files: Vec<String>,
}

impl FolderConfig {
    // Membership test; duplicate names in the set are harmless.
    pub fn is_pinned(&self, name: &str) -> bool {
        self.pinned_files.iter().any(|pinned| pinned == name)
    }

    fn normalized(&self) -> Self {
        Self {
            pinned_files: self.pinned_files.iter().map(|n| normalize_name(n)).collect(),
        }
    }
}

// Canonical composed form; entry names and pin membership must agree on it.
pub(crate) fn normalize_name(name: &str) -> String {
    name.nfc().collect()
}

/// Durable pin-annotation storage with an in-memory fallback cache.
///
/// The cache is keyed by folder path and lives for the whole process: a
/// transient sidecar read failure returns the last known config instead of
/// silently dropping every pin. Sidecar I/O goes through the same store
/// handle as everything else.
pub struct ConfigStore {
    store: Arc<dyn FileStore>,
    cache: Mutex<HashMap<PathBuf, FolderConfig>>,
}

impl ConfigStore {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn config_path(folder: &Path) -> PathBuf {
        folder.join(CONFIG_FILE)
    }

    async fn try_load(&self, folder: &Path) -> StoreResult<Option<FolderConfig>> {
        let path = Self::config_path(folder);
        if !self.store.exists(&path).await {
            return Ok(None);
        }
        let content = self.store.read_file(&path).await?;
        let config: FolderConfig = serde_json::from_str(&content)?;
        Ok(Some(config.normalized()))
    }

    /// Load the pin config for `folder`. Never fails: a missing sidecar is
    /// an empty config, and a read or parse failure falls back to the
    /// cached config for this folder (empty if none was ever loaded).
    pub async fn load(&self, folder: &Path) -> FolderConfig {
        match self.try_load(folder).await {
            Ok(None) => FolderConfig::default(),
            Ok(Some(config)) => {
                let mut cache = self.cache.lock().expect("config cache mutex");
                cache.insert(folder.to_path_buf(), config.clone());
                config
            }
            Err(e) => {
                warn!(folder = %folder.display(), error = %e, "failed to load folder config");
                let cache = self.cache.lock().expect("config cache mutex");
                match cache.get(folder) {
                    Some(cached) => {
                        debug!(folder = %folder.display(), "falling back to cached folder config");
                        cached.clone()
                    }
                    None => FolderConfig::default(),
                }
            }
        }
    }

    /// Persist the pin config for `folder`. The cache is updated before the
    /// write, so in-memory state reflects the user's intent for the rest of
    /// the session even when the write fails; the failure still propagates.
    pub async fn save(&self, folder: &Path, config: FolderConfig) -> StoreResult<()> {
        let config = config.normalized();
        {
            let mut cache = self.cache.lock().expect("config cache mutex");
            cache.insert(folder.to_path_buf(), config.clone());
        }

        let content = serde_json::to_string_pretty(&config)?;
        self.store
            .write_file(&Self::config_path(folder), &content)
            .await
    }
}
