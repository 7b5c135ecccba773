use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::fs_store::FsStore;
use crate::memory_store::MemoryStore;
use crate::settings::Settings;

// Raw listing record produced by a store backend, before annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    pub updated_at: u64,
}

/// Uniform interface over the file store backing a workspace.
///
/// Implemented by the local filesystem backend and by the in-memory backend
/// used for demo mode and tests. The backend is selected once at startup via
/// [`create_store`]; everything above this trait is backend-agnostic.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Ask the user for a folder. `Ok(None)` means the picker was cancelled.
    async fn pick_folder(&self) -> StoreResult<Option<PathBuf>>;

    /// List the direct children of `folder`. Dotfiles are never surfaced.
    async fn list_entries(&self, folder: &Path) -> StoreResult<Vec<RawEntry>>;

    /// Read a file as UTF-8 text. Fails with `NotFound` when absent.
    async fn read_file(&self, path: &Path) -> StoreResult<String>;

    /// Write `content` to `path`, replacing any previous content. A
    /// concurrent read observes either the old or the new content, never a
    /// partial write.
    async fn write_file(&self, path: &Path, content: &str) -> StoreResult<()>;

    /// Delete the file (or directory tree) at `path`.
    async fn delete_file(&self, path: &Path) -> StoreResult<()>;

    /// Rename `old_path` to `new_path`. Fails with `AlreadyExists` when the
    /// target is occupied and `NotFound` when the source is absent.
    async fn rename_file(&self, old_path: &Path, new_path: &Path) -> StoreResult<()>;

    /// Whether anything exists at `path`.
    async fn exists(&self, path: &Path) -> bool;
}

// Select the store backend once at startup; no runtime branching elsewhere.
pub fn create_store(settings: &Settings) -> Arc<dyn FileStore> {
    if settings.use_mock_store {
        Arc::new(MemoryStore::with_demo_notes())
    } else {
        Arc::new(FsStore::new())
    }
}

// Current instant as epoch millis, 0 when the clock is unavailable.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
