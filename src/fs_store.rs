use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::fs;

use crate::error::{StoreError, StoreResult};
use crate::store::{FileStore, RawEntry};

type FolderPicker = Box<dyn Fn() -> Option<PathBuf> + Send + Sync>;

/// Store backend over the local filesystem, addressed by absolute paths.
///
/// The native folder dialog belongs to the shell; it is injected as a
/// callback via [`FsStore::with_picker`]. Without one, `pick_folder`
/// reports cancellation.
pub struct FsStore {
    picker: Option<FolderPicker>,
}

impl FsStore {
    pub fn new() -> Self {
        Self { picker: None }
    }

    pub fn with_picker(picker: impl Fn() -> Option<PathBuf> + Send + Sync + 'static) -> Self {
        Self {
            picker: Some(Box::new(picker)),
        }
    }
}

impl Default for FsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileStore for FsStore {
    async fn pick_folder(&self) -> StoreResult<Option<PathBuf>> {
        Ok(self.picker.as_ref().and_then(|picker| picker()))
    }

    async fn list_entries(&self, folder: &Path) -> StoreResult<Vec<RawEntry>> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(folder).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }

            let metadata = entry.metadata().await?;
            let updated_at = metadata
                .modified()
                .unwrap_or(SystemTime::now())
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64;

            entries.push(RawEntry {
                name,
                path: entry.path(),
                is_directory: metadata.is_dir(),
                updated_at,
            });
        }

        Ok(entries)
    }

    async fn read_file(&self, path: &Path) -> StoreResult<String> {
        fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::from_io(path, e))
    }

    async fn write_file(&self, path: &Path, content: &str) -> StoreResult<()> {
        // Stage to a hidden sibling, then rename into place: readers see the
        // old or the new content, never a partial write.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;
        let staging = path.with_file_name(format!(".{}.tmp", file_name));

        fs::write(&staging, content)
            .await
            .map_err(|e| StoreError::from_io(&staging, e))?;
        fs::rename(&staging, path)
            .await
            .map_err(|e| StoreError::from_io(path, e))
    }

    async fn delete_file(&self, path: &Path) -> StoreResult<()> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| StoreError::from_io(path, e))?;

        if metadata.is_dir() {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        }
        .map_err(|e| StoreError::from_io(path, e))
    }

    async fn rename_file(&self, old_path: &Path, new_path: &Path) -> StoreResult<()> {
        if !self.exists(old_path).await {
            return Err(StoreError::NotFound(old_path.to_path_buf()));
        }
        if self.exists(new_path).await {
            return Err(StoreError::AlreadyExists(new_path.to_path_buf()));
        }
        fs::rename(old_path, new_path)
            .await
            .map_err(|e| StoreError::from_io(old_path, e))
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }
}
