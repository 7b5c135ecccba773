use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ConfigStore;
use crate::error::{StoreError, StoreResult};
use crate::index::{Entry, WorkspaceIndex};
use crate::store::FileStore;

// Seed content for a freshly created note.
const NEW_FILE_CONTENT: &str = "# New File\n";

/// Consumer-facing session: the currently opened folder, the selected entry
/// and the unsaved-edit state, orchestrating the index and the store in
/// response to user intents.
pub struct WorkspaceSession {
    store: Arc<dyn FileStore>,
    index: WorkspaceIndex,
    open_folder: Option<PathBuf>,
    selected: Option<Entry>,
    edited_content: String,
    saved_content: String,
}

impl WorkspaceSession {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        let config = Arc::new(ConfigStore::new(Arc::clone(&store)));
        Self::with_config(store, config)
    }

    // The config store handle can be shared so several sessions (or tests)
    // reuse one cache.
    pub fn with_config(store: Arc<dyn FileStore>, config: Arc<ConfigStore>) -> Self {
        Self {
            index: WorkspaceIndex::new(Arc::clone(&store), config),
            store,
            open_folder: None,
            selected: None,
            edited_content: String::new(),
            saved_content: String::new(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        self.index.current_entries()
    }

    pub fn open_folder_path(&self) -> Option<&Path> {
        self.open_folder.as_deref()
    }

    pub fn selected(&self) -> Option<&Entry> {
        self.selected.as_ref()
    }

    pub fn content(&self) -> &str {
        &self.edited_content
    }

    // Dirty iff an entry is selected and the buffer differs from what was
    // last read or written for it.
    pub fn is_dirty(&self) -> bool {
        self.selected.is_some() && self.edited_content != self.saved_content
    }

    /// Ask the store for a folder and open it. A cancelled picker is a
    /// no-op reported as `Ok(None)`, not a failure.
    pub async fn open_folder(&mut self) -> StoreResult<Option<Vec<Entry>>> {
        match self.store.pick_folder().await? {
            Some(path) => self.open_folder_at(&path).await.map(Some),
            None => Ok(None),
        }
    }

    /// Open a known folder directly, e.g. one restored from settings.
    pub async fn open_folder_at(&mut self, path: &Path) -> StoreResult<Vec<Entry>> {
        let entries = self.index.refresh(path).await?;
        self.open_folder = Some(path.to_path_buf());
        self.clear_selection();
        Ok(entries)
    }

    pub fn close_folder(&mut self) {
        self.open_folder = None;
        self.index.clear();
        self.clear_selection();
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.edited_content.clear();
        self.saved_content.clear();
    }

    /// Select a file entry and load its content, resetting the edit state.
    /// Selecting a directory is a no-op (navigation is not supported here).
    pub async fn select_entry(&mut self, path: &Path) -> StoreResult<Option<String>> {
        let Some(entry) = self.index.entry_at(path).cloned() else {
            return Err(StoreError::NotFound(path.to_path_buf()));
        };
        if entry.is_directory {
            return Ok(None);
        }

        let content = self.store.read_file(&entry.path).await?;
        self.selected = Some(entry);
        self.edited_content = content.clone();
        self.saved_content = content.clone();
        Ok(Some(content))
    }

    /// Replace the edit buffer.
    pub fn update_content(&mut self, content: impl Into<String>) {
        self.edited_content = content.into();
    }

    /// Write the buffer through the store and bump the entry's recency in
    /// the index. Without a selection there is nothing to save.
    pub async fn save(&mut self) -> StoreResult<()> {
        let Some(entry) = self.selected.clone() else {
            return Ok(());
        };
        self.store
            .write_file(&entry.path, &self.edited_content)
            .await?;
        self.saved_content = self.edited_content.clone();
        self.index.touch_on_save(&entry.path);
        Ok(())
    }

    /// Flip an entry's pin state; the selection mirrors the new state.
    pub async fn toggle_pin(&mut self, path: &Path) -> StoreResult<Vec<Entry>> {
        let entries = self.index.toggle_pin(path).await?;
        if let Some(selected) = self.selected.as_mut() {
            if let Some(current) = entries.iter().find(|entry| entry.path == selected.path) {
                *selected = current.clone();
            }
        }
        Ok(entries)
    }

    /// Delete an entry. If it was the selected one, the selection and edit
    /// state are cleared. (A declined confirmation prompt simply means this
    /// is never called.)
    pub async fn delete_entry(&mut self, path: &Path) -> StoreResult<Vec<Entry>> {
        let result = self.index.remove(path).await;

        // Clear the selection as soon as the entry is gone from the list,
        // even if persisting the annotation update failed.
        let removed = self.index.entry_at(path).is_none();
        if removed && self.selected.as_ref().map_or(false, |e| e.path == path) {
            self.clear_selection();
        }
        result
    }

    /// Create a markdown file in the open folder and select it. Names
    /// without a `.md` suffix get one. Without an open folder this is a
    /// no-op.
    pub async fn create_file(&mut self, name: &str) -> StoreResult<Option<Entry>> {
        let Some(folder) = self.open_folder.clone() else {
            return Ok(None);
        };
        let final_name = ensure_md_suffix(name);
        let entry = self
            .index
            .insert(&folder, &final_name, NEW_FILE_CONTENT)
            .await?;
        self.select_entry(&entry.path).await?;
        Ok(Some(entry))
    }

    /// Rename an entry, keeping the `.md` suffix when the old name had one
    /// and the new name lacks it. The selection follows a renamed entry to
    /// its new identity.
    pub async fn rename_entry(&mut self, path: &Path, new_name: &str) -> StoreResult<Entry> {
        let keeps_md = self
            .index
            .entry_at(path)
            .map_or(false, |entry| entry.name.ends_with(".md"));
        let final_name = if keeps_md {
            ensure_md_suffix(new_name)
        } else {
            new_name.to_string()
        };

        let was_selected = self.selected.as_ref().map_or(false, |e| e.path == path);
        let entry = self.index.rename(path, &final_name).await?;
        if was_selected {
            self.selected = Some(entry.clone());
        }
        Ok(entry)
    }
}

fn ensure_md_suffix(name: &str) -> String {
    if name.ends_with(".md") {
        name.to_string()
    } else {
        format!("{}.md", name)
    }
}
