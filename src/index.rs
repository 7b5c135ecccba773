use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::{normalize_name, ConfigStore, FolderConfig};
use crate::error::{StoreError, StoreResult};
use crate::store::{now_millis, FileStore, RawEntry};

// One file or directory surfaced in the workspace list. `path` is the
// identity key; a rename replaces the entry rather than mutating it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    pub updated_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

impl Entry {
    // Pin state; None means "not yet evaluated" and sorts as unpinned.
    pub fn pinned(&self) -> bool {
        self.is_pinned.unwrap_or(false)
    }
}

// Only markdown files and directories are surfaced; everything else is
// invisible to the workspace. This is policy, not a store capability.
fn entry_visible(entry: &RawEntry) -> bool {
    entry.is_directory || entry.name.ends_with(".md")
}

/// Order entries in place: pinned first, then directories, then most
/// recently modified. The sort is stable, so entries with equal keys keep
/// their listing order.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        // Pinned files first
        if a.pinned() != b.pinned() {
            return if a.pinned() {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        // Directories first, then by date descending
        if a.is_directory != b.is_directory {
            return if a.is_directory {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        b.updated_at.cmp(&a.updated_at)
    });
}

/// Ordered, annotated entry list for the opened folder.
///
/// Every mutation is written through to the store before the in-memory list
/// changes; `refresh` replaces the list wholesale. Callers must not run
/// `refresh` concurrently with an optimistic mutation against the same
/// folder — operations are expected to be serialized by a single action
/// handler, and interleaving is only safe at the `.await` points.
pub struct WorkspaceIndex {
    store: Arc<dyn FileStore>,
    config: Arc<ConfigStore>,
    folder: Option<PathBuf>,
    entries: Vec<Entry>,
}

impl WorkspaceIndex {
    pub fn new(store: Arc<dyn FileStore>, config: Arc<ConfigStore>) -> Self {
        Self {
            store,
            config,
            folder: None,
            entries: Vec::new(),
        }
    }

    pub fn current_entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry_at(&self, path: &Path) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    // Forget the folder and its list entirely.
    pub fn clear(&mut self) {
        self.folder = None;
        self.entries.clear();
    }

    // Names of the currently pinned subset, in list order.
    fn pinned_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.pinned())
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Rebuild the list for `folder` from a fresh store listing and the
    /// folder's pin config, replacing whatever was held before.
    pub async fn refresh(&mut self, folder: &Path) -> StoreResult<Vec<Entry>> {
        let raw = self.store.list_entries(folder).await?;
        let config = self.config.load(folder).await;

        let mut entries: Vec<Entry> = raw
            .into_iter()
            .filter(entry_visible)
            .map(|raw| {
                let name = normalize_name(&raw.name);
                let is_pinned = Some(config.is_pinned(&name));
                Entry {
                    name,
                    path: raw.path,
                    is_directory: raw.is_directory,
                    updated_at: raw.updated_at,
                    is_pinned,
                }
            })
            .collect();
        sort_entries(&mut entries);

        debug!(folder = %folder.display(), count = entries.len(), "workspace refreshed");
        self.folder = Some(folder.to_path_buf());
        self.entries = entries;
        Ok(self.entries.clone())
    }

    /// Bump an entry's timestamp after a successful content write and
    /// re-sort locally, without re-querying the store. Avoids a listing
    /// round-trip per save and the reorder flicker of a lagging store clock.
    pub fn touch_on_save(&mut self, path: &Path) -> &[Entry] {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.path == path) {
            entry.updated_at = now_millis();
        }
        sort_entries(&mut self.entries);
        &self.entries
    }

    /// Flip an entry's pin state optimistically and persist the new pinned
    /// set. On a failed save the in-memory flip is kept and the error
    /// propagates so the caller can warn; the next successful save or
    /// refresh reconciles. A no-op when no folder is open or the path is
    /// not listed.
    pub async fn toggle_pin(&mut self, path: &Path) -> StoreResult<Vec<Entry>> {
        let Some(folder) = self.folder.clone() else {
            return Ok(self.entries.clone());
        };
        let flipped = match self.entries.iter_mut().find(|entry| entry.path == path) {
            Some(entry) => {
                entry.is_pinned = Some(!entry.pinned());
                true
            }
            None => false,
        };
        if !flipped {
            return Ok(self.entries.clone());
        }
        sort_entries(&mut self.entries);

        let pinned_files = self.pinned_names();
        self.config.save(&folder, FolderConfig { pinned_files }).await?;
        Ok(self.entries.clone())
    }

    /// Delete at the store, then drop the entry from the list; a pinned
    /// entry's name is also removed from the persisted pin set.
    pub async fn remove(&mut self, path: &Path) -> StoreResult<Vec<Entry>> {
        self.store.delete_file(path).await?;

        let was_pinned = match self.entries.iter().position(|entry| entry.path == path) {
            Some(pos) => self.entries.remove(pos).pinned(),
            None => false,
        };

        if was_pinned {
            if let Some(folder) = self.folder.clone() {
                let pinned_files = self.pinned_names();
                self.config.save(&folder, FolderConfig { pinned_files }).await?;
            }
        }
        Ok(self.entries.clone())
    }

    /// Create a file, then re-query the store: a new entry's sort position,
    /// timestamp and store-assigned metadata are not predictable locally.
    pub async fn insert(&mut self, folder: &Path, name: &str, content: &str) -> StoreResult<Entry> {
        let path = folder.join(name);
        self.store.write_file(&path, content).await?;
        self.refresh(folder).await?;

        let normalized = normalize_name(name);
        self.entries
            .iter()
            .find(|entry| entry.name == normalized)
            .cloned()
            .ok_or(StoreError::NotFound(path))
    }

    /// Rename at the store, migrate the pin annotation, then re-query. The
    /// annotation is substituted old→new in the persisted set before the
    /// refresh — re-adding under the new name would leave the stale name
    /// behind, and refreshing first would derive pin state from it.
    pub async fn rename(&mut self, path: &Path, new_name: &str) -> StoreResult<Entry> {
        let Some(entry) = self.entry_at(path) else {
            return Err(StoreError::NotFound(path.to_path_buf()));
        };
        let old_name = entry.name.clone();
        let was_pinned = entry.pinned();

        let folder = match path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => return Err(StoreError::NotFound(path.to_path_buf())),
        };
        let new_path = folder.join(new_name);

        self.store.rename_file(path, &new_path).await?;

        if was_pinned {
            let renamed = normalize_name(new_name);
            let pinned_files = self
                .pinned_names()
                .into_iter()
                .map(|name| if name == old_name { renamed.clone() } else { name })
                .collect();
            self.config.save(&folder, FolderConfig { pinned_files }).await?;
        }

        self.refresh(&folder).await?;
        self.entries
            .iter()
            .find(|entry| entry.path == new_path)
            .cloned()
            .ok_or(StoreError::NotFound(new_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE;
    use crate::memory_store::MemoryStore;

    const FOLDER: &str = "/mock";

    fn entry(name: &str, is_directory: bool, updated_at: u64, pinned: bool) -> Entry {
        Entry {
            name: name.to_string(),
            path: PathBuf::from(FOLDER).join(name),
            is_directory,
            updated_at,
            is_pinned: Some(pinned),
        }
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn setup() -> (Arc<MemoryStore>, WorkspaceIndex) {
        let store = Arc::new(MemoryStore::new());
        let file_store = Arc::clone(&store) as Arc<dyn FileStore>;
        let config = Arc::new(ConfigStore::new(Arc::clone(&file_store)));
        (store, WorkspaceIndex::new(file_store, config))
    }

    async fn sidecar_pins(store: &MemoryStore) -> Vec<String> {
        let raw = store
            .read_file(&Path::new(FOLDER).join(CONFIG_FILE))
            .await
            .unwrap();
        let config: FolderConfig = serde_json::from_str(&raw).unwrap();
        config.pinned_files
    }

    #[test]
    fn test_sort_scenario() {
        let mut entries = vec![
            entry("notes.md", false, 100, false),
            entry("todo.md", false, 50, true),
            entry("drafts", true, 200, false),
        ];
        sort_entries(&mut entries);
        assert_eq!(names(&entries), vec!["todo.md", "drafts", "notes.md"]);
    }

    #[test]
    fn test_pin_beats_type_and_recency() {
        let mut entries = vec![
            entry("dir", true, 900, false),
            entry("old-pinned.md", false, 1, true),
        ];
        sort_entries(&mut entries);
        assert_eq!(names(&entries), vec!["old-pinned.md", "dir"]);
    }

    #[test]
    fn test_directories_before_files_within_pin_state() {
        let mut entries = vec![
            entry("new.md", false, 900, false),
            entry("dir", true, 1, false),
        ];
        sort_entries(&mut entries);
        assert_eq!(names(&entries), vec!["dir", "new.md"]);
    }

    #[test]
    fn test_recency_descending_within_group() {
        let mut entries = vec![
            entry("a.md", false, 10, false),
            entry("b.md", false, 30, false),
            entry("c.md", false, 20, false),
        ];
        sort_entries(&mut entries);
        assert_eq!(names(&entries), vec!["b.md", "c.md", "a.md"]);
    }

    #[test]
    fn test_sort_is_idempotent_and_stable_on_ties() {
        let mut entries = vec![
            entry("first.md", false, 5, false),
            entry("second.md", false, 5, false),
            entry("third.md", false, 5, false),
        ];
        sort_entries(&mut entries);
        let once = entries.clone();
        sort_entries(&mut entries);
        assert_eq!(entries, once);
        // Equal keys keep listing order.
        assert_eq!(names(&entries), vec!["first.md", "second.md", "third.md"]);
    }

    #[tokio::test]
    async fn test_refresh_filters_and_annotates() {
        let (store, mut index) = setup();
        store.seed_file_at("/mock/notes.md", "# Notes", 100);
        store.seed_file_at("/mock/todo.md", "# Todo", 50);
        store.seed_file_at("/mock/image.png", "png bytes", 400);
        store.seed_file_at("/mock/drafts/wip.md", "# WIP", 200);
        store.seed_file(
            "/mock/.tauri-md.json",
            "{\"pinnedFiles\": [\"todo.md\"]}",
        );

        let entries = index.refresh(Path::new(FOLDER)).await.unwrap();

        // Non-markdown files are invisible; the sidecar never surfaces.
        assert_eq!(names(&entries), vec!["todo.md", "drafts", "notes.md"]);
        assert_eq!(entries[0].is_pinned, Some(true));
        assert_eq!(entries[2].is_pinned, Some(false));
    }

    #[tokio::test]
    async fn test_refresh_propagates_listing_failure() {
        let (store, mut index) = setup();
        store.seed_file("/mock/a.md", "# A");
        index.refresh(Path::new(FOLDER)).await.unwrap();

        store.set_fail_reads(true);
        assert!(index.refresh(Path::new(FOLDER)).await.is_err());
        // The previous list is still current until a refresh succeeds.
        assert_eq!(index.current_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_touch_on_save_reorders_without_store() {
        let (store, mut index) = setup();
        store.seed_file_at("/mock/a.md", "# A", 100);
        store.seed_file_at("/mock/b.md", "# B", 200);
        index.refresh(Path::new(FOLDER)).await.unwrap();
        assert_eq!(names(index.current_entries()), vec!["b.md", "a.md"]);

        // Even with the store unreachable the local reorder goes through.
        store.set_fail_reads(true);
        let entries = index.touch_on_save(&PathBuf::from("/mock/a.md"));
        assert_eq!(names(entries), vec!["a.md", "b.md"]);
        assert!(entries[0].updated_at > 200);
    }

    #[tokio::test]
    async fn test_toggle_pin_persists_and_survives_refresh() {
        let (store, mut index) = setup();
        store.seed_file_at("/mock/notes.md", "# Notes", 100);
        store.seed_file_at("/mock/todo.md", "# Todo", 200);
        index.refresh(Path::new(FOLDER)).await.unwrap();

        let entries = index.toggle_pin(&PathBuf::from("/mock/notes.md")).await.unwrap();
        assert_eq!(names(&entries), vec!["notes.md", "todo.md"]);
        assert_eq!(sidecar_pins(&store).await, vec!["notes.md"]);

        let entries = index.refresh(Path::new(FOLDER)).await.unwrap();
        assert_eq!(entries[0].name, "notes.md");
        assert_eq!(entries[0].is_pinned, Some(true));
    }

    #[tokio::test]
    async fn test_toggle_pin_off_removes_name() {
        let (store, mut index) = setup();
        store.seed_file("/mock/notes.md", "# Notes");
        index.refresh(Path::new(FOLDER)).await.unwrap();

        let path = PathBuf::from("/mock/notes.md");
        index.toggle_pin(&path).await.unwrap();
        index.toggle_pin(&path).await.unwrap();

        assert!(sidecar_pins(&store).await.is_empty());
        assert_eq!(index.current_entries()[0].is_pinned, Some(false));
    }

    #[tokio::test]
    async fn test_toggle_pin_keeps_optimistic_state_when_save_fails() {
        let (store, mut index) = setup();
        store.seed_file("/mock/notes.md", "# Notes");
        index.refresh(Path::new(FOLDER)).await.unwrap();

        store.set_fail_writes(true);
        let result = index.toggle_pin(&PathBuf::from("/mock/notes.md")).await;
        assert!(result.is_err());

        // The flip stays visible; only the durable write failed.
        assert_eq!(index.current_entries()[0].is_pinned, Some(true));
    }

    #[tokio::test]
    async fn test_remove_deletes_and_drops_annotation() {
        let (store, mut index) = setup();
        store.seed_file("/mock/notes.md", "# Notes");
        store.seed_file("/mock/todo.md", "# Todo");
        index.refresh(Path::new(FOLDER)).await.unwrap();

        index.toggle_pin(&PathBuf::from("/mock/notes.md")).await.unwrap();
        index.toggle_pin(&PathBuf::from("/mock/todo.md")).await.unwrap();

        let entries = index.remove(&PathBuf::from("/mock/notes.md")).await.unwrap();
        assert_eq!(names(&entries), vec!["todo.md"]);
        assert!(!store.exists(Path::new("/mock/notes.md")).await);
        assert_eq!(sidecar_pins(&store).await, vec!["todo.md"]);
    }

    #[tokio::test]
    async fn test_remove_is_write_through() {
        let (store, mut index) = setup();
        store.seed_file("/mock/notes.md", "# Notes");
        index.refresh(Path::new(FOLDER)).await.unwrap();

        store.set_fail_writes(true);
        assert!(index.remove(&PathBuf::from("/mock/notes.md")).await.is_err());

        // The delete never happened, so the entry must still be listed.
        assert_eq!(index.current_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_refreshes_and_returns_entry() {
        let (store, mut index) = setup();
        store.seed_file_at("/mock/old.md", "# Old", 100);
        index.refresh(Path::new(FOLDER)).await.unwrap();

        let created = index
            .insert(Path::new(FOLDER), "new.md", "# New File\n")
            .await
            .unwrap();
        assert_eq!(created.name, "new.md");
        assert_eq!(created.is_pinned, Some(false));
        assert_eq!(store.read_file(&created.path).await.unwrap(), "# New File\n");

        // The fresh write is newest, so it leads the unpinned files.
        assert_eq!(index.current_entries()[0].name, "new.md");
    }

    #[tokio::test]
    async fn test_rename_migrates_pin_annotation() {
        let (store, mut index) = setup();
        store.seed_file("/mock/a.md", "# A");
        store.seed_file("/mock/other.md", "# Other");
        index.refresh(Path::new(FOLDER)).await.unwrap();
        index.toggle_pin(&PathBuf::from("/mock/a.md")).await.unwrap();

        let renamed = index.rename(&PathBuf::from("/mock/a.md"), "b.md").await.unwrap();
        assert_eq!(renamed.name, "b.md");
        assert_eq!(renamed.path, PathBuf::from("/mock/b.md"));
        assert_eq!(renamed.is_pinned, Some(true));

        // Substituted, not re-added: the old name is gone from the sidecar.
        let pins = sidecar_pins(&store).await;
        assert_eq!(pins, vec!["b.md"]);

        // And a later refresh still derives the pin from the sidecar.
        let entries = index.refresh(Path::new(FOLDER)).await.unwrap();
        let entry = entries.iter().find(|e| e.name == "b.md").unwrap();
        assert_eq!(entry.is_pinned, Some(true));
        assert!(index.entry_at(Path::new("/mock/a.md")).is_none());
    }

    #[tokio::test]
    async fn test_rename_unpinned_leaves_config_alone() {
        let (store, mut index) = setup();
        store.seed_file("/mock/a.md", "# A");
        index.refresh(Path::new(FOLDER)).await.unwrap();

        index.rename(&PathBuf::from("/mock/a.md"), "b.md").await.unwrap();
        assert!(!store.exists(&Path::new(FOLDER).join(CONFIG_FILE)).await);
    }

    #[tokio::test]
    async fn test_rename_to_occupied_name_fails_cleanly() {
        let (store, mut index) = setup();
        store.seed_file("/mock/a.md", "# A");
        store.seed_file("/mock/b.md", "# B");
        index.refresh(Path::new(FOLDER)).await.unwrap();

        let err = index.rename(&PathBuf::from("/mock/a.md"), "b.md").await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));

        // Nothing moved, nothing lost.
        assert!(store.exists(Path::new("/mock/a.md")).await);
        assert_eq!(index.current_entries().len(), 2);
    }

    #[tokio::test]
    async fn test_toggle_pin_without_open_folder_is_noop() {
        let (_store, mut index) = setup();
        let entries = index.toggle_pin(&PathBuf::from("/mock/a.md")).await.unwrap();
        assert!(entries.is_empty());
    }
}
