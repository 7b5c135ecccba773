use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::store::{now_millis, FileStore, RawEntry};

const MOCK_ROOT: &str = "/mock";

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    updated_at: u64,
}

/// In-memory store backend, used for demo mode and as the test double.
///
/// Files live in a flat path→content map; directory entries are derived
/// from deeper paths at list time. `pick_folder` always offers the fixed
/// root. Reads and writes can be made to fail on demand so degraded paths
/// (config cache fallback, failed annotation saves) can be exercised.
pub struct MemoryStore {
    root: PathBuf,
    files: Mutex<BTreeMap<PathBuf, MemoryFile>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_root(MOCK_ROOT)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: Mutex::new(BTreeMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    // Demo workspace shown when the app runs without a real folder.
    pub fn with_demo_notes() -> Self {
        let store = Self::new();
        store.seed_file(
            "/mock/welcome.md",
            "# Welcome\n\nThis workspace lives in memory.\n\n- [x] Test persistence\n- [ ] Try editing this file\n",
        );
        store.seed_file("/mock/notes.md", "# Notes\n\n* Buy milk\n* Walk the dog\n");
        store.seed_file("/mock/project/readme.md", "# Project\n\nThis is a nested file.\n");
        store
    }

    /// Insert a file directly, bypassing `write_file` and failure injection.
    pub fn seed_file(&self, path: impl Into<PathBuf>, content: &str) {
        self.seed_file_at(path, content, now_millis());
    }

    /// Insert a file with an explicit timestamp, for deterministic ordering
    /// in fixtures.
    pub fn seed_file_at(&self, path: impl Into<PathBuf>, content: &str, updated_at: u64) {
        self.files.lock().expect("memory store mutex").insert(
            path.into(),
            MemoryFile {
                content: content.to_string(),
                updated_at,
            },
        );
    }

    /// Make subsequent reads fail with an I/O error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes (including deletes and renames) fail with an
    /// I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Io(io::Error::other("injected failure")))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn pick_folder(&self) -> StoreResult<Option<PathBuf>> {
        Ok(Some(self.root.clone()))
    }

    async fn list_entries(&self, folder: &Path) -> StoreResult<Vec<RawEntry>> {
        self.check(&self.fail_reads)?;
        let files = self.files.lock().expect("memory store mutex");

        // Direct children become files; deeper paths surface as a single
        // directory entry stamped with the newest contained file.
        let mut dirs: BTreeMap<String, u64> = BTreeMap::new();
        let mut file_entries = Vec::new();

        for (path, file) in files.iter() {
            let Ok(rel) = path.strip_prefix(folder) else {
                continue;
            };
            let mut components = rel.components();
            let Some(first) = components.next() else {
                continue;
            };
            let name = first.as_os_str().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }

            if components.next().is_none() {
                file_entries.push(RawEntry {
                    name,
                    path: path.clone(),
                    is_directory: false,
                    updated_at: file.updated_at,
                });
            } else {
                let newest = dirs.entry(name).or_insert(0);
                *newest = (*newest).max(file.updated_at);
            }
        }

        let mut entries: Vec<RawEntry> = dirs
            .into_iter()
            .map(|(name, updated_at)| RawEntry {
                path: folder.join(&name),
                name,
                is_directory: true,
                updated_at,
            })
            .collect();
        entries.extend(file_entries);
        Ok(entries)
    }

    async fn read_file(&self, path: &Path) -> StoreResult<String> {
        self.check(&self.fail_reads)?;
        let files = self.files.lock().expect("memory store mutex");
        files
            .get(path)
            .map(|file| file.content.clone())
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    async fn write_file(&self, path: &Path, content: &str) -> StoreResult<()> {
        self.check(&self.fail_writes)?;
        self.files.lock().expect("memory store mutex").insert(
            path.to_path_buf(),
            MemoryFile {
                content: content.to_string(),
                updated_at: now_millis(),
            },
        );
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> StoreResult<()> {
        self.check(&self.fail_writes)?;
        let mut files = self.files.lock().expect("memory store mutex");

        if files.remove(path).is_some() {
            return Ok(());
        }

        // A directory is any prefix of stored paths; deleting it takes the
        // whole subtree.
        let children: Vec<PathBuf> = files
            .keys()
            .filter(|stored| stored.starts_with(path))
            .cloned()
            .collect();
        if children.is_empty() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        for child in children {
            files.remove(&child);
        }
        Ok(())
    }

    async fn rename_file(&self, old_path: &Path, new_path: &Path) -> StoreResult<()> {
        self.check(&self.fail_writes)?;
        let mut files = self.files.lock().expect("memory store mutex");

        if files.contains_key(new_path) {
            return Err(StoreError::AlreadyExists(new_path.to_path_buf()));
        }
        match files.remove(old_path) {
            Some(file) => {
                files.insert(new_path.to_path_buf(), file);
                Ok(())
            }
            None => Err(StoreError::NotFound(old_path.to_path_buf())),
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().expect("memory store mutex");
        files.contains_key(path) || files.keys().any(|stored| stored.starts_with(path))
    }
}
