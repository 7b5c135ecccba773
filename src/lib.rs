//! Workspace core for an offline, folder-backed markdown notes app.
//!
//! The desktop shell consumes this crate through [`WorkspaceSession`]; the
//! store backend behind it is picked once at startup with [`create_store`].

pub mod config;
pub mod error;
pub mod fs_store;
pub mod index;
pub mod memory_store;
pub mod session;
pub mod settings;
pub mod store;

pub use config::{ConfigStore, FolderConfig, CONFIG_FILE};
pub use error::{StoreError, StoreResult};
pub use fs_store::FsStore;
pub use index::{sort_entries, Entry, WorkspaceIndex};
pub use memory_store::MemoryStore;
pub use session::WorkspaceSession;
pub use settings::{load_settings, save_settings, settings_path, Settings, ThemeMode, ViewMode};
pub use store::{create_store, FileStore, RawEntry};
