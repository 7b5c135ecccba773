use std::path::{Path, PathBuf};

use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// Failure taxonomy shared by the store backends, config persistence and the
// workspace index. Cancellation (folder picker, confirmation prompts) is not
// an error: it is reported as an Ok(None) outcome by the operations involved.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl StoreError {
    // Map io NotFound onto the variant that carries the path.
    pub(crate) fn from_io(path: &Path, e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_path_buf())
        } else {
            StoreError::Io(e)
        }
    }
}
