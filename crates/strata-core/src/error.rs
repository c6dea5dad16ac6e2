//! Error types for `strata-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`. Every failure aborts the
//! current call; nothing is recorded in shared state.

use std::path::PathBuf;

/// Unified error type for all core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A resolved path climbs above the dataset root.
    #[error("{path} is outside of the dataset root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// A filesystem path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A path specification cannot be compiled into a pattern.
    #[error("invalid path pattern: {0}")]
    InvalidPattern(String),

    /// No index was found at (or above) the given directory.
    #[error("not a dataset: {0}")]
    NotADataset(PathBuf),

    /// `init` was called on a directory that already holds an index.
    #[error("dataset already initialized: {0}")]
    AlreadyInitialized(PathBuf),

    /// A dataset tag is malformed.
    #[error("invalid tag: {0}")]
    InvalidTag(String),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// The index store failed (I/O, corruption, locked database).
    #[error("index store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Failed to render entries as JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout `strata-core`.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Maps an I/O error on `path` to the most specific variant.
    pub(crate) fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            _ => CoreError::Io(err),
        }
    }
}
