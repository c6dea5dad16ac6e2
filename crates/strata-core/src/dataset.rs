//! On-disk datasets.
//!
//! A dataset is a directory tree whose root holds a `.strata` directory
//! with the index database inside. Every path the index stores is relative
//! to that root.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::index::path::absolute;
use crate::index::{DepthPolicy, Entry, IndexStore, SqliteIndex};
use crate::ops::{add_to_index, list_index, remove_from_index};

/// Name of the per-dataset metadata directory.
pub const DATASET_DIR: &str = ".strata";

/// Name of the index database inside [`DATASET_DIR`].
pub const INDEX_FILE: &str = "index.sqlite";

const TAG_KEY: &str = "tag";

/// An opened dataset: its root directory and index.
#[derive(Debug)]
pub struct Dataset {
    root: PathBuf,
    index: SqliteIndex,
}

impl Dataset {
    /// Creates `<directory>/.strata/index.sqlite` and returns the canonical
    /// path of the `.strata` directory.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if `directory` does not exist.
    /// - [`CoreError::AlreadyInitialized`] if it already holds a dataset.
    pub fn init(directory: &Path) -> CoreResult<PathBuf> {
        let root = fs::canonicalize(directory).map_err(|e| CoreError::from_io(e, directory))?;
        if !root.is_dir() {
            return Err(CoreError::NotFound(root));
        }

        let meta_dir = root.join(DATASET_DIR);
        if meta_dir.exists() {
            return Err(CoreError::AlreadyInitialized(root));
        }
        fs::create_dir(&meta_dir).map_err(|e| CoreError::from_io(e, &meta_dir))?;
        SqliteIndex::open(meta_dir.join(INDEX_FILE))?;

        tracing::info!("initialized dataset at {}", root.display());
        Ok(meta_dir)
    }

    /// Opens the dataset rooted at `root`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotADataset`] if `root` holds no index.
    pub fn open(root: &Path) -> CoreResult<Self> {
        let root = absolute(root)?;
        let db_path = index_path(&root);
        if !db_path.is_file() {
            return Err(CoreError::NotADataset(root));
        }
        let index = SqliteIndex::open(&db_path)?;
        tracing::debug!("opened dataset at {}", root.display());
        Ok(Self { root, index })
    }

    /// Opens the nearest dataset at or above `start`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotADataset`] if no ancestor holds an index.
    pub fn find(start: &Path) -> CoreResult<Self> {
        let start = absolute(start)?;
        match start.ancestors().find(|dir| index_path(dir).is_file()) {
            Some(root) => Self::open(root),
            None => Err(CoreError::NotADataset(start)),
        }
    }

    /// The dataset root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The underlying index.
    pub fn index(&self) -> &SqliteIndex {
        &self.index
    }

    /// See [`add_to_index`].
    pub fn add<P: AsRef<Path>>(&mut self, paths: &[P], recursive: bool) -> CoreResult<Vec<Entry>> {
        add_to_index(&mut self.index, &self.root, paths, recursive)
    }

    /// See [`remove_from_index`].
    pub fn remove<P: AsRef<Path>>(&mut self, paths: &[P]) -> CoreResult<Vec<Entry>> {
        remove_from_index(&mut self.index, &self.root, paths)
    }

    /// See [`list_index`].
    pub fn list<P: AsRef<Path>>(&self, paths: &[P], policy: DepthPolicy) -> CoreResult<Vec<Entry>> {
        list_index(&self.index, &self.root, paths, policy)
    }

    /// Number of indexed entries.
    pub fn len(&self) -> CoreResult<usize> {
        self.index.count()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// The stored tag, if one was set.
    pub fn tag(&self) -> CoreResult<Option<String>> {
        self.index.attribute(TAG_KEY)
    }

    /// Validates and stores the dataset tag.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidTag`] unless `tag` is `org/dataset` or
    /// `registry/org/dataset` with non-empty, whitespace-free parts.
    pub fn set_tag(&mut self, tag: &str) -> CoreResult<()> {
        validate_tag(tag)?;
        self.index.set_attribute(TAG_KEY, tag)?;
        tracing::info!(tag, "dataset tag set");
        Ok(())
    }
}

fn index_path(root: &Path) -> PathBuf {
    root.join(DATASET_DIR).join(INDEX_FILE)
}

/// Checks the `[registry/]org/dataset` shape of a tag.
pub fn validate_tag(tag: &str) -> CoreResult<()> {
    let parts: Vec<&str> = tag.split('/').collect();
    let well_formed = matches!(parts.len(), 2 | 3)
        && parts
            .iter()
            .all(|part| !part.is_empty() && !part.chars().any(char::is_whitespace));
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::InvalidTag(tag.to_string()))
    }
}

/// Prefixes `registry` unless the tag already names one.
#[must_use]
pub fn qualified_tag(tag: &str, registry: &str) -> String {
    if tag.split('/').count() >= 3 {
        tag.to_string()
    } else {
        format!("{registry}/{tag}")
    }
}
