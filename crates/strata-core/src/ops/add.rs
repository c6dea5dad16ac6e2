//! Adding filesystem paths to the index.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dataset::DATASET_DIR;
use crate::error::{CoreError, CoreResult};
use crate::index::path::absolute;
use crate::index::{normalize, Entry, IndexPath, IndexStore};
use crate::nfc_string;

/// Adds `paths` (and every ancestor directory between them and `root`) to
/// the index. With `recursive`, directories named in `paths` are walked and
/// everything below them is added too.
///
/// Entries already present are replaced with fresh metadata. Symlinks are
/// recorded as generic entries and never followed. The dataset's own
/// `.strata` directory is skipped.
///
/// Every path is stat'ed before anything is written: a single missing or
/// unreadable path aborts the batch and leaves the store untouched.
///
/// Returns the written entries, sorted by path.
///
/// # Errors
///
/// - [`CoreError::OutsideRoot`] / [`CoreError::InvalidPattern`] for bad paths.
/// - [`CoreError::NotFound`] / [`CoreError::PermissionDenied`] when a path
///   cannot be read.
/// - [`CoreError::Store`] if the write fails.
pub fn add_to_index<S, P>(
    store: &mut S,
    root: &Path,
    paths: &[P],
    recursive: bool,
) -> CoreResult<Vec<Entry>>
where
    S: IndexStore + ?Sized,
    P: AsRef<Path>,
{
    let root = absolute(root)?;

    // Index keys are NFC; on-disk names keep whatever form the filesystem has,
    // so every stat goes through the caller's (cleaned) path.
    let mut targets: BTreeMap<IndexPath, PathBuf> = BTreeMap::new();
    let mut walk_roots: Vec<(IndexPath, PathBuf)> = Vec::new();
    for raw in paths {
        let index_path = normalize(&root, raw.as_ref())?;
        let on_disk = absolute(raw.as_ref())?;
        for dir in on_disk
            .ancestors()
            .filter(|dir| *dir != root.as_path() && dir.starts_with(&root))
        {
            targets.insert(normalize(&root, dir)?, dir.to_path_buf());
        }
        if recursive {
            walk_roots.push((index_path, on_disk));
        }
    }

    let mut collected: BTreeMap<IndexPath, Entry> = BTreeMap::new();
    for (path, on_disk) in targets {
        if is_reserved(&path) {
            tracing::warn!("skipping {path}: inside the dataset directory");
            continue;
        }
        let metadata = fs::symlink_metadata(&on_disk).map_err(|e| CoreError::from_io(e, &on_disk))?;
        collected.insert(path.clone(), Entry::from_metadata(path, &metadata));
    }

    for (path, on_disk) in walk_roots {
        let is_dir = path.is_root() || collected.get(&path).is_some_and(Entry::is_dir);
        if is_dir && !is_reserved(&path) {
            walk_directory(&on_disk, &path, &mut collected)?;
        }
    }

    let entries: Vec<Entry> = collected.into_values().collect();
    if entries.is_empty() {
        return Ok(entries);
    }
    store.upsert(&entries)?;
    tracing::info!(added = entries.len(), recursive, "added entries to index");
    Ok(entries)
}

fn is_reserved(path: &IndexPath) -> bool {
    path.as_str()
        .split('/')
        .next()
        .is_some_and(|first| first == DATASET_DIR)
}

fn walk_directory(
    fs_dir: &Path,
    dir: &IndexPath,
    out: &mut BTreeMap<IndexPath, Entry>,
) -> CoreResult<()> {
    let read_dir = fs::read_dir(fs_dir).map_err(|e| CoreError::from_io(e, fs_dir))?;

    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|e| CoreError::from_io(e, fs_dir))?;
        let file_name = dir_entry.file_name();
        let Some(name) = file_name.to_str() else {
            tracing::warn!("skipping non UTF-8 name in {}", fs_dir.display());
            continue;
        };

        let path = dir.join(&nfc_string(name));
        if is_reserved(&path) {
            continue;
        }

        let fs_path = dir_entry.path();
        // DirEntry::metadata does not traverse symlinks.
        let metadata = dir_entry
            .metadata()
            .map_err(|e| CoreError::from_io(e, &fs_path))?;
        let entry = Entry::from_metadata(path.clone(), &metadata);
        let descend = entry.is_dir();
        out.insert(path.clone(), entry);

        if descend {
            walk_directory(&fs_path, &path, out)?;
        }
    }
    Ok(())
}
