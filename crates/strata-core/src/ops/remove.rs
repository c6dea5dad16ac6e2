//! Removing entries from the index.

use std::path::Path;

use crate::error::CoreResult;
use crate::index::{compile_all, resolve, DepthPolicy, DirectoryMatch, Entry, IndexStore, IndexPath};

/// Removes the entries selected by `specs` and returns them, sorted by path.
///
/// A matched directory is always removed together with its whole subtree;
/// there is no partial-depth removal. A spec naming the dataset root removes
/// every entry. An empty `specs` removes nothing. All deletions happen in one
/// store transaction.
///
/// # Errors
///
/// Compilation failures abort before the store is touched; store failures
/// are returned as [`crate::CoreError::Store`].
pub fn remove_from_index<S, P>(store: &mut S, root: &Path, specs: &[P]) -> CoreResult<Vec<Entry>>
where
    S: IndexStore + ?Sized,
    P: AsRef<Path>,
{
    let patterns = compile_all(root, specs)?;
    if patterns.is_empty() {
        tracing::debug!("remove called without paths; nothing to do");
        return Ok(Vec::new());
    }

    let entries = resolve(&*store, &patterns, DepthPolicy::unbounded(), DirectoryMatch::Include)?;
    if entries.is_empty() {
        return Ok(entries);
    }

    let paths: Vec<IndexPath> = entries.iter().map(|e| e.path.clone()).collect();
    let removed = store.delete(&paths)?;
    tracing::info!(removed, "removed entries from index");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::index::SqliteIndex;
    use crate::testing::{fixture_index, FIXTURE_ROOT};

    fn remove(index: &mut SqliteIndex, specs: &[&str]) -> CoreResult<Vec<Entry>> {
        let specs: Vec<String> = specs
            .iter()
            .map(|s| format!("{FIXTURE_ROOT}/{s}"))
            .collect();
        remove_from_index(index, Path::new(FIXTURE_ROOT), &specs)
    }

    fn exists(index: &SqliteIndex, path: &str) -> bool {
        index.get(&IndexPath::parse(path).unwrap()).unwrap().is_some()
    }

    #[test]
    fn missing_file_removes_nothing() {
        let mut index = fixture_index();
        assert!(remove(&mut index, &["pics.jpg"]).unwrap().is_empty());
        assert_eq!(index.count().unwrap(), 24);
    }

    #[test]
    fn folder_removes_subtree() {
        let mut index = fixture_index();
        let removed = remove(&mut index, &["pics"]).unwrap();
        assert_eq!(removed.len(), 9);
        assert_eq!(index.count().unwrap(), 15);
        assert!(!exists(&index, "pics"));
        assert!(!exists(&index, "pics/pics2/IMG_20160826_181305.jpg"));
        assert!(exists(&index, "pics.JPG"));
        assert!(exists(&index, "pics2/pics/pics2"));
    }

    #[test]
    fn subfolder_removes_subtree() {
        let mut index = fixture_index();
        remove(&mut index, &["pics/pics2"]).unwrap();
        assert_eq!(index.count().unwrap(), 21);
        assert!(exists(&index, "pics"));
        assert!(exists(&index, "pics2/pics/pics2"));
    }

    #[test]
    fn exact_file() {
        let mut index = fixture_index();
        let removed = remove(&mut index, &["1JI_0065.JPG"]).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(!exists(&index, "1JI_0065.JPG"));
        assert_eq!(index.count().unwrap(), 23);
    }

    #[test]
    fn exact_file_in_folder() {
        let mut index = fixture_index();
        remove(&mut index, &["pics/IMG_20160826_181309.jpg"]).unwrap();
        assert!(!exists(&index, "pics/IMG_20160826_181309.jpg"));
        assert!(exists(&index, "pics/pics2/IMG_20160826_181309.jpg"));
        assert_eq!(index.count().unwrap(), 23);
    }

    #[test]
    fn file_wildcard() {
        let mut index = fixture_index();
        let removed = remove(&mut index, &["1JI*"]).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(index.count().unwrap(), 22);
    }

    #[test]
    fn wildcard_in_folder_leaves_nested_matches() {
        let mut index = fixture_index();
        let removed = remove(&mut index, &["pics/IMG*"]).unwrap();
        assert_eq!(removed.len(), 5);
        for stamp in ["181302", "181305", "181309", "181314", "181317"] {
            assert!(!exists(&index, &format!("pics/IMG_20160826_{stamp}.jpg")));
        }
        assert!(exists(&index, "pics/pics2/IMG_20160826_181305.jpg"));
        assert!(exists(&index, "pics/pics2/IMG_20160826_181309.jpg"));
    }

    #[test]
    fn dirty_dot_paths() {
        let mut index = fixture_index();
        remove(&mut index, &["./1JI_0065.JPG"]).unwrap();
        assert!(!exists(&index, "1JI_0065.JPG"));

        let mut index = fixture_index();
        remove(&mut index, &["pics/../1JI_0065.JPG"]).unwrap();
        assert!(!exists(&index, "1JI_0065.JPG"));
        assert_eq!(index.count().unwrap(), 23);
    }

    #[test]
    fn wildcard_directory_takes_subtree() {
        let mut index = fixture_index();
        remove(&mut index, &["pics2*"]).unwrap();
        assert_eq!(index.count().unwrap(), 24 - 11);
        assert!(exists(&index, "pics/pics2"));
    }

    #[test]
    fn root_removes_everything() {
        let mut index = fixture_index();
        let removed = remove_from_index(&mut index, Path::new(FIXTURE_ROOT), &[FIXTURE_ROOT]).unwrap();
        assert_eq!(removed.len(), 24);
        assert_eq!(index.count().unwrap(), 0);
    }

    #[test]
    fn empty_specs_remove_nothing() {
        let mut index = fixture_index();
        let removed = remove_from_index::<_, &str>(&mut index, Path::new(FIXTURE_ROOT), &[]).unwrap();
        assert!(removed.is_empty());
        assert_eq!(index.count().unwrap(), 24);
    }

    #[test]
    fn outside_root_aborts_whole_batch() {
        let mut index = fixture_index();
        let err = remove_from_index(
            &mut index,
            Path::new(FIXTURE_ROOT),
            &[format!("{FIXTURE_ROOT}/1JI_0064.JPG"), "/data/other/x".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::OutsideRoot { .. }));
        assert_eq!(index.count().unwrap(), 24);
    }
}
