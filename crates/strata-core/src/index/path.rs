//! Canonical index paths and the normalizer that produces them.
//!
//! Every entry in the index is keyed by an [`IndexPath`]: a root-relative,
//! `/`-separated path with no `.`/`..` segments, no leading `./` and no
//! trailing slash. [`normalize`] turns arbitrary user input (absolute or
//! relative to the current directory) into one, rejecting anything that
//! escapes the dataset root.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::nfc_string;

/// Separator used inside canonical paths, independent of the host platform.
pub const SEPARATOR: char = '/';

/// A canonical, root-relative path.
///
/// The empty path is the dataset root itself; it is never stored as an entry
/// but can be the target of a query ("list the root").
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IndexPath(String);

impl IndexPath {
    /// The dataset root.
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parses an already-canonical path string.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidPattern`] if `s` has a leading or trailing `/`,
    /// an empty segment, or a `.`/`..` segment.
    pub fn parse(s: &str) -> CoreResult<Self> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let valid = s
            .split(SEPARATOR)
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        if !valid || s.contains('\0') {
            return Err(CoreError::InvalidPattern(format!(
                "{s:?} is not a canonical index path"
            )));
        }
        Ok(Self(s.to_owned()))
    }

    /// Wraps a string the store already holds as a key.
    pub(crate) fn from_stored(s: String) -> Self {
        Self(s)
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the dataset root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of separators in the path. Top-level entries have depth `0`.
    #[must_use]
    pub fn depth(&self) -> u32 {
        separators(&self.0)
    }

    /// Depth shared by the direct children of this path.
    #[must_use]
    pub fn child_depth(&self) -> u32 {
        if self.is_root() {
            0
        } else {
            self.depth() + 1
        }
    }

    /// The last segment, or `""` for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or_default()
    }

    /// The containing directory. The parent of a top-level path is the root;
    /// the root has no parent.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(match self.0.rfind(SEPARATOR) {
            Some(idx) => Self(self.0[..idx].to_owned()),
            None => Self::root(),
        })
    }

    /// Proper ancestors, nearest first, excluding the root.
    #[must_use]
    pub fn ancestors(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(path) = current {
            if path.is_root() {
                break;
            }
            current = path.parent();
            out.push(path);
        }
        out
    }

    /// Returns a new path with `name` appended.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            Self(name.to_owned())
        } else {
            Self(format!("{}{SEPARATOR}{name}", self.0))
        }
    }

    /// Returns `true` if `self` lies strictly below `dir`.
    #[must_use]
    pub fn is_descendant_of(&self, dir: &IndexPath) -> bool {
        if dir.is_root() {
            return !self.is_root();
        }
        self.0.len() > dir.0.len()
            && self.0.starts_with(&dir.0)
            && self.0.as_bytes()[dir.0.len()] == SEPARATOR as u8
    }

    /// Resolves the path against a dataset root on disk.
    #[must_use]
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.0
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IndexPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IndexPath {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::parse(&value)
    }
}

impl From<IndexPath> for String {
    fn from(path: IndexPath) -> Self {
        path.0
    }
}

pub(crate) fn separators(s: &str) -> u32 {
    s.bytes().filter(|b| *b == SEPARATOR as u8).count() as u32
}

/// Collapses `.` and `..` components without touching the filesystem.
///
/// Symlinks are not resolved. A `..` at the filesystem root is dropped; a
/// leading `..` in a relative path is kept.
#[must_use]
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

/// Makes `path` absolute against the current directory and cleans it.
///
/// # Errors
///
/// - [`CoreError::InvalidPattern`] for an empty path.
/// - [`CoreError::Io`] if the current directory cannot be determined.
pub fn absolute(path: &Path) -> CoreResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(CoreError::InvalidPattern("empty path".to_string()));
    }
    Ok(lexical_clean(&std::path::absolute(path)?))
}

/// Canonicalizes `raw` relative to `root`.
///
/// Both arguments may be relative (to the current directory) or absolute.
/// `root/a/./b`, `root/a/../a/b` and `root/a/b` all normalize to `a/b`;
/// `root` itself normalizes to [`IndexPath::root`].
///
/// # Errors
///
/// - [`CoreError::OutsideRoot`] if `raw` resolves above `root`.
/// - [`CoreError::InvalidPattern`] if a segment is not valid UTF-8.
pub fn normalize(root: &Path, raw: &Path) -> CoreResult<IndexPath> {
    let root = absolute(root)?;
    let full = absolute(raw)?;

    let relative = match full.strip_prefix(&root) {
        Ok(rel) => rel,
        Err(_) => {
            return Err(CoreError::OutsideRoot {
                path: full.clone(),
                root,
            })
        }
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        let Component::Normal(segment) = component else {
            return Err(CoreError::InvalidPattern(format!(
                "unexpected component in {}",
                raw.display()
            )));
        };
        let segment = segment.to_str().ok_or_else(|| {
            CoreError::InvalidPattern(format!("{} is not valid UTF-8", raw.display()))
        })?;
        segments.push(nfc_string(segment));
    }

    Ok(IndexPath(segments.join("/")))
}

/// Normalizes a batch of paths for insertion into the index.
///
/// With `include_dirs`, every ancestor directory of each input (up to but
/// excluding the root) is added as well. The result is deduplicated and
/// sorted, so directories precede their contents. The root itself is never
/// part of the result.
///
/// # Errors
///
/// The first normalization failure aborts the whole batch.
pub fn get_index_path_list<P: AsRef<Path>>(
    root: &Path,
    raw_paths: &[P],
    include_dirs: bool,
) -> CoreResult<Vec<IndexPath>> {
    let mut out = BTreeSet::new();
    for raw in raw_paths {
        let path = normalize(root, raw.as_ref())?;
        if path.is_root() {
            continue;
        }
        if include_dirs {
            out.extend(path.ancestors());
        }
        out.insert(path);
    }
    Ok(out.into_iter().collect())
}
