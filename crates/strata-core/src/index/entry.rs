//! Index entry representation.

use std::fmt;
use std::time::UNIX_EPOCH;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use super::path::IndexPath;

/// What kind of filesystem object an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory. Its contents are the entries prefixed by its path.
    Directory,
    /// Anything else (symlinks, sockets, devices).
    Generic,
}

impl EntryKind {
    /// Stable name used in the store and in JSON output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Generic => "generic",
        }
    }

    /// Parses a stored kind name.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "file" => Some(EntryKind::File),
            "directory" => Some(EntryKind::Directory),
            "generic" => Some(EntryKind::Generic),
            _ => None,
        }
    }

    /// Classifies filesystem metadata. Symlinks are not followed.
    #[must_use]
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            EntryKind::Generic
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Generic
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for EntryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EntryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let name = value.as_str()?;
        EntryKind::from_name(name).ok_or_else(|| {
            FromSqlError::Other(format!("unknown entry type {name:?}").into())
        })
    }
}

/// A single row of the index.
///
/// `depth` is derived from `path` and kept alongside it so the store can
/// filter by depth without parsing paths. `size` and `modified` are opaque
/// payload: the resolution engine never looks at them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub path: IndexPath,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub depth: u32,
    /// Size in bytes. Always `0` for directories.
    pub size: u64,
    /// Last modification, seconds since the Unix epoch.
    pub modified: i64,
}

impl Entry {
    /// Creates an entry with empty payload.
    #[must_use]
    pub fn new(path: IndexPath, kind: EntryKind) -> Self {
        let depth = path.depth();
        Self {
            path,
            kind,
            depth,
            size: 0,
            modified: 0,
        }
    }

    /// Creates an entry from filesystem metadata.
    #[must_use]
    pub fn from_metadata(path: IndexPath, metadata: &std::fs::Metadata) -> Self {
        let kind = EntryKind::from_metadata(metadata);
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        Self {
            size: if kind == EntryKind::File { metadata.len() } else { 0 },
            modified,
            ..Self::new(path, kind)
        }
    }

    /// Returns `true` if this entry is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}
