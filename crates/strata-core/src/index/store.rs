//! Persistent entry storage.
//!
//! The resolution engine talks to storage only through [`IndexStore`]:
//! point lookup, `LIKE` lookup, prefix (subtree) lookup, and batched
//! writes. [`SqliteIndex`] is the SQLite-backed implementation.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::entry::Entry;
use super::path::IndexPath;
use super::pattern::escape_like;
use crate::error::CoreResult;

const SCHEMA_VERSION: u32 = 1;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS entries (
    path TEXT PRIMARY KEY NOT NULL,
    type TEXT NOT NULL,
    depth INTEGER NOT NULL,
    size INTEGER NOT NULL DEFAULT 0,
    modified INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS ix_entries_depth ON entries (depth);
CREATE TABLE IF NOT EXISTS attributes (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
";

const ENTRY_COLUMNS: &str = "path, type, depth, size, modified";

/// Query and mutation capabilities the core needs from storage.
///
/// Implementations assume exclusive access for the duration of one call;
/// callers serialize concurrent use.
pub trait IndexStore {
    /// Point lookup by exact path.
    fn get(&self, path: &IndexPath) -> CoreResult<Option<Entry>>;

    /// Entries whose path satisfies `like` (a `LIKE` pattern using `\` as
    /// escape), optionally limited to `depth <= max_depth`.
    fn find_matching(&self, like: &str, max_depth: Option<u32>) -> CoreResult<Vec<Entry>>;

    /// Entries strictly below `dir`, optionally limited to
    /// `depth <= max_depth`. For the root this is every entry.
    fn find_descendants(&self, dir: &IndexPath, max_depth: Option<u32>)
        -> CoreResult<Vec<Entry>>;

    /// Inserts or replaces `entries` in one unit of work.
    fn upsert(&mut self, entries: &[Entry]) -> CoreResult<()>;

    /// Deletes `paths` in one unit of work. Returns the number of rows removed.
    fn delete(&mut self, paths: &[IndexPath]) -> CoreResult<usize>;

    /// Total number of entries.
    fn count(&self) -> CoreResult<usize>;
}

/// SQLite-backed index.
#[derive(Debug)]
pub struct SqliteIndex {
    conn: Connection,
}

impl SqliteIndex {
    /// Opens (or creates) the index database at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> CoreResult<Self> {
        let db_path = db_path.as_ref();
        tracing::debug!("opening index at {}", db_path.display());
        Self::with_connection(Connection::open(db_path)?)
    }

    /// Opens a transient in-memory index.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> CoreResult<Self> {
        // Path matching is byte-wise; SQLite's LIKE folds ASCII case unless told otherwise.
        conn.pragma_update(None, "case_sensitive_like", true)?;
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(Self { conn })
    }

    /// Reads a dataset attribute.
    pub fn attribute(&self, key: &str) -> CoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM attributes WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Writes (or replaces) a dataset attribute.
    pub fn set_attribute(&mut self, key: &str, value: &str) -> CoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO attributes (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn query_entries(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> CoreResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, entry_from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        path: IndexPath::from_stored(row.get(0)?),
        kind: row.get(1)?,
        depth: row.get(2)?,
        size: row.get::<_, i64>(3)? as u64,
        modified: row.get(4)?,
    })
}

impl IndexStore for SqliteIndex {
    fn get(&self, path: &IndexPath) -> CoreResult<Option<Entry>> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE path = ?1"),
                [path.as_str()],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn find_matching(&self, like: &str, max_depth: Option<u32>) -> CoreResult<Vec<Entry>> {
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM entries
                 WHERE path LIKE ?1 ESCAPE '\\' AND (?2 IS NULL OR depth <= ?2)
                 ORDER BY path"
            ),
            params![like, max_depth],
        )
    }

    fn find_descendants(
        &self,
        dir: &IndexPath,
        max_depth: Option<u32>,
    ) -> CoreResult<Vec<Entry>> {
        if dir.is_root() {
            return self.query_entries(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries
                     WHERE (?1 IS NULL OR depth <= ?1)
                     ORDER BY path"
                ),
                params![max_depth],
            );
        }
        let prefix = format!("{}/%", escape_like(dir.as_str()));
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM entries
                 WHERE path LIKE ?1 ESCAPE '\\' AND depth > ?2 AND (?3 IS NULL OR depth <= ?3)
                 ORDER BY path"
            ),
            params![prefix, dir.depth(), max_depth],
        )
    }

    fn upsert(&mut self, entries: &[Entry]) -> CoreResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT OR REPLACE INTO entries ({ENTRY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"
            ))?;
            for entry in entries {
                stmt.execute(params![
                    entry.path.as_str(),
                    entry.kind,
                    entry.depth,
                    entry.size as i64,
                    entry.modified,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete(&mut self, paths: &[IndexPath]) -> CoreResult<usize> {
        let tx = self.conn.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare_cached("DELETE FROM entries WHERE path = ?1")?;
            for path in paths {
                removed += stmt.execute([path.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    fn count(&self) -> CoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::entry::EntryKind;
    use tempfile::TempDir;

    fn p(s: &str) -> IndexPath {
        IndexPath::parse(s).unwrap()
    }

    fn seeded() -> SqliteIndex {
        let mut index = SqliteIndex::open_in_memory().unwrap();
        index
            .upsert(&[
                Entry::new(p("a"), EntryKind::Directory),
                Entry::new(p("a/x.txt"), EntryKind::File),
                Entry::new(p("a/b"), EntryKind::Directory),
                Entry::new(p("a/b/y.txt"), EntryKind::File),
                Entry::new(p("ab.txt"), EntryKind::File),
                Entry::new(p("A_1.txt"), EntryKind::File),
            ])
            .unwrap();
        index
    }

    fn paths(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn get_by_exact_path() {
        let index = seeded();
        let entry = index.get(&p("a/x.txt")).unwrap().unwrap();
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.depth, 1);
        assert!(index.get(&p("a/missing")).unwrap().is_none());
    }

    #[test]
    fn find_matching_respects_depth() {
        let index = seeded();
        assert_eq!(
            paths(&index.find_matching("a%", None).unwrap()),
            vec!["a", "a/b", "a/b/y.txt", "a/x.txt", "ab.txt"]
        );
        assert_eq!(
            paths(&index.find_matching("a%", Some(0)).unwrap()),
            vec!["a", "ab.txt"]
        );
    }

    #[test]
    fn find_matching_is_case_sensitive() {
        let index = seeded();
        assert_eq!(paths(&index.find_matching("A%", None).unwrap()), vec!["A_1.txt"]);
    }

    #[test]
    fn find_matching_honours_escape() {
        let index = seeded();
        assert_eq!(paths(&index.find_matching("A\\_%", None).unwrap()), vec!["A_1.txt"]);
        assert!(index.find_matching("a\\_%", None).unwrap().is_empty());
    }

    #[test]
    fn find_descendants_of_directory() {
        let index = seeded();
        assert_eq!(
            paths(&index.find_descendants(&p("a"), None).unwrap()),
            vec!["a/b", "a/b/y.txt", "a/x.txt"]
        );
        assert_eq!(
            paths(&index.find_descendants(&p("a"), Some(1)).unwrap()),
            vec!["a/b", "a/x.txt"]
        );
    }

    #[test]
    fn find_descendants_of_root() {
        let index = seeded();
        assert_eq!(index.find_descendants(&IndexPath::root(), None).unwrap().len(), 6);
        assert_eq!(
            paths(&index.find_descendants(&IndexPath::root(), Some(0)).unwrap()),
            vec!["A_1.txt", "a", "ab.txt"]
        );
    }

    #[test]
    fn upsert_replaces_payload() {
        let mut index = seeded();
        let mut entry = Entry::new(p("ab.txt"), EntryKind::File);
        entry.size = 42;
        index.upsert(&[entry]).unwrap();

        assert_eq!(index.count().unwrap(), 6);
        assert_eq!(index.get(&p("ab.txt")).unwrap().unwrap().size, 42);
    }

    #[test]
    fn delete_counts_rows() {
        let mut index = seeded();
        let removed = index.delete(&[p("a/x.txt"), p("nope")]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(index.count().unwrap(), 5);
    }

    #[test]
    fn attributes_round_trip() {
        let mut index = seeded();
        assert_eq!(index.attribute("tag").unwrap(), None);
        index.set_attribute("tag", "org/ds").unwrap();
        index.set_attribute("tag", "org/ds2").unwrap();
        assert_eq!(index.attribute("tag").unwrap().as_deref(), Some("org/ds2"));
    }

    #[test]
    fn persists_across_sessions() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("index.sqlite");

        {
            let mut index = SqliteIndex::open(&db_path).unwrap();
            index
                .upsert(&[Entry::new(p("persist.txt"), EntryKind::File)])
                .unwrap();
        }

        let index = SqliteIndex::open(&db_path).unwrap();
        assert!(index.get(&p("persist.txt")).unwrap().is_some());
    }
}
