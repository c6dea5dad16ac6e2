//! Resolution of compiled patterns into ordered sets of index entries.
//!
//! [`resolve`] is shared by listing and removal. It matches each pattern,
//! expands matched directories according to a [`DepthPolicy`], deduplicates,
//! and returns entries in byte-wise path order. Because hierarchy lives in
//! the path strings, that single sort yields parent-before-child output
//! without walking a tree.

use std::collections::BTreeMap;

use super::entry::Entry;
use super::path::IndexPath;
use super::pattern::{PathPattern, Wildcard};
use super::store::IndexStore;
use crate::error::CoreResult;

/// How far below a match resolution reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthPolicy {
    recursive: bool,
    max_depth: i32,
}

impl DepthPolicy {
    /// `max_depth < 0` means unbounded; it is ignored when not `recursive`.
    #[must_use]
    pub fn new(recursive: bool, max_depth: i32) -> Self {
        Self {
            recursive,
            max_depth,
        }
    }

    /// Non-recursive: directories are opened one level, wildcards are not expanded.
    #[must_use]
    pub fn shallow() -> Self {
        Self::new(false, 0)
    }

    /// Every descendant at every depth.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(true, -1)
    }

    /// Whether the policy is recursive.
    #[must_use]
    pub fn recursive(&self) -> bool {
        self.recursive
    }

    /// Levels reached below a pattern's own level; `None` is unbounded.
    #[must_use]
    pub fn extra_levels(&self) -> Option<u32> {
        if !self.recursive {
            Some(0)
        } else if self.max_depth < 0 {
            None
        } else {
            Some(self.max_depth as u32)
        }
    }
}

impl Default for DepthPolicy {
    fn default() -> Self {
        Self::shallow()
    }
}

/// What an exact pattern naming a directory selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryMatch {
    /// The directory's contents, as `ls dir` shows them.
    Open,
    /// The directory itself together with its contents.
    Include,
}

/// Resolves `patterns` against `store`.
///
/// An empty pattern list opens the dataset root. The result holds each entry
/// once, sorted by path.
pub fn resolve<S: IndexStore + ?Sized>(
    store: &S,
    patterns: &[PathPattern],
    policy: DepthPolicy,
    mode: DirectoryMatch,
) -> CoreResult<Vec<Entry>> {
    let mut found = BTreeMap::new();

    if patterns.is_empty() {
        open_directory(store, &IndexPath::root(), policy, &mut found)?;
    }

    for pattern in patterns {
        match pattern {
            PathPattern::Exact(path) => resolve_exact(store, path, policy, mode, &mut found)?,
            PathPattern::Wildcard(wildcard) => {
                resolve_wildcard(store, wildcard, policy, &mut found)?
            }
        }
    }

    tracing::debug!(
        patterns = patterns.len(),
        matched = found.len(),
        "resolved path patterns"
    );
    Ok(found.into_values().collect())
}

type Found = BTreeMap<IndexPath, Entry>;

fn insert(found: &mut Found, entry: Entry) {
    found.entry(entry.path.clone()).or_insert(entry);
}

fn resolve_exact<S: IndexStore + ?Sized>(
    store: &S,
    path: &IndexPath,
    policy: DepthPolicy,
    mode: DirectoryMatch,
    found: &mut Found,
) -> CoreResult<()> {
    if path.is_root() {
        return open_directory(store, path, policy, found);
    }

    match store.get(path)? {
        None => tracing::debug!("no entry matches {path}"),
        Some(entry) if entry.is_dir() => {
            open_directory(store, path, policy, found)?;
            if mode == DirectoryMatch::Include {
                insert(found, entry);
            }
        }
        Some(entry) => insert(found, entry),
    }
    Ok(())
}

/// Adds the contents of `dir`. Direct children are always reached, even when
/// the policy adds no extra levels.
fn open_directory<S: IndexStore + ?Sized>(
    store: &S,
    dir: &IndexPath,
    policy: DepthPolicy,
    found: &mut Found,
) -> CoreResult<()> {
    let limit = policy
        .extra_levels()
        .map(|levels| dir.child_depth() + levels.max(1) - 1);
    collect_descendants(store, dir, limit, found)
}

fn resolve_wildcard<S: IndexStore + ?Sized>(
    store: &S,
    wildcard: &Wildcard,
    policy: DepthPolicy,
    found: &mut Found,
) -> CoreResult<()> {
    let limit = policy.extra_levels().map(|levels| wildcard.depth() + levels);

    let matches: Vec<Entry> = store
        .find_matching(wildcard.like(), limit)?
        .into_iter()
        .filter(|entry| wildcard.matches(entry.path.as_str()))
        .collect();

    for entry in matches {
        if entry.is_dir() {
            collect_descendants(store, &entry.path, limit, found)?;
        }
        insert(found, entry);
    }
    Ok(())
}

fn collect_descendants<S: IndexStore + ?Sized>(
    store: &S,
    dir: &IndexPath,
    limit: Option<u32>,
    found: &mut Found,
) -> CoreResult<()> {
    if limit.is_some_and(|limit| limit < dir.child_depth()) {
        return Ok(());
    }
    for entry in store.find_descendants(dir, limit)? {
        if entry.path.is_descendant_of(dir) {
            insert(found, entry);
        }
    }
    Ok(())
}
