//! The path index: canonical paths, pattern compilation, storage, and
//! the query engine that maps patterns onto stored entries.
//!
//! Hierarchy is implicit. A directory's contents are the entries whose
//! [`path::IndexPath`] starts with the directory's path plus `/`; no entry
//! points at another.

pub mod entry;
pub mod path;
pub mod pattern;
pub mod query;
pub mod store;

pub use entry::{Entry, EntryKind};
pub use path::{get_index_path_list, normalize, IndexPath};
pub use pattern::{compile_all, PathPattern, Wildcard};
pub use query::{resolve, DepthPolicy, DirectoryMatch};
pub use store::{IndexStore, SqliteIndex};
