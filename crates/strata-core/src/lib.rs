//! Strata core library: a path index for dataset directories.
//!
//! `strata-core` records the files and directories of a dataset tree in an
//! embedded SQLite index and answers add / remove / list requests against
//! it using glob-style path patterns. It has no user interface; the
//! `strata` binary (`strata-cli`) and the async [`dispatch::Dispatcher`]
//! are thin layers on top.
//!
//! # Modules
//!
//! - [`index`] — canonical index paths, pattern compilation, the store trait
//!   and its SQLite implementation, and the resolution engine.
//! - [`ops`] — add, remove and list over any [`index::IndexStore`].
//! - [`dataset`] — the on-disk dataset layout (`.strata/index.sqlite`) and tags.
//! - [`dispatch`] — per-dataset serialized async entry points with callbacks.
//! - [`config`] — TOML user configuration.
//! - [`error`] — unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod config;
pub mod dataset;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod ops;

#[cfg(test)]
mod testing;

pub use config::settings::Config;
pub use dataset::{qualified_tag, validate_tag, Dataset, DATASET_DIR, INDEX_FILE};
pub use dispatch::{AddOptions, Dispatcher, ListOptions};
pub use error::{CoreError, CoreResult};
pub use index::{
    get_index_path_list, normalize, DepthPolicy, DirectoryMatch, Entry, EntryKind, IndexPath,
    IndexStore, PathPattern, SqliteIndex,
};
pub use ops::{add_to_index, format_entries, list_index, remove_from_index, ListFormat};

/// Normalises a string to NFC (composed) form.
///
/// macOS reports filenames in NFD (decomposed); storing every path segment
/// composed keeps lookups stable across platforms.
pub fn nfc_string(s: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    s.nfc().collect()
}
