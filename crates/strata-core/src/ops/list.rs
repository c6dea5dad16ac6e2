//! Listing index entries.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::index::{compile_all, resolve, DepthPolicy, DirectoryMatch, Entry, IndexStore};

/// Output format for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    /// One path per line.
    #[default]
    Text,
    /// A JSON array of entries.
    Json,
}

impl FromStr for ListFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ListFormat::Text),
            "json" => Ok(ListFormat::Json),
            other => Err(CoreError::ConfigParse(format!("unknown list format {other:?}"))),
        }
    }
}

impl fmt::Display for ListFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListFormat::Text => "text",
            ListFormat::Json => "json",
        })
    }
}

/// Lists the entries selected by `specs`, sorted by path.
///
/// A spec naming a directory lists its contents; wildcards list their
/// matches. With no specs the dataset root is listed. `policy` controls how
/// far below each match the listing reaches.
///
/// # Errors
///
/// - [`CoreError::OutsideRoot`] / [`CoreError::InvalidPattern`] if any spec
///   cannot be compiled; nothing is listed.
/// - [`CoreError::Store`] if the index cannot be read.
pub fn list_index<S, P>(
    store: &S,
    root: &Path,
    specs: &[P],
    policy: DepthPolicy,
) -> CoreResult<Vec<Entry>>
where
    S: IndexStore + ?Sized,
    P: AsRef<Path>,
{
    let patterns = compile_all(root, specs)?;
    resolve(store, &patterns, policy, DirectoryMatch::Open)
}

/// Renders entries in the requested format.
pub fn format_entries(entries: &[Entry], format: ListFormat) -> CoreResult<String> {
    match format {
        ListFormat::Text => Ok(entries
            .iter()
            .map(|entry| format!("{}\n", entry.path))
            .collect()),
        ListFormat::Json => Ok(serde_json::to_string(entries)?),
    }
}
