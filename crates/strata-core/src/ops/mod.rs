//! Index mutations and queries: add, remove, list.
//!
//! Every operation takes a dataset root and raw path arguments, normalizes
//! them, and works through an [`IndexStore`](crate::index::IndexStore).

pub mod add;
pub mod list;
pub mod remove;

pub use add::add_to_index;
pub use list::{format_entries, list_index, ListFormat};
pub use remove::remove_from_index;
