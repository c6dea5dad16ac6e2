//! Shared fixtures for unit tests.

use crate::index::entry::{Entry, EntryKind};
use crate::index::path::IndexPath;
use crate::index::store::{IndexStore, SqliteIndex};

/// Dataset root the fixture paths are resolved against.
pub const FIXTURE_ROOT: &str = "/data/fixture";

const DIRECTORIES: [&str; 5] = ["pics", "pics/pics2", "pics2", "pics2/pics", "pics2/pics/pics2"];

const FILES: [&str; 19] = [
    "1JI_0064.JPG",
    "1JI_0065.JPG",
    "pics.JPG",
    "pics/IMG_20160826_181302.jpg",
    "pics/IMG_20160826_181305.jpg",
    "pics/IMG_20160826_181309.jpg",
    "pics/IMG_20160826_181314.jpg",
    "pics/IMG_20160826_181317.jpg",
    "pics/pics2/IMG_20160826_181305.jpg",
    "pics/pics2/IMG_20160826_181309.jpg",
    "pics2/IMG_20160826_181305.jpg",
    "pics2/IMG_20160826_181309.jpg",
    "pics2/pics/IMG_20160826_181302.jpg",
    "pics2/pics/IMG_20160826_181305.jpg",
    "pics2/pics/IMG_20160826_181309.jpg",
    "pics2/pics/IMG_20160826_181314.jpg",
    "pics2/pics/IMG_20160826_181317.jpg",
    "pics2/pics/pics2/IMG_20160826_181305.jpg",
    "pics2/pics/pics2/IMG_20160826_181309.jpg",
];

/// An in-memory index with 24 entries: 19 files in 5 nested directories.
pub fn fixture_index() -> SqliteIndex {
    let entries: Vec<Entry> = DIRECTORIES
        .iter()
        .map(|p| (p, EntryKind::Directory))
        .chain(FILES.iter().map(|p| (p, EntryKind::File)))
        .map(|(p, kind)| Entry::new(IndexPath::parse(p).expect("fixture path"), kind))
        .collect();

    let mut index = SqliteIndex::open_in_memory().expect("in-memory index");
    index.upsert(&entries).expect("seed fixture");
    index
}
