//! Metadatum — `(object_id, key, value)` (SPEC_FULL.md §3).
//!
//! Keys are unique per object, so the dense map is the natural
//! representation; there is no separate `Metadatum` struct, matching how
//! the original excerpt's `retrieveMetadataForObject` returns
//! `std::map<std::string, std::string>`.

use std::collections::BTreeMap;

pub type Metadata = BTreeMap<String, String>;

/// Diff two metadata maps into the insert/update/delete triples the write
/// path needs (SPEC_FULL.md §4.5 "Update").
pub struct MetadataDiff {
    pub inserted: Vec<(String, String)>,
    pub updated: Vec<(String, String)>,
    pub deleted: Vec<String>,
}

pub fn diff_metadata(stored: &Metadata, desired: &Metadata) -> MetadataDiff {
    let mut inserted = Vec::new();
    let mut updated = Vec::new();
    let mut deleted = Vec::new();

    for (key, value) in desired {
        match stored.get(key) {
            None => inserted.push((key.clone(), value.clone())),
            Some(old) if old != value => updated.push((key.clone(), value.clone())),
            Some(_) => {}
        }
    }
    for key in stored.keys() {
        if !desired.contains_key(key) {
            deleted.push(key.clone());
        }
    }
    MetadataDiff {
        inserted,
        updated,
        deleted,
    }
}
