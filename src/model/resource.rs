//! Resource — an addressable byte-stream view of an object (SPEC_FULL.md §3).

use std::collections::BTreeMap;

/// A dense map of attribute name to value. The defined key set is
/// schema-evolvable: migration `-> 13` adds one column per attribute the
/// `Config` collaborator declares (SPEC_FULL.md §4.4, §10).
pub type ResourceAttributes = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Stable within the owning object; determines enumeration order.
    pub ordinal: i64,
    pub attrs: ResourceAttributes,
}

impl Resource {
    pub fn new(ordinal: i64) -> Self {
        Self {
            ordinal,
            attrs: ResourceAttributes::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

/// Compact ordinals back to the contiguous set `[0, n)`, preserving
/// relative order. Invariant 4 in SPEC_FULL.md §8.
pub fn compact_ordinals(resources: &mut [Resource]) {
    resources.sort_by_key(|r| r.ordinal);
    for (i, r) in resources.iter_mut().enumerate() {
        r.ordinal = i as i64;
    }
}

/// The insert/update/delete triples the resource write path needs, keyed by
/// ordinal the same way `diff_metadata` keys by property name (SPEC_FULL.md
/// §4.5 "Update").
pub struct ResourceDiff {
    pub inserted: Vec<Resource>,
    pub updated: Vec<Resource>,
    pub deleted: Vec<i64>,
}

/// Diff two resource lists already compacted to `[0, n)` ordinals.
pub fn diff_resources(stored: &[Resource], desired: &[Resource]) -> ResourceDiff {
    let mut inserted = Vec::new();
    let mut updated = Vec::new();
    let mut deleted = Vec::new();

    for resource in desired {
        match stored.iter().find(|r| r.ordinal == resource.ordinal) {
            None => inserted.push(resource.clone()),
            Some(old) if old.attrs != resource.attrs => updated.push(resource.clone()),
            Some(_) => {}
        }
    }
    for resource in stored {
        if !desired.iter().any(|r| r.ordinal == resource.ordinal) {
            deleted.push(resource.ordinal);
        }
    }
    ResourceDiff {
        inserted,
        updated,
        deleted,
    }
}
