//! ChangedContainers — result bundle from a mutating call (SPEC_FULL.md §3, §4.6).

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedContainers {
    /// Containers whose update id was bumped.
    pub upnp_update_ids: BTreeSet<i64>,
    /// Containers that became empty as a side effect and were purged.
    pub purged: BTreeSet<i64>,
}

impl ChangedContainers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.upnp_update_ids.is_empty() && self.purged.is_empty()
    }

    pub fn merge(&mut self, other: ChangedContainers) {
        self.upnp_update_ids.extend(other.upnp_update_ids);
        self.purged.extend(other.purged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_unions_both_sets() {
        let mut a = ChangedContainers {
            upnp_update_ids: [1, 2].into_iter().collect(),
            purged: [2].into_iter().collect(),
        };
        let b = ChangedContainers {
            upnp_update_ids: [2, 3].into_iter().collect(),
            purged: [4].into_iter().collect(),
        };
        a.merge(b);
        assert_eq!(a.upnp_update_ids, [1, 2, 3].into_iter().collect());
        assert_eq!(a.purged, [2, 4].into_iter().collect());
    }

    #[test]
    fn default_is_empty() {
        assert!(ChangedContainers::new().is_empty());
    }
}
