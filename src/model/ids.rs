//! Id types and bitmasks for the object tree (SPEC_FULL.md §3, §9).

use bitflags::bitflags;

/// The fixed id of the root container. Never deleted (invariant 7 in SPEC_FULL.md §8).
pub const ROOT_ID: i64 = 0;

bitflags! {
    /// Object-type bitmask. Multiple bits may be set (e.g. an active item is
    /// also an item).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObjectType: u32 {
        const CONTAINER     = 0b0001;
        const ITEM          = 0b0010;
        const EXTERNAL_ITEM = 0b0100;
        const ACTIVE_ITEM   = 0b1000;
    }
}

bitflags! {
    /// Per-object flags bitmask. Meanings beyond "persistent container" are
    /// owned by collaborators outside this core; the store only persists
    /// and bulk-clears them (`clear_flag_in_db`, SPEC_FULL.md §10).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u32 {
        const RESTRICTED        = 0b0000_0001;
        const SEARCHABLE        = 0b0000_0010;
        const PERSISTENT_CONTAINER = 0b0000_0100;
        const PLAYLIST_REF      = 0b0000_1000;
    }
}

/// Dynamic containers never reach the object table; they live behind a
/// tagged id so a bare integer crossing the public API never gets confused
/// with a persisted object id (SPEC_FULL.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectId {
    /// A row in `mt_cds_object`.
    Persistent(i64),
    /// An in-memory container materialized from a saved search, never
    /// written to the object table.
    Synthetic(i64),
}

impl ObjectId {
    /// Round-trips through the sign-overloaded representation the original
    /// C++ excerpt and the UPnP wire protocol both use: synthetic ids are
    /// negative, persistent ids (including the root) are non-negative.
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            ObjectId::Synthetic(-raw)
        } else {
            ObjectId::Persistent(raw)
        }
    }

    pub fn to_raw(self) -> i64 {
        match self {
            ObjectId::Persistent(id) => id,
            ObjectId::Synthetic(id) => -id,
        }
    }

    pub fn is_root(self) -> bool {
        matches!(self, ObjectId::Persistent(ROOT_ID))
    }

    pub fn is_synthetic(self) -> bool {
        matches!(self, ObjectId::Synthetic(_))
    }

    pub fn as_persistent(self) -> Option<i64> {
        match self {
            ObjectId::Persistent(id) => Some(id),
            ObjectId::Synthetic(_) => None,
        }
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip() {
        for raw in [-42_i64, -1, 0, 1, 42] {
            let id = ObjectId::from_raw(raw);
            assert_eq!(id.to_raw(), raw);
        }
    }

    #[test]
    fn root_is_persistent_zero() {
        assert!(ObjectId::from_raw(0).is_root());
        assert!(!ObjectId::from_raw(1).is_root());
        assert!(!ObjectId::from_raw(-1).is_root());
    }

    #[test]
    fn synthetic_ids_are_negative_on_the_wire() {
        let id = ObjectId::Synthetic(7);
        assert_eq!(id.to_raw(), -7);
        assert!(id.is_synthetic());
    }

    #[test]
    fn object_type_bits_compose() {
        let t = ObjectType::ITEM | ObjectType::ACTIVE_ITEM;
        assert!(t.contains(ObjectType::ITEM));
        assert!(t.contains(ObjectType::ACTIVE_ITEM));
        assert!(!t.contains(ObjectType::CONTAINER));
    }
}
