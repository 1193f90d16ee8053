//! `CdsObject` — the unit of content (SPEC_FULL.md §3 "Object").

use super::ids::{ObjectFlags, ObjectId, ObjectType};
use super::location::Location;

/// Fields common to every object variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeader {
    pub id: ObjectId,
    pub parent_id: ObjectId,
    pub ref_id: Option<ObjectId>,
    pub upnp_class: String,
    pub title: String,
    pub location: Location,
    pub flags: ObjectFlags,
    /// Non-empty for objects owned by an external service; the first
    /// character is that service's routing prefix.
    pub service_id: Option<String>,
}

/// A node in the Content Directory tree. Value-typed with cheap clone
/// semantics (SPEC_FULL.md §9: the source's shared-handle decoding is a
/// cache concern, not a lifetime one, so we do not reach for `Arc` here).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CdsObject {
    Container {
        header: ObjectHeader,
        /// Monotonic per-container counter bumped by `increment_update_ids`.
        update_id: i64,
    },
    Item {
        header: ObjectHeader,
        mime_type: String,
    },
    ExternalItem {
        header: ObjectHeader,
        mime_type: String,
        protocol_info: Option<String>,
    },
    ActiveItem {
        header: ObjectHeader,
        mime_type: String,
        action: Option<String>,
    },
}

impl CdsObject {
    pub fn header(&self) -> &ObjectHeader {
        match self {
            CdsObject::Container { header, .. }
            | CdsObject::Item { header, .. }
            | CdsObject::ExternalItem { header, .. }
            | CdsObject::ActiveItem { header, .. } => header,
        }
    }

    pub fn header_mut(&mut self) -> &mut ObjectHeader {
        match self {
            CdsObject::Container { header, .. }
            | CdsObject::Item { header, .. }
            | CdsObject::ExternalItem { header, .. }
            | CdsObject::ActiveItem { header, .. } => header,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.header().id
    }

    pub fn parent_id(&self) -> ObjectId {
        self.header().parent_id
    }

    pub fn ref_id(&self) -> Option<ObjectId> {
        self.header().ref_id
    }

    pub fn is_container(&self) -> bool {
        matches!(self, CdsObject::Container { .. })
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.header().location, Location::Virtual(_))
    }

    /// The bitmask stored in `mt_cds_object.object_type`.
    pub fn object_type(&self) -> ObjectType {
        match self {
            CdsObject::Container { .. } => ObjectType::CONTAINER,
            CdsObject::Item { .. } => ObjectType::ITEM,
            CdsObject::ExternalItem { .. } => ObjectType::ITEM | ObjectType::EXTERNAL_ITEM,
            CdsObject::ActiveItem { .. } => ObjectType::ITEM | ObjectType::ACTIVE_ITEM,
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        match self {
            CdsObject::Container { .. } => None,
            CdsObject::Item { mime_type, .. }
            | CdsObject::ExternalItem { mime_type, .. }
            | CdsObject::ActiveItem { mime_type, .. } => Some(mime_type),
        }
    }

    /// Drops the id field, for round-trip-law comparisons
    /// (`load(add(o)).without(id) == o.without(id)`, SPEC_FULL.md §8).
    pub fn without_id(&self) -> CdsObject {
        let mut clone = self.clone();
        clone.header_mut().id = ObjectId::Persistent(0);
        clone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> ObjectHeader {
        ObjectHeader {
            id: ObjectId::Persistent(5),
            parent_id: ObjectId::Persistent(1),
            ref_id: None,
            upnp_class: "object.item".to_string(),
            title: "clip.mp4".to_string(),
            location: Location::Real("/media/clip.mp4".to_string()),
            flags: ObjectFlags::empty(),
            service_id: None,
        }
    }

    #[test]
    fn item_object_type_is_item_only() {
        let obj = CdsObject::Item {
            header: header(),
            mime_type: "video/mp4".to_string(),
        };
        assert_eq!(obj.object_type(), ObjectType::ITEM);
        assert!(!obj.is_container());
    }

    #[test]
    fn active_item_carries_item_and_active_bits() {
        let obj = CdsObject::ActiveItem {
            header: header(),
            mime_type: "video/mp4".to_string(),
            action: Some("on_play".to_string()),
        };
        let t = obj.object_type();
        assert!(t.contains(ObjectType::ITEM));
        assert!(t.contains(ObjectType::ACTIVE_ITEM));
    }

    #[test]
    fn without_id_zeroes_the_id_but_keeps_everything_else() {
        let obj = CdsObject::Item {
            header: header(),
            mime_type: "video/mp4".to_string(),
        };
        let stripped = obj.without_id();
        assert_eq!(stripped.id(), ObjectId::Persistent(0));
        assert_eq!(stripped.header().title, obj.header().title);
    }
}
