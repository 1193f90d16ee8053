//! In-memory registry of dynamic (synthetic) containers materialized from
//! saved searches (SPEC_FULL.md §4.9). Never persisted; guarded by the same
//! mutex as the driver (SPEC_FULL.md §5).

use std::collections::BTreeMap;

use crate::dialect::search::{CompareOp, SearchValue};
use crate::dialect::SearchExpr;
use crate::model::{CdsObject, Location, ObjectFlags, ObjectHeader, ObjectId, ROOT_ID};

#[derive(Debug, Clone)]
pub struct DynamicContainer {
    pub title: String,
    pub upnp_class: String,
    pub search: SearchExpr,
}

#[derive(Debug, Default)]
pub struct DynamicContainerRegistry {
    next_id: i64,
    containers: BTreeMap<i64, DynamicContainer>,
}

impl DynamicContainerRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            containers: BTreeMap::new(),
        }
    }

    /// Register a saved search as a dynamic container, returning its
    /// (synthetic) id.
    pub fn register(&mut self, container: DynamicContainer) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        self.containers.insert(id, container);
        ObjectId::Synthetic(id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&DynamicContainer> {
        match id {
            ObjectId::Synthetic(raw) => self.containers.get(&raw),
            ObjectId::Persistent(_) => None,
        }
    }

    /// Drop a saved search from the registry entirely. Distinct from the
    /// object-removal path, which treats a synthetic id as a no-op
    /// (SPEC_FULL.md §4.9) — this is how a saved search is actually
    /// discarded by whatever manages it.
    pub fn unregister(&mut self, id: ObjectId) -> bool {
        match id {
            ObjectId::Synthetic(raw) => self.containers.remove(&raw).is_some(),
            ObjectId::Persistent(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

/// Materialize the container shell for a dynamic container (for `get_object`
/// on a synthetic id). It has no stable location of its own; the given
/// `raw_id` feeds a synthetic virtual path so two different saved searches
/// never collide.
pub fn materialize_container(raw_id: i64, container: &DynamicContainer) -> CdsObject {
    CdsObject::Container {
        header: ObjectHeader {
            id: ObjectId::Synthetic(raw_id),
            parent_id: ObjectId::Persistent(ROOT_ID),
            ref_id: None,
            upnp_class: container.upnp_class.clone(),
            title: container.title.clone(),
            location: Location::Virtual(format!("/dynamic/{raw_id}")),
            flags: ObjectFlags::empty(),
            service_id: None,
        },
        update_id: 0,
    }
}

/// Evaluate a saved search directly against an object's own fields. A
/// deliberately small property set (`dc:title`, `upnp:class`) — the UPnP
/// search grammar's full property space is the front end's concern
/// (SPEC_FULL.md §1 Non-goals); this only has to pick out a dynamic
/// container's children in process.
pub fn matches(expr: &SearchExpr, obj: &CdsObject) -> bool {
    match expr {
        SearchExpr::Compare { property, op, value } => {
            let field = match property.as_str() {
                "dc:title" => &obj.header().title,
                "upnp:class" => &obj.header().upnp_class,
                _ => return false,
            };
            let SearchValue::Str(needle) = value else { return false };
            match op {
                CompareOp::Eq => field == needle,
                CompareOp::Ne => field != needle,
                CompareOp::Contains => field.contains(needle.as_str()),
                CompareOp::StartsWith => field.starts_with(needle.as_str()),
                _ => false,
            }
        }
        SearchExpr::And(lhs, rhs) => matches(lhs, obj) && matches(rhs, obj),
        SearchExpr::Or(lhs, rhs) => matches(lhs, obj) || matches(rhs, obj),
        SearchExpr::Not(inner) => !matches(inner, obj),
    }
}
