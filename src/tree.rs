//! Tree operations: container chains, path resolution, recursive removal,
//! empty-container purge, update-id propagation (SPEC_FULL.md §4.6).

use std::collections::BTreeSet;

use crate::autoscan_store;
use crate::dialect::{Emitter, SqlDialect};
use crate::driver::Driver;
use crate::error::{CdsError, Result};
use crate::model::{ChangedContainers, Location, ObjectFlags, ObjectHeader, ObjectId, CdsObject, ROOT_ID};
use crate::object_store::{self, create_object_from_row, delete_object_sql, insert_object_sql};
use crate::row::{SqlResult, SqlRow};
use crate::schema::{METADATA_TABLE, OBJECT_TABLE, RESOURCE_TABLE};

/// The path an autoscan entry should display once reattached to `id`
/// (SPEC_FULL.md §4.7).
fn location_path_of(driver: &dyn Driver, emitter: &Emitter, id: i64) -> Result<String> {
    let obj = object_store::load_object(driver, emitter, id)?
        .ok_or_else(|| CdsError::NotFound(format!("object {id}")))?;
    Ok(obj.header().location.path().to_string())
}

/// Drop `id`'s resource and metadata rows, in that order, ahead of the
/// object row itself (SPEC_FULL.md §4.6 "_removeObjects": deletion order is
/// `{resources, metadata, autoscan-for-id, object}`).
fn delete_dependent_rows(driver: &dyn Driver, dialect: &dyn SqlDialect, id: i64) -> Result<()> {
    driver.exec(
        &format!(
            "DELETE FROM {} WHERE object_id = {}",
            dialect.quote_identifier(RESOURCE_TABLE),
            dialect.quote_int(id)
        ),
        false,
    )?;
    driver.exec(
        &format!(
            "DELETE FROM {} WHERE object_id = {}",
            dialect.quote_identifier(METADATA_TABLE),
            dialect.quote_int(id)
        ),
        false,
    )?;
    Ok(())
}

/// Split a virtual path like `/Videos/Movies/2024` into its non-empty
/// segments, in order.
fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Find (or create) the chain of containers named by `path` under the
/// root, returning the id of the final (leaf) container. Existing
/// containers along the way are reused; missing ones are created with the
/// given `upnp_class` and `restricted` flag (SPEC_FULL.md §4.6
/// "add_container_chain").
pub fn add_container_chain(
    driver: &dyn Driver,
    dialect: &dyn SqlDialect,
    emitter: &Emitter,
    path: &str,
    upnp_class: &str,
    restricted: bool,
) -> Result<i64> {
    let mut parent_id = ROOT_ID;
    let mut built_path = String::new();

    for segment in path_segments(path) {
        built_path.push('/');
        built_path.push_str(segment);

        match find_child_by_title(driver, emitter, parent_id, segment)? {
            Some(existing) if existing.is_container() => {
                parent_id = existing.id().to_raw();
            }
            Some(_non_container) => {
                return Err(CdsError::ConstraintViolation(format!(
                    "path segment '{segment}' under container {parent_id} already exists and is not a container"
                )));
            }
            None => {
                let header = ObjectHeader {
                    id: ObjectId::Persistent(0),
                    parent_id: ObjectId::Persistent(parent_id),
                    ref_id: None,
                    upnp_class: upnp_class.to_string(),
                    title: segment.to_string(),
                    location: Location::Virtual(built_path.clone()),
                    flags: if restricted {
                        ObjectFlags::RESTRICTED
                    } else {
                        ObjectFlags::empty()
                    },
                    service_id: None,
                };
                let obj = CdsObject::Container { header, update_id: 0 };
                let outcome = driver.exec(&insert_object_sql(dialect, &obj), true)?;
                parent_id = outcome.last_insert_id().expect("want_last_id was requested");
            }
        }
    }

    Ok(parent_id)
}

fn find_child_by_title(
    driver: &dyn Driver,
    emitter: &Emitter,
    parent_id: i64,
    title: &str,
) -> Result<Option<CdsObject>> {
    let mut result = driver.select(&emitter.browse_by_parent(parent_id))?;
    while let Some(row) = result.next_row() {
        let obj = create_object_from_row(&row)?;
        if obj.header().title == title {
            return Ok(Some(obj));
        }
    }
    Ok(None)
}

/// Resolve a virtual path to an object id, or `None` if any segment is
/// missing.
pub fn find_object_id_by_path(driver: &dyn Driver, emitter: &Emitter, path: &str) -> Result<Option<i64>> {
    let mut current = ROOT_ID;
    for segment in path_segments(path) {
        match find_child_by_title(driver, emitter, current, segment)? {
            Some(obj) => current = obj.id().to_raw(),
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

pub fn find_object_by_path(driver: &dyn Driver, emitter: &Emitter, path: &str) -> Result<Option<CdsObject>> {
    match find_object_id_by_path(driver, emitter, path)? {
        Some(id) => object_store::load_object(driver, emitter, id),
        None => Ok(None),
    }
}

/// Count of `parent_id`'s children, with container/item filtering and an
/// option to exclude the filesystem-root pseudo-child (SPEC_FULL.md §10
/// "get_child_count"). `hide_fs_root_name`, when set, is the configured
/// filesystem-root container's title (`get_fs_root_name` in `database.rs`) —
/// the one child of `parent_id` the browse-pagination caller wants omitted.
pub fn get_child_count(
    driver: &dyn Driver,
    emitter: &Emitter,
    parent_id: i64,
    containers: bool,
    items: bool,
    hide_fs_root_name: Option<&str>,
) -> Result<usize> {
    let mut result = driver.select(&emitter.browse_by_parent(parent_id))?;
    let mut count = 0;
    while let Some(row) = result.next_row() {
        let obj = create_object_from_row(&row)?;
        if obj.is_container() {
            if !containers {
                continue;
            }
            if hide_fs_root_name == Some(obj.header().title.as_str()) {
                continue;
            }
        } else if !items {
            continue;
        }
        count += 1;
    }
    Ok(count)
}

/// Raw children of `parent_id`, optionally excluding containers
/// (SPEC_FULL.md §10 "get_objects"); the primitive the removal BFS and
/// `get_child_count` both build on.
pub fn get_objects(driver: &dyn Driver, emitter: &Emitter, parent_id: i64, without_container: bool) -> Result<Vec<CdsObject>> {
    let mut result = driver.select(&emitter.browse_by_parent(parent_id))?;
    let mut objects = Vec::new();
    while let Some(row) = result.next_row() {
        let obj = create_object_from_row(&row)?;
        if without_container && obj.is_container() {
            continue;
        }
        objects.push(obj);
    }
    Ok(objects)
}

/// The ordered chain of object ids from `id` up to (and including) the
/// root — used by UPnP `BrowsePath`-style clients (SPEC_FULL.md §10
/// "get_path_ids").
pub fn get_path_ids(driver: &dyn Driver, emitter: &Emitter, id: i64) -> Result<Vec<i64>> {
    let mut chain = vec![id];
    let mut current = id;
    while current != ROOT_ID {
        let obj = object_store::load_object(driver, emitter, current)?
            .ok_or_else(|| CdsError::NotFound(format!("object {current}")))?;
        current = obj.parent_id().to_raw();
        chain.push(current);
    }
    Ok(chain)
}

fn referencing_object_ids(driver: &dyn Driver, dialect: &dyn SqlDialect, id: i64) -> Result<Vec<i64>> {
    let sql = format!(
        "SELECT id FROM {} WHERE ref_id = {}",
        dialect.quote_identifier(OBJECT_TABLE),
        dialect.quote_int(id)
    );
    let mut result = driver.select(&sql)?;
    let mut ids = Vec::new();
    while let Some(row) = result.next_row() {
        ids.push(row.col_int(0, 0));
    }
    Ok(ids)
}

fn null_out_ref_id(driver: &dyn Driver, dialect: &dyn SqlDialect, alias_id: i64) -> Result<()> {
    driver.exec(
        &format!(
            "UPDATE {} SET ref_id = NULL WHERE id = {}",
            dialect.quote_identifier(OBJECT_TABLE),
            dialect.quote_int(alias_id)
        ),
        false,
    )?;
    Ok(())
}

/// Remove an object and, if it is a non-persistent container, everything
/// beneath it. Returns the set of containers whose update id changed and
/// the set purged as a side effect (SPEC_FULL.md §4.6, invariant 3: the
/// root is never removable).
///
/// `all` governs what happens to virtual aliases referencing `id`
/// (SPEC_FULL.md §8 scenario 2): `false` orphans them by nulling their
/// `ref_id` and leaves them in place; `true` removes them too.
pub fn remove_object(driver: &dyn Driver, dialect: &dyn SqlDialect, emitter: &Emitter, id: i64, all: bool) -> Result<ChangedContainers> {
    if id == ROOT_ID {
        return Err(CdsError::ConstraintViolation("the root container cannot be removed".into()));
    }

    let obj = object_store::load_object(driver, emitter, id)?
        .ok_or_else(|| CdsError::NotFound(format!("object {id}")))?;
    let parent_id = obj.parent_id().to_raw();

    let mut changed = ChangedContainers::new();

    for alias_id in referencing_object_ids(driver, dialect, id)? {
        if all {
            changed.merge(remove_object(driver, dialect, emitter, alias_id, all)?);
        } else {
            null_out_ref_id(driver, dialect, alias_id)?;
        }
    }

    if obj.is_container() {
        for child in get_objects(driver, emitter, id, false)? {
            changed.merge(remove_object(driver, dialect, emitter, child.id().to_raw(), all)?);
        }
    }

    let parent_location = location_path_of(driver, emitter, parent_id)?;
    delete_dependent_rows(driver, dialect, id)?;
    driver.exec(&delete_object_sql(dialect, id), false)?;
    autoscan_store::reattach_persistent_autoscans(driver, dialect, emitter, id, parent_id, &parent_location)?;
    changed.upnp_update_ids.insert(parent_id);

    changed.merge(purge_empty_containers(driver, dialect, emitter, parent_id)?);
    Ok(changed)
}

/// Walk up from `start_parent_id`, deleting every non-persistent container
/// that has become empty, stopping at the root or at the first container
/// that still has children or is flagged persistent (SPEC_FULL.md §4.6
/// "_purge_empty_containers").
pub fn purge_empty_containers(
    driver: &dyn Driver,
    dialect: &dyn SqlDialect,
    emitter: &Emitter,
    start_parent_id: i64,
) -> Result<ChangedContainers> {
    let mut changed = ChangedContainers::new();
    let mut current = start_parent_id;

    loop {
        if current == ROOT_ID {
            break;
        }
        let obj = match object_store::load_object(driver, emitter, current)? {
            Some(obj) => obj,
            None => break,
        };
        if !obj.is_container() {
            break;
        }
        if obj.header().flags.contains(ObjectFlags::PERSISTENT_CONTAINER) {
            break;
        }
        if get_child_count(driver, emitter, current, true, true, None)? > 0 {
            break;
        }

        let parent_id = obj.parent_id().to_raw();
        let parent_location = location_path_of(driver, emitter, parent_id)?;
        delete_dependent_rows(driver, dialect, current)?;
        driver.exec(&delete_object_sql(dialect, current), false)?;
        autoscan_store::reattach_persistent_autoscans(driver, dialect, emitter, current, parent_id, &parent_location)?;
        changed.purged.insert(current);
        changed.upnp_update_ids.insert(parent_id);
        current = parent_id;
    }

    Ok(changed)
}

/// Bump `update_id` for every container in `ids`, returning the set
/// actually touched (root included if present).
pub fn increment_update_ids(driver: &dyn Driver, dialect: &dyn SqlDialect, ids: &BTreeSet<i64>) -> Result<BTreeSet<i64>> {
    let table = dialect.quote_identifier(OBJECT_TABLE);
    for &id in ids {
        driver.exec(
            &format!(
                "UPDATE {table} SET update_id = update_id + 1 WHERE id = {} AND object_type & 1 = 1",
                dialect.quote_int(id)
            ),
            false,
        )?;
    }
    Ok(ids.clone())
}
