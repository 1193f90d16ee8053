//! Encode/decode `CdsObject` rows and build the write-path SQL for them
//! (SPEC_FULL.md §4.5, "_addUpdateObject" in the original).
//!
//! Like the rest of this core, statements are built as literal SQL text
//! through the dialect's quoting rules rather than bound parameters — the
//! same approach the original `SQLDatabase` takes, and the reason the
//! dialect owns all literal escaping.

use crate::dialect::SqlDialect;
use crate::driver::Driver;
use crate::error::{CdsError, Result};
use crate::model::{
    add_location_prefix, strip_location_prefix, CdsObject, ObjectFlags, ObjectHeader, ObjectId,
    ObjectType,
};
use crate::row::SqlRow;
use crate::schema::OBJECT_TABLE;

fn type_and_flags(obj: &CdsObject) -> (u32, u32) {
    (obj.object_type().bits(), obj.header().flags.bits())
}

fn optional_int_sql(dialect: &dyn SqlDialect, v: Option<i64>) -> String {
    match v {
        Some(v) => dialect.quote_int(v),
        None => "NULL".to_string(),
    }
}

fn optional_str_sql(dialect: &dyn SqlDialect, v: Option<&str>) -> String {
    match v {
        Some(v) => dialect.quote_str(v),
        None => "NULL".to_string(),
    }
}

/// Build the `INSERT` statement for a new object. The caller is responsible
/// for running it through a driver with `want_last_id = true` to recover
/// the assigned id.
pub fn insert_object_sql(dialect: &dyn SqlDialect, obj: &CdsObject) -> String {
    let header = obj.header();
    let (object_type, flags) = type_and_flags(obj);
    let update_id = match obj {
        CdsObject::Container { update_id, .. } => *update_id,
        _ => 0,
    };
    format!(
        "INSERT INTO {table} (parent_id, ref_id, object_type, upnp_class, dc_title, location, mime_type, update_id, flags, service_id) \
         VALUES ({parent_id}, {ref_id}, {object_type}, {upnp_class}, {title}, {location}, {mime}, {update_id}, {flags}, {service_id})",
        table = dialect.quote_identifier(OBJECT_TABLE),
        parent_id = dialect.quote_int(header.parent_id.to_raw()),
        ref_id = optional_int_sql(dialect, header.ref_id.map(ObjectId::to_raw)),
        upnp_class = dialect.quote_str(&header.upnp_class),
        title = dialect.quote_str(&header.title),
        location = dialect.quote_str(&add_location_prefix(&header.location)),
        mime = optional_str_sql(dialect, obj.mime_type()),
        service_id = optional_str_sql(dialect, header.service_id.as_deref()),
    )
}

/// Build the `UPDATE` statement for an existing object, keyed on its id.
pub fn update_object_sql(dialect: &dyn SqlDialect, obj: &CdsObject) -> Result<String> {
    let header = obj.header();
    let id = header
        .id
        .as_persistent()
        .ok_or_else(|| CdsError::ConstraintViolation("cannot update a non-persistent object id".into()))?;
    let (object_type, flags) = type_and_flags(obj);
    let update_id = match obj {
        CdsObject::Container { update_id, .. } => *update_id,
        _ => 0,
    };
    Ok(format!(
        "UPDATE {table} SET parent_id = {parent_id}, ref_id = {ref_id}, object_type = {object_type}, \
         upnp_class = {upnp_class}, dc_title = {title}, location = {location}, mime_type = {mime}, \
         update_id = {update_id}, flags = {flags}, service_id = {service_id} WHERE id = {id}",
        table = dialect.quote_identifier(OBJECT_TABLE),
        parent_id = dialect.quote_int(header.parent_id.to_raw()),
        ref_id = optional_int_sql(dialect, header.ref_id.map(ObjectId::to_raw)),
        upnp_class = dialect.quote_str(&header.upnp_class),
        title = dialect.quote_str(&header.title),
        location = dialect.quote_str(&add_location_prefix(&header.location)),
        mime = optional_str_sql(dialect, obj.mime_type()),
        service_id = optional_str_sql(dialect, header.service_id.as_deref()),
        id = dialect.quote_int(id),
    ))
}

pub fn delete_object_sql(dialect: &dyn SqlDialect, id: i64) -> String {
    format!(
        "DELETE FROM {} WHERE id = {}",
        dialect.quote_identifier(OBJECT_TABLE),
        dialect.quote_int(id)
    )
}

/// Decode one row of the browse/search projection (`Emitter::BROWSE_COLUMNS`)
/// back into a `CdsObject`. The trailing `ref_*` columns from the self-join
/// are not needed to reconstruct the shell and are ignored here.
pub fn create_object_from_row(row: &dyn SqlRow) -> Result<CdsObject> {
    let id = ObjectId::from_raw(row.col_int(0, 0));
    let parent_id = ObjectId::from_raw(row.col_int(1, 0));
    let ref_id = if row.is_null(2) {
        None
    } else {
        Some(ObjectId::from_raw(row.col_int(2, 0)))
    };
    let object_type = ObjectType::from_bits_truncate(row.col_int(3, 0) as u32);
    let upnp_class = row.col_string(4);
    let title = row.col_string(5);
    let location = strip_location_prefix(&row.col_string(6))?;
    let mime_type = row.col(7).map(str::to_string);
    let update_id = row.col_int(8, 0);
    let flags = ObjectFlags::from_bits_truncate(row.col_int(9, 0) as u32);
    let service_id = row.col(10).map(str::to_string);

    let header = ObjectHeader {
        id,
        parent_id,
        ref_id,
        upnp_class,
        title,
        location,
        flags,
        service_id,
    };

    if object_type.contains(ObjectType::CONTAINER) {
        Ok(CdsObject::Container { header, update_id })
    } else if object_type.contains(ObjectType::ACTIVE_ITEM) {
        Ok(CdsObject::ActiveItem {
            header,
            mime_type: mime_type.unwrap_or_default(),
            action: None,
        })
    } else if object_type.contains(ObjectType::EXTERNAL_ITEM) {
        Ok(CdsObject::ExternalItem {
            header,
            mime_type: mime_type.unwrap_or_default(),
            protocol_info: None,
        })
    } else {
        Ok(CdsObject::Item {
            header,
            mime_type: mime_type.unwrap_or_default(),
        })
    }
}

/// Load a single object by id, or `None` if it doesn't exist.
pub fn load_object(driver: &dyn Driver, emitter: &crate::dialect::Emitter, id: i64) -> Result<Option<CdsObject>> {
    let mut result = driver.select(&emitter.browse_by_id(id))?;
    use crate::row::SqlResult;
    match result.next_row() {
        Some(row) => Ok(Some(create_object_from_row(&row)?)),
        None => Ok(None),
    }
}

pub fn load_object_by_service_id(
    driver: &dyn Driver,
    emitter: &crate::dialect::Emitter,
    service_id: &str,
) -> Result<Option<CdsObject>> {
    let mut result = driver.select(&emitter.browse_by_service_id(service_id))?;
    use crate::row::SqlResult;
    match result.next_row() {
        Some(row) => Ok(Some(create_object_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Reject a reference to an object that is itself a reference, or to one
/// that does not exist. The model disallows chained references (SPEC_FULL.md
/// §3: "reference id, if set, points to an existing object of compatible
/// type").
pub fn check_ref_id(driver: &dyn Driver, emitter: &crate::dialect::Emitter, ref_id: i64) -> Result<CdsObject> {
    let target = load_object(driver, emitter, ref_id)?
        .ok_or_else(|| CdsError::NotFound(format!("reference target object {ref_id}")))?;
    if target.ref_id().is_some() {
        return Err(CdsError::ConstraintViolation(format!(
            "object {ref_id} is itself a reference; chained references are not allowed"
        )));
    }
    Ok(target)
}
