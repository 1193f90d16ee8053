//! `CdsDatabase` — the public entry point (SPEC_FULL.md §2, §5).
//!
//! All driver and dynamic-container-map access is serialized through one
//! `Mutex`. Every public method here locks exactly once and then calls into
//! plain functions (`tree::*`, `object_store::*`, …) that take the already
//! -held driver by reference — so the "recursive mutex" the original
//! requires (write paths call read helpers mid-critical-section) never
//! needs an actual re-entrant lock: the reentrancy happens below the lock,
//! not through it (SPEC_FULL.md §9 design note).

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::autoscan_store;
use crate::config::Config;
use crate::config_store;
use crate::dialect::{Emitter, SqlDialect, SqliteDialect};
use crate::driver::{Driver, SqliteDriver};
use crate::dynamic::{self, DynamicContainer, DynamicContainerRegistry};
use crate::error::{CdsError, Result};
use crate::model::{
    AutoscanDirectory, CdsObject, ChangedContainers, ConfigValue, Metadata, ObjectId, Resource, ScanMode,
};
use crate::object_store;
use crate::row::SqlResult;
use crate::schema;
use crate::tree;

struct Inner {
    driver: SqliteDriver,
    dynamic: DynamicContainerRegistry,
}

pub struct CdsDatabase {
    inner: Mutex<Inner>,
    dialect: Arc<dyn SqlDialect>,
    emitter: Emitter,
    resource_attributes: Vec<String>,
    transactions_enabled: bool,
}

impl CdsDatabase {
    /// Open (creating if absent) the database at `config`'s path, running
    /// schema bootstrap/migration to completion before returning.
    pub fn open(config: &dyn Config) -> Result<Self> {
        Self::open_at(config.database_path(), config.resource_attributes(), config.transactions_enabled())
    }

    pub fn open_at(path: &Path, resource_attributes: &[String], transactions_enabled: bool) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::init(&conn, resource_attributes)?;

        let dialect: Arc<dyn SqlDialect> = Arc::new(SqliteDialect);
        let emitter = Emitter::new(dialect.clone());
        Ok(Self {
            inner: Mutex::new(Inner {
                driver: SqliteDriver::open(conn),
                dynamic: DynamicContainerRegistry::new(),
            }),
            dialect,
            emitter,
            resource_attributes: resource_attributes.to_vec(),
            transactions_enabled,
        })
    }

    /// An in-memory database, for tests and embedded use.
    pub fn open_in_memory(resource_attributes: &[String]) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn, resource_attributes)?;
        let dialect: Arc<dyn SqlDialect> = Arc::new(SqliteDialect);
        let emitter = Emitter::new(dialect.clone());
        Ok(Self {
            inner: Mutex::new(Inner {
                driver: SqliteDriver::open(conn),
                dynamic: DynamicContainerRegistry::new(),
            }),
            dialect,
            emitter,
            resource_attributes: resource_attributes.to_vec(),
            transactions_enabled: true,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `body` inside a named transaction when the collaborator config
    /// enables them; otherwise run it directly (SPEC_FULL.md §5).
    fn with_transaction<T>(&self, driver: &dyn Driver, name: &str, body: impl FnOnce() -> Result<T>) -> Result<T> {
        if !self.transactions_enabled {
            return body();
        }
        driver.begin(name)?;
        match body() {
            Ok(value) => {
                driver.commit(name)?;
                Ok(value)
            }
            Err(e) => {
                driver.rollback(name)?;
                Err(e)
            }
        }
    }

    // ---- object store -------------------------------------------------

    pub fn get_object(&self, id: ObjectId) -> Result<Option<CdsObject>> {
        let guard = self.lock();
        match id {
            ObjectId::Persistent(raw) => object_store::load_object(&guard.driver, &self.emitter, raw),
            ObjectId::Synthetic(raw) => Ok(guard
                .dynamic
                .get(id)
                .map(|container| dynamic::materialize_container(raw, container))),
        }
    }

    pub fn get_object_by_service_id(&self, service_id: &str) -> Result<Option<CdsObject>> {
        let guard = self.lock();
        object_store::load_object_by_service_id(&guard.driver, &self.emitter, service_id)
    }

    /// Insert a new object, bumping its parent's update id. Returns the
    /// assigned id and the set of containers whose update id changed.
    pub fn add_object(&self, obj: CdsObject) -> Result<(i64, ChangedContainers)> {
        let guard = self.lock();
        let driver: &dyn Driver = &guard.driver;

        if let Some(ref_id) = obj.ref_id() {
            object_store::check_ref_id(driver, &self.emitter, ref_id.to_raw())?;
        }

        self.with_transaction(driver, "add_object", || {
            let outcome = driver.exec(&object_store::insert_object_sql(self.dialect.as_ref(), &obj), true)?;
            let new_id = outcome.last_insert_id().expect("want_last_id was requested");

            let mut changed = BTreeSet::new();
            changed.insert(obj.parent_id().to_raw());
            let changed = tree::increment_update_ids(driver, self.dialect.as_ref(), &changed)?;

            Ok((
                new_id,
                ChangedContainers {
                    upnp_update_ids: changed,
                    purged: BTreeSet::new(),
                },
            ))
        })
    }

    pub fn update_object(&self, obj: &CdsObject) -> Result<ChangedContainers> {
        let guard = self.lock();
        let driver: &dyn Driver = &guard.driver;

        self.with_transaction(driver, "update_object", || {
            driver.exec(&object_store::update_object_sql(self.dialect.as_ref(), obj)?, false)?;
            let mut changed = BTreeSet::new();
            changed.insert(obj.parent_id().to_raw());
            let changed = tree::increment_update_ids(driver, self.dialect.as_ref(), &changed)?;
            Ok(ChangedContainers {
                upnp_update_ids: changed,
                purged: BTreeSet::new(),
            })
        })
    }

    /// Remove an object (and, recursively, its subtree if it's a
    /// non-persistent container). A synthetic id is a no-op, per SPEC_FULL.md
    /// §4.9. `all` governs virtual aliases referencing `id`: `false` orphans
    /// them (their `ref_id` is nulled out, they stay in place), `true`
    /// removes them too (SPEC_FULL.md §8 scenario 2).
    pub fn remove_object(&self, id: ObjectId, all: bool) -> Result<ChangedContainers> {
        let raw = match id {
            ObjectId::Synthetic(_) => return Ok(ChangedContainers::new()),
            ObjectId::Persistent(raw) => raw,
        };
        let guard = self.lock();
        let driver: &dyn Driver = &guard.driver;
        self.with_transaction(driver, "remove_object", || {
            tree::remove_object(driver, self.dialect.as_ref(), &self.emitter, raw, all)
        })
    }

    // ---- metadata / resources ------------------------------------------

    pub fn retrieve_metadata_for_object(&self, id: i64) -> Result<Metadata> {
        let guard = self.lock();
        let mut result = guard.driver.select(&self.emitter.metadata_query(id))?;
        use crate::row::SqlRow;
        let mut metadata = Metadata::new();
        while let Some(row) = result.next_row() {
            metadata.insert(row.col_string(0), row.col_string(1));
        }
        Ok(metadata)
    }

    /// Replace an object's metadata set with `desired`, writing only the
    /// rows that actually changed (SPEC_FULL.md §4.5 `diff_metadata`).
    pub fn update_metadata(&self, object_id: i64, desired: &Metadata) -> Result<()> {
        let guard = self.lock();
        let driver: &dyn Driver = &guard.driver;
        let stored = self.retrieve_metadata_for_object_locked(driver, object_id)?;
        let diff = crate::model::diff_metadata(&stored, desired);

        self.with_transaction(driver, "update_metadata", || {
            let table = self.dialect.quote_identifier(crate::schema::METADATA_TABLE);
            for (key, value) in diff.inserted.iter().chain(diff.updated.iter()) {
                driver.exec(
                    &format!(
                        "INSERT OR REPLACE INTO {table} (object_id, property_name, property_value) VALUES ({}, {}, {})",
                        self.dialect.quote_int(object_id),
                        self.dialect.quote_str(key),
                        self.dialect.quote_str(value),
                    ),
                    false,
                )?;
            }
            for key in &diff.deleted {
                driver.exec(
                    &format!(
                        "DELETE FROM {table} WHERE object_id = {} AND property_name = {}",
                        self.dialect.quote_int(object_id),
                        self.dialect.quote_str(key),
                    ),
                    false,
                )?;
            }
            Ok(())
        })
    }

    fn retrieve_metadata_for_object_locked(&self, driver: &dyn Driver, id: i64) -> Result<Metadata> {
        let mut result = driver.select(&self.emitter.metadata_query(id))?;
        use crate::row::SqlRow;
        let mut metadata = Metadata::new();
        while let Some(row) = result.next_row() {
            metadata.insert(row.col_string(0), row.col_string(1));
        }
        Ok(metadata)
    }

    pub fn retrieve_resources_for_object(&self, id: i64) -> Result<Vec<Resource>> {
        let guard = self.lock();
        let driver: &dyn Driver = &guard.driver;
        let mut resources = self.retrieve_resources_for_object_locked(driver, id)?;
        crate::model::compact_ordinals(&mut resources);
        Ok(resources)
    }

    fn retrieve_resources_for_object_locked(&self, driver: &dyn Driver, id: i64) -> Result<Vec<Resource>> {
        let mut result = driver.select(&self.emitter.resource_query(id, &self.resource_attributes))?;
        use crate::row::SqlRow;
        let mut resources = Vec::new();
        while let Some(row) = result.next_row() {
            let ordinal = row.col_int(0, 0);
            let mut resource = Resource::new(ordinal);
            for (i, attr) in self.resource_attributes.iter().enumerate() {
                if let Some(value) = row.col(i + 1) {
                    resource = resource.with_attr(attr.clone(), value.to_string());
                }
            }
            resources.push(resource);
        }
        Ok(resources)
    }

    /// Replace an object's resource list with `desired`, writing only the
    /// rows that actually changed, diffed by ordinal the same way
    /// `update_metadata` diffs by property name (SPEC_FULL.md §4.5, object
    /// row / metadata rows / resource rows is one logical write; this is the
    /// resource-rows component of it).
    pub fn update_resources(&self, object_id: i64, desired: &[Resource]) -> Result<()> {
        let guard = self.lock();
        let driver: &dyn Driver = &guard.driver;
        let mut desired = desired.to_vec();
        crate::model::compact_ordinals(&mut desired);
        let stored = self.retrieve_resources_for_object_locked(driver, object_id)?;
        let diff = crate::model::diff_resources(&stored, &desired);

        self.with_transaction(driver, "update_resources", || {
            let table = self.dialect.quote_identifier(crate::schema::RESOURCE_TABLE);
            for resource in diff.inserted.iter().chain(diff.updated.iter()) {
                let mut columns = vec!["object_id".to_string(), "res_id".to_string()];
                let mut values = vec![
                    self.dialect.quote_int(object_id),
                    self.dialect.quote_int(resource.ordinal),
                ];
                for attr in &self.resource_attributes {
                    columns.push(attr.clone());
                    values.push(match resource.attrs.get(attr) {
                        Some(value) => self.dialect.quote_str(value),
                        None => "NULL".to_string(),
                    });
                }
                let column_list = columns
                    .iter()
                    .map(|c| self.dialect.quote_identifier(c))
                    .collect::<Vec<_>>()
                    .join(", ");
                let value_list = values.join(", ");
                driver.exec(
                    &format!("INSERT OR REPLACE INTO {table} ({column_list}) VALUES ({value_list})"),
                    false,
                )?;
            }
            for ordinal in &diff.deleted {
                driver.exec(
                    &format!(
                        "DELETE FROM {table} WHERE object_id = {} AND res_id = {}",
                        self.dialect.quote_int(object_id),
                        self.dialect.quote_int(*ordinal),
                    ),
                    false,
                )?;
            }
            Ok(())
        })
    }

    // ---- tree operations -------------------------------------------------

    pub fn add_container_chain(&self, path: &str, upnp_class: &str, restricted: bool) -> Result<i64> {
        let guard = self.lock();
        self.with_transaction(&guard.driver, "add_container_chain", || {
            tree::add_container_chain(&guard.driver, self.dialect.as_ref(), &self.emitter, path, upnp_class, restricted)
        })
    }

    pub fn find_object_by_path(&self, path: &str) -> Result<Option<CdsObject>> {
        let guard = self.lock();
        tree::find_object_by_path(&guard.driver, &self.emitter, path)
    }

    /// Count of `parent_id`'s children. `hide_fs_root` excludes the child
    /// container whose title matches `get_fs_root_name` (SPEC_FULL.md §10).
    pub fn get_child_count(&self, parent_id: ObjectId, containers: bool, items: bool, hide_fs_root: bool) -> Result<usize> {
        let guard = self.lock();
        let driver: &dyn Driver = &guard.driver;
        let fs_root_name = if hide_fs_root {
            self.get_internal_setting_locked(driver, "fs_root_name")?
        } else {
            None
        };
        match parent_id {
            ObjectId::Persistent(raw) => {
                tree::get_child_count(driver, &self.emitter, raw, containers, items, fs_root_name.as_deref())
            }
            ObjectId::Synthetic(raw) => {
                let count = self.dynamic_children_locked(&guard, raw)?.len();
                Ok(if containers && items { count } else { 0 })
            }
        }
    }

    pub fn get_objects(&self, parent_id: ObjectId, without_container: bool) -> Result<Vec<CdsObject>> {
        let guard = self.lock();
        match parent_id {
            ObjectId::Persistent(raw) => tree::get_objects(&guard.driver, &self.emitter, raw, without_container),
            ObjectId::Synthetic(raw) => self.dynamic_children_locked(&guard, raw),
        }
    }

    fn dynamic_children_locked(&self, guard: &Inner, raw_id: i64) -> Result<Vec<CdsObject>> {
        let container = guard
            .dynamic
            .get(ObjectId::Synthetic(raw_id))
            .ok_or_else(|| CdsError::NotFound(format!("dynamic container {raw_id}")))?;
        let mut result = guard.driver.select(&self.emitter.browse_all())?;
        let mut matches = Vec::new();
        while let Some(row) = result.next_row() {
            let obj = object_store::create_object_from_row(&row)?;
            if dynamic::matches(&container.search, &obj) {
                matches.push(obj);
            }
        }
        Ok(matches)
    }

    pub fn register_dynamic_container(&self, container: DynamicContainer) -> ObjectId {
        let mut guard = self.lock();
        guard.dynamic.register(container)
    }

    pub fn get_path_ids(&self, id: i64) -> Result<Vec<i64>> {
        let guard = self.lock();
        tree::get_path_ids(&guard.driver, &self.emitter, id)
    }

    /// Count of non-container objects, filtered by virtual/real, mime type,
    /// and UPnP class. Supplemented from the original's `getTotalFiles`
    /// (SPEC_FULL.md §10).
    pub fn get_total_files(
        &self,
        is_virtual: Option<bool>,
        mime_type: Option<&str>,
        upnp_class: Option<&str>,
    ) -> Result<i64> {
        let guard = self.lock();
        let table = self.dialect.quote_identifier(schema::OBJECT_TABLE);
        let mut clauses = vec!["object_type & 1 = 0".to_string()];
        if let Some(is_virtual) = is_virtual {
            let op = if is_virtual { "=" } else { "!=" };
            clauses.push(format!("substr(location, 1, 1) {op} {}", self.dialect.quote_str("V")));
        }
        if let Some(mime_type) = mime_type {
            clauses.push(format!("mime_type = {}", self.dialect.quote_str(mime_type)));
        }
        if let Some(upnp_class) = upnp_class {
            clauses.push(format!("upnp_class = {}", self.dialect.quote_str(upnp_class)));
        }
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE {}", clauses.join(" AND "));
        let mut result = guard.driver.select(&sql)?;
        use crate::row::SqlRow;
        Ok(result.next_row().map(|r| r.col_int(0, 0)).unwrap_or(0))
    }

    /// All persisted object ids whose `service_id` starts with
    /// `service_prefix` (SPEC_FULL.md §10 "get_service_object_ids").
    pub fn get_service_object_ids(&self, service_prefix: &str) -> Result<Vec<i64>> {
        let guard = self.lock();
        let mut result = guard.driver.select(&self.emitter.browse_by_service_prefix(service_prefix))?;
        let mut ids = Vec::new();
        while let Some(row) = result.next_row() {
            ids.push(object_store::create_object_from_row(&row)?.id().to_raw());
        }
        Ok(ids)
    }

    // ---- flags / filesystem root name ----------------------------------

    /// Bulk-clear a flag bit across every object (SPEC_FULL.md §10
    /// "clear_flag_in_db").
    pub fn clear_flag_in_db(&self, flag: crate::model::ObjectFlags) -> Result<()> {
        let guard = self.lock();
        let table = self.dialect.quote_identifier(schema::OBJECT_TABLE);
        guard.driver.exec(
            &format!("UPDATE {table} SET flags = flags & ~{}", flag.bits()),
            false,
        )?;
        Ok(())
    }

    pub fn get_fs_root_name(&self) -> Result<Option<String>> {
        self.get_internal_setting("fs_root_name")
    }

    pub fn set_fs_root_name(&self, name: &str) -> Result<()> {
        self.store_internal_setting("fs_root_name", name)
    }

    pub fn get_internal_setting(&self, key: &str) -> Result<Option<String>> {
        let guard = self.lock();
        self.get_internal_setting_locked(&guard.driver, key)
    }

    fn get_internal_setting_locked(&self, driver: &dyn Driver, key: &str) -> Result<Option<String>> {
        let table = self.dialect.quote_identifier(schema::INTERNAL_SETTINGS_TABLE);
        let sql = format!(
            "SELECT value FROM {table} WHERE key = {}",
            self.dialect.quote_str(key)
        );
        let mut result = driver.select(&sql)?;
        use crate::row::SqlRow;
        Ok(result.next_row().map(|r| r.col_string(0)))
    }

    pub fn store_internal_setting(&self, key: &str, value: &str) -> Result<()> {
        let guard = self.lock();
        let table = self.dialect.quote_identifier(schema::INTERNAL_SETTINGS_TABLE);
        guard.driver.exec(
            &format!(
                "INSERT OR REPLACE INTO {table} (key, value) VALUES ({}, {})",
                self.dialect.quote_str(key),
                self.dialect.quote_str(value)
            ),
            false,
        )?;
        Ok(())
    }

    // ---- autoscan ---------------------------------------------------------

    pub fn add_autoscan_directory(&self, dir: &AutoscanDirectory) -> Result<()> {
        let guard = self.lock();
        autoscan_store::add_autoscan_directory(&guard.driver, self.dialect.as_ref(), &self.emitter, dir)
    }

    pub fn remove_autoscan_directory(&self, object_id: i64, mode: ScanMode) -> Result<()> {
        let guard = self.lock();
        autoscan_store::remove_autoscan_directory(&guard.driver, self.dialect.as_ref(), object_id, mode)
    }

    pub fn get_autoscan_list(&self, mode: ScanMode) -> Result<Vec<AutoscanDirectory>> {
        let guard = self.lock();
        autoscan_store::get_autoscan_list(&guard.driver, &self.emitter, mode)
    }

    // ---- config values ------------------------------------------------

    pub fn get_config_values(&self) -> Result<Vec<ConfigValue>> {
        let guard = self.lock();
        config_store::get_config_values(&guard.driver, &self.emitter)
    }

    pub fn update_config_value(&self, value: &ConfigValue) -> Result<()> {
        let guard = self.lock();
        config_store::update_config_value(&guard.driver, self.dialect.as_ref(), value)
    }

    pub fn remove_config_value(&self, item: &str) -> Result<()> {
        let guard = self.lock();
        config_store::remove_config_value(&guard.driver, self.dialect.as_ref(), item)
    }

    // ---- capabilities -------------------------------------------------

    /// UPnP `SortCapabilities` — the sortable subset of the properties this
    /// core's dialect and browse projection actually expose (SPEC_FULL.md
    /// §10).
    pub fn get_sort_capabilities(&self) -> &'static [&'static str] {
        &["dc:title", "upnp:class"]
    }

    pub fn get_search_capabilities(&self) -> &'static [&'static str] {
        &["dc:title", "upnp:class"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, ObjectFlags, ObjectHeader};

    fn database() -> CdsDatabase {
        CdsDatabase::open_in_memory(&["mimetype".to_string()]).unwrap()
    }

    fn item(parent: i64, title: &str) -> CdsObject {
        CdsObject::Item {
            header: ObjectHeader {
                id: ObjectId::Persistent(0),
                parent_id: ObjectId::Persistent(parent),
                ref_id: None,
                upnp_class: "object.item".to_string(),
                title: title.to_string(),
                location: Location::Real(format!("/media/{title}")),
                flags: ObjectFlags::empty(),
                service_id: None,
            },
            mime_type: "video/mp4".to_string(),
        }
    }

    #[test]
    fn add_then_get_round_trips() {
        let db = database();
        let (id, changed) = db.add_object(item(0, "clip.mp4")).unwrap();
        assert!(changed.upnp_update_ids.contains(&0));

        let loaded = db.get_object(ObjectId::Persistent(id)).unwrap().unwrap();
        assert_eq!(loaded.header().title, "clip.mp4");
    }

    #[test]
    fn remove_object_purges_emptied_container_chain() {
        let db = database();
        let leaf = db.add_container_chain("/A/B", "object.container", false).unwrap();
        let (item_id, _) = db.add_object(item(leaf, "x.mp4")).unwrap();

        let changed = db.remove_object(ObjectId::Persistent(item_id), false).unwrap();
        assert!(changed.purged.contains(&leaf));
        assert!(db.find_object_by_path("/A/B").unwrap().is_none());
    }

    #[test]
    fn remove_object_orphans_referencing_alias_unless_all() {
        let db = database();
        let (item_id, _) = db.add_object(item(0, "song.mp3")).unwrap();
        let mut alias = item(0, "song (alias).mp3");
        if let CdsObject::Item { header, .. } = &mut alias {
            header.ref_id = Some(ObjectId::Persistent(item_id));
        }
        let (alias_id, _) = db.add_object(alias).unwrap();

        db.remove_object(ObjectId::Persistent(item_id), false).unwrap();
        let remaining = db.get_object(ObjectId::Persistent(alias_id)).unwrap().unwrap();
        assert!(remaining.header().ref_id.is_none());
    }

    #[test]
    fn remove_object_with_all_removes_referencing_alias() {
        let db = database();
        let (item_id, _) = db.add_object(item(0, "song.mp3")).unwrap();
        let mut alias = item(0, "song (alias).mp3");
        if let CdsObject::Item { header, .. } = &mut alias {
            header.ref_id = Some(ObjectId::Persistent(item_id));
        }
        let (alias_id, _) = db.add_object(alias).unwrap();

        db.remove_object(ObjectId::Persistent(item_id), true).unwrap();
        assert!(db.get_object(ObjectId::Persistent(alias_id)).unwrap().is_none());
    }

    #[test]
    fn metadata_updates_are_diffed() {
        let db = database();
        let (id, _) = db.add_object(item(0, "song.mp3")).unwrap();

        let mut first = Metadata::new();
        first.insert("artist".to_string(), "Miles".to_string());
        db.update_metadata(id, &first).unwrap();

        let mut second = Metadata::new();
        second.insert("artist".to_string(), "Coltrane".to_string());
        second.insert("album".to_string(), "Giant Steps".to_string());
        db.update_metadata(id, &second).unwrap();

        let stored = db.retrieve_metadata_for_object(id).unwrap();
        assert_eq!(stored.get("artist").unwrap(), "Coltrane");
        assert_eq!(stored.get("album").unwrap(), "Giant Steps");
    }

    #[test]
    fn resource_updates_are_diffed_and_compacted() {
        let db = database();
        let (id, _) = db.add_object(item(0, "song.mp3")).unwrap();

        let first = vec![crate::model::Resource::new(0).with_attr("mimetype", "audio/mp3")];
        db.update_resources(id, &first).unwrap();
        assert_eq!(db.retrieve_resources_for_object(id).unwrap().len(), 1);

        let second = vec![
            crate::model::Resource::new(0).with_attr("mimetype", "audio/mp3"),
            crate::model::Resource::new(5).with_attr("mimetype", "image/jpeg"),
        ];
        db.update_resources(id, &second).unwrap();

        let stored = db.retrieve_resources_for_object(id).unwrap();
        assert_eq!(stored.len(), 2);
        // ordinals are compacted back to [0, n) on write, matching the read path.
        assert_eq!(stored[0].ordinal, 0);
        assert_eq!(stored[1].ordinal, 1);
        assert_eq!(stored[1].attrs.get("mimetype").unwrap(), "image/jpeg");

        db.update_resources(id, &first).unwrap();
        assert_eq!(db.retrieve_resources_for_object(id).unwrap().len(), 1);
    }

    #[test]
    fn get_child_count_can_hide_the_configured_fs_root() {
        let db = database();
        db.add_container_chain("/Videos", "object.container", false).unwrap();
        db.add_container_chain("/PC Directory", "object.container", false).unwrap();
        db.set_fs_root_name("PC Directory").unwrap();

        let root = ObjectId::Persistent(0);
        assert_eq!(db.get_child_count(root, true, true, false).unwrap(), 2);
        assert_eq!(db.get_child_count(root, true, true, true).unwrap(), 1);
    }

    #[test]
    fn get_total_files_filters_by_virtual_mime_and_class() {
        let db = database();
        db.add_object(item(0, "real.mp4")).unwrap();

        let mut virt = item(0, "virtual.mp4");
        if let CdsObject::Item { header, .. } = &mut virt {
            header.location = Location::Virtual("virtual.mp4".to_string());
        }
        db.add_object(virt).unwrap();

        assert_eq!(db.get_total_files(None, None, None).unwrap(), 2);
        assert_eq!(db.get_total_files(Some(true), None, None).unwrap(), 1);
        assert_eq!(db.get_total_files(Some(false), None, None).unwrap(), 1);
        assert_eq!(db.get_total_files(None, Some("video/mp4"), None).unwrap(), 2);
        assert_eq!(db.get_total_files(None, Some("audio/mp3"), None).unwrap(), 0);
        assert_eq!(db.get_total_files(None, None, Some("object.item")).unwrap(), 2);
        assert_eq!(db.get_total_files(None, None, Some("object.container")).unwrap(), 0);
    }

    #[test]
    fn get_service_object_ids_matches_by_prefix() {
        let db = database();
        let mut a = item(0, "a.mp4");
        if let CdsObject::Item { header, .. } = &mut a {
            header.service_id = Some("youtube_api/abc".to_string());
        }
        let (a_id, _) = db.add_object(a).unwrap();

        let mut b = item(0, "b.mp4");
        if let CdsObject::Item { header, .. } = &mut b {
            header.service_id = Some("youtube_api/xyz".to_string());
        }
        let (b_id, _) = db.add_object(b).unwrap();

        db.add_object(item(0, "c.mp4")).unwrap();

        let mut ids = db.get_service_object_ids("youtube_api").unwrap();
        ids.sort();
        let mut expected = vec![a_id, b_id];
        expected.sort();
        assert_eq!(ids, expected);

        assert!(db.get_service_object_ids("spotify").unwrap().is_empty());
    }

    #[test]
    fn dynamic_container_materializes_matching_items() {
        let db = database();
        db.add_object(item(0, "Summer 2024 Trip")).unwrap();
        db.add_object(item(0, "Winter Trip")).unwrap();

        let id = db.register_dynamic_container(DynamicContainer {
            title: "2024 items".to_string(),
            upnp_class: "object.container".to_string(),
            search: crate::dialect::SearchExpr::Compare {
                property: "dc:title".to_string(),
                op: crate::dialect::search::CompareOp::Contains,
                value: crate::dialect::search::SearchValue::Str("2024".to_string()),
            },
        });

        let children = db.get_objects(id, false).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].header().title, "Summer 2024 Trip");
    }

    #[test]
    fn removing_a_synthetic_id_is_a_no_op() {
        let db = database();
        let changed = db.remove_object(ObjectId::Synthetic(99), false).unwrap();
        assert!(changed.is_empty());
    }

    #[test]
    fn internal_settings_round_trip() {
        let db = database();
        db.set_fs_root_name("/mnt/media").unwrap();
        assert_eq!(db.get_fs_root_name().unwrap().unwrap(), "/mnt/media");
    }

    #[test]
    fn overlapping_autoscan_directories_are_rejected() {
        let db = database();
        let a = db.add_container_chain("/A", "object.container", false).unwrap();
        let b = db.add_container_chain("/A/B", "object.container", false).unwrap();

        db.add_autoscan_directory(&AutoscanDirectory {
            object_id: ObjectId::Persistent(a),
            location: "/A".to_string(),
            scan_mode: ScanMode::Timed,
            level: crate::model::ScanLevel::Full,
            recursive: true,
            hidden_files: false,
            interval_seconds: 60,
            last_modified: 0,
            persistent: false,
        })
        .unwrap();

        let err = db
            .add_autoscan_directory(&AutoscanDirectory {
                object_id: ObjectId::Persistent(b),
                location: "/A/B".to_string(),
                scan_mode: ScanMode::Timed,
                level: crate::model::ScanLevel::Full,
                recursive: false,
                hidden_files: false,
                interval_seconds: 60,
                last_modified: 0,
                persistent: false,
            })
            .unwrap_err();
        assert!(matches!(err, CdsError::Overlap { .. }));
    }
}
