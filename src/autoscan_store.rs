//! CRUD for `AutoscanDirectory` rows, overlap checking, and the
//! persistent-reattachment rule on removal (SPEC_FULL.md §4.7).

use crate::dialect::{Emitter, SqlDialect};
use crate::driver::Driver;
use crate::error::{CdsError, Result};
use crate::model::{AutoscanDirectory, ObjectId, ScanLevel, ScanMode};
use crate::row::{SqlResult, SqlRow};
use crate::schema::AUTOSCAN_TABLE;

fn scan_mode_str(mode: ScanMode) -> &'static str {
    match mode {
        ScanMode::Timed => "timed",
        ScanMode::Inotify => "inotify",
    }
}

fn parse_scan_mode(s: &str) -> Result<ScanMode> {
    match s {
        "timed" => Ok(ScanMode::Timed),
        "inotify" => Ok(ScanMode::Inotify),
        other => Err(CdsError::ConstraintViolation(format!("unknown scan mode '{other}'"))),
    }
}

fn scan_level_str(level: ScanLevel) -> &'static str {
    match level {
        ScanLevel::Basic => "basic",
        ScanLevel::Full => "full",
    }
}

fn parse_scan_level(s: &str) -> Result<ScanLevel> {
    match s {
        "basic" => Ok(ScanLevel::Basic),
        "full" => Ok(ScanLevel::Full),
        other => Err(CdsError::ConstraintViolation(format!("unknown scan level '{other}'"))),
    }
}

fn row_to_directory(row: &dyn SqlRow) -> Result<AutoscanDirectory> {
    Ok(AutoscanDirectory {
        object_id: ObjectId::from_raw(row.col_int(0, 0)),
        location: row.col_string(1),
        scan_mode: parse_scan_mode(&row.col_string(2))?,
        level: parse_scan_level(&row.col_string(3))?,
        recursive: row.col_bool(4, false),
        hidden_files: row.col_bool(5, false),
        interval_seconds: row.col_int(6, 0) as u32,
        last_modified: row.col_int(7, 0),
        persistent: row.col_bool(8, false),
    })
}

/// Every declared autoscan for one scan mode, ordered by object id.
pub fn get_autoscan_list(driver: &dyn Driver, emitter: &Emitter, mode: ScanMode) -> Result<Vec<AutoscanDirectory>> {
    let mut result = driver.select(&emitter.autoscan_query(scan_mode_str(mode)))?;
    let mut directories = Vec::new();
    while let Some(row) = result.next_row() {
        directories.push(row_to_directory(&row)?);
    }
    Ok(directories)
}

fn all_directories(driver: &dyn Driver, emitter: &Emitter) -> Result<Vec<AutoscanDirectory>> {
    let mut all = get_autoscan_list(driver, emitter, ScanMode::Timed)?;
    all.extend(get_autoscan_list(driver, emitter, ScanMode::Inotify)?);
    Ok(all)
}

/// Does `candidate` overlap any directory already on watch? Invariant 5 in
/// SPEC_FULL.md §8.
pub fn check_overlapping_autoscans(
    driver: &dyn Driver,
    emitter: &Emitter,
    candidate: &AutoscanDirectory,
) -> Result<()> {
    for existing in all_directories(driver, emitter)? {
        if existing.object_id != candidate.object_id && existing.overlaps(candidate) {
            return Err(CdsError::Overlap {
                existing_id: existing.object_id.to_raw(),
                existing_path: existing.location,
            });
        }
    }
    Ok(())
}

/// Insert or replace the autoscan entry for `dir.object_id` / `dir.scan_mode`,
/// after checking for overlap with anything else on watch.
pub fn add_autoscan_directory(driver: &dyn Driver, dialect: &dyn SqlDialect, emitter: &Emitter, dir: &AutoscanDirectory) -> Result<()> {
    check_overlapping_autoscans(driver, emitter, dir)?;
    let sql = format!(
        "INSERT OR REPLACE INTO {table} (object_id, scan_mode, location, level, recursive, hidden_files, interval_seconds, last_modified, persistent) \
         VALUES ({id}, {mode}, {location}, {level}, {recursive}, {hidden}, {interval}, {last_modified}, {persistent})",
        table = dialect.quote_identifier(AUTOSCAN_TABLE),
        id = dialect.quote_int(dir.object_id.to_raw()),
        mode = dialect.quote_str(scan_mode_str(dir.scan_mode)),
        location = dialect.quote_str(&dir.location),
        level = dialect.quote_str(scan_level_str(dir.level)),
        recursive = dialect.quote_bool(dir.recursive),
        hidden = dialect.quote_bool(dir.hidden_files),
        interval = dialect.quote_int(dir.interval_seconds as i64),
        last_modified = dialect.quote_int(dir.last_modified),
        persistent = dialect.quote_bool(dir.persistent),
    );
    driver.exec(&sql, false)?;
    Ok(())
}

pub fn remove_autoscan_directory(driver: &dyn Driver, dialect: &dyn SqlDialect, object_id: i64, mode: ScanMode) -> Result<()> {
    let sql = format!(
        "DELETE FROM {} WHERE object_id = {} AND scan_mode = {}",
        dialect.quote_identifier(AUTOSCAN_TABLE),
        dialect.quote_int(object_id),
        dialect.quote_str(scan_mode_str(mode)),
    );
    driver.exec(&sql, false)?;
    Ok(())
}

/// Reattach every persistent autoscan watching a now-deleted object onto
/// its surviving parent, instead of dropping the watch entirely
/// (SPEC_FULL.md §4.7 "persistent reattachment").
pub fn reattach_persistent_autoscans(
    driver: &dyn Driver,
    dialect: &dyn SqlDialect,
    emitter: &Emitter,
    removed_object_id: i64,
    new_parent_id: i64,
    new_parent_location: &str,
) -> Result<()> {
    for mut dir in all_directories(driver, emitter)? {
        if dir.object_id.to_raw() != removed_object_id {
            continue;
        }
        if dir.persistent {
            dir.object_id = crate::model::ObjectId::Persistent(new_parent_id);
            dir.location = new_parent_location.to_string();
            add_autoscan_directory(driver, dialect, emitter, &dir)?;
        } else {
            remove_autoscan_directory(driver, dialect, removed_object_id, dir.scan_mode)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqliteDialect;
    use crate::driver::SqliteDriver;
    use rusqlite::Connection;
    use std::sync::Arc;

    fn store() -> (SqliteDriver, Arc<dyn SqlDialect>, Emitter) {
        let conn = Connection::open_in_memory().unwrap();
        crate::schema::init(&conn, &[]).unwrap();
        let driver = SqliteDriver::open(conn);
        let dialect: Arc<dyn SqlDialect> = Arc::new(SqliteDialect);
        let emitter = Emitter::new(dialect.clone());
        (driver, dialect, emitter)
    }

    fn dir(id: i64, path: &str, recursive: bool, persistent: bool) -> AutoscanDirectory {
        AutoscanDirectory {
            object_id: ObjectId::Persistent(id),
            location: path.to_string(),
            scan_mode: ScanMode::Timed,
            level: ScanLevel::Full,
            recursive,
            hidden_files: false,
            interval_seconds: 3600,
            last_modified: 0,
            persistent,
        }
    }

    #[test]
    fn overlapping_directories_are_rejected() {
        let (driver, dialect, emitter) = store();
        add_autoscan_directory(&driver, dialect.as_ref(), &emitter, &dir(1, "/A", true, false)).unwrap();
        let err = add_autoscan_directory(&driver, dialect.as_ref(), &emitter, &dir(2, "/A/B", false, false)).unwrap_err();
        assert!(matches!(err, CdsError::Overlap { .. }));
    }

    #[test]
    fn non_overlapping_directories_are_both_kept() {
        let (driver, dialect, emitter) = store();
        add_autoscan_directory(&driver, dialect.as_ref(), &emitter, &dir(1, "/A", false, false)).unwrap();
        add_autoscan_directory(&driver, dialect.as_ref(), &emitter, &dir(2, "/B", false, false)).unwrap();
        assert_eq!(get_autoscan_list(&driver, &emitter, ScanMode::Timed).unwrap().len(), 2);
    }

    #[test]
    fn persistent_entry_reattaches_instead_of_vanishing() {
        let (driver, dialect, emitter) = store();
        add_autoscan_directory(&driver, dialect.as_ref(), &emitter, &dir(5, "/A/B", true, true)).unwrap();

        reattach_persistent_autoscans(&driver, dialect.as_ref(), &emitter, 5, 1, "/A").unwrap();

        let remaining = get_autoscan_list(&driver, &emitter, ScanMode::Timed).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].object_id, ObjectId::Persistent(1));
        assert_eq!(remaining[0].location, "/A");
    }

    #[test]
    fn non_persistent_entry_is_dropped_on_reattach() {
        let (driver, dialect, emitter) = store();
        add_autoscan_directory(&driver, dialect.as_ref(), &emitter, &dir(5, "/A/B", true, false)).unwrap();

        reattach_persistent_autoscans(&driver, dialect.as_ref(), &emitter, 5, 1, "/A").unwrap();

        assert!(get_autoscan_list(&driver, &emitter, ScanMode::Timed).unwrap().is_empty());
    }
}
