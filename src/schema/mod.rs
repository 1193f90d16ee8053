//! Schema bootstrap and migration orchestration (SPEC_FULL.md §4.4).
//!
//! The on-disk schema carries a monotonic version number plus a hash of the
//! DDL the binary associates with that version, stored in
//! `mt_internal_setting`. A fresh store is bootstrapped straight to
//! [`TARGET_VERSION`]; an existing store is walked forward one step at a
//! time, each step wrapped in its own transaction.

pub mod ddl;
pub mod migrations;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{CdsError, Result};
use ddl::{canonicalize, STEP_DDL};

pub const OBJECT_TABLE: &str = "mt_cds_object";
pub const INTERNAL_SETTINGS_TABLE: &str = "mt_internal_setting";
pub const AUTOSCAN_TABLE: &str = "mt_autoscan";
pub const METADATA_TABLE: &str = "mt_metadata";
pub const RESOURCE_TABLE: &str = "grb_cds_resource";
pub const CONFIG_VALUE_TABLE: &str = "grb_config_value";

pub const TARGET_VERSION: u32 = 13;

const VERSION_KEY: &str = "db_version";
const VERSION_HASH_KEY: &str = "db_version_hash";

/// The fixed description a data-only migration step contributes to its
/// version's hash. Not literal DDL — versions 12/13 alter the schema in a
/// way that depends on runtime configuration (declared resource
/// attributes), so the hash ladder fingerprints the *migration's intent*
/// rather than statements it would emit for one particular store.
const MIGRATION_12_DESC: &str =
    "-> 12: mt_cds_object.metadata_blob migrated into mt_metadata rows, column dropped";
const MIGRATION_13_DESC: &str =
    "-> 13: mt_cds_object.resources_blob migrated into grb_cds_resource rows, column dropped, one column added per declared resource attribute";

/// The cumulative, canonicalized DDL text through `version`, used to
/// compute that version's hash.
fn cumulative_ddl(version: u32) -> String {
    assert!((1..=TARGET_VERSION).contains(&version));
    let mut text = STEP_DDL[..version.min(11) as usize].join("\n");
    if version >= 12 {
        text.push('\n');
        text.push_str(MIGRATION_12_DESC);
    }
    if version >= 13 {
        text.push('\n');
        text.push_str(MIGRATION_13_DESC);
    }
    canonicalize(&text)
}

/// The hash this binary expects a store at `version` to carry. Exposed so
/// integration tests can seed a store at a known-good version without
/// tripping the mismatch check `init` performs on existing stores.
pub fn version_hash(version: u32) -> u32 {
    crc32fast::hash(cumulative_ddl(version).as_bytes())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn read_internal_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    if !table_exists(conn, INTERNAL_SETTINGS_TABLE)? {
        return Ok(None);
    }
    Ok(conn
        .query_row(
            &format!("SELECT value FROM {INTERNAL_SETTINGS_TABLE} WHERE key = ?1"),
            params![key],
            |row| row.get(0),
        )
        .optional()?)
}

fn write_internal_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        &format!("INSERT OR REPLACE INTO {INTERNAL_SETTINGS_TABLE} (key, value) VALUES (?1, ?2)"),
        params![key, value],
    )?;
    Ok(())
}

fn apply_step(conn: &Connection, version: u32, resource_attributes: &[String]) -> Result<()> {
    if version <= 11 {
        conn.execute_batch(STEP_DDL[(version - 1) as usize])?;
    } else if version == 12 {
        migrations::migrate_metadata_blob(conn)?;
    } else if version == 13 {
        migrations::migrate_resource_blob(conn, resource_attributes)?;
    } else {
        unreachable!("no migration defined beyond TARGET_VERSION");
    }
    Ok(())
}

/// Bring `conn` up to [`TARGET_VERSION`], bootstrapping a fresh store or
/// walking an existing one forward. `resource_attributes` is the set of
/// resource attribute names the running configuration declares; it is
/// needed by migration `-> 13` and by a fresh bootstrap (which must reach
/// the same end state without ever having run `-> 13` as a migration).
pub fn init(conn: &Connection, resource_attributes: &[String]) -> Result<()> {
    let stored_version: Option<u32> = read_internal_setting(conn, VERSION_KEY)?
        .map(|s| s.parse().unwrap_or(0));

    let start_version = match stored_version {
        None => {
            conn.execute_batch("BEGIN")?;
            let result = (|| -> Result<()> {
                // Walk every step, including 12/13, so a fresh store ends up
                // physically identical to one migrated up from v11 — same
                // dropped blob columns, same attribute columns added.
                for v in 1..=TARGET_VERSION {
                    apply_step(conn, v, resource_attributes)?;
                }
                write_internal_setting(conn, VERSION_KEY, &TARGET_VERSION.to_string())?;
                write_internal_setting(
                    conn,
                    VERSION_HASH_KEY,
                    &version_hash(TARGET_VERSION).to_string(),
                )?;
                Ok(())
            })();
            match result {
                Ok(()) => conn.execute_batch("COMMIT")?,
                Err(e) => {
                    conn.execute_batch("ROLLBACK")?;
                    return Err(e);
                }
            }
            return Ok(());
        }
        Some(v) => v,
    };

    if start_version > TARGET_VERSION {
        return Err(CdsError::MigrationFailed {
            version: start_version,
            reason: format!(
                "stored schema version {start_version} is newer than this binary's target {TARGET_VERSION}"
            ),
        });
    }

    let stored_hash: Option<u32> = read_internal_setting(conn, VERSION_HASH_KEY)?
        .map(|s| s.parse().unwrap_or(0));
    let expected_hash = version_hash(start_version);
    if stored_hash != Some(expected_hash) {
        return Err(CdsError::SchemaMismatch {
            stored: start_version,
            stored_hash: stored_hash.unwrap_or(0),
            expected_hash,
        });
    }

    for v in (start_version + 1)..=TARGET_VERSION {
        conn.execute_batch(&format!("SAVEPOINT migrate_{v}"))?;
        let result = apply_step(conn, v, resource_attributes).and_then(|_| {
            write_internal_setting(conn, VERSION_KEY, &v.to_string())?;
            write_internal_setting(conn, VERSION_HASH_KEY, &version_hash(v).to_string())?;
            Ok(())
        });
        match result {
            Ok(()) => conn.execute_batch(&format!("RELEASE migrate_{v}"))?,
            Err(e) => {
                conn.execute_batch(&format!("ROLLBACK TO migrate_{v}; RELEASE migrate_{v}"))?;
                return Err(CdsError::MigrationFailed {
                    version: v,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(())
}
