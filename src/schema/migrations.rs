//! The two explicitly modeled data migrations (SPEC_FULL.md §4.4): `-> 12`
//! moves an inlined metadata blob into `mt_metadata` rows, and `-> 13` moves
//! an inlined resources blob into `grb_cds_resource` rows while adding one
//! column per declared resource attribute.

use rusqlite::{params, Connection};

use crate::error::{CdsError, Result};
use crate::schema::{METADATA_TABLE, OBJECT_TABLE, RESOURCE_TABLE};

/// Parse a blob encoded as `key=value` pairs joined by `,`. Used by both
/// migrations; the resources blob additionally groups pairs into
/// resources with `;`.
fn parse_pairs(segment: &str) -> Vec<(String, String)> {
    segment
        .split(',')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn sanitize_column_name(name: &str) -> Result<String> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        || name.chars().next().unwrap().is_ascii_digit()
    {
        return Err(CdsError::ConstraintViolation(format!(
            "'{name}' is not a valid resource attribute column name"
        )));
    }
    Ok(name.to_string())
}

/// Migration step `-> 12`.
pub fn migrate_metadata_blob(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, metadata_blob FROM {OBJECT_TABLE} WHERE metadata_blob IS NOT NULL"
    ))?;
    let rows: Vec<(i64, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;

    for (object_id, blob) in rows {
        for (key, value) in parse_pairs(&blob) {
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {METADATA_TABLE} (object_id, property_name, property_value) VALUES (?1, ?2, ?3)"
                ),
                params![object_id, key, value],
            )?;
        }
    }

    conn.execute(&format!("ALTER TABLE {OBJECT_TABLE} DROP COLUMN metadata_blob"), [])?;
    Ok(())
}

/// Migration step `-> 13`.
pub fn migrate_resource_blob(conn: &Connection, resource_attributes: &[String]) -> Result<()> {
    for attribute in resource_attributes {
        let column = sanitize_column_name(attribute)?;
        conn.execute(
            &format!("ALTER TABLE {RESOURCE_TABLE} ADD COLUMN \"{column}\" TEXT"),
            [],
        )?;
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT id, resources_blob FROM {OBJECT_TABLE} WHERE resources_blob IS NOT NULL"
    ))?;
    let rows: Vec<(i64, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;

    for (object_id, blob) in rows {
        for group in blob.split(';').filter(|g| !g.is_empty()) {
            let pairs = parse_pairs(group);
            let mut res_id: i64 = 0;
            let mut attrs: Vec<(String, String)> = Vec::new();
            for (key, value) in pairs {
                if key == "id" {
                    res_id = value.parse().unwrap_or(0);
                } else {
                    attrs.push((key, value));
                }
            }
            conn.execute(
                &format!("INSERT OR REPLACE INTO {RESOURCE_TABLE} (object_id, res_id) VALUES (?1, ?2)"),
                params![object_id, res_id],
            )?;
            for (key, value) in attrs {
                let column = sanitize_column_name(&key)?;
                conn.execute(
                    &format!(
                        "UPDATE {RESOURCE_TABLE} SET \"{column}\" = ?1 WHERE object_id = ?2 AND res_id = ?3"
                    ),
                    params![value, object_id, res_id],
                )?;
            }
        }
    }

    conn.execute(&format!("ALTER TABLE {OBJECT_TABLE} DROP COLUMN resources_blob"), [])?;
    Ok(())
}
