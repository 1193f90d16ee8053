//! Per-version DDL. Each entry is the incremental statement batch applied
//! when moving from version `N-1` to version `N` (SPEC_FULL.md §4.4).
//! Versions 12 and 13 carry a data migration alongside their DDL and are
//! handled in `migrations.rs`; every other version here is DDL-only.

/// The DDL batch for versions that are pure schema build-up (no data
/// migration attached). Indexed `[0]` = version 1, `[10]` = version 11.
pub const STEP_DDL: [&str; 11] = [
    // v1: internal settings, the object table (with the two legacy inline
    // blob columns later migrations will retire), and the root container.
    r#"
    CREATE TABLE mt_internal_setting (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE mt_cds_object (
        id INTEGER PRIMARY KEY,
        parent_id INTEGER NOT NULL,
        ref_id INTEGER,
        object_type INTEGER NOT NULL,
        upnp_class TEXT NOT NULL,
        dc_title TEXT NOT NULL,
        location TEXT NOT NULL,
        mime_type TEXT,
        update_id INTEGER NOT NULL DEFAULT 0,
        flags INTEGER NOT NULL DEFAULT 0,
        service_id TEXT,
        metadata_blob TEXT,
        resources_blob TEXT
    );
    INSERT INTO mt_cds_object
        (id, parent_id, ref_id, object_type, upnp_class, dc_title, location, mime_type, update_id, flags, service_id)
        VALUES (0, 0, NULL, 1, 'object.container', '', 'V/', NULL, 0, 4, NULL);
    "#,
    // v2
    "CREATE INDEX idx_cds_object_parent ON mt_cds_object(parent_id);",
    // v3
    "CREATE INDEX idx_cds_object_ref ON mt_cds_object(ref_id);",
    // v4
    "CREATE INDEX idx_cds_object_service ON mt_cds_object(service_id);",
    // v5
    r#"
    CREATE TABLE mt_autoscan (
        object_id INTEGER NOT NULL,
        scan_mode TEXT NOT NULL,
        location TEXT NOT NULL,
        level TEXT NOT NULL,
        recursive INTEGER NOT NULL,
        hidden_files INTEGER NOT NULL,
        interval_seconds INTEGER NOT NULL,
        last_modified INTEGER NOT NULL,
        persistent INTEGER NOT NULL,
        PRIMARY KEY (object_id, scan_mode)
    );
    "#,
    // v6
    r#"
    CREATE TABLE grb_config_value (
        item TEXT NOT NULL,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        status TEXT NOT NULL,
        PRIMARY KEY (item, key)
    );
    "#,
    // v7
    r#"
    CREATE TABLE mt_metadata (
        object_id INTEGER NOT NULL,
        property_name TEXT NOT NULL,
        property_value TEXT,
        PRIMARY KEY (object_id, property_name)
    );
    "#,
    // v8
    "CREATE INDEX idx_metadata_object ON mt_metadata(object_id);",
    // v9
    r#"
    CREATE TABLE grb_cds_resource (
        object_id INTEGER NOT NULL,
        res_id INTEGER NOT NULL,
        PRIMARY KEY (object_id, res_id)
    );
    "#,
    // v10
    "CREATE INDEX idx_resource_object ON grb_cds_resource(object_id);",
    // v11: placeholder step reserved for the index the 0.x series added
    // right before the blob migrations landed.
    "CREATE INDEX idx_cds_object_update ON mt_cds_object(update_id);",
];

/// Canonicalize DDL text before hashing: strip trailing whitespace per
/// line, drop blank lines, join with `\n` (SPEC_FULL.md §9 "Open question,
/// resolved").
pub fn canonicalize(ddl: &str) -> String {
    ddl.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
