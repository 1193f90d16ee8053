//! Error kinds produced by the persistence core (see SPEC_FULL.md §7).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CdsError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored schema version {stored} has hash {stored_hash:#010x} but this binary expects {expected_hash:#010x}")]
    SchemaMismatch {
        stored: u32,
        stored_hash: u32,
        expected_hash: u32,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("autoscan overlap with existing directory id {existing_id} ({existing_path})")]
    Overlap {
        existing_id: i64,
        existing_path: String,
    },

    #[error("driver fault: {0}")]
    DriverFault(String),

    #[error("migration to version {version} failed: {reason}")]
    MigrationFailed { version: u32, reason: String },
}

pub type Result<T> = std::result::Result<T, CdsError>;
