//! Location tagging: `addLocationPrefix` / `stripLocationPrefix` from
//! SPEC_FULL.md §6 ("Path serialization"). These two functions are the only
//! code in the crate allowed to know the on-disk layout of the `location`
//! column.

use crate::error::{CdsError, Result};

const PREFIX_REAL: char = 'F';
const PREFIX_VIRTUAL: char = 'V';
const PREFIX_SERVICE: char = 'S';

/// Which resolver owns a stored location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A real filesystem path.
    Real(String),
    /// A virtual (synthetic tree) path.
    Virtual(String),
    /// An object owned by an external service; `prefix` is the service's
    /// single-character routing tag.
    Service { prefix: char, path: String },
}

impl Location {
    pub fn path(&self) -> &str {
        match self {
            Location::Real(p) => p,
            Location::Virtual(p) => p,
            Location::Service { path, .. } => path,
        }
    }
}

/// Encode a `Location` into the single text column stored in `mt_cds_object.location`.
pub fn add_location_prefix(loc: &Location) -> String {
    match loc {
        Location::Real(path) => format!("{PREFIX_REAL}{path}"),
        Location::Virtual(path) => format!("{PREFIX_VIRTUAL}{path}"),
        Location::Service { prefix, path } => format!("{PREFIX_SERVICE}{prefix}{path}"),
    }
}

/// Decode the `location` column back into a tagged path.
pub fn strip_location_prefix(db_location: &str) -> Result<Location> {
    let mut chars = db_location.chars();
    let tag = chars
        .next()
        .ok_or_else(|| CdsError::ConstraintViolation("empty location column".into()))?;
    let rest = chars.as_str();
    match tag {
        PREFIX_REAL => Ok(Location::Real(rest.to_string())),
        PREFIX_VIRTUAL => Ok(Location::Virtual(rest.to_string())),
        PREFIX_SERVICE => {
            let mut rest_chars = rest.chars();
            let service_prefix = rest_chars.next().ok_or_else(|| {
                CdsError::ConstraintViolation("service location missing service prefix byte".into())
            })?;
            Ok(Location::Service {
                prefix: service_prefix,
                path: rest_chars.as_str().to_string(),
            })
        }
        other => Err(CdsError::ConstraintViolation(format!(
            "unknown location prefix byte '{other}'"
        ))),
    }
}
