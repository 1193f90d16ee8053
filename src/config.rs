//! Collaborator interfaces this core consumes (SPEC_FULL.md §6), plus a
//! concrete file/environment-backed `Config` (SPEC_FULL.md §10 "Ambient
//! stack — configuration").

use std::path::PathBuf;

use crate::error::{CdsError, Result};

/// Provides the transactions-enabled flag, the declared resource attribute
/// set, and ancillary tunables. The resource attribute set drives migration
/// `-> 13` and the live `grb_cds_resource` column layout, so it must be
/// stable for the lifetime of one open database.
pub trait Config {
    fn transactions_enabled(&self) -> bool;
    fn resource_attributes(&self) -> &[String];
    fn database_path(&self) -> &std::path::Path;
}

/// Classifies paths to mime types during object creation. A thin seam so
/// the persistence core never depends on a specific sniffing library.
pub trait Mime {
    fn classify(&self, path: &str) -> Option<String>;
}

const DEFAULT_RESOURCE_ATTRIBUTES: &[&str] = &["mimetype", "resolution", "bitrate", "duration", "size"];

/// File/environment-backed `Config`. Mirrors the teacher's
/// `Config::from_env` shape: a handful of environment overrides plus an
/// XDG-resolved data file path, with no config file parser of its own.
#[derive(Debug, Clone)]
pub struct FileConfig {
    transactions_enabled: bool,
    resource_attributes: Vec<String>,
    database_path: PathBuf,
}

impl FileConfig {
    /// Resolve from environment variables and XDG base directories. Honors
    /// `CDSDB_TRANSACTIONS` (default enabled) and `CDSDB_RESOURCE_ATTRS`
    /// (comma-separated, default `DEFAULT_RESOURCE_ATTRIBUTES`).
    pub fn from_env() -> Result<Self> {
        let transactions_enabled = match std::env::var("CDSDB_TRANSACTIONS") {
            Ok(v) => v.to_lowercase() != "false",
            Err(_) => true,
        };

        let resource_attributes = match std::env::var("CDSDB_RESOURCE_ATTRS") {
            Ok(v) if !v.trim().is_empty() => v.split(',').map(|s| s.trim().to_string()).collect(),
            _ => DEFAULT_RESOURCE_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
        };

        let xdg_dirs = xdg::BaseDirectories::with_prefix("cdsdb")
            .map_err(|e| CdsError::ConstraintViolation(format!("could not resolve XDG directories: {e}")))?;
        let database_path = xdg_dirs.place_data_file("cds.sqlite")?;

        Ok(Self {
            transactions_enabled,
            resource_attributes,
            database_path,
        })
    }

    /// Build a config pointing at an explicit path, bypassing XDG — used by
    /// tests and by `--db-path` on the CLI.
    pub fn at_path(path: PathBuf, resource_attributes: Vec<String>) -> Self {
        Self {
            transactions_enabled: true,
            resource_attributes,
            database_path: path,
        }
    }
}

impl Config for FileConfig {
    fn transactions_enabled(&self) -> bool {
        self.transactions_enabled
    }

    fn resource_attributes(&self) -> &[String] {
        &self.resource_attributes
    }

    fn database_path(&self) -> &std::path::Path {
        &self.database_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_path_config_carries_the_given_attributes() {
        let config = FileConfig::at_path(PathBuf::from("/tmp/cds-test.sqlite"), vec!["mimetype".to_string()]);
        assert!(config.transactions_enabled());
        assert_eq!(config.resource_attributes(), &["mimetype".to_string()]);
        assert_eq!(config.database_path(), std::path::Path::new("/tmp/cds-test.sqlite"));
    }
}
