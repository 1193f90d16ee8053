//! Driver — executes a statement string; returns a result set or
//! last-insert id; supports begin/commit/rollback (SPEC_FULL.md §4.3).

pub mod sqlite_driver;

pub use sqlite_driver::SqliteDriver;

use crate::error::Result;
use crate::row::VecResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    RowsAffected(usize),
    LastInsertId(i64),
}

impl ExecOutcome {
    pub fn rows_affected(self) -> usize {
        match self {
            ExecOutcome::RowsAffected(n) => n,
            ExecOutcome::LastInsertId(_) => 1,
        }
    }

    pub fn last_insert_id(self) -> Option<i64> {
        match self {
            ExecOutcome::LastInsertId(id) => Some(id),
            ExecOutcome::RowsAffected(_) => None,
        }
    }
}

/// All entry points are invoked under the core's single mutex
/// (SPEC_FULL.md §5); a driver may assume it is never called concurrently.
/// `begin`/`commit`/`rollback` are advisory — the default no-op is correct
/// for a driver that cannot nest transactions, provided the core then
/// serializes around it instead.
pub trait Driver {
    fn exec(&self, sql: &str, want_last_id: bool) -> Result<ExecOutcome>;
    fn select(&self, sql: &str) -> Result<VecResult>;

    fn begin(&self, _name: &str) -> Result<()> {
        Ok(())
    }
    fn commit(&self, _name: &str) -> Result<()> {
        Ok(())
    }
    fn rollback(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}
