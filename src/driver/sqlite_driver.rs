//! The concrete driver this crate ships, backed by `rusqlite`. Named
//! transactions become SQLite `SAVEPOINT`s, which genuinely nest — unlike
//! the "advisory, no-op by default" contract the trait allows for weaker
//! drivers (SPEC_FULL.md §4.3).

use rusqlite::types::ValueRef;
use rusqlite::Connection;

use super::{Driver, ExecOutcome};
use crate::error::Result;
use crate::row::{VecResult, VecRow};

pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    pub fn open(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn value_ref_to_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}

impl Driver for SqliteDriver {
    fn exec(&self, sql: &str, want_last_id: bool) -> Result<ExecOutcome> {
        let affected = self.conn.execute(sql, [])?;
        if want_last_id {
            Ok(ExecOutcome::LastInsertId(self.conn.last_insert_rowid()))
        } else {
            Ok(ExecOutcome::RowsAffected(affected))
        }
    }

    fn select(&self, sql: &str) -> Result<VecResult> {
        let mut stmt = self.conn.prepare(sql)?;
        let column_count = stmt.column_count();
        let mut rows_out = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cols = Vec::with_capacity(column_count);
            for i in 0..column_count {
                cols.push(value_ref_to_text(row.get_ref(i)?));
            }
            rows_out.push(VecRow::new(cols));
        }
        Ok(VecResult::new(rows_out))
    }

    fn begin(&self, name: &str) -> Result<()> {
        self.conn.execute_batch(&format!("SAVEPOINT {name}"))?;
        Ok(())
    }

    fn commit(&self, name: &str) -> Result<()> {
        self.conn.execute_batch(&format!("RELEASE {name}"))?;
        Ok(())
    }

    fn rollback(&self, name: &str) -> Result<()> {
        self.conn
            .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::SqlRow;

    fn memory_driver() -> SqliteDriver {
        SqliteDriver::open(Connection::open_in_memory().unwrap())
    }

    #[test]
    fn exec_and_select_round_trip() {
        let driver = memory_driver();
        driver.exec("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", false).unwrap();
        driver.exec("INSERT INTO t (name) VALUES ('alice')", false).unwrap();
        let outcome = driver.exec("INSERT INTO t (name) VALUES ('bob')", true).unwrap();
        assert!(outcome.last_insert_id().is_some());

        let mut result = driver.select("SELECT id, name FROM t ORDER BY id").unwrap();
        use crate::row::SqlResult;
        assert_eq!(result.num_rows(), 2);
        let row = result.next_row().unwrap();
        assert_eq!(row.col_string(1), "alice");
    }

    #[test]
    fn null_column_reads_back_as_none() {
        let driver = memory_driver();
        driver.exec("CREATE TABLE t (id INTEGER, val TEXT)", false).unwrap();
        driver.exec("INSERT INTO t (id, val) VALUES (1, NULL)", false).unwrap();
        let mut result = driver.select("SELECT id, val FROM t").unwrap();
        use crate::row::SqlResult;
        let row = result.next_row().unwrap();
        assert!(row.is_null(1));
    }

    #[test]
    fn savepoint_rollback_discards_the_insert() {
        let driver = memory_driver();
        driver.exec("CREATE TABLE t (id INTEGER)", false).unwrap();
        driver.begin("sp1").unwrap();
        driver.exec("INSERT INTO t VALUES (1)", false).unwrap();
        driver.rollback("sp1").unwrap();

        use crate::row::SqlResult;
        let mut result = driver.select("SELECT COUNT(*) FROM t").unwrap();
        let row = result.next_row().unwrap();
        assert_eq!(row.col_int(0, -1), 0);
    }

    #[test]
    fn savepoint_commit_keeps_the_insert() {
        let driver = memory_driver();
        driver.exec("CREATE TABLE t (id INTEGER)", false).unwrap();
        driver.begin("sp1").unwrap();
        driver.exec("INSERT INTO t VALUES (1)", false).unwrap();
        driver.commit("sp1").unwrap();

        use crate::row::SqlResult;
        let mut result = driver.select("SELECT COUNT(*) FROM t").unwrap();
        let row = result.next_row().unwrap();
        assert_eq!(row.col_int(0, -1), 1);
    }
}
