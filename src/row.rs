//! SqlRow / SqlResult — thin cursor abstraction over a driver result set
//! (SPEC_FULL.md §4.1).

/// One row of a result set. Column access returns the raw column text, or
/// `None` for SQL NULL; integer/boolean accessors are pure conversions on
/// top that fall back to a caller-supplied default on NULL.
pub trait SqlRow {
    fn col(&self, index: usize) -> Option<&str>;

    fn is_null(&self, index: usize) -> bool {
        self.col(index).is_none()
    }

    fn col_string(&self, index: usize) -> String {
        self.col(index).unwrap_or_default().to_string()
    }

    fn col_int(&self, index: usize, null_value: i64) -> i64 {
        self.col(index)
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(null_value)
    }

    fn col_bool(&self, index: usize, null_value: bool) -> bool {
        match self.col(index) {
            Some(s) => s == "1",
            None => null_value,
        }
    }
}

/// A decoded result set. Rows do not outlive the `SqlResult` that produced
/// them (SPEC_FULL.md §3 "Ownership").
pub trait SqlResult {
    type Row: SqlRow;

    fn next_row(&mut self) -> Option<Self::Row>;

    /// Total row count; may be computed lazily but must be stable once
    /// observed.
    fn num_rows(&self) -> usize;
}

/// An in-memory `SqlResult`/`SqlRow` pair. The Sqlite driver materializes
/// its query results into this shape immediately, since `rusqlite`
/// statements cannot outlive their connection borrow as an opaque trait
/// object would require.
#[derive(Debug, Clone, Default)]
pub struct VecResult {
    rows: Vec<VecRow>,
    cursor: usize,
}

#[derive(Debug, Clone, Default)]
pub struct VecRow {
    columns: Vec<Option<String>>,
}

impl VecRow {
    pub fn new(columns: Vec<Option<String>>) -> Self {
        Self { columns }
    }
}

impl SqlRow for VecRow {
    fn col(&self, index: usize) -> Option<&str> {
        self.columns.get(index).and_then(|c| c.as_deref())
    }
}

impl VecResult {
    pub fn new(rows: Vec<VecRow>) -> Self {
        Self { rows, cursor: 0 }
    }
}

impl SqlResult for VecResult {
    type Row = VecRow;

    fn next_row(&mut self) -> Option<VecRow> {
        let row = self.rows.get(self.cursor).cloned();
        if row.is_some() {
            self.cursor += 1;
        }
        row
    }

    fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_fall_back_on_null() {
        let row = VecRow::new(vec![Some("42".to_string()), None, Some("1".to_string())]);
        assert_eq!(row.col_int(0, -1), 42);
        assert_eq!(row.col_int(1, -1), -1);
        assert!(row.col_bool(2, false));
        assert!(!row.col_bool(1, false));
        assert!(row.is_null(1));
        assert!(!row.is_null(0));
    }

    #[test]
    fn result_iterates_all_rows_then_stops() {
        let mut result = VecResult::new(vec![
            VecRow::new(vec![Some("a".into())]),
            VecRow::new(vec![Some("b".into())]),
        ]);
        assert_eq!(result.num_rows(), 2);
        assert_eq!(result.next_row().unwrap().col_string(0), "a");
        assert_eq!(result.next_row().unwrap().col_string(0), "b");
        assert!(result.next_row().is_none());
    }
}
