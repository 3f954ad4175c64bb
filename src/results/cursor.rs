use std::collections::VecDeque;

use crate::connection::RowCursor;
use crate::error::DriverError;
use crate::types::RowValues;

/// Cursor over rows that were read eagerly.
///
/// Backends that must release their statement before returning (pooled `SQLite` connections)
/// read every row up front; a row that failed to read is replayed as the error at its position.
#[derive(Debug, Default)]
pub struct BufferedCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<RowValues>>,
    failure: Option<DriverError>,
}

impl BufferedCursor {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: VecDeque::new(),
            failure: None,
        }
    }

    pub fn push_row(&mut self, row: Vec<RowValues>) {
        self.rows.push_back(row);
    }

    /// Stop the cursor with `err` after the rows pushed so far.
    pub fn fail_with(&mut self, err: DriverError) {
        self.failure = Some(err);
    }
}

impl RowCursor for BufferedCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, DriverError> {
        if let Some(row) = self.rows.pop_front() {
            return Ok(Some(row));
        }
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ResultSet;

    #[test]
    fn replays_rows_then_failure() {
        let mut cursor = BufferedCursor::new(vec!["id".into()]);
        cursor.push_row(vec![RowValues::Int(1)]);
        cursor.fail_with(DriverError::new("disk I/O error"));

        assert_eq!(cursor.next_row().unwrap(), Some(vec![RowValues::Int(1)]));
        assert!(cursor.next_row().is_err());
        assert_eq!(cursor.next_row().unwrap(), None);
    }

    #[test]
    fn collects_into_result_set_with_named_access() {
        let mut cursor = BufferedCursor::new(vec!["id".into(), "name".into()]);
        cursor.push_row(vec![RowValues::Int(1), RowValues::Text("a".into())]);
        cursor.push_row(vec![RowValues::Int(2), RowValues::Text("b".into())]);

        let set = ResultSet::collect_from(&mut cursor).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.column_names(), ["id", "name"]);
        assert_eq!(set.results[1].get("name").and_then(RowValues::as_text), Some("b"));
        assert_eq!(set.results[0].get_by_index(0), Some(&RowValues::Int(1)));
    }
}
