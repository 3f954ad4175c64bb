use r2d2_sqlite::rusqlite::types::Value;
use r2d2_sqlite::rusqlite::{self, params_from_iter};

use crate::error::DriverError;
use crate::results::BufferedCursor;
use crate::types::{ExecOutcome, RowValues};

use super::params::convert_params;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `DriverError` if the value cannot be read.
pub fn sqlite_extract_value_sync(row: &rusqlite::Row, idx: usize) -> Result<RowValues, DriverError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run a select and read every row up front.
///
/// The statement is released before returning. A row that fails to read ends the cursor with
/// that error.
///
/// # Errors
/// Returns `DriverError` if the statement cannot be prepared or started.
pub fn build_cursor(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[RowValues],
) -> Result<BufferedCursor, DriverError> {
    let values = convert_params(params);
    let mut stmt = conn.prepare_cached(sql)?;
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();
    let mut cursor = BufferedCursor::new(column_names);

    let mut rows = stmt.query(params_from_iter(values.iter()))?;
    loop {
        let row = match rows.next() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(err) => {
                cursor.fail_with(err.into());
                break;
            }
        };
        match (0..col_count)
            .map(|i| sqlite_extract_value_sync(row, i))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(values) => cursor.push_row(values),
            Err(err) => {
                cursor.fail_with(err);
                break;
            }
        }
    }

    Ok(cursor)
}

/// Run an insert/update/delete through the statement cache of `conn`.
///
/// # Errors
/// Returns `DriverError` if the statement fails.
pub fn execute_dml(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[RowValues],
) -> Result<ExecOutcome, DriverError> {
    let values = convert_params(params);
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.execute(params_from_iter(values.iter()))?;
    Ok(ExecOutcome {
        rows_affected: u64::try_from(rows).ok(),
        last_insert_id: Some(conn.last_insert_rowid()),
    })
}
