use r2d2_sqlite::rusqlite::types::Value;

use crate::types::RowValues;

/// Timestamp layout written to `SQLite` text columns.
pub const TIMESTAMP_FORMAT: &str = "%F %T%.f";

/// Convert a single `RowValues` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
        RowValues::Null => Value::Null,
        // Only serialize once
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Convert statement parameters into owned `SQLite` values.
#[must_use]
pub fn convert_params(params: &[RowValues]) -> Vec<Value> {
    params.iter().map(row_value_to_sqlite_value).collect()
}
