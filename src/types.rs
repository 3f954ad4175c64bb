use std::sync::Arc;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde_json::Value as JsonValue;

use crate::vendor::{CodeTable, ErrorTranslator};

/// Values that can be bound as statement parameters or read back from a result row.
///
/// Drivers hand raw column values back in this shape: either natively typed, or as text/bytes
/// that the record mapper parses into the target field type.
/// ```rust
/// use fluent_sql::prelude::*;
///
/// let values = params![1_i64, "alice", true];
/// assert_eq!(values[1], RowValues::Text("alice".into()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data (byte-encoded text for drivers that return numbers as bytes)
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Name of the variant, used in coercion error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            RowValues::Int(_) => "integer",
            RowValues::Float(_) => "float",
            RowValues::Text(_) => "text",
            RowValues::Bool(_) => "bool",
            RowValues::Timestamp(_) => "timestamp",
            RowValues::Null => "null",
            RowValues::JSON(_) => "json",
            RowValues::Blob(_) => "blob",
        }
    }
}

macro_rules! row_values_from {
    ($($ty:ty => $variant:ident via $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for RowValues {
                fn from(value: $ty) -> Self {
                    RowValues::$variant($conv(value))
                }
            }
        )*
    };
}

row_values_from! {
    i8 => Int via i64::from,
    i16 => Int via i64::from,
    i32 => Int via i64::from,
    i64 => Int via std::convert::identity,
    u8 => Int via i64::from,
    u16 => Int via i64::from,
    u32 => Int via i64::from,
    f32 => Float via f64::from,
    f64 => Float via std::convert::identity,
    bool => Bool via std::convert::identity,
    String => Text via std::convert::identity,
    &str => Text via str::to_string,
    NaiveDateTime => Timestamp via std::convert::identity,
    JsonValue => JSON via std::convert::identity,
    Vec<u8> => Blob via std::convert::identity,
}

impl<T> From<Option<T>> for RowValues
where
    T: Into<RowValues>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// Build a `Vec<RowValues>` from heterogeneous values.
///
/// ```rust
/// use fluent_sql::params;
///
/// let id = 7_i64;
/// let values = params![id, "name", None::<i32>];
/// assert_eq!(values.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::RowValues>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::RowValues::from($value)),+]
    };
}

/// What a driver reports after running an insert/update/delete.
///
/// `None` means the driver could not provide the number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: Option<u64>,
    pub last_insert_id: Option<i64>,
}

/// The database engine a connection talks to; selects the vendor error translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DatabaseType {
    /// `SQLite` database
    Sqlite,
    /// `MySQL` / `MariaDB` database
    Mysql,
}

impl DatabaseType {
    #[must_use]
    pub fn error_translator(self) -> Arc<dyn ErrorTranslator> {
        match self {
            DatabaseType::Sqlite => Arc::new(crate::vendor::SqliteErrorTranslator::default()),
            DatabaseType::Mysql => Arc::new(CodeTable::mysql()),
        }
    }
}
