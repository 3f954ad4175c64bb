use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Named cause of a failure. Several reasons may be set on one [`DbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Reason {
    // Connection
    OpenFailed,
    CloseFailed,

    // Statement shape
    TableNameEmpty,
    ColumnListEmpty,
    ConditionEmpty,
    ConditionValuesEmpty,

    // Execution shape
    ValuesEmpty,
    ColumnValueCountMismatch,

    // Vendor-translated
    TableMissing,
    ColumnMissing,
    DuplicateKey,
    ValueOutOfRange,
    WrongScalarType,
    WrongJsonType,
    Uncaught,

    // Outcome
    AffectedRowsUnreadable,
    NoRowsAffected,
    LastIdUnreadable,

    // Mapping
    DestinationNotSequence,
    NoFieldRelations,
    NestedRecord,
    UnsupportedFieldType,
    MissingColumns,
    RowScanFailed,
    FieldAssignmentFailed,

    // Prepared statement
    PreparedCreateFailed,

    // Transaction
    TxBeginFailed,
    TxCommitFailed,
    TxRollbackFailed,
}

impl Reason {
    /// Fixed message recorded when this reason is raised.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Reason::OpenFailed => "unable to connect to the database",
            Reason::CloseFailed => "unable to close the database connection",
            Reason::TableNameEmpty => "cannot build the statement because the table name is empty",
            Reason::ColumnListEmpty => "cannot build the statement because the column list is empty",
            Reason::ConditionEmpty => {
                "cannot build the statement because the condition is empty; unconditional updates and deletes are not allowed"
            }
            Reason::ConditionValuesEmpty => {
                "cannot execute the statement because the condition values are empty"
            }
            Reason::ValuesEmpty => "cannot execute the statement because the value list is empty",
            Reason::ColumnValueCountMismatch => {
                "cannot execute the statement because the number of columns does not match the number of values"
            }
            Reason::TableMissing => "the table does not exist in the database",
            Reason::ColumnMissing => "at least one column does not exist in the table",
            Reason::DuplicateKey => "a unique key already holds the received value (duplicate entry)",
            Reason::ValueOutOfRange => "at least one value exceeds the range allowed by its column",
            Reason::WrongScalarType => "at least one column received a value of the wrong type",
            Reason::WrongJsonType => "at least one JSON column received an invalid JSON value",
            Reason::Uncaught => "the database returned an unexpected error while executing the statement",
            Reason::AffectedRowsUnreadable => "unable to read the number of affected rows",
            Reason::NoRowsAffected => {
                "the statement ran successfully but no row was affected (missing row or unchanged values)"
            }
            Reason::LastIdUnreadable => "unable to read the last inserted id",
            Reason::DestinationNotSequence => {
                "the destination must be an empty sequence of a single record type"
            }
            Reason::NoFieldRelations => "the record type has no field bound to a result column",
            Reason::NestedRecord => "the record type contains a nested record field",
            Reason::UnsupportedFieldType => "the record type contains a field of an unsupported type",
            Reason::MissingColumns => "the query returned columns with no matching record field",
            Reason::RowScanFailed => "unable to read the columns of a result row",
            Reason::FieldAssignmentFailed => "unable to assign a result column to its record field",
            Reason::PreparedCreateFailed => "unable to create the prepared statement",
            Reason::TxBeginFailed => "unable to begin the transaction",
            Reason::TxCommitFailed => "unable to commit the transaction",
            Reason::TxRollbackFailed => "unable to roll back the transaction",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Structured error returned by every fallible operation of the crate.
///
/// Carries the underlying cause (if any), one message per contributing reason, and the set of
/// reasons. Use the `is_*` predicates to branch on a specific cause:
/// ```rust
/// use fluent_sql::{DbError, Reason};
///
/// let err = DbError::from_reason(Reason::NoRowsAffected);
/// assert!(err.is_no_rows_affected());
/// assert!(!err.is_duplicate_key());
/// ```
#[derive(Debug, Default, Error)]
#[error("{}", .messages.join(". "))]
pub struct DbError {
    #[source]
    origin: Option<BoxError>,
    messages: Vec<String>,
    reasons: BTreeSet<Reason>,
    missing_columns: Vec<String>,
    failed_column: Option<String>,
}

impl DbError {
    #[must_use]
    pub fn from_reason(reason: Reason) -> Self {
        Self::default().with_reason(reason)
    }

    /// Add a reason (and its message) to this error.
    #[must_use]
    pub fn with_reason(mut self, reason: Reason) -> Self {
        self.push(reason);
        self
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_origin<E>(mut self, origin: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.origin = Some(origin.into());
        self
    }

    pub(crate) fn push(&mut self, reason: Reason) {
        self.push_with_detail(reason, None);
    }

    fn push_with_detail(&mut self, reason: Reason, detail: Option<String>) {
        let message = match detail {
            Some(detail) => format!("{}: {detail}", reason.message()),
            None => reason.message().to_string(),
        };
        self.messages.push(message);
        self.reasons.insert(reason);
    }

    pub(crate) fn missing_columns_error(columns: Vec<String>) -> Self {
        let mut err = Self::default();
        err.push_with_detail(Reason::MissingColumns, Some(columns.join(", ")));
        err.missing_columns = columns;
        err
    }

    pub(crate) fn field_assignment_error<E>(column: &str, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        let cause = cause.into();
        let mut err = Self::default();
        err.push_with_detail(
            Reason::FieldAssignmentFailed,
            Some(format!("column {column}: {cause}")),
        );
        err.failed_column = Some(column.to_string());
        err.origin = Some(cause);
        err
    }

    /// Downcast a generic error into the structured error, if it is one.
    #[must_use]
    pub fn from_error<'e>(err: &'e (dyn std::error::Error + 'static)) -> Option<&'e DbError> {
        err.downcast_ref::<DbError>()
    }

    #[must_use]
    pub fn has(&self, reason: Reason) -> bool {
        self.reasons.contains(&reason)
    }

    pub fn reasons(&self) -> impl Iterator<Item = Reason> + '_ {
        self.reasons.iter().copied()
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// The underlying engine (or coercion) error, if any.
    #[must_use]
    pub fn origin(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.origin.as_deref()
    }

    /// Result columns that had no matching record field.
    #[must_use]
    pub fn missing_columns(&self) -> &[String] {
        &self.missing_columns
    }

    /// Column whose value could not be assigned to its record field.
    #[must_use]
    pub fn failed_column(&self) -> Option<&str> {
        self.failed_column.as_deref()
    }
}

macro_rules! reason_predicates {
    ($($method:ident => $reason:ident),* $(,)?) => {
        impl DbError {
            $(
                #[must_use]
                pub fn $method(&self) -> bool {
                    self.has(Reason::$reason)
                }
            )*
        }
    };
}

reason_predicates! {
    is_open_failed => OpenFailed,
    is_close_failed => CloseFailed,
    is_table_name_empty => TableNameEmpty,
    is_column_list_empty => ColumnListEmpty,
    is_condition_empty => ConditionEmpty,
    is_condition_values_empty => ConditionValuesEmpty,
    is_values_empty => ValuesEmpty,
    is_column_value_count_mismatch => ColumnValueCountMismatch,
    is_table_missing => TableMissing,
    is_column_missing => ColumnMissing,
    is_duplicate_key => DuplicateKey,
    is_value_out_of_range => ValueOutOfRange,
    is_wrong_scalar_type => WrongScalarType,
    is_wrong_json_type => WrongJsonType,
    is_uncaught => Uncaught,
    is_affected_rows_unreadable => AffectedRowsUnreadable,
    is_no_rows_affected => NoRowsAffected,
    is_last_id_unreadable => LastIdUnreadable,
    is_destination_not_sequence => DestinationNotSequence,
    is_no_field_relations => NoFieldRelations,
    is_nested_record => NestedRecord,
    is_unsupported_field_type => UnsupportedFieldType,
    is_missing_columns => MissingColumns,
    is_row_scan_failed => RowScanFailed,
    is_field_assignment_failed => FieldAssignmentFailed,
    is_prepared_create_failed => PreparedCreateFailed,
    is_tx_begin_failed => TxBeginFailed,
    is_tx_commit_failed => TxCommitFailed,
    is_tx_rollback_failed => TxRollbackFailed,
}

/// Accumulates every violated precondition of one validation pass.
#[derive(Debug, Default)]
pub(crate) struct Violations(DbError);

impl Violations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn check(&mut self, violated: bool, reason: Reason) -> &mut Self {
        if violated {
            self.0.push(reason);
        }
        self
    }

    pub(crate) fn finish(self) -> Result<(), DbError> {
        if self.0.reasons.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

/// Error reported by a connection implementation.
///
/// `code` is the engine's numeric error code (e.g. `1062` on `MySQL`, the extended result code
/// on `SQLite`); translators map it to a [`Reason`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DriverError {
    pub code: Option<i64>,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl DriverError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.source = Some(source.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_every_violation() {
        let mut v = Violations::new();
        v.check(true, Reason::TableNameEmpty)
            .check(false, Reason::ColumnListEmpty)
            .check(true, Reason::ConditionEmpty);
        let err = v.finish().unwrap_err();
        assert!(err.is_table_name_empty());
        assert!(err.is_condition_empty());
        assert!(!err.is_column_list_empty());
        assert_eq!(err.messages().len(), 2);
        assert!(err.to_string().contains(". "));
    }

    #[test]
    fn empty_accumulator_is_ok() {
        assert!(Violations::new().finish().is_ok());
    }

    #[test]
    fn origin_is_exposed_as_source() {
        let err = DbError::from_reason(Reason::Uncaught)
            .with_origin(DriverError::new("boom").with_code(9));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "boom");
        assert!(err.origin().is_some());
    }

    #[test]
    fn downcasts_from_boxed_error() {
        let boxed: Box<dyn std::error::Error> = Box::new(DbError::from_reason(Reason::ValuesEmpty));
        let err = DbError::from_error(boxed.as_ref()).unwrap();
        assert!(err.is_values_empty());

        let other: Box<dyn std::error::Error> = Box::new(std::fmt::Error);
        assert!(DbError::from_error(other.as_ref()).is_none());
    }

    #[test]
    fn missing_columns_lists_every_column() {
        let err = DbError::missing_columns_error(vec!["a".into(), "b".into()]);
        assert!(err.is_missing_columns());
        assert_eq!(err.missing_columns(), ["a", "b"]);
        assert!(err.to_string().ends_with("a, b"));
    }
}
