//! Prepared insert/update/delete statements.
//!
//! The statement shape is validated once when the builder prepares it. Each execution only checks
//! that the number of values matches the placeholders of the prepared text. A handle is closed
//! exactly once: explicitly with `close`, or when it is dropped.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::connection::PreparedHandle;
use crate::error::{DbError, Reason, Violations};
use crate::placeholders::count_placeholders;
use crate::query_builder::{inserted_id, rows_affected};
use crate::types::{ExecOutcome, RowValues};
use crate::vendor::{ErrorTranslator, translate};

struct PreparedCore<'a> {
    handle: Box<dyn PreparedHandle + 'a>,
    translator: Arc<dyn ErrorTranslator>,
    sql: String,
    expected: usize,
    values: Vec<RowValues>,
    closed: bool,
}

impl<'a> PreparedCore<'a> {
    fn new(
        handle: Box<dyn PreparedHandle + 'a>,
        sql: &str,
        translator: &Arc<dyn ErrorTranslator>,
    ) -> Self {
        Self {
            handle,
            translator: Arc::clone(translator),
            expected: count_placeholders(sql),
            sql: sql.to_string(),
            values: Vec::new(),
            closed: false,
        }
    }

    fn run(&mut self) -> Result<ExecOutcome, DbError> {
        let mut v = Violations::new();
        v.check(self.values.is_empty(), Reason::ValuesEmpty).check(
            self.values.len() != self.expected,
            Reason::ColumnValueCountMismatch,
        );
        v.finish()?;

        self.handle
            .execute(&self.values)
            .map_err(|err| translate(self.translator.as_ref(), err))
    }

    fn close(&mut self) -> Result<(), DbError> {
        self.closed = true;
        debug!(sql = %self.sql, "closing prepared statement");
        self.handle
            .close()
            .map_err(|err| translate(self.translator.as_ref(), err))
    }
}

impl Drop for PreparedCore<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.handle.close() {
            warn!(sql = %self.sql, error = %err, "failed to close prepared statement on drop");
        }
    }
}

macro_rules! prepared_common {
    ($name:ident) => {
        impl $name<'_> {
            /// Values for the next execution, in placeholder order.
            pub fn values(&mut self, values: Vec<RowValues>) -> &mut Self {
                self.core.values = values;
                self
            }

            /// Number of values each execution must bind.
            #[must_use]
            pub fn expected_values(&self) -> usize {
                self.core.expected
            }

            #[must_use]
            pub fn sql(&self) -> &str {
                &self.core.sql
            }

            /// Release the statement. Closing twice reports the engine's error.
            ///
            /// # Errors
            /// Returns the translated engine error.
            pub fn close(&mut self) -> Result<(), DbError> {
                self.core.close()
            }
        }

        impl std::fmt::Debug for $name<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("sql", &self.core.sql)
                    .field("expected", &self.core.expected)
                    .field("closed", &self.core.closed)
                    .finish_non_exhaustive()
            }
        }
    };
}

/// A prepared insert, created by [`crate::InsertBuilder::prepare`].
pub struct PreparedInsert<'a> {
    core: PreparedCore<'a>,
    returning_id: bool,
}

impl<'a> PreparedInsert<'a> {
    pub(crate) fn new(
        handle: Box<dyn PreparedHandle + 'a>,
        sql: &str,
        translator: &Arc<dyn ErrorTranslator>,
    ) -> Self {
        Self {
            core: PreparedCore::new(handle, sql, translator),
            returning_id: false,
        }
    }

    /// Report the generated id from each [`PreparedInsert::execute`].
    pub fn returning_id(&mut self) -> &mut Self {
        self.returning_id = true;
        self
    }

    /// # Errors
    /// [`Reason::ValuesEmpty`] / [`Reason::ColumnValueCountMismatch`], translated engine errors,
    /// or [`Reason::LastIdUnreadable`].
    pub fn execute(&mut self) -> Result<Option<i64>, DbError> {
        let outcome = self.core.run()?;
        inserted_id(outcome, self.returning_id)
    }
}

prepared_common!(PreparedInsert);

/// A prepared update, created by [`crate::UpdateBuilder::prepare`].
///
/// Values bind the `set` columns first, then the condition.
pub struct PreparedUpdate<'a> {
    core: PreparedCore<'a>,
}

impl<'a> PreparedUpdate<'a> {
    pub(crate) fn new(
        handle: Box<dyn PreparedHandle + 'a>,
        sql: &str,
        translator: &Arc<dyn ErrorTranslator>,
    ) -> Self {
        Self {
            core: PreparedCore::new(handle, sql, translator),
        }
    }

    /// # Errors
    /// [`Reason::ValuesEmpty`] / [`Reason::ColumnValueCountMismatch`], translated engine errors,
    /// or [`Reason::NoRowsAffected`].
    pub fn execute(&mut self) -> Result<u64, DbError> {
        rows_affected(self.core.run()?)
    }
}

prepared_common!(PreparedUpdate);

/// A prepared delete, created by [`crate::DeleteBuilder::prepare`].
pub struct PreparedDelete<'a> {
    core: PreparedCore<'a>,
}

impl<'a> PreparedDelete<'a> {
    pub(crate) fn new(
        handle: Box<dyn PreparedHandle + 'a>,
        sql: &str,
        translator: &Arc<dyn ErrorTranslator>,
    ) -> Self {
        Self {
            core: PreparedCore::new(handle, sql, translator),
        }
    }

    /// # Errors
    /// [`Reason::ValuesEmpty`] / [`Reason::ColumnValueCountMismatch`], translated engine errors,
    /// or [`Reason::NoRowsAffected`].
    pub fn execute(&mut self) -> Result<u64, DbError> {
        rows_affected(self.core.run()?)
    }
}

prepared_common!(PreparedDelete);

#[cfg(test)]
mod tests {
    use crate::test_utils::ScriptedConnection;
    use crate::{DatabaseType, Db, params};

    #[test]
    fn expected_count_comes_from_placeholders() {
        let db = Db::new(ScriptedConnection::new(), DatabaseType::Mysql);
        let update = db
            .update("")
            .table("t")
            .columns(["a", "b"])
            .condition("id = ? and tipo = 'x?'", params![1])
            .prepare()
            .unwrap();
        assert_eq!(update.expected_values(), 3);
    }

    #[test]
    fn only_the_count_is_rechecked() {
        let conn = ScriptedConnection::new();
        let db = Db::new(conn.clone(), DatabaseType::Mysql);
        let mut insert = db.insert("").table("t").columns(["a", "b"]).prepare().unwrap();

        let err = insert.values(params![1]).execute().unwrap_err();
        assert!(err.is_column_value_count_mismatch());
        let err = insert.values(Vec::new()).execute().unwrap_err();
        assert!(err.is_values_empty());

        conn.push_outcome(1, Some(5));
        let id = insert.values(params![1, 2]).returning_id().execute().unwrap();
        assert_eq!(id, Some(5));
        insert.close().unwrap();
    }

    #[test]
    fn double_close_and_execute_after_close_are_engine_errors() {
        let conn = ScriptedConnection::new();
        let db = Db::new(conn.clone(), DatabaseType::Mysql);
        let mut delete = db
            .delete("")
            .table("t")
            .condition("id = ?", params![1])
            .prepare()
            .unwrap();
        delete.close().unwrap();
        assert!(delete.close().unwrap_err().is_uncaught());
        let err = delete.values(params![1]).execute().unwrap_err();
        assert!(err.is_uncaught());
        assert!(err.origin().is_some());
    }

    #[test]
    fn dropping_an_open_statement_closes_it() {
        let conn = ScriptedConnection::new();
        let db = Db::new(conn.clone(), DatabaseType::Mysql);
        {
            let _stmt = db.insert("").table("t").columns(["a"]).prepare().unwrap();
            assert_eq!(conn.open_prepared(), 1);
        }
        assert_eq!(conn.open_prepared(), 0);
    }

    #[test]
    fn creation_failure_carries_its_flag() {
        let conn = ScriptedConnection::new();
        conn.fail_next_prepare(crate::DriverError::new("no such table").with_code(1146));
        let db = Db::new(conn, DatabaseType::Mysql);
        let err = db.insert("").table("nada").columns(["a"]).prepare().unwrap_err();
        assert!(err.is_prepared_create_failed());
        assert!(err.is_table_missing());
    }
}
