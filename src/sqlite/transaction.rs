use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::connection::{Executor, PreparedHandle, RowCursor, TransactionHandle};
use crate::error::DriverError;
use crate::types::{ExecOutcome, RowValues};

use super::SqlitePooledConnection;
use super::prepared::SqlitePrepared;
use super::query::{build_cursor, execute_dml};

/// An open `SQLite` transaction holding one pooled connection.
///
/// If it is dropped while still open, the transaction is rolled back before the connection goes
/// back to the pool.
pub struct SqliteTx {
    conn: Mutex<SqlitePooledConnection>,
    open: bool,
}

impl SqliteTx {
    pub(crate) fn new(conn: SqlitePooledConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
            open: true,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SqlitePooledConnection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run `COMMIT` or `ROLLBACK`. The transaction stays open when the statement fails, so a
    /// failed commit can still be rolled back.
    fn finish(&mut self, statement: &str) -> Result<(), DriverError> {
        if !self.open {
            return Err(DriverError::new("transaction already finished"));
        }
        let conn = match self.conn.get_mut() {
            Ok(conn) => conn,
            Err(poisoned) => poisoned.into_inner(),
        };
        conn.execute_batch(statement)?;
        self.open = false;
        Ok(())
    }
}

impl Executor for SqliteTx {
    fn execute(&self, sql: &str, params: &[RowValues]) -> Result<ExecOutcome, DriverError> {
        execute_dml(&self.lock(), sql, params)
    }

    fn query(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Box<dyn RowCursor + '_>, DriverError> {
        Ok(Box::new(build_cursor(&self.lock(), sql, params)?))
    }

    fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedHandle + '_>, DriverError> {
        self.lock().prepare_cached(sql)?;
        Ok(Box::new(SqlitePrepared::in_tx(self, Arc::new(sql.to_string()))))
    }
}

impl TransactionHandle for SqliteTx {
    fn commit(&mut self) -> Result<(), DriverError> {
        self.finish("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteTx {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        if let Err(err) = self.finish("ROLLBACK") {
            warn!(error = %err, "sqlite rollback on drop failed");
        }
    }
}
