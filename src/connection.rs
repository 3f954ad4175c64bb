//! Capabilities a database connection must expose.
//!
//! The pool and the wire protocol live outside this crate; builders only ever see these traits.

use crate::error::DriverError;
use crate::types::{ExecOutcome, RowValues};

/// Forward-only cursor over the rows of one query.
pub trait RowCursor {
    /// Column names, in result order.
    fn columns(&self) -> &[String];

    /// Next row as untyped values, `Ok(None)` once exhausted.
    ///
    /// # Errors
    /// Returns [`DriverError`] if the row cannot be read.
    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, DriverError>;
}

/// A statement compiled by the engine, re-executed with successive value sets.
pub trait PreparedHandle {
    /// # Errors
    /// Returns [`DriverError`] on engine failure, or when the handle is already closed.
    fn execute(&mut self, params: &[RowValues]) -> Result<ExecOutcome, DriverError>;

    /// Release the statement.
    ///
    /// # Errors
    /// Returns [`DriverError`] if the engine refuses, or when the handle is already closed.
    fn close(&mut self) -> Result<(), DriverError>;
}

/// Statement execution shared by pooled connections and open transactions.
pub trait Executor: Send + Sync {
    /// Run an insert/update/delete.
    ///
    /// # Errors
    /// Returns [`DriverError`] on engine failure.
    fn execute(&self, sql: &str, params: &[RowValues]) -> Result<ExecOutcome, DriverError>;

    /// Run a select.
    ///
    /// # Errors
    /// Returns [`DriverError`] on engine failure.
    fn query(&self, sql: &str, params: &[RowValues])
    -> Result<Box<dyn RowCursor + '_>, DriverError>;

    /// Compile `sql` for repeated execution.
    ///
    /// # Errors
    /// Returns [`DriverError`] if the engine cannot compile the statement.
    fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedHandle + '_>, DriverError>;
}

/// A pooled connection (or the pool itself).
pub trait Connection: Executor {
    /// # Errors
    /// Returns [`DriverError`] if the engine cannot start a transaction.
    fn begin(&self) -> Result<Box<dyn TransactionHandle + '_>, DriverError>;

    /// # Errors
    /// Returns [`DriverError`] if the pool cannot be shut down cleanly.
    fn close(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// One in-flight unit of work. Not shared between callers.
pub trait TransactionHandle: Executor {
    /// # Errors
    /// Returns [`DriverError`] if the commit fails.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns [`DriverError`] if the rollback fails.
    fn rollback(&mut self) -> Result<(), DriverError>;
}
