use std::sync::Arc;

use crate::connection::PreparedHandle;
use crate::error::DriverError;
use crate::types::{ExecOutcome, RowValues};

use super::SqlitePool;
use super::query::execute_dml;
use super::transaction::SqliteTx;

enum Source<'a> {
    Pool(SqlitePool),
    Tx(&'a SqliteTx),
}

/// Handle to a prepared `SQLite` statement.
///
/// The compiled statement lives in rusqlite's per-connection `prepare_cached` cache; the handle
/// keeps the SQL text and re-fetches it on each execution. Pooled handles may run on a different
/// pooled connection each time.
pub struct SqlitePrepared<'a> {
    source: Source<'a>,
    query: Arc<String>,
    closed: bool,
}

impl<'a> SqlitePrepared<'a> {
    pub(crate) fn pooled(pool: SqlitePool, query: Arc<String>) -> Self {
        Self {
            source: Source::Pool(pool),
            query,
            closed: false,
        }
    }

    pub(crate) fn in_tx(tx: &'a SqliteTx, query: Arc<String>) -> Self {
        Self {
            source: Source::Tx(tx),
            query,
            closed: false,
        }
    }

    /// Access the raw SQL string of the prepared statement.
    #[must_use]
    pub fn sql(&self) -> &str {
        self.query.as_str()
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed {
            Err(DriverError::new("prepared statement already closed"))
        } else {
            Ok(())
        }
    }
}

impl PreparedHandle for SqlitePrepared<'_> {
    fn execute(&mut self, params: &[RowValues]) -> Result<ExecOutcome, DriverError> {
        self.ensure_open()?;
        match &self.source {
            Source::Pool(pool) => {
                let conn = pool.get()?;
                execute_dml(&conn, &self.query, params)
            }
            Source::Tx(tx) => {
                let conn = tx.lock();
                execute_dml(&conn, &self.query, params)
            }
        }
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }
}
