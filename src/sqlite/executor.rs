use std::sync::Arc;

use tracing::debug;

use crate::connection::{Connection, Executor, PreparedHandle, RowCursor, TransactionHandle};
use crate::error::DriverError;
use crate::types::{ExecOutcome, RowValues};

use super::prepared::SqlitePrepared;
use super::query::{build_cursor, execute_dml};
use super::transaction::SqliteTx;
use super::{SqlitePool, SqlitePooledConnection};

/// Blocking `SQLite` connection backed by an r2d2 pool.
///
/// Every call checks a connection out of the pool for its duration; transactions keep theirs
/// until they are finished.
#[derive(Clone, Debug)]
pub struct SqliteConnection {
    pool: SqlitePool,
}

impl SqliteConnection {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn checkout(&self) -> Result<SqlitePooledConnection, DriverError> {
        Ok(self.pool.get()?)
    }
}

impl Executor for SqliteConnection {
    fn execute(&self, sql: &str, params: &[RowValues]) -> Result<ExecOutcome, DriverError> {
        let conn = self.checkout()?;
        execute_dml(&conn, sql, params)
    }

    fn query(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Box<dyn RowCursor + '_>, DriverError> {
        let conn = self.checkout()?;
        Ok(Box::new(build_cursor(&conn, sql, params)?))
    }

    fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedHandle + '_>, DriverError> {
        {
            // compile once so syntax and schema errors surface here
            let conn = self.checkout()?;
            conn.prepare_cached(sql)?;
        }
        Ok(Box::new(SqlitePrepared::pooled(
            self.pool.clone(),
            Arc::new(sql.to_string()),
        )))
    }
}

impl Connection for SqliteConnection {
    fn begin(&self) -> Result<Box<dyn TransactionHandle + '_>, DriverError> {
        let conn = self.checkout()?;
        conn.execute_batch("BEGIN")?;
        debug!("sqlite transaction opened");
        Ok(Box::new(SqliteTx::new(conn)))
    }
}
