// SQLite backend - a blocking connection over an r2d2 pool
//
// This module is split into several sub-modules:
// - config: pool options and `Db::connect_sqlite`
// - params: parameter conversion to rusqlite values
// - query: row extraction and eager result buffering
// - executor: the pooled `Connection`
// - transaction / prepared: transaction and prepared statement handles

pub mod config;
pub mod executor;
pub mod params;
pub mod prepared;
pub mod query;
pub mod transaction;

use r2d2_sqlite::rusqlite;

use crate::error::DriverError;

// Re-export the public API
pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use executor::SqliteConnection;
pub use prepared::SqlitePrepared;
pub use transaction::SqliteTx;

/// Type alias for the r2d2 `SQLite` pool.
pub type SqlitePool = r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>;

/// Type alias for a connection checked out of the pool.
pub type SqlitePooledConnection = r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>;

impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(ffi, _) => Some(i64::from(ffi.extended_code)),
            _ => None,
        };
        let driver = DriverError::new(err.to_string()).with_source(err);
        match code {
            Some(code) => driver.with_code(code),
            None => driver,
        }
    }
}

impl From<r2d2::Error> for DriverError {
    fn from(err: r2d2::Error) -> Self {
        DriverError::new(format!("sqlite pool error: {err}")).with_source(err)
    }
}
