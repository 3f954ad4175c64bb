use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::Db;
use crate::error::{DbError, DriverError, Reason};
use crate::types::DatabaseType;

use super::executor::SqliteConnection;

fn default_max_size() -> u32 {
    10
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_connection_timeout_ms() -> u64 {
    30_000
}

/// Options for configuring a `SQLite` pool.
///
/// Deserializable, so it can be read straight out of a config file:
/// ```rust
/// use fluent_sql::sqlite::SqliteOptions;
///
/// let opts: SqliteOptions = serde_json::from_str(r#"{ "db_path": "app.db" }"#).unwrap();
/// assert_eq!(opts.max_size, 10);
/// assert_eq!(opts.min_idle, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteOptions {
    pub db_path: String,
    /// Maximum open connections.
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    /// Idle connections kept ready; `None` keeps up to `max_size`.
    #[serde(default)]
    pub min_idle: Option<u32>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// How long opening (and later checkouts) may wait for a connection.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// Enforce foreign keys on every pooled connection.
    #[serde(default)]
    pub foreign_keys: bool,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            max_size: default_max_size(),
            min_idle: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            connection_timeout_ms: default_connection_timeout_ms(),
            foreign_keys: false,
        }
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn max_size(mut self, max_size: u32) -> Self {
        self.opts.max_size = max_size;
        self
    }

    #[must_use]
    pub fn min_idle(mut self, min_idle: u32) -> Self {
        self.opts.min_idle = Some(min_idle);
        self
    }

    #[must_use]
    pub fn busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.opts.busy_timeout_ms = busy_timeout_ms;
        self
    }

    #[must_use]
    pub fn connection_timeout_ms(mut self, connection_timeout_ms: u64) -> Self {
        self.opts.connection_timeout_ms = connection_timeout_ms;
        self
    }

    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.opts.foreign_keys = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Open the pool and wrap it in a [`Db`].
    ///
    /// # Errors
    ///
    /// Returns [`Reason::OpenFailed`] if pool creation or the initial pragma fails.
    pub fn build(self) -> Result<Db, DbError> {
        Db::connect_sqlite(self.finish())
    }
}

impl Db {
    #[must_use]
    pub fn sqlite_builder(db_path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    /// Open an r2d2 `SQLite` pool and switch the database to WAL.
    ///
    /// # Errors
    /// Returns [`Reason::OpenFailed`] with the pool or engine error as origin.
    pub fn connect_sqlite(opts: SqliteOptions) -> Result<Self, DbError> {
        let busy_timeout = Duration::from_millis(opts.busy_timeout_ms);
        let foreign_keys = opts.foreign_keys;
        let manager = SqliteConnectionManager::file(&opts.db_path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            if foreign_keys {
                conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            }
            Ok(())
        });

        let open_failed = |err: DriverError| DbError::from_reason(Reason::OpenFailed).with_origin(err);

        let pool = r2d2::Pool::builder()
            .max_size(opts.max_size)
            .min_idle(opts.min_idle)
            .connection_timeout(Duration::from_millis(opts.connection_timeout_ms))
            .build(manager)
            .map_err(|err| open_failed(err.into()))?;

        // Initialize the database
        {
            let conn = pool.get().map_err(|err| open_failed(err.into()))?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")
                .map_err(|err| open_failed(err.into()))?;
        }

        debug!(db_path = %opts.db_path, max_size = opts.max_size, "sqlite pool opened");
        Ok(Db::new(SqliteConnection::new(pool), DatabaseType::Sqlite))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let opts = Db::sqlite_builder("x.db")
            .max_size(4)
            .min_idle(1)
            .busy_timeout_ms(250)
            .finish();
        assert_eq!(
            opts,
            SqliteOptions {
                db_path: "x.db".into(),
                max_size: 4,
                min_idle: Some(1),
                busy_timeout_ms: 250,
                connection_timeout_ms: 30_000,
                foreign_keys: false,
            }
        );
    }

    #[test]
    fn unopenable_path_reports_open_failed() {
        let err = Db::sqlite_builder("/nonexistent-dir/sub/app.db")
            .connection_timeout_ms(200)
            .build()
            .unwrap_err();
        assert!(err.is_open_failed());
        assert!(err.origin().is_some());
    }
}
