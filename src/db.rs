use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{SharedStatementCache, StatementCache};
use crate::connection::Connection;
use crate::error::{DbError, Reason};
use crate::query_builder::{
    DeleteBuilder, InsertBuilder, SelectBuilder, Shared, Target, UpdateBuilder,
};
use crate::transaction::Transaction;
use crate::types::DatabaseType;
use crate::vendor::{ErrorTranslator, translate_in};

/// Limit rendered for an `offset` without an explicit `limit`.
pub const DEFAULT_UNBOUNDED_LIMIT: u64 = 2_100_000_000;

/// Handle over one connection pool: the entry point for every builder.
///
/// Safe to share between threads; the statement cache is the only mutable state.
/// ```rust
/// use fluent_sql::prelude::*;
///
/// let db = Db::connect_sqlite(SqliteOptions::new(":memory:")).unwrap();
/// let sql = db
///     .insert("nueva_cosa")
///     .table("cosas")
///     .columns(["nombre", "precio"])
///     .sql()
///     .unwrap();
/// assert_eq!(sql, "insert into cosas (nombre, precio) values (?, ?);");
/// ```
pub struct Db {
    conn: Box<dyn Connection>,
    db_type: DatabaseType,
    shared: Shared,
}

impl Db {
    /// Wrap `conn`, translating engine errors the way `db_type` reports them.
    #[must_use]
    pub fn new<C>(conn: C, db_type: DatabaseType) -> Self
    where
        C: Connection + 'static,
    {
        Self {
            conn: Box::new(conn),
            db_type,
            shared: Shared {
                cache: Arc::new(SharedStatementCache::new()),
                translator: db_type.error_translator(),
                unbounded_limit: DEFAULT_UNBOUNDED_LIMIT,
            },
        }
    }

    /// Use `cache` instead of a private [`SharedStatementCache`].
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn StatementCache>) -> Self {
        self.shared.cache = cache;
        self
    }

    /// Replace the vendor error translator chosen from the database type.
    #[must_use]
    pub fn with_translator(mut self, translator: Arc<dyn ErrorTranslator>) -> Self {
        self.shared.translator = translator;
        self
    }

    /// Limit used when a select sets an offset without a limit.
    #[must_use]
    pub fn with_unbounded_limit(mut self, limit: u64) -> Self {
        self.shared.unbounded_limit = limit;
        self
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    fn target(&self) -> Target<'_> {
        Target::pool(self.conn.as_ref(), &self.shared)
    }

    /// Insert builder under the logical `name`; an empty name is never cached.
    #[must_use]
    pub fn insert(&self, name: &str) -> InsertBuilder<'_> {
        InsertBuilder::new(self.target(), name)
    }

    #[must_use]
    pub fn update(&self, name: &str) -> UpdateBuilder<'_> {
        UpdateBuilder::new(self.target(), name)
    }

    #[must_use]
    pub fn delete(&self, name: &str) -> DeleteBuilder<'_> {
        DeleteBuilder::new(self.target(), name)
    }

    #[must_use]
    pub fn select(&self, name: &str) -> SelectBuilder<'_> {
        SelectBuilder::new(self.target(), name)
    }

    /// # Errors
    /// [`Reason::TxBeginFailed`] with the engine error as origin.
    pub fn begin(&self) -> Result<Transaction<'_>, DbError> {
        let handle = self.conn.begin().map_err(|err| {
            translate_in(self.shared.translator.as_ref(), Reason::TxBeginFailed, err)
        })?;
        Ok(Transaction::new(handle, &self.shared))
    }

    /// Shut the pool down.
    ///
    /// # Errors
    /// [`Reason::CloseFailed`] with the engine error as origin.
    pub fn close(self) -> Result<(), DbError> {
        debug!(db_type = ?self.db_type, "closing database handle");
        self.conn.close().map_err(|err| {
            translate_in(self.shared.translator.as_ref(), Reason::CloseFailed, err)
        })
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("db_type", &self.db_type)
            .field("unbounded_limit", &self.shared.unbounded_limit)
            .finish_non_exhaustive()
    }
}
