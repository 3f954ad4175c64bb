//! Fluent statement builders and the dispatch they share.
//!
//! A builder is created from a [`crate::Db`] or a [`crate::Transaction`] under a logical name.
//! When the name is already in the statement cache, the builder starts in the cached state:
//! rendering returns the cached text verbatim and structural clause setters are ignored, while
//! value setters keep working.

mod delete;
mod insert;
mod select;
mod update;

use std::sync::Arc;

use tracing::{debug, trace};

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

use crate::cache::StatementCache;
use crate::connection::{Connection, PreparedHandle, RowCursor, TransactionHandle};
use crate::error::{DbError, Reason};
use crate::types::{ExecOutcome, RowValues};
use crate::vendor::{ErrorTranslator, translate, translate_in};

/// Services shared by every builder of one [`crate::Db`].
pub(crate) struct Shared {
    pub(crate) cache: Arc<dyn StatementCache>,
    pub(crate) translator: Arc<dyn ErrorTranslator>,
    pub(crate) unbounded_limit: u64,
}

/// Where a builder runs: the pooled connection or an open transaction.
#[derive(Clone, Copy)]
pub(crate) struct Target<'a> {
    kind: TargetKind<'a>,
    shared: &'a Shared,
}

#[derive(Clone, Copy)]
pub(crate) enum TargetKind<'a> {
    Pool(&'a dyn Connection),
    Tx(&'a dyn TransactionHandle),
}

impl<'a> Target<'a> {
    pub(crate) fn pool(conn: &'a dyn Connection, shared: &'a Shared) -> Self {
        Self {
            kind: TargetKind::Pool(conn),
            shared,
        }
    }

    pub(crate) fn tx(tx: &'a dyn TransactionHandle, shared: &'a Shared) -> Self {
        Self {
            kind: TargetKind::Tx(tx),
            shared,
        }
    }

    fn in_tx(&self) -> bool {
        matches!(self.kind, TargetKind::Tx(_))
    }

    pub(crate) fn translator(&self) -> &'a Arc<dyn ErrorTranslator> {
        &self.shared.translator
    }

    pub(crate) fn unbounded_limit(&self) -> u64 {
        self.shared.unbounded_limit
    }

    /// Run an insert/update/delete; engine failures go through the vendor translator.
    pub(crate) fn execute(&self, sql: &str, params: &[RowValues]) -> Result<ExecOutcome, DbError> {
        trace!(sql, params = params.len(), in_tx = self.in_tx(), "execute");
        let result = match self.kind {
            TargetKind::Pool(conn) => conn.execute(sql, params),
            TargetKind::Tx(tx) => tx.execute(sql, params),
        };
        result.map_err(|err| translate(self.translator().as_ref(), err))
    }

    pub(crate) fn query(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Box<dyn RowCursor + 'a>, DbError> {
        trace!(sql, params = params.len(), in_tx = self.in_tx(), "query");
        let result = match self.kind {
            TargetKind::Pool(conn) => conn.query(sql, params),
            TargetKind::Tx(tx) => tx.query(sql, params),
        };
        result.map_err(|err| translate(self.translator().as_ref(), err))
    }

    pub(crate) fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedHandle + 'a>, DbError> {
        debug!(sql, in_tx = self.in_tx(), "preparing statement");
        let result = match self.kind {
            TargetKind::Pool(conn) => conn.prepare(sql),
            TargetKind::Tx(tx) => tx.prepare(sql),
        };
        result.map_err(|err| {
            translate_in(self.translator().as_ref(), Reason::PreparedCreateFailed, err)
        })
    }
}

/// The logical name of a builder and the cached text it resolved to, if any.
pub(crate) struct Named<'a> {
    target: Target<'a>,
    name: String,
    cached: Option<Arc<str>>,
}

impl<'a> Named<'a> {
    pub(crate) fn new(target: Target<'a>, name: &str) -> Self {
        let cached = target.shared.cache.get(name);
        if cached.is_some() {
            debug!(name, "statement found in cache");
        }
        Self {
            target,
            name: name.to_string(),
            cached,
        }
    }

    pub(crate) fn target(&self) -> Target<'a> {
        self.target
    }

    /// `true` when structural setters must be ignored.
    pub(crate) fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Cached text, or validate and render a fresh one and store it under this name.
    pub(crate) fn render(
        &self,
        validate: impl FnOnce() -> Result<(), DbError>,
        render: impl FnOnce() -> String,
    ) -> Result<String, DbError> {
        if let Some(sql) = &self.cached {
            return Ok(sql.to_string());
        }
        validate()?;
        let sql = render();
        let cache = &self.target.shared.cache;
        cache.put(&self.name, &sql);
        debug!(name = %self.name, sql = %sql, "statement rendered");
        // another builder may have stored this name first
        Ok(cache
            .get(&self.name)
            .map_or(sql, |stored| stored.to_string()))
    }
}

/// Rows affected by an update/delete; zero is its own failure.
pub(crate) fn rows_affected(outcome: ExecOutcome) -> Result<u64, DbError> {
    match outcome.rows_affected {
        None => Err(DbError::from_reason(Reason::AffectedRowsUnreadable)),
        Some(0) => Err(DbError::from_reason(Reason::NoRowsAffected)),
        Some(n) => Ok(n),
    }
}

/// Last inserted id when the caller asked for it.
pub(crate) fn inserted_id(outcome: ExecOutcome, wanted: bool) -> Result<Option<i64>, DbError> {
    if !wanted {
        return Ok(None);
    }
    outcome
        .last_insert_id
        .map(Some)
        .ok_or_else(|| DbError::from_reason(Reason::LastIdUnreadable))
}

pub(crate) fn to_strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

/// ` limit n`, or nothing when `n` is zero.
fn limit_clause(limit: u64) -> String {
    if limit > 0 {
        format!(" limit {limit}")
    } else {
        String::new()
    }
}
