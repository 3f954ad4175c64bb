use tracing::{debug, warn};

use crate::connection::TransactionHandle;
use crate::error::{DbError, Reason};
use crate::query_builder::{
    DeleteBuilder, InsertBuilder, SelectBuilder, Shared, Target, UpdateBuilder,
};
use crate::vendor::translate_in;

/// One in-flight unit of work, created by [`crate::Db::begin`].
///
/// Builders created from a transaction run inside it. Finish it with [`Transaction::commit`],
/// [`Transaction::rollback`] or [`Transaction::finalize`]; a transaction dropped without being
/// finished is rolled back.
///
/// ```rust,no_run
/// use fluent_sql::prelude::*;
///
/// # fn demo(db: &Db) -> Result<(), DbError> {
/// let tx = db.begin()?;
/// let result = tx
///     .update("precio")
///     .table("cosas")
///     .columns(["precio"])
///     .values(params![10.5])
///     .condition("id = ?", params![1])
///     .execute();
/// tx.finalize(&result)?;
/// # Ok(())
/// # }
/// ```
pub struct Transaction<'db> {
    handle: Box<dyn TransactionHandle + 'db>,
    shared: &'db Shared,
    finished: bool,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(handle: Box<dyn TransactionHandle + 'db>, shared: &'db Shared) -> Self {
        debug!("transaction started");
        Self {
            handle,
            shared,
            finished: false,
        }
    }

    fn target(&self) -> Target<'_> {
        Target::tx(self.handle.as_ref(), self.shared)
    }

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

    /// A failed commit rolls the transaction back before returning.
    ///
    /// # Errors
    /// [`Reason::TxCommitFailed`] with the engine error as origin.
    pub fn commit(mut self) -> Result<(), DbError> {
        debug!("committing transaction");
        let result = self.handle.commit();
        self.finished = true;
        result.map_err(|err| {
            if let Err(rollback_err) = self.handle.rollback() {
                warn!(error = %rollback_err, "rollback after failed commit failed");
            }
            translate_in(self.shared.translator.as_ref(), Reason::TxCommitFailed, err)
        })
    }

    /// # Errors
    /// [`Reason::TxRollbackFailed`] with the engine error as origin.
    pub fn rollback(mut self) -> Result<(), DbError> {
        self.finished = true;
        debug!("rolling back transaction");
        self.handle.rollback().map_err(|err| {
            translate_in(self.shared.translator.as_ref(), Reason::TxRollbackFailed, err)
        })
    }

    /// Commit when `result` is `Ok`, roll back when it is `Err`.
    ///
    /// # Errors
    /// The commit or rollback failure; the caller's own error is left untouched in `result`.
    pub fn finalize<T, E>(self, result: &Result<T, E>) -> Result<(), DbError> {
        if result.is_ok() {
            self.commit()
        } else {
            self.rollback()
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("transaction dropped without commit or rollback; rolling back");
        if let Err(err) = self.handle.rollback() {
            warn!(error = %err, "implicit rollback failed");
        }
    }
}
