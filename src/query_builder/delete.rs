use crate::error::{DbError, Reason, Violations};
use crate::prepared::PreparedDelete;
use crate::types::RowValues;

use super::{Named, Target, limit_clause, rows_affected};

/// Builder for `delete from <table> where <condition> [limit n];`.
pub struct DeleteBuilder<'a> {
    named: Named<'a>,
    table: String,
    condition: String,
    condition_values: Vec<RowValues>,
    limit: u64,
}

impl<'a> DeleteBuilder<'a> {
    pub(crate) fn new(target: Target<'a>, name: &str) -> Self {
        Self {
            named: Named::new(target, name),
            table: String::new(),
            condition: String::new(),
            condition_values: Vec::new(),
            limit: 0,
        }
    }

    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        if !self.named.is_cached() {
            self.table = table.into();
        }
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: impl Into<String>, values: Vec<RowValues>) -> Self {
        if !self.named.is_cached() {
            self.condition = condition.into();
        }
        self.condition_values = values;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// # Errors
    /// Returns every violated precondition at once: empty table name, empty condition.
    pub fn sql(&self) -> Result<String, DbError> {
        self.named.render(
            || {
                let mut v = Violations::new();
                v.check(self.table.is_empty(), Reason::TableNameEmpty)
                    .check(self.condition.is_empty(), Reason::ConditionEmpty);
                v.finish()
            },
            || {
                format!(
                    "delete from {} where {}{};",
                    self.table,
                    self.condition,
                    limit_clause(self.limit)
                )
            },
        )
    }

    /// Run the delete and return the number of rows removed.
    ///
    /// # Errors
    /// Structural errors from [`DeleteBuilder::sql`]; [`Reason::ConditionValuesEmpty`];
    /// translated engine errors; [`Reason::NoRowsAffected`] when nothing matched.
    pub fn execute(&self) -> Result<u64, DbError> {
        let sql = self.sql()?;
        let mut v = Violations::new();
        v.check(
            self.condition_values.is_empty(),
            Reason::ConditionValuesEmpty,
        );
        v.finish()?;

        let outcome = self
            .named
            .target()
            .execute(&sql, &self.condition_values)?;
        rows_affected(outcome)
    }

    /// # Errors
    /// Structural errors from [`DeleteBuilder::sql`], or [`Reason::PreparedCreateFailed`].
    pub fn prepare(&self) -> Result<PreparedDelete<'a>, DbError> {
        let sql = self.sql()?;
        let target = self.named.target();
        let handle = target.prepare(&sql)?;
        Ok(PreparedDelete::new(handle, &sql, target.translator()))
    }
}
