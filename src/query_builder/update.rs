use crate::error::{DbError, Reason, Violations};
use crate::placeholders::count_placeholders;
use crate::prepared::PreparedUpdate;
use crate::types::RowValues;

use super::{Named, Target, limit_clause, rows_affected, to_strings};

/// Builder for `update <table> set <col> = ?, ... where <condition> [limit n];`.
///
/// A condition is mandatory; there is no way to render an unconditional update.
pub struct UpdateBuilder<'a> {
    named: Named<'a>,
    table: String,
    columns: Vec<String>,
    values: Vec<RowValues>,
    condition: String,
    condition_values: Vec<RowValues>,
    limit: u64,
}

impl<'a> UpdateBuilder<'a> {
    pub(crate) fn new(target: Target<'a>, name: &str) -> Self {
        Self {
            named: Named::new(target, name),
            table: String::new(),
            columns: Vec::new(),
            values: Vec::new(),
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
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = to_strings(columns);
        self
    }

    #[must_use]
    pub fn values(mut self, values: Vec<RowValues>) -> Self {
        self.values = values;
        self
    }

    /// `where` clause and its values. On a cached statement only the values are taken.
    #[must_use]
    pub fn condition(mut self, condition: impl Into<String>, values: Vec<RowValues>) -> Self {
        if !self.named.is_cached() {
            self.condition = condition.into();
        }
        self.condition_values = values;
        self
    }

    /// `0` means no limit.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// # Errors
    /// Returns every violated precondition at once: empty table name, empty column list,
    /// empty condition.
    pub fn sql(&self) -> Result<String, DbError> {
        self.named.render(
            || {
                let mut v = Violations::new();
                v.check(self.table.is_empty(), Reason::TableNameEmpty)
                    .check(self.columns.is_empty(), Reason::ColumnListEmpty)
                    .check(self.condition.is_empty(), Reason::ConditionEmpty);
                v.finish()
            },
            || {
                let assignments = self
                    .columns
                    .iter()
                    .map(|col| format!("{col} = ?"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "update {} set {} where {}{};",
                    self.table,
                    assignments,
                    self.condition,
                    limit_clause(self.limit)
                )
            },
        )
    }

    /// Run the update and return the number of rows changed.
    ///
    /// # Errors
    /// Structural errors from [`UpdateBuilder::sql`]; [`Reason::ValuesEmpty`],
    /// [`Reason::ColumnValueCountMismatch`] and [`Reason::ConditionValuesEmpty`] before touching
    /// the database; translated engine errors; [`Reason::NoRowsAffected`] when nothing matched.
    pub fn execute(&self) -> Result<u64, DbError> {
        let sql = self.sql()?;
        let mut v = Violations::new();
        let mismatched = if self.named.is_cached() {
            count_placeholders(&sql) != self.values.len() + self.condition_values.len()
        } else {
            self.columns.len() != self.values.len()
        };
        v.check(self.values.is_empty(), Reason::ValuesEmpty)
            .check(mismatched, Reason::ColumnValueCountMismatch)
            .check(
                self.condition_values.is_empty(),
                Reason::ConditionValuesEmpty,
            );
        v.finish()?;

        let params: Vec<RowValues> = self
            .values
            .iter()
            .chain(&self.condition_values)
            .cloned()
            .collect();
        let outcome = self.named.target().execute(&sql, &params)?;
        rows_affected(outcome)
    }

    /// Compile the statement; each execution binds the set values followed by the condition
    /// values.
    ///
    /// # Errors
    /// Structural errors from [`UpdateBuilder::sql`], or [`Reason::PreparedCreateFailed`].
    pub fn prepare(&self) -> Result<PreparedUpdate<'a>, DbError> {
        let sql = self.sql()?;
        let target = self.named.target();
        let handle = target.prepare(&sql)?;
        Ok(PreparedUpdate::new(handle, &sql, target.translator()))
    }
}
