use crate::error::{DbError, Reason, Violations};
use crate::placeholders::{count_placeholders, placeholder_list};
use crate::prepared::PreparedInsert;
use crate::types::RowValues;

use super::{Named, Target, inserted_id, to_strings};

/// Builder for `insert into <table> (<cols>) values (<placeholders>);`.
pub struct InsertBuilder<'a> {
    named: Named<'a>,
    table: String,
    columns: Vec<String>,
    values: Vec<RowValues>,
    returning_id: bool,
}

impl<'a> InsertBuilder<'a> {
    pub(crate) fn new(target: Target<'a>, name: &str) -> Self {
        Self {
            named: Named::new(target, name),
            table: String::new(),
            columns: Vec::new(),
            values: Vec::new(),
            returning_id: false,
        }
    }

    /// Table to insert into. Ignored when the statement came from the cache.
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

    /// Values for the columns, in column order.
    #[must_use]
    pub fn values(mut self, values: Vec<RowValues>) -> Self {
        self.values = values;
        self
    }

    /// Report the id generated for the inserted row from [`InsertBuilder::execute`].
    #[must_use]
    pub fn returning_id(mut self) -> Self {
        self.returning_id = true;
        self
    }

    /// Render (or fetch from the cache) the statement text.
    ///
    /// # Errors
    /// Returns every violated precondition at once: empty table name, empty column list.
    pub fn sql(&self) -> Result<String, DbError> {
        self.named.render(
            || {
                let mut v = Violations::new();
                v.check(self.table.is_empty(), Reason::TableNameEmpty)
                    .check(self.columns.is_empty(), Reason::ColumnListEmpty);
                v.finish()
            },
            || {
                format!(
                    "insert into {} ({}) values ({});",
                    self.table,
                    self.columns.join(", "),
                    placeholder_list(self.columns.len())
                )
            },
        )
    }

    /// Run the insert. Returns the generated id when [`InsertBuilder::returning_id`] was set.
    ///
    /// # Errors
    /// Structural errors from [`InsertBuilder::sql`]; [`Reason::ValuesEmpty`] and
    /// [`Reason::ColumnValueCountMismatch`] before touching the database; translated engine
    /// errors; [`Reason::LastIdUnreadable`] if the engine cannot report the id.
    pub fn execute(&self) -> Result<Option<i64>, DbError> {
        let sql = self.sql()?;
        let mut v = Violations::new();
        // a cached statement may be reused without naming its columns again
        let expected = if self.named.is_cached() {
            count_placeholders(&sql)
        } else {
            self.columns.len()
        };
        v.check(self.values.is_empty(), Reason::ValuesEmpty)
            .check(expected != self.values.len(), Reason::ColumnValueCountMismatch);
        v.finish()?;

        let outcome = self.named.target().execute(&sql, &self.values)?;
        inserted_id(outcome, self.returning_id)
    }

    /// Compile the statement for repeated execution.
    ///
    /// # Errors
    /// Structural errors from [`InsertBuilder::sql`], or [`Reason::PreparedCreateFailed`].
    pub fn prepare(&self) -> Result<PreparedInsert<'a>, DbError> {
        let sql = self.sql()?;
        let target = self.named.target();
        let handle = target.prepare(&sql)?;
        Ok(PreparedInsert::new(handle, &sql, target.translator()))
    }
}
