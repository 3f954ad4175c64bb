
use crate::error::{DbError, Reason, Violations};
use crate::mapper::{FieldMap, Record, map_rows};
use crate::results::ResultSet;
use crate::types::RowValues;
use crate::vendor::translate;

use super::{Named, Target, to_strings};

/// Join kinds, in the order they are always rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum JoinKind {
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinKind {
    const ALL: [JoinKind; 4] = [
        JoinKind::Inner,
        JoinKind::Left,
        JoinKind::Right,
        JoinKind::Outer,
    ];

    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "inner join",
            JoinKind::Left => "left join",
            JoinKind::Right => "right join",
            JoinKind::Outer => "outer join",
        }
    }
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: String,
    on: String,
}

/// Builder for `select` statements with joins, grouping, ordering and pagination.
///
/// Rows are read into caller records with [`SelectBuilder::execute`], or returned raw with
/// [`SelectBuilder::fetch`].
pub struct SelectBuilder<'a> {
    named: Named<'a>,
    table: String,
    columns: Vec<String>,
    joins: Vec<Join>,
    condition: String,
    condition_values: Vec<RowValues>,
    group_by: Vec<String>,
    having: String,
    having_values: Vec<RowValues>,
    order_by: Vec<String>,
    limit: u64,
    offset: u64,
}

impl<'a> SelectBuilder<'a> {
    pub(crate) fn new(target: Target<'a>, name: &str) -> Self {
        Self {
            named: Named::new(target, name),
            table: String::new(),
            columns: Vec::new(),
            joins: Vec::new(),
            condition: String::new(),
            condition_values: Vec::new(),
            group_by: Vec::new(),
            having: String::new(),
            having_values: Vec::new(),
            order_by: Vec::new(),
            limit: 0,
            offset: 0,
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

    /// `where` clause and its values. On a cached statement only the values are taken.
    #[must_use]
    pub fn condition(mut self, condition: impl Into<String>, values: Vec<RowValues>) -> Self {
        if !self.named.is_cached() {
            self.condition = condition.into();
        }
        self.condition_values = values;
        self
    }

    #[must_use]
    pub fn inner_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join(JoinKind::Inner, table.into(), on.into())
    }

    #[must_use]
    pub fn left_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join(JoinKind::Left, table.into(), on.into())
    }

    #[must_use]
    pub fn right_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join(JoinKind::Right, table.into(), on.into())
    }

    #[must_use]
    pub fn outer_join(self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.join(JoinKind::Outer, table.into(), on.into())
    }

    fn join(mut self, kind: JoinKind, table: String, on: String) -> Self {
        if !self.named.is_cached() {
            self.joins.push(Join { kind, table, on });
        }
        self
    }

    #[must_use]
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.named.is_cached() {
            self.group_by = to_strings(columns);
        }
        self
    }

    /// `having` clause and its values, bound after the `where` values.
    #[must_use]
    pub fn having(mut self, condition: impl Into<String>, values: Vec<RowValues>) -> Self {
        if !self.named.is_cached() {
            self.having = condition.into();
        }
        self.having_values = values;
        self
    }

    #[must_use]
    pub fn order_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.named.is_cached() {
            self.order_by = to_strings(columns);
        }
        self
    }

    /// `0` means no limit.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Rows to skip. Without a limit, the statement gets the connection's unbounded limit.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

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
            || self.render(),
        )
    }

    fn render(&self) -> String {
        let mut sql = format!("select {} from {}", self.columns.join(", "), self.table);
        for kind in JoinKind::ALL {
            for join in self.joins.iter().filter(|j| j.kind == kind) {
                sql.push_str(&format!(" {} {} on {}", kind.keyword(), join.table, join.on));
            }
        }
        if !self.condition.is_empty() {
            sql.push_str(&format!(" where {}", self.condition));
        }
        if !self.group_by.is_empty() {
            sql.push_str(&format!(" group by {}", self.group_by.join(", ")));
        }
        if !self.having.is_empty() {
            sql.push_str(&format!(" having {}", self.having));
        }
        if !self.order_by.is_empty() {
            sql.push_str(&format!(" order by {}", self.order_by.join(", ")));
        }
        if self.limit > 0 {
            sql.push_str(&format!(" limit {}", self.limit));
        }
        if self.offset > 0 {
            if self.limit == 0 {
                sql.push_str(&format!(" limit {}", self.named.target().unbounded_limit()));
            }
            sql.push_str(&format!(" offset {}", self.offset));
        }
        sql.push(';');
        sql
    }

    fn params(&self) -> Vec<RowValues> {
        self.condition_values
            .iter()
            .chain(&self.having_values)
            .cloned()
            .collect()
    }

    /// Run the select and append one `T` per row to `dest`, returning the row count.
    ///
    /// `dest` must be empty. Field bindings are checked against the result columns before any
    /// row is read; on any failure `dest` is left empty.
    ///
    /// # Errors
    /// Structural errors from [`SelectBuilder::sql`]; [`Reason::DestinationNotSequence`];
    /// mapping errors ([`Reason::NoFieldRelations`], [`Reason::MissingColumns`],
    /// [`Reason::NestedRecord`], [`Reason::UnsupportedFieldType`], [`Reason::RowScanFailed`],
    /// [`Reason::FieldAssignmentFailed`]); translated engine errors.
    pub fn execute<T: Record>(&self, dest: &mut Vec<T>) -> Result<usize, DbError> {
        let sql = self.sql()?;
        if !dest.is_empty() {
            return Err(DbError::from_reason(Reason::DestinationNotSequence));
        }
        let fields = FieldMap::<T>::build()?;

        let mut cursor = self.named.target().query(&sql, &self.params())?;
        map_rows(&fields, cursor.as_mut(), dest)
    }

    /// Run the select and return the rows unmapped.
    ///
    /// # Errors
    /// Structural errors from [`SelectBuilder::sql`], or translated engine errors.
    pub fn fetch(&self) -> Result<ResultSet, DbError> {
        let sql = self.sql()?;
        let target = self.named.target();
        let mut cursor = target.query(&sql, &self.params())?;
        ResultSet::collect_from(cursor.as_mut())
            .map_err(|err| translate(target.translator().as_ref(), err))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::ScriptedConnection;
    use crate::{DatabaseType, Db, RowValues, impl_record, params};

    fn db() -> (ScriptedConnection, Db) {
        let conn = ScriptedConnection::new();
        (conn.clone(), Db::new(conn, DatabaseType::Mysql))
    }

    #[derive(Debug, Default, PartialEq)]
    struct Cosa {
        id: i64,
        nombre: String,
    }

    impl_record!(Cosa { id: i64, nombre: String });

    #[test]
    fn joins_render_in_fixed_kind_order() {
        let (_, db) = db();
        let sql = db
            .select("")
            .table("a")
            .columns(["a.id"])
            .outer_join("d", "d.a = a.id")
            .left_join("b", "b.a = a.id")
            .inner_join("c", "c.a = a.id")
            .right_join("e", "e.a = a.id")
            .left_join("f", "f.a = a.id")
            .sql()
            .unwrap();
        assert_eq!(
            sql,
            "select a.id from a inner join c on c.a = a.id left join b on b.a = a.id \
             left join f on f.a = a.id right join e on e.a = a.id outer join d on d.a = a.id;"
        );
    }

    #[test]
    fn renders_every_clause() {
        let (_, db) = db();
        let sql = db
            .select("")
            .table("ventas")
            .columns(["cliente", "sum(total)"])
            .condition("anio = ?", params![2024])
            .group_by(["cliente"])
            .having("sum(total) > ?", params![100])
            .order_by(["cliente", "anio desc"])
            .limit(10)
            .offset(20)
            .sql()
            .unwrap();
        assert_eq!(
            sql,
            "select cliente, sum(total) from ventas where anio = ? group by cliente \
             having sum(total) > ? order by cliente, anio desc limit 10 offset 20;"
        );
    }

    #[test]
    fn offset_without_limit_gets_unbounded_limit() {
        let (_, db) = db();
        let sql = db.select("").table("t").columns(["id"]).offset(10).sql().unwrap();
        assert_eq!(sql, "select id from t limit 2100000000 offset 10;");

        let custom = Db::new(ScriptedConnection::new(), DatabaseType::Sqlite).with_unbounded_limit(99);
        let sql = custom.select("").table("t").columns(["id"]).offset(10).sql().unwrap();
        assert_eq!(sql, "select id from t limit 99 offset 10;");
    }

    #[test]
    fn where_values_precede_having_values() {
        let (conn, db) = db();
        conn.push_rows(&["cliente"], vec![]);
        db.select("")
            .table("ventas")
            .columns(["cliente"])
            .condition("anio = ?", params![2024])
            .group_by(["cliente"])
            .having("count(*) > ?", params![3])
            .fetch()
            .unwrap();
        assert_eq!(conn.statements()[0].1, params![2024, 3]);
    }

    #[test]
    fn maps_rows_into_records() {
        let (conn, db) = db();
        conn.push_rows(
            &["id", "nombre"],
            vec![vec![RowValues::Int(7), RowValues::Text("x".into())]],
        );
        let mut cosas: Vec<Cosa> = Vec::new();
        let n = db
            .select("")
            .table("cosas")
            .columns(["id", "nombre"])
            .execute(&mut cosas)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(cosas, vec![Cosa { id: 7, nombre: "x".into() }]);
    }

    #[test]
    fn non_empty_destination_is_refused_before_querying() {
        let (conn, db) = db();
        let mut cosas = vec![Cosa::default()];
        let err = db
            .select("")
            .table("cosas")
            .columns(["id"])
            .execute(&mut cosas)
            .unwrap_err();
        assert!(err.is_destination_not_sequence());
        assert!(conn.statements().is_empty());
    }

    #[test]
    fn cached_statement_ignores_structural_setters() {
        let (conn, db) = db();
        let first = db
            .select("by_id")
            .table("cosas")
            .columns(["id", "nombre"])
            .condition("id = ?", params![1])
            .sql()
            .unwrap();

        conn.push_rows(&["id", "nombre"], vec![]);
        let again = db
            .select("by_id")
            .table("otra")
            .condition("nombre = ?", params![5])
            .order_by(["nombre"]);
        assert_eq!(again.sql().unwrap(), first);
        again.fetch().unwrap();
        assert_eq!(conn.statements()[0], (first, params![5]));
    }
}
