use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::connection::{Connection, Executor, PreparedHandle, RowCursor, TransactionHandle};
use crate::error::DriverError;
use crate::results::BufferedCursor;
use crate::types::{ExecOutcome, RowValues};

#[derive(Default)]
struct State {
    statements: Vec<(String, Vec<RowValues>)>,
    events: Vec<String>,
    exec: VecDeque<Result<ExecOutcome, DriverError>>,
    queries: VecDeque<Result<BufferedCursor, DriverError>>,
    prepare_failure: Option<DriverError>,
    begin_failure: Option<DriverError>,
    commit_failure: Option<DriverError>,
    close_failure: Option<DriverError>,
    open_prepared: usize,
}

/// A [`Connection`] that records what it is asked to run and answers from queues.
///
/// Clones share state, so a test can keep one clone for assertions after handing another to
/// [`crate::Db::new`]. Executions with nothing queued report one affected row and no id; queries
/// with nothing queued return no columns and no rows.
///
/// ```rust
/// use fluent_sql::prelude::*;
/// use fluent_sql::test_utils::ScriptedConnection;
///
/// let conn = ScriptedConnection::new();
/// conn.push_outcome(0, None);
/// let db = Db::new(conn.clone(), DatabaseType::Mysql);
/// let err = db
///     .delete("")
///     .table("cosas")
///     .condition("id = ?", params![1])
///     .execute()
///     .unwrap_err();
/// assert!(err.is_no_rows_affected());
/// assert_eq!(conn.statements()[0].0, "delete from cosas where id = ?;");
/// ```
#[derive(Clone, Default)]
pub struct ScriptedConnection {
    state: Arc<Mutex<State>>,
}

impl ScriptedConnection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    /// Queue the outcome of the next execution.
    pub fn push_outcome(&self, rows_affected: u64, last_insert_id: Option<i64>) {
        self.push_exec(ExecOutcome {
            rows_affected: Some(rows_affected),
            last_insert_id,
        });
    }

    pub fn push_exec(&self, outcome: ExecOutcome) {
        self.lock().exec.push_back(Ok(outcome));
    }

    /// Make the next execution fail with `err`.
    pub fn push_error(&self, err: DriverError) {
        self.lock().exec.push_back(Err(err));
    }

    /// Queue the result of the next query.
    pub fn push_rows(&self, columns: &[&str], rows: Vec<Vec<RowValues>>) {
        let mut cursor = BufferedCursor::new(columns.iter().map(|c| (*c).to_string()).collect());
        for row in rows {
            cursor.push_row(row);
        }
        self.push_cursor(cursor);
    }

    pub fn push_cursor(&self, cursor: BufferedCursor) {
        self.lock().queries.push_back(Ok(cursor));
    }

    /// Make the next query fail with `err`.
    pub fn push_query_error(&self, err: DriverError) {
        self.lock().queries.push_back(Err(err));
    }

    pub fn fail_next_prepare(&self, err: DriverError) {
        self.lock().prepare_failure = Some(err);
    }

    pub fn fail_next_begin(&self, err: DriverError) {
        self.lock().begin_failure = Some(err);
    }

    pub fn fail_next_commit(&self, err: DriverError) {
        self.lock().commit_failure = Some(err);
    }

    pub fn fail_close(&self, err: DriverError) {
        self.lock().close_failure = Some(err);
    }

    /// Every executed or queried statement with its parameters, in order.
    #[must_use]
    pub fn statements(&self) -> Vec<(String, Vec<RowValues>)> {
        self.lock().statements.clone()
    }

    /// Transaction events: `begin`, `tx execute`, `tx query`, `tx prepare`, `commit`,
    /// `rollback`.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    /// Prepared handles created and not yet closed.
    #[must_use]
    pub fn open_prepared(&self) -> usize {
        self.lock().open_prepared
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn run_exec(state: &Mutex<State>, sql: &str, params: &[RowValues]) -> Result<ExecOutcome, DriverError> {
    let mut state = lock(state);
    state.statements.push((sql.to_string(), params.to_vec()));
    state.exec.pop_front().unwrap_or(Ok(ExecOutcome {
        rows_affected: Some(1),
        last_insert_id: None,
    }))
}

fn run_query(
    state: &Mutex<State>,
    sql: &str,
    params: &[RowValues],
) -> Result<Box<dyn RowCursor + 'static>, DriverError> {
    let mut state = lock(state);
    state.statements.push((sql.to_string(), params.to_vec()));
    let cursor = state
        .queries
        .pop_front()
        .unwrap_or_else(|| Ok(BufferedCursor::default()))?;
    Ok(Box::new(cursor))
}

fn open_prepared(
    state: &Arc<Mutex<State>>,
    sql: &str,
) -> Result<Box<dyn PreparedHandle + 'static>, DriverError> {
    let mut guard = lock(state);
    if let Some(err) = guard.prepare_failure.take() {
        return Err(err);
    }
    guard.open_prepared += 1;
    Ok(Box::new(ScriptedPrepared {
        state: Arc::clone(state),
        sql: sql.to_string(),
        closed: false,
    }))
}

impl Executor for ScriptedConnection {
    fn execute(&self, sql: &str, params: &[RowValues]) -> Result<ExecOutcome, DriverError> {
        run_exec(&self.state, sql, params)
    }

    fn query(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Box<dyn RowCursor + '_>, DriverError> {
        run_query(&self.state, sql, params)
    }

    fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedHandle + '_>, DriverError> {
        open_prepared(&self.state, sql)
    }
}

impl Connection for ScriptedConnection {
    fn begin(&self) -> Result<Box<dyn TransactionHandle + '_>, DriverError> {
        let mut state = self.lock();
        if let Some(err) = state.begin_failure.take() {
            return Err(err);
        }
        state.events.push("begin".into());
        Ok(Box::new(ScriptedTx {
            state: Arc::clone(&self.state),
        }))
    }

    fn close(&self) -> Result<(), DriverError> {
        match self.lock().close_failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct ScriptedTx {
    state: Arc<Mutex<State>>,
}

impl ScriptedTx {
    fn event(&self, name: &str) {
        lock(&self.state).events.push(name.to_string());
    }
}

impl Executor for ScriptedTx {
    fn execute(&self, sql: &str, params: &[RowValues]) -> Result<ExecOutcome, DriverError> {
        self.event("tx execute");
        run_exec(&self.state, sql, params)
    }

    fn query(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Box<dyn RowCursor + '_>, DriverError> {
        self.event("tx query");
        run_query(&self.state, sql, params)
    }

    fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedHandle + '_>, DriverError> {
        self.event("tx prepare");
        open_prepared(&self.state, sql)
    }
}

impl TransactionHandle for ScriptedTx {
    fn commit(&mut self) -> Result<(), DriverError> {
        let mut state = lock(&self.state);
        state.events.push("commit".into());
        match state.commit_failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.event("rollback");
        Ok(())
    }
}

struct ScriptedPrepared {
    state: Arc<Mutex<State>>,
    sql: String,
    closed: bool,
}

impl PreparedHandle for ScriptedPrepared {
    fn execute(&mut self, params: &[RowValues]) -> Result<ExecOutcome, DriverError> {
        if self.closed {
            return Err(DriverError::new("sql: statement is closed"));
        }
        run_exec(&self.state, &self.sql, params)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::new("sql: statement is closed"));
        }
        self.closed = true;
        lock(&self.state).open_prepared -= 1;
        Ok(())
    }
}
