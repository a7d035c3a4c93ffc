//! Scripted in-memory driver.
//!
//! Records every statement the execution layer creates together with its binds, `add()` calls and
//! generated-key requests, and replays canned results. Nothing is logged until the result stream
//! is polled, so tests can also observe laziness.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};

use crate::driver::{
    Connection, ConnectionProvider, DriverResult, FixedConnectionProvider, ResultStream, Row,
    RowStream, Statement,
};
use crate::error::SqlExecError;
use crate::results::{ColumnMetadata, RowMetadata, ValueRow};
use crate::translation::PlaceholderStyle;
use crate::types::{SqlType, SqlValue};

#[cfg(feature = "test-utils-postgres")]
mod embedded;

#[cfg(feature = "test-utils-postgres")]
pub use embedded::EmbeddedPostgres;

/// One bind call on a scripted statement.
#[derive(Debug, Clone, PartialEq)]
pub enum BindCall {
    Value { index: usize, value: SqlValue },
    Null { index: usize, ty: SqlType },
}

/// Everything a scripted statement saw before and during execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementLog {
    pub sql: String,
    /// Bind calls grouped per parameter set, in call order.
    pub parameter_sets: Vec<Vec<BindCall>>,
    pub add_calls: usize,
    pub returning: Vec<String>,
    /// Number of parameter sets actually executed (results pulled from the stream).
    pub executions: usize,
}

/// Canned result handed out per executed parameter set.
#[derive(Debug, Clone)]
pub enum ScriptedResult {
    Updated(u64),
    Rows(Arc<RowMetadata>, Vec<Vec<SqlValue>>),
}

impl ScriptedResult {
    /// Rows with the given `(name, type)` columns.
    #[must_use]
    pub fn rows(columns: &[(&str, Option<SqlType>)], rows: Vec<Vec<SqlValue>>) -> Self {
        let metadata = RowMetadata::new(
            columns
                .iter()
                .map(|(name, ty)| ColumnMetadata::new(*name, *ty))
                .collect(),
        );
        ScriptedResult::Rows(Arc::new(metadata), rows)
    }
}

#[async_trait]
impl DriverResult for ScriptedResult {
    async fn rows_updated(self: Box<Self>) -> Result<u64, SqlExecError> {
        match *self {
            ScriptedResult::Updated(count) => Ok(count),
            ScriptedResult::Rows(_, rows) => Ok(rows.len() as u64),
        }
    }

    fn rows(self: Box<Self>) -> RowStream {
        match *self {
            ScriptedResult::Updated(_) => stream::empty().boxed(),
            ScriptedResult::Rows(metadata, rows) => {
                let rows = rows.into_iter().map(move |values| {
                    let row: Box<dyn Row> = Box::new(ValueRow::new(Arc::clone(&metadata), values));
                    Ok::<_, SqlExecError>(row)
                });
                stream::iter(rows).boxed()
            }
        }
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    statements: Vec<StatementLog>,
    responses: VecDeque<ScriptedResult>,
}

/// A connection that records instead of talking to a database.
#[derive(Debug, Clone)]
pub struct ScriptedConnection {
    state: Arc<Mutex<ScriptState>>,
    style: PlaceholderStyle,
}

impl ScriptedConnection {
    #[must_use]
    pub fn new(style: PlaceholderStyle) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState::default())),
            style,
        }
    }

    /// Queue results; each executed parameter set takes the next one, `Updated(1)` once empty.
    pub fn respond_with(&self, results: Vec<ScriptedResult>) {
        self.lock().responses.extend(results);
    }

    /// Statements executed so far, in execution order.
    #[must_use]
    pub fn statements(&self) -> Vec<StatementLog> {
        self.lock().statements.clone()
    }

    /// A provider lending this connection.
    #[must_use]
    pub fn provider(&self) -> Arc<dyn ConnectionProvider> {
        FixedConnectionProvider::shared(Arc::new(self.clone()))
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Connection for ScriptedConnection {
    fn create_statement(&self, sql: &str) -> Box<dyn Statement> {
        Box::new(ScriptedStatement {
            connection: self.clone(),
            log: StatementLog {
                sql: sql.to_owned(),
                parameter_sets: vec![Vec::new()],
                ..StatementLog::default()
            },
        })
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        self.style
    }
}

struct ScriptedStatement {
    connection: ScriptedConnection,
    log: StatementLog,
}

impl ScriptedStatement {
    fn current(&mut self) -> &mut Vec<BindCall> {
        if self.log.parameter_sets.is_empty() {
            self.log.parameter_sets.push(Vec::new());
        }
        let last = self.log.parameter_sets.len() - 1;
        &mut self.log.parameter_sets[last]
    }
}

impl Statement for ScriptedStatement {
    fn bind(&mut self, index: usize, value: SqlValue) {
        self.current().push(BindCall::Value { index, value });
    }

    fn bind_null(&mut self, index: usize, ty: SqlType) {
        self.current().push(BindCall::Null { index, ty });
    }

    fn add(&mut self) {
        self.log.add_calls += 1;
        self.log.parameter_sets.push(Vec::new());
    }

    fn return_generated_values(&mut self, columns: &[String]) {
        self.log.returning = columns.to_vec();
    }

    fn execute(self: Box<Self>) -> ResultStream {
        let ScriptedStatement {
            connection,
            mut log,
        } = *self;
        // a trailing empty set after add() is not executed
        if log.add_calls > 0 && log.parameter_sets.last().is_some_and(Vec::is_empty) {
            log.parameter_sets.pop();
        }
        let sets = log.parameter_sets.len().max(1);

        stream::once(async move {
            let position = {
                let mut state = connection.lock();
                state.statements.push(log);
                state.statements.len() - 1
            };
            stream::iter(0..sets).map(move |_| {
                let mut state = connection.lock();
                state.statements[position].executions += 1;
                let result = state
                    .responses
                    .pop_front()
                    .unwrap_or(ScriptedResult::Updated(1));
                Ok::<_, SqlExecError>(Box::new(result) as Box<dyn DriverResult>)
            })
        })
        .flatten()
        .boxed()
    }
}
