use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use rusqlite::types::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::driver::{
    Connection, DriverResult, ResultStream, Row, RowStream, Statement, with_returning,
};
use crate::error::SqlExecError;
use crate::results::ValueRow;
use crate::translation::PlaceholderStyle;
use crate::types::{SqlType, SqlValue};

use super::params::sql_value_to_sqlite_value;
use super::query::{build_rows, declared_columns, sqlite_extract_value};

type ParameterSet = BTreeMap<usize, Value>;

/// A borrowed `rusqlite` connection usable by the execution layer.
///
/// Statements run on the blocking thread pool; each parameter set is executed while holding
/// the connection lock and its result is handed back over a channel.
#[derive(Clone)]
pub struct SqliteConnection {
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteConnection {
    #[must_use]
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// # Errors
    /// Returns `SqlExecError::SqliteError` if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqlExecError> {
        Ok(Self::new(rusqlite::Connection::open(path)?))
    }

    /// # Errors
    /// Returns `SqlExecError::SqliteError` if the database cannot be opened.
    pub fn open_in_memory() -> Result<Self, SqlExecError> {
        Ok(Self::new(rusqlite::Connection::open_in_memory()?))
    }

    /// Run a batch of SQL statements, e.g. schema setup.
    ///
    /// # Errors
    /// Returns any error raised by SQLite or by the blocking task.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlExecError> {
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_owned();
        tokio::task::spawn_blocking(move || {
            lock(&conn).execute_batch(&sql)?;
            Ok(())
        })
        .await
        .map_err(|e| SqlExecError::ExecutionError(format!("sqlite task failed: {e}")))?
    }

    /// Run synchronous `rusqlite` logic against the connection.
    ///
    /// # Errors
    /// Propagates the callback's error or a failure of the blocking task.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, SqlExecError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlExecError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || func(&mut lock(&conn)))
            .await
            .map_err(|e| SqlExecError::ExecutionError(format!("sqlite task failed: {e}")))?
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection").finish_non_exhaustive()
    }
}

impl Connection for SqliteConnection {
    fn create_statement(&self, sql: &str) -> Box<dyn Statement> {
        Box::new(SqliteStatement {
            conn: Arc::clone(&self.conn),
            sql: sql.to_owned(),
            current: ParameterSet::new(),
            sets: Vec::new(),
            returning: Vec::new(),
        })
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Sqlite
    }
}

fn lock(conn: &Mutex<rusqlite::Connection>) -> MutexGuard<'_, rusqlite::Connection> {
    // a panic mid-statement leaves the connection itself usable
    conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

struct SqliteStatement {
    conn: Arc<Mutex<rusqlite::Connection>>,
    sql: String,
    current: ParameterSet,
    sets: Vec<ParameterSet>,
    returning: Vec<String>,
}

impl Statement for SqliteStatement {
    fn bind(&mut self, index: usize, value: SqlValue) {
        self.current.insert(index, sql_value_to_sqlite_value(value));
    }

    fn bind_null(&mut self, index: usize, _ty: SqlType) {
        self.current.insert(index, Value::Null);
    }

    fn add(&mut self) {
        self.sets.push(std::mem::take(&mut self.current));
    }

    fn return_generated_values(&mut self, columns: &[String]) {
        self.returning = columns.to_vec();
    }

    fn execute(self: Box<Self>) -> ResultStream {
        let SqliteStatement {
            conn,
            sql,
            current,
            mut sets,
            returning,
        } = *self;
        if sets.is_empty() || !current.is_empty() {
            sets.push(current);
        }
        let sql = with_returning(sql, &returning);

        stream::once(async move {
            let (tx, mut rx) = mpsc::channel(1);
            debug!(sql = %sql, parameter_sets = sets.len(), "sqlite execute");
            tokio::task::spawn_blocking(move || run_parameter_sets(&conn, &sql, sets, &tx));
            Ok::<_, SqlExecError>(stream::poll_fn(move |cx| rx.poll_recv(cx)))
        })
        .try_flatten()
        .boxed()
    }
}

type ResultSender = mpsc::Sender<Result<Box<dyn DriverResult>, SqlExecError>>;

fn run_parameter_sets(
    conn: &Mutex<rusqlite::Connection>,
    sql: &str,
    sets: Vec<ParameterSet>,
    tx: &ResultSender,
) {
    for set in sets {
        let result = execute_parameter_set(&lock(conn), sql, &set)
            .map(|result| Box::new(result) as Box<dyn DriverResult>);
        let failed = result.is_err();
        // a closed channel means the consumer dropped the stream
        if tx.blocking_send(result).is_err() || failed {
            break;
        }
    }
}

fn execute_parameter_set(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &ParameterSet,
) -> Result<SqliteResult, SqlExecError> {
    let mut stmt = conn.prepare_cached(sql)?;
    for (index, value) in params {
        stmt.raw_bind_parameter(index + 1, value)?;
    }

    if stmt.column_count() == 0 {
        let changes = stmt.raw_execute()?;
        return Ok(SqliteResult {
            rows: Vec::new(),
            rows_updated: u64::try_from(changes).unwrap_or(u64::MAX),
        });
    }

    let columns = declared_columns(&stmt);
    let column_count = columns.len();
    let readonly = stmt.readonly();
    let mut values = Vec::new();
    {
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut row_values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                row_values.push(sqlite_extract_value(row, idx)?);
            }
            values.push(row_values);
        }
    }
    let rows_updated = if readonly {
        0
    } else {
        u64::try_from(conn.changes()).unwrap_or(u64::MAX)
    };
    Ok(SqliteResult {
        rows: build_rows(columns, values),
        rows_updated,
    })
}

struct SqliteResult {
    rows: Vec<ValueRow>,
    rows_updated: u64,
}

#[async_trait]
impl DriverResult for SqliteResult {
    async fn rows_updated(self: Box<Self>) -> Result<u64, SqlExecError> {
        Ok(self.rows_updated)
    }

    fn rows(self: Box<Self>) -> RowStream {
        stream::iter(
            self.rows
                .into_iter()
                .map(|row| Ok::<_, SqlExecError>(Box::new(row) as Box<dyn Row>)),
        )
        .boxed()
    }
}
