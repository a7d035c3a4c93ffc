use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, RowStream as PgRowStream};
use tracing::debug;

use crate::driver::{
    Connection, DriverResult, ResultStream, Row, RowStream, Statement, with_returning,
};
use crate::error::SqlExecError;
use crate::results::RowMetadata;
use crate::translation::PlaceholderStyle;
use crate::types::{SqlType, SqlValue};

use super::query::{PgRow, statement_metadata};

type ParameterSet = BTreeMap<usize, SqlValue>;

/// A borrowed `tokio_postgres` client usable by the execution layer.
///
/// The client is shared, never closed here; transactions begun on it stay the caller's.
#[derive(Clone)]
pub struct PostgresConnection {
    client: Arc<Client>,
}

impl PostgresConnection {
    #[must_use]
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl std::fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

impl Connection for PostgresConnection {
    fn create_statement(&self, sql: &str) -> Box<dyn Statement> {
        Box::new(PostgresStatement {
            client: Arc::clone(&self.client),
            sql: sql.to_owned(),
            current: ParameterSet::new(),
            sets: Vec::new(),
            returning: Vec::new(),
        })
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Postgres
    }
}

struct PostgresStatement {
    client: Arc<Client>,
    sql: String,
    current: ParameterSet,
    sets: Vec<ParameterSet>,
    returning: Vec<String>,
}

impl Statement for PostgresStatement {
    fn bind(&mut self, index: usize, value: SqlValue) {
        self.current.insert(index, value);
    }

    fn bind_null(&mut self, index: usize, _ty: SqlType) {
        // the prepared statement already knows the parameter type
        self.current.insert(index, SqlValue::Null);
    }

    fn add(&mut self) {
        self.sets.push(std::mem::take(&mut self.current));
    }

    fn return_generated_values(&mut self, columns: &[String]) {
        self.returning = columns.to_vec();
    }

    fn execute(self: Box<Self>) -> ResultStream {
        let PostgresStatement {
            client,
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
            debug!(sql = %sql, parameter_sets = sets.len(), "postgres execute");
            let statement = client.prepare(&sql).await?;
            let metadata = Arc::new(statement_metadata(&statement));
            let results = stream::iter(sets).then(move |set| {
                let client = Arc::clone(&client);
                let statement = statement.clone();
                let metadata = Arc::clone(&metadata);
                async move { execute_parameter_set(&client, &statement, metadata, set).await }
            });
            Ok::<_, SqlExecError>(results)
        })
        .try_flatten()
        .boxed()
    }
}

async fn execute_parameter_set(
    client: &Client,
    statement: &tokio_postgres::Statement,
    metadata: Arc<RowMetadata>,
    set: ParameterSet,
) -> Result<Box<dyn DriverResult>, SqlExecError> {
    let expected = statement.params().len();
    let mut values = vec![SqlValue::Null; expected];
    for (index, value) in set {
        let slot = values.get_mut(index).ok_or_else(|| {
            SqlExecError::ExecutionError(format!(
                "parameter {index} bound but statement takes {expected}"
            ))
        })?;
        *slot = value;
    }

    if statement.columns().is_empty() {
        let params: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        let count = client.execute(statement, &params).await?;
        return Ok(Box::new(PgResult::Updated(count)));
    }

    let rows = client.query_raw(statement, values.iter()).await?;
    Ok(Box::new(PgResult::Rows {
        rows: Box::pin(rows),
        metadata,
    }))
}

enum PgResult {
    Updated(u64),
    Rows {
        rows: Pin<Box<PgRowStream>>,
        metadata: Arc<RowMetadata>,
    },
}

#[async_trait]
impl DriverResult for PgResult {
    async fn rows_updated(self: Box<Self>) -> Result<u64, SqlExecError> {
        match *self {
            PgResult::Updated(count) => Ok(count),
            PgResult::Rows { mut rows, .. } => {
                while rows.try_next().await?.is_some() {}
                Ok(rows.rows_affected().unwrap_or(0))
            }
        }
    }

    fn rows(self: Box<Self>) -> RowStream {
        match *self {
            PgResult::Updated(_) => stream::empty().boxed(),
            PgResult::Rows { rows, metadata } => rows
                .map(move |row| {
                    row.map(|row| {
                        Box::new(PgRow {
                            row,
                            metadata: Arc::clone(&metadata),
                        }) as Box<dyn Row>
                    })
                    .map_err(SqlExecError::from)
                })
                .boxed(),
        }
    }
}
