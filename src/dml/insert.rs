use std::sync::Arc;

use futures_util::TryStreamExt;
use futures_util::stream::{self, BoxStream, StreamExt};

use crate::config::Configuration;
use crate::driver::ConnectionProvider;
use crate::error::SqlExecError;
use crate::results::{Projection, project_results};
use crate::sql::{
    ColumnPath, Expression, FlagPosition, InsertRow, Param, ParamMap, QueryFlag,
    SerializedStatement, Table,
};
use crate::types::{FromSqlValue, SqlValue};

use super::{
    BatchCoordinator, BatchPlan, ClauseContext, ClauseShape, execute_clause, prepare_statement,
};

/// An insert into one table, optionally batched.
///
/// ```rust
/// use sql_exec_engine::prelude::*;
///
/// let mut survey = Table::new("survey");
/// let id = survey.add_column("id", SqlType::Int);
/// let name = survey.add_column("name", SqlType::Text);
/// let factory = QueryFactory::without_connection(Configuration::new(Dialect::Postgres));
///
/// let insert = factory
///     .insert(&survey)
///     .set(&id, 1)
///     .set(&name, "first")
///     .add_batch()
///     .set(&id, 2)
///     .set(&name, "second")
///     .add_batch()
///     .with_batch_to_bulk(true);
/// assert_eq!(insert.batch_count(), 2);
/// assert_eq!(
///     insert.to_sql()?.sql,
///     "insert into survey (id, name) values (?, ?), (?, ?)"
/// );
/// # Ok::<(), SqlExecError>(())
/// ```
#[derive(Debug, Clone)]
pub struct InsertClause {
    context: ClauseContext,
    table: Table,
    flags: Vec<QueryFlag>,
    row: InsertRow,
    params: ParamMap,
    batches: BatchCoordinator<InsertRow>,
}

impl InsertClause {
    pub(crate) fn new(
        provider: Option<Arc<dyn ConnectionProvider>>,
        configuration: Configuration,
        table: Table,
    ) -> Self {
        Self {
            context: ClauseContext::new(provider, configuration),
            table,
            flags: Vec::new(),
            row: InsertRow::default(),
            params: ParamMap::new(),
            batches: BatchCoordinator::default(),
        }
    }

    /// Assign a value; NULL is bound as a NULL of the column's type.
    #[must_use]
    pub fn set(self, column: &ColumnPath, value: impl Into<SqlValue>) -> Self {
        self.set_expr(column, Expression::value(value))
    }

    #[must_use]
    pub fn set_null(self, column: &ColumnPath) -> Self {
        self.set_expr(column, Expression::Null)
    }

    /// Assign an expression, replacing an earlier assignment of the same column.
    #[must_use]
    pub fn set_expr(mut self, column: &ColumnPath, expr: impl Into<Expression>) -> Self {
        let expr = expr.into();
        match self.row.columns.iter().position(|c| c == column) {
            Some(i) if i < self.row.values.len() => self.row.values[i] = expr,
            _ => {
                self.row.columns.push(column.clone());
                self.row.values.push(expr);
            }
        }
        self
    }

    /// Declare the target columns for a later [`InsertClause::values`].
    #[must_use]
    pub fn columns(mut self, columns: &[&ColumnPath]) -> Self {
        self.row
            .columns
            .extend(columns.iter().map(|column| (*column).clone()));
        self
    }

    #[must_use]
    pub fn values(mut self, values: Vec<Expression>) -> Self {
        self.row.values.extend(values);
        self
    }

    /// Splice raw SQL text, e.g. a `StartOverride` of `insert or ignore into `.
    #[must_use]
    pub fn add_flag(mut self, position: FlagPosition, text: &str) -> Self {
        let flag = QueryFlag::new(position, text);
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
        self
    }

    #[must_use]
    pub fn set_param(mut self, param: &Param, value: impl Into<SqlValue>) -> Self {
        self.params.insert(param.clone(), value.into());
        self
    }

    #[must_use]
    pub fn with_use_literals(mut self, use_literals: bool) -> Self {
        self.context.set_use_literals(use_literals);
        self
    }

    /// Merge batch rows into one multi-row insert when the dialect supports it.
    #[must_use]
    pub fn with_batch_to_bulk(mut self, batch_to_bulk: bool) -> Self {
        let supported = self.context.templates().is_batch_to_bulk_supported();
        self.batches.request_bulk(batch_to_bulk, supported);
        self
    }

    /// Commit the pending row as a batch row and start a new one.
    #[must_use]
    pub fn add_batch(mut self) -> Self {
        self.batches.commit(std::mem::take(&mut self.row));
        self
    }

    /// Drop the pending row and every batch row.
    pub fn clear(&mut self) {
        self.batches.clear();
        self.row = InsertRow::default();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row.values.is_empty() && self.batches.is_empty()
    }

    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Render the statement that would execute.
    ///
    /// # Errors
    /// Returns any planning or rendering error `execute` would report.
    pub fn to_sql(&self) -> Result<SerializedStatement, SqlExecError> {
        let plan = self.batches.plan(self.context.use_literals())?;
        self.serialize_plan(plan)
    }

    /// Execute and return the number of inserted rows.
    ///
    /// # Errors
    /// Returns connection, planning, binding and driver errors.
    pub async fn execute(&self) -> Result<u64, SqlExecError> {
        let plan = self.batches.plan(self.context.use_literals())?;
        execute_clause(&self.context, self, plan).await
    }

    /// Execute and return the first generated value of `column`.
    ///
    /// Every batch row is still inserted; only the first key is kept.
    ///
    /// # Errors
    /// Returns `SqlExecError::NullResult` when the driver returns a NULL key.
    pub async fn execute_with_key<K: FromSqlValue>(
        &self,
        column: &ColumnPath,
    ) -> Result<Option<K>, SqlExecError> {
        let mut keys = self.execute_with_keys::<K>(column);
        let first = keys.try_next().await?;
        while keys.try_next().await?.is_some() {}
        Ok(first)
    }

    /// Execute and stream the generated value of `column` for every inserted row.
    #[must_use]
    pub fn execute_with_keys<K: FromSqlValue>(
        &self,
        column: &ColumnPath,
    ) -> BoxStream<'static, Result<K, SqlExecError>> {
        let returning = self.key_columns(column);
        self.returning(returning, Projection::<K>::scalar(column))
    }

    /// Execute and stream every primary-key column of each inserted row.
    #[must_use]
    pub fn execute_with_key_rows(&self) -> BoxStream<'static, Result<Vec<SqlValue>, SqlExecError>> {
        let primary_key = self.table.primary_key();
        if primary_key.is_empty() {
            let err = SqlExecError::ConfigError(format!(
                "table {} declares no primary key",
                self.table.name()
            ));
            return stream::once(async move { Err(err) }).boxed();
        }
        let templates = self.context.templates();
        let returning = primary_key
            .iter()
            .map(|column| templates.quote_identifier(column.name()))
            .collect();
        self.returning(returning, Projection::wildcard())
    }

    // requested column first, then the remaining primary-key columns
    fn key_columns(&self, column: &ColumnPath) -> Vec<String> {
        let templates = self.context.templates();
        std::iter::once(column)
            .chain(self.table.primary_key().iter().filter(|pk| *pk != column))
            .map(|key| templates.quote_identifier(key.name()))
            .collect()
    }

    fn returning<T: Send + 'static>(
        &self,
        returning: Vec<String>,
        projection: Projection<T>,
    ) -> BoxStream<'static, Result<T, SqlExecError>> {
        let clause = self.clone();
        stream::once(async move {
            let plan = clause.batches.plan(clause.context.use_literals())?;
            let connection = clause.context.connection().await?;
            let statement = prepare_statement(&clause, connection.as_ref(), plan, &returning)?;
            Ok::<_, SqlExecError>(project_results(statement.execute(), Arc::new(projection)))
        })
        .try_flatten()
        .boxed()
    }
}

impl ClauseShape for InsertClause {
    fn params(&self) -> &ParamMap {
        &self.params
    }

    fn serialize_plan(&self, plan: BatchPlan) -> Result<SerializedStatement, SqlExecError> {
        match plan {
            BatchPlan::Single => self.context.serializer(&self.params).serialize_insert(
                &self.table,
                &self.flags,
                std::slice::from_ref(&self.row),
            ),
            BatchPlan::Bulk { .. } => self.context.serializer(&self.params).serialize_insert(
                &self.table,
                &self.flags,
                self.batches.entries(),
            ),
            BatchPlan::Sequential { .. } => self.serialize_batch(0).map(|(statement, _)| statement),
        }
    }

    // flags and parameters belong to the whole insert, not to its rows
    fn serialize_batch(
        &self,
        index: usize,
    ) -> Result<(SerializedStatement, &ParamMap), SqlExecError> {
        let row = self.batches.entries().get(index).ok_or_else(|| {
            SqlExecError::ConfigError(format!("no batch row at index {index}"))
        })?;
        let statement = self.context.serializer(&self.params).serialize_insert(
            &self.table,
            &self.flags,
            std::slice::from_ref(row),
        )?;
        Ok((statement, &self.params))
    }
}
