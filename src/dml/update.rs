use std::sync::Arc;

use crate::config::Configuration;
use crate::driver::ConnectionProvider;
use crate::error::SqlExecError;
use crate::sql::{
    ColumnPath, Expression, FlagPosition, Param, ParamMap, Predicate, QueryFlag, QueryMetadata,
    SerializedStatement, Table,
};
use crate::types::SqlValue;

use super::{BatchCoordinator, BatchPlan, ClauseContext, ClauseShape, execute_clause};

// filters, flags, limit and parameter values are committed with the assignments
#[derive(Debug, Clone, Default)]
struct UpdateRow {
    updates: Vec<(ColumnPath, Expression)>,
    metadata: QueryMetadata,
}

/// An update of one table. Batch rows always run one parameter set at a time.
///
/// ```rust
/// use sql_exec_engine::prelude::*;
///
/// let mut survey = Table::new("survey");
/// let id = survey.add_column("id", SqlType::Int);
/// let name = survey.add_column("name", SqlType::Text);
/// let target = Param::new("target", SqlType::Int);
/// let factory = QueryFactory::without_connection(Configuration::new(Dialect::Postgres));
///
/// let update = factory
///     .update(&survey)
///     .set(&name, "renamed")
///     .filter(id.eq_param(&target))
///     .set_param(&target, 10)
///     .add_batch();
/// assert_eq!(update.to_sql()?.sql, "update survey set name = ? where id = ?");
/// # Ok::<(), SqlExecError>(())
/// ```
#[derive(Debug, Clone)]
pub struct UpdateClause {
    context: ClauseContext,
    table: Table,
    row: UpdateRow,
    batches: BatchCoordinator<UpdateRow>,
}

impl UpdateClause {
    pub(crate) fn new(
        provider: Option<Arc<dyn ConnectionProvider>>,
        configuration: Configuration,
        table: Table,
    ) -> Self {
        Self {
            context: ClauseContext::new(provider, configuration),
            table,
            row: UpdateRow::default(),
            batches: BatchCoordinator::default(),
        }
    }

    #[must_use]
    pub fn set(self, column: &ColumnPath, value: impl Into<SqlValue>) -> Self {
        self.set_expr(column, Expression::value(value))
    }

    #[must_use]
    pub fn set_null(self, column: &ColumnPath) -> Self {
        self.set_expr(column, Expression::Null)
    }

    /// Assign an expression; a later assignment of the same column wins.
    #[must_use]
    pub fn set_expr(mut self, column: &ColumnPath, expr: impl Into<Expression>) -> Self {
        let expr = expr.into();
        match self.row.updates.iter().position(|(c, _)| c == column) {
            Some(i) => self.row.updates[i].1 = expr,
            None => self.row.updates.push((column.clone(), expr)),
        }
        self
    }

    /// Assign several columns positionally.
    ///
    /// # Errors
    /// Returns `SqlExecError::ArgumentCountMismatch` when the lists differ in length.
    pub fn set_all(
        mut self,
        columns: &[&ColumnPath],
        values: Vec<SqlValue>,
    ) -> Result<Self, SqlExecError> {
        if columns.len() != values.len() {
            return Err(SqlExecError::ArgumentCountMismatch {
                values: values.len(),
                paths: columns.len(),
            });
        }
        for (column, value) in columns.iter().zip(values) {
            self = self.set(column, value);
        }
        Ok(self)
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.row.metadata.predicates.push(predicate);
        self
    }

    /// Supply a named parameter value for the pending row.
    #[must_use]
    pub fn set_param(mut self, param: &Param, value: impl Into<SqlValue>) -> Self {
        self.row.metadata.params.insert(param.clone(), value.into());
        self
    }

    /// Splice raw SQL text, e.g. a `StartOverride` of `update or ignore `.
    #[must_use]
    pub fn add_flag(mut self, position: FlagPosition, text: &str) -> Self {
        self.row.metadata.add_flag(QueryFlag::new(position, text));
        self
    }

    /// Limit the number of updated rows; only dialects that allow it can render this.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.row.metadata.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_use_literals(mut self, use_literals: bool) -> Self {
        self.context.set_use_literals(use_literals);
        self
    }

    /// Commit the pending assignments, filters, flags and parameter values as a batch row.
    #[must_use]
    pub fn add_batch(mut self) -> Self {
        self.batches.commit(std::mem::take(&mut self.row));
        self
    }

    /// Drop every batch row and the pending state.
    pub fn clear(&mut self) {
        self.batches.clear();
        self.row = UpdateRow::default();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row.updates.is_empty() && self.batches.is_empty()
    }

    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// # Errors
    /// Returns any planning or rendering error `execute` would report.
    pub fn to_sql(&self) -> Result<SerializedStatement, SqlExecError> {
        let plan = self.batches.plan(self.context.use_literals())?;
        self.serialize_plan(plan)
    }

    /// Execute and return the number of updated rows.
    ///
    /// # Errors
    /// Returns connection, planning, binding and driver errors.
    pub async fn execute(&self) -> Result<u64, SqlExecError> {
        let plan = self.batches.plan(self.context.use_literals())?;
        execute_clause(&self.context, self, plan).await
    }

    fn serialize_row(&self, row: &UpdateRow) -> Result<SerializedStatement, SqlExecError> {
        self.context.serializer(&row.metadata.params).serialize_update(
            &self.table,
            &row.updates,
            &row.metadata,
        )
    }
}

impl ClauseShape for UpdateClause {
    fn params(&self) -> &ParamMap {
        &self.row.metadata.params
    }

    fn serialize_plan(&self, plan: BatchPlan) -> Result<SerializedStatement, SqlExecError> {
        match plan {
            BatchPlan::Single => self.serialize_row(&self.row),
            BatchPlan::Bulk { .. } | BatchPlan::Sequential { .. } => {
                self.serialize_batch(0).map(|(statement, _)| statement)
            }
        }
    }

    fn serialize_batch(
        &self,
        index: usize,
    ) -> Result<(SerializedStatement, &ParamMap), SqlExecError> {
        let row = self.batches.entries().get(index).ok_or_else(|| {
            SqlExecError::ConfigError(format!("no batch row at index {index}"))
        })?;
        Ok((self.serialize_row(row)?, &row.metadata.params))
    }
}
