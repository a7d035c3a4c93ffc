use std::sync::Arc;

use crate::config::Configuration;
use crate::driver::ConnectionProvider;
use crate::error::SqlExecError;
use crate::sql::{
    FlagPosition, Param, ParamMap, Predicate, QueryFlag, QueryMetadata, SerializedStatement, Table,
};
use crate::types::SqlValue;

use super::{BatchCoordinator, BatchPlan, ClauseContext, ClauseShape, execute_clause};

/// A delete from one table. Without a filter every row is deleted.
///
/// Filters, flags, limit and parameter values form the pending batch row; `add_batch` commits
/// them together.
#[derive(Debug, Clone)]
pub struct DeleteClause {
    context: ClauseContext,
    table: Table,
    metadata: QueryMetadata,
    batches: BatchCoordinator<QueryMetadata>,
}

impl DeleteClause {
    pub(crate) fn new(
        provider: Option<Arc<dyn ConnectionProvider>>,
        configuration: Configuration,
        table: Table,
    ) -> Self {
        Self {
            context: ClauseContext::new(provider, configuration),
            table,
            metadata: QueryMetadata::default(),
            batches: BatchCoordinator::default(),
        }
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.metadata.predicates.push(predicate);
        self
    }

    #[must_use]
    pub fn set_param(mut self, param: &Param, value: impl Into<SqlValue>) -> Self {
        self.metadata.params.insert(param.clone(), value.into());
        self
    }

    #[must_use]
    pub fn add_flag(mut self, position: FlagPosition, text: &str) -> Self {
        self.metadata.add_flag(QueryFlag::new(position, text));
        self
    }

    /// Limit the number of deleted rows; only dialects that allow it can render this.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.metadata.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_use_literals(mut self, use_literals: bool) -> Self {
        self.context.set_use_literals(use_literals);
        self
    }

    /// Commit the pending filters as a batch row.
    #[must_use]
    pub fn add_batch(mut self) -> Self {
        self.batches.commit(std::mem::take(&mut self.metadata));
        self
    }

    pub fn clear(&mut self) {
        self.batches.clear();
        self.metadata = QueryMetadata::default();
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

    /// Execute and return the number of deleted rows.
    ///
    /// # Errors
    /// Returns connection, planning, binding and driver errors.
    pub async fn execute(&self) -> Result<u64, SqlExecError> {
        let plan = self.batches.plan(self.context.use_literals())?;
        execute_clause(&self.context, self, plan).await
    }

    fn serialize_row(&self, metadata: &QueryMetadata) -> Result<SerializedStatement, SqlExecError> {
        self.context
            .serializer(&metadata.params)
            .serialize_delete(&self.table, metadata)
    }
}

impl ClauseShape for DeleteClause {
    fn params(&self) -> &ParamMap {
        &self.metadata.params
    }

    fn serialize_plan(&self, plan: BatchPlan) -> Result<SerializedStatement, SqlExecError> {
        match plan {
            BatchPlan::Single => self.serialize_row(&self.metadata),
            BatchPlan::Bulk { .. } | BatchPlan::Sequential { .. } => {
                self.serialize_batch(0).map(|(statement, _)| statement)
            }
        }
    }

    fn serialize_batch(
        &self,
        index: usize,
    ) -> Result<(SerializedStatement, &ParamMap), SqlExecError> {
        let metadata = self.batches.entries().get(index).ok_or_else(|| {
            SqlExecError::ConfigError(format!("no batch row at index {index}"))
        })?;
        Ok((self.serialize_row(metadata)?, &metadata.params))
    }
}
