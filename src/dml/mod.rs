//! Insert, update and delete clauses.
//!
//! Every clause accumulates mutation state, optionally commits it as batch rows, and executes
//! through the same pipeline: plan the batch shape, render, translate placeholders, bind each
//! parameter set, execute, and sum the affected-row counts.

use std::sync::Arc;

use futures_util::TryStreamExt;
use tracing::debug;

use crate::binding::bind_parameters;
use crate::config::Configuration;
use crate::driver::{Connection, ConnectionProvider, ResultStream, Statement, require_connection};
use crate::error::SqlExecError;
use crate::sql::{ParamMap, SerializedStatement, SqlSerializer, SqlTemplates};
use crate::translation::replace_binding_arguments;

mod batch;
mod delete;
mod insert;
mod update;

pub use batch::BatchPlan;
pub use delete::DeleteClause;
pub use insert::InsertClause;
pub use update::UpdateClause;

pub(crate) use batch::BatchCoordinator;

/// Connection and rendering settings shared by all clause kinds.
#[derive(Clone)]
pub(crate) struct ClauseContext {
    provider: Option<Arc<dyn ConnectionProvider>>,
    configuration: Configuration,
    use_literals: bool,
}

impl ClauseContext {
    pub(crate) fn new(
        provider: Option<Arc<dyn ConnectionProvider>>,
        configuration: Configuration,
    ) -> Self {
        let use_literals = configuration.use_literals();
        Self {
            provider,
            configuration,
            use_literals,
        }
    }

    pub(crate) fn templates(&self) -> &SqlTemplates {
        self.configuration.templates()
    }

    pub(crate) fn use_literals(&self) -> bool {
        self.use_literals
    }

    pub(crate) fn set_use_literals(&mut self, use_literals: bool) {
        self.use_literals = use_literals;
    }

    pub(crate) fn serializer<'a>(&'a self, params: &'a ParamMap) -> SqlSerializer<'a> {
        SqlSerializer::new(self.templates(), self.use_literals, params)
    }

    pub(crate) async fn connection(&self) -> Result<Arc<dyn Connection>, SqlExecError> {
        require_connection(self.provider.as_ref()).await
    }
}

impl std::fmt::Debug for ClauseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClauseContext")
            .field("configuration", &self.configuration)
            .field("use_literals", &self.use_literals)
            .finish_non_exhaustive()
    }
}

/// Rendering a clause contributes to the shared execution pipeline.
pub(crate) trait ClauseShape {
    /// Parameter values of the pending, uncommitted state.
    fn params(&self) -> &ParamMap;

    /// Statement text for `plan`; for `Single` it also carries the constants to bind.
    fn serialize_plan(&self, plan: BatchPlan) -> Result<SerializedStatement, SqlExecError>;

    /// The batch row at `index` rendered on its own, with the parameter values committed
    /// alongside it.
    fn serialize_batch(
        &self,
        index: usize,
    ) -> Result<(SerializedStatement, &ParamMap), SqlExecError>;
}

/// Create and fully bind the driver statement for `plan`.
///
/// Every batch row is rendered and checked before the first bind, so a failing row leaves
/// nothing half-bound.
pub(crate) fn prepare_statement<C: ClauseShape + ?Sized>(
    clause: &C,
    connection: &dyn Connection,
    plan: BatchPlan,
    returning: &[String],
) -> Result<Box<dyn Statement>, SqlExecError> {
    let shape = clause.serialize_plan(plan)?;
    let rows = match plan {
        BatchPlan::Single => Vec::new(),
        BatchPlan::Bulk { rows } | BatchPlan::Sequential { rows } => (0..rows)
            .map(|index| clause.serialize_batch(index))
            .collect::<Result<Vec<_>, _>>()?,
    };
    let (rows, row_params): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
    check_batch_shapes(&shape, &rows, plan)?;

    let sql = replace_binding_arguments(&shape.sql, connection.placeholder_style());
    debug!(sql = %sql, ?plan, "creating clause statement");
    let mut statement = connection.create_statement(&sql);
    match plan {
        BatchPlan::Single => bind_parameters(
            statement.as_mut(),
            &shape.constants,
            &shape.constant_paths,
            clause.params(),
            0,
        )?,
        BatchPlan::Bulk { .. } => {
            for (offset, (row, params)) in rows.iter().zip(&row_params).enumerate() {
                bind_parameters(
                    statement.as_mut(),
                    &row.constants,
                    &row.constant_paths,
                    params,
                    offset,
                )?;
            }
        }
        BatchPlan::Sequential { .. } => {
            for (row, params) in rows.iter().zip(&row_params) {
                bind_parameters(
                    statement.as_mut(),
                    &row.constants,
                    &row.constant_paths,
                    params,
                    0,
                )?;
                statement.add();
            }
        }
    }
    if !returning.is_empty() {
        debug!(columns = ?returning, "requesting generated keys");
        statement.return_generated_values(returning);
    }
    Ok(statement)
}

fn check_batch_shapes(
    shape: &SerializedStatement,
    rows: &[SerializedStatement],
    plan: BatchPlan,
) -> Result<(), SqlExecError> {
    match plan {
        BatchPlan::Single => Ok(()),
        BatchPlan::Bulk { .. } => {
            let width = rows.first().map_or(0, |row| row.constants.len());
            if let Some(index) = rows.iter().position(|row| row.constants.len() != width) {
                return Err(SqlExecError::ConfigError(format!(
                    "batch row {index} binds {} values, expected {width}",
                    rows[index].constants.len()
                )));
            }
            if width * rows.len() != shape.constants.len() {
                return Err(SqlExecError::ConfigError(format!(
                    "bulk statement has {} placeholders for {} rows of {width}",
                    shape.constants.len(),
                    rows.len()
                )));
            }
            Ok(())
        }
        BatchPlan::Sequential { .. } => {
            match rows.iter().position(|row| row.sql != shape.sql) {
                Some(index) => Err(SqlExecError::ConfigError(format!(
                    "batch row {index} renders differently than the first row"
                ))),
                None => Ok(()),
            }
        }
    }
}

/// Total affected rows over every driver result.
pub(crate) async fn sum_rows_updated(results: ResultStream) -> Result<u64, SqlExecError> {
    results
        .and_then(|result| result.rows_updated())
        .try_fold(0u64, |total, count| async move { Ok(total + count) })
        .await
}

/// Plan, bind and execute `clause`, returning the summed affected-row count.
pub(crate) async fn execute_clause<C: ClauseShape + Sync>(
    context: &ClauseContext,
    clause: &C,
    plan: BatchPlan,
) -> Result<u64, SqlExecError> {
    let connection = context.connection().await?;
    let statement = prepare_statement(clause, connection.as_ref(), plan, &[])?;
    sum_rows_updated(statement.execute()).await
}
