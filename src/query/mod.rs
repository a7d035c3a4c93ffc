//! Select queries and the factory that creates queries and clauses.

use std::sync::Arc;

use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::debug;

use crate::binding::bind_parameters;
use crate::config::Configuration;
use crate::driver::{Connection, ConnectionProvider, require_connection};
use crate::error::SqlExecError;
use crate::results::{Projection, project_results};
use crate::sql::{
    Constant, Expression, FlagPosition, JoinExpression, JoinType, OrderSpecifier, Param,
    ParamMap, Predicate, QueryFlag, QueryMetadata, SerializedStatement, SqlSerializer, Table,
};
use crate::translation::replace_binding_arguments;
use crate::types::SqlValue;

mod factory;
mod union;

pub use factory::QueryFactory;
pub use union::Union;

/// A select statement with a typed projection.
///
/// Builder methods consume and return the query. Fetching borrows it, so the same query can
/// run several times; nothing touches the connection until a returned stream or future is
/// polled.
pub struct Query<T> {
    provider: Option<Arc<dyn ConnectionProvider>>,
    configuration: Configuration,
    metadata: QueryMetadata,
    projection: Projection<T>,
    use_literals: bool,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            configuration: self.configuration.clone(),
            metadata: self.metadata.clone(),
            projection: self.projection.clone(),
            use_literals: self.use_literals,
        }
    }
}

impl<T> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("metadata", &self.metadata)
            .field("projection", &self.projection)
            .field("use_literals", &self.use_literals)
            .finish_non_exhaustive()
    }
}

impl<T> Query<T> {
    #[must_use]
    pub fn new(
        provider: Option<Arc<dyn ConnectionProvider>>,
        configuration: Configuration,
        projection: Projection<T>,
    ) -> Self {
        let use_literals = configuration.use_literals();
        Self {
            provider,
            configuration,
            metadata: QueryMetadata::default(),
            projection,
            use_literals,
        }
    }

    /// Replace the projection, keeping every other part of the query.
    #[must_use]
    pub fn select<U>(self, projection: Projection<U>) -> Query<U> {
        Query {
            provider: self.provider,
            configuration: self.configuration,
            metadata: self.metadata,
            projection,
            use_literals: self.use_literals,
        }
    }

    #[must_use]
    pub fn from(mut self, table: &Table) -> Self {
        self.metadata.from.push(table.clone());
        self
    }

    #[must_use]
    pub fn inner_join(self, table: &Table, on: Predicate) -> Self {
        self.join(JoinType::Inner, table, on)
    }

    #[must_use]
    pub fn left_join(self, table: &Table, on: Predicate) -> Self {
        self.join(JoinType::Left, table, on)
    }

    fn join(mut self, kind: JoinType, table: &Table, on: Predicate) -> Self {
        self.metadata.joins.push(JoinExpression {
            kind,
            table: table.clone(),
            on: Some(on),
        });
        self
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.metadata.predicates.push(predicate);
        self
    }

    #[must_use]
    pub fn order_by(mut self, order: OrderSpecifier) -> Self {
        self.metadata.order_by.push(order);
        self
    }

    #[must_use]
    pub fn group_by(mut self, expr: impl Into<Expression>) -> Self {
        self.metadata.group_by.push(expr.into());
        self
    }

    #[must_use]
    pub fn having(mut self, predicate: Predicate) -> Self {
        self.metadata.having.push(predicate);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.metadata.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.metadata.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.metadata.distinct = true;
        self
    }

    /// Splice raw SQL text at a fixed position of the statement.
    #[must_use]
    pub fn add_flag(mut self, position: FlagPosition, text: &str) -> Self {
        self.metadata.add_flag(QueryFlag::new(position, text));
        self
    }

    /// Supply the value of a named parameter.
    #[must_use]
    pub fn set_param(mut self, param: &Param, value: impl Into<SqlValue>) -> Self {
        self.metadata.params.insert(param.clone(), value.into());
        self
    }

    /// Render values inline instead of binding them.
    #[must_use]
    pub fn with_use_literals(mut self, use_literals: bool) -> Self {
        self.use_literals = use_literals;
        self
    }

    /// Lock the selected rows for update.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` if the dialect has no row locking.
    pub fn for_update(mut self) -> Result<Self, SqlExecError> {
        let flag = self.configuration.templates().for_update_flag().ok_or_else(|| {
            SqlExecError::ConfigError("Using forUpdate() is not supported".to_string())
        })?;
        self.metadata.add_flag(flag);
        Ok(self)
    }

    /// Lock the selected rows in share mode, optionally falling back to `for update`.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` if share locks are unsupported and no fallback was
    /// requested, or the fallback is unsupported too.
    pub fn for_share(mut self, fallback_to_for_update: bool) -> Result<Self, SqlExecError> {
        let templates = self.configuration.templates();
        if templates.is_for_share_supported() {
            if let Some(flag) = templates.for_share_flag() {
                self.metadata.add_flag(flag);
                return Ok(self);
            }
        }
        if fallback_to_for_update {
            return self.for_update();
        }
        Err(SqlExecError::ConfigError(
            "Using forShare() is not supported".to_string(),
        ))
    }

    /// # Errors
    /// Returns `SqlExecError::ConfigError` if the dialect has no `nowait`.
    pub fn no_wait(mut self) -> Result<Self, SqlExecError> {
        let flag = self.configuration.templates().no_wait_flag().ok_or_else(|| {
            SqlExecError::ConfigError("Using noWait() is not supported".to_string())
        })?;
        self.metadata.add_flag(flag);
        Ok(self)
    }

    /// PostgreSQL `distinct on (..)`.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` on other dialects.
    pub fn distinct_on(mut self, exprs: Vec<Expression>) -> Result<Self, SqlExecError> {
        self.require_postgres("distinctOn()")?;
        self.metadata.distinct_on.extend(exprs);
        Ok(self)
    }

    /// Restrict the row lock to `tables`, e.g. `for update of survey`.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` on dialects without lock targets.
    pub fn lock_of(mut self, tables: &[&Table]) -> Result<Self, SqlExecError> {
        self.require_postgres("of()")?;
        let templates = self.configuration.templates();
        let names: Vec<String> = tables
            .iter()
            .map(|table| templates.quote_identifier(table.name()))
            .collect();
        let flag = QueryFlag::new(FlagPosition::End, &format!(" of {}", names.join(", ")));
        self.metadata.add_flag(flag);
        Ok(self)
    }

    fn require_postgres(&self, feature: &str) -> Result<(), SqlExecError> {
        if self
            .configuration
            .templates()
            .is_postgres_select_extension_supported()
        {
            Ok(())
        } else {
            Err(SqlExecError::ConfigError(format!(
                "Using {feature} is not supported"
            )))
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &QueryMetadata {
        &self.metadata
    }

    /// Render the statement without executing it.
    ///
    /// # Errors
    /// Returns `SqlExecError::ParameterNotSet` when literal rendering meets an unset parameter.
    pub fn to_sql(&self) -> Result<SerializedStatement, SqlExecError> {
        SqlSerializer::new(
            self.configuration.templates(),
            self.use_literals,
            &self.metadata.params,
        )
        .serialize_select(&self.metadata, self.projection.select_list())
    }

    // parameters this query already knows become plain values, so the statement can be
    // embedded in a union that binds its own parameters
    pub(crate) fn to_resolved_sql(&self) -> Result<SerializedStatement, SqlExecError> {
        let mut statement = self.to_sql()?;
        for constant in &mut statement.constants {
            if let Constant::Param(param) = constant {
                if let Some(value) = self.metadata.params.get(param) {
                    *constant = Constant::Value(value.clone());
                }
            }
        }
        Ok(statement)
    }

    pub(crate) fn projection(&self) -> &Projection<T> {
        &self.projection
    }
}

/// Bind `serialized` as one parameter set on `connection` and project every row.
pub(crate) fn open_statement<T: Send + 'static>(
    connection: &dyn Connection,
    serialized: &SerializedStatement,
    params: &ParamMap,
    projection: Projection<T>,
) -> Result<BoxStream<'static, Result<T, SqlExecError>>, SqlExecError> {
    let sql = replace_binding_arguments(&serialized.sql, connection.placeholder_style());
    debug!(sql = %sql, constants = serialized.constants.len(), "executing query");

    let mut statement = connection.create_statement(&sql);
    bind_parameters(
        statement.as_mut(),
        &serialized.constants,
        &serialized.constant_paths,
        params,
        0,
    )?;
    Ok(project_results(statement.execute(), Arc::new(projection)))
}

impl<T: Send + 'static> Query<T> {
    /// Stream every projected row in driver order.
    ///
    /// The stream is lazy: the connection is acquired and the statement executed on first poll.
    #[must_use]
    pub fn fetch(&self) -> BoxStream<'static, Result<T, SqlExecError>> {
        let query = self.clone();
        stream::once(query.open()).try_flatten().boxed()
    }

    async fn open(self) -> Result<BoxStream<'static, Result<T, SqlExecError>>, SqlExecError> {
        let connection = require_connection(self.provider.as_ref()).await?;
        let serialized = self.to_sql()?;
        open_statement(
            connection.as_ref(),
            &serialized,
            &self.metadata.params,
            self.projection,
        )
    }

    /// Collect every projected row.
    ///
    /// # Errors
    /// Returns the first error raised while executing or projecting.
    pub async fn fetch_all(&self) -> Result<Vec<T>, SqlExecError> {
        self.fetch().try_collect().await
    }

    /// The single row of the result, or `None` when there is none.
    ///
    /// A missing row is `None` for every projection; use [`Query::fetch_one_required`] when a
    /// required projection must raise `SqlExecError::NullResult` instead.
    ///
    /// # Errors
    /// Returns `SqlExecError::NonUniqueResult` when more than one row comes back.
    pub async fn fetch_one(&self) -> Result<Option<T>, SqlExecError> {
        let mut rows = self.fetch();
        let Some(first) = rows.try_next().await? else {
            return Ok(None);
        };
        if rows.try_next().await?.is_some() {
            return Err(SqlExecError::NonUniqueResult);
        }
        Ok(Some(first))
    }

    /// The first row of the result, limiting the statement to one row.
    ///
    /// # Errors
    /// Returns any error raised while executing or projecting.
    pub async fn fetch_first(&self) -> Result<Option<T>, SqlExecError> {
        self.clone().limit(1).fetch_one().await
    }

    /// Like [`Query::fetch_one`], but a missing row is an error unless the projection is
    /// optional, in which case it yields the absent value.
    ///
    /// # Errors
    /// Returns `SqlExecError::NullResult` when no row comes back for a required projection.
    pub async fn fetch_one_required(&self) -> Result<T, SqlExecError> {
        match self.fetch_one().await? {
            Some(value) => Ok(value),
            None => self.projection.absent(),
        }
    }
}
