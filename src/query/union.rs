use std::sync::Arc;

use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::config::Configuration;
use crate::driver::{ConnectionProvider, require_connection};
use crate::error::SqlExecError;
use crate::sql::{
    Expression, OrderSpecifier, Param, Predicate, QueryMetadata, SerializedStatement,
    SqlSerializer,
};
use crate::types::SqlValue;

use super::{Query, open_statement};

/// `union` or `union all` of queries sharing one projection type.
///
/// Rows are projected with the first part's projection. Grouping, ordering and limits added
/// here apply to the combined result.
///
/// ```rust
/// use sql_exec_engine::prelude::*;
///
/// let mut locale = Table::new("locale");
/// let country = locale.add_column("country_code", SqlType::Text);
/// let factory = QueryFactory::without_connection(Configuration::new(Dialect::Sqlite));
///
/// let part = |code: &str| {
///     factory
///         .select(Projection::<String>::scalar(&country))
///         .from(&locale)
///         .filter(country.eq(code))
/// };
/// let union = factory.union(vec![part("US"), part("UK")]).order_by(country.asc());
/// assert_eq!(
///     union.to_sql()?.sql,
///     "select country_code from locale where country_code = ? union \
///      select country_code from locale where country_code = ? order by country_code asc"
/// );
/// # Ok::<(), SqlExecError>(())
/// ```
pub struct Union<T> {
    provider: Option<Arc<dyn ConnectionProvider>>,
    configuration: Configuration,
    parts: Vec<Query<T>>,
    all: bool,
    metadata: QueryMetadata,
}

impl<T> Clone for Union<T> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            configuration: self.configuration.clone(),
            parts: self.parts.clone(),
            all: self.all,
            metadata: self.metadata.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Union<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Union")
            .field("parts", &self.parts)
            .field("all", &self.all)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl<T> Union<T> {
    pub(crate) fn new(
        provider: Option<Arc<dyn ConnectionProvider>>,
        configuration: Configuration,
        parts: Vec<Query<T>>,
        all: bool,
    ) -> Self {
        Self {
            provider,
            configuration,
            parts,
            all,
            metadata: QueryMetadata::default(),
        }
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
    pub fn order_by(mut self, order: OrderSpecifier) -> Self {
        self.metadata.order_by.push(order);
        self
    }

    /// Value for a parameter none of the parts supplies, e.g. one used in `having`.
    #[must_use]
    pub fn set_param(mut self, param: &Param, value: impl Into<SqlValue>) -> Self {
        self.metadata.params.insert(param.clone(), value.into());
        self
    }

    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Render every part and the outer clauses as one statement.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` for an empty union and any error rendering a part.
    pub fn to_sql(&self) -> Result<SerializedStatement, SqlExecError> {
        let parts = self
            .parts
            .iter()
            .map(Query::to_resolved_sql)
            .collect::<Result<Vec<_>, _>>()?;
        SqlSerializer::new(
            self.configuration.templates(),
            self.configuration.use_literals(),
            &self.metadata.params,
        )
        .serialize_union(parts, self.all, &self.metadata)
    }
}

impl<T: Send + 'static> Union<T> {
    /// Stream every projected row of the combined result; lazy like [`Query::fetch`].
    #[must_use]
    pub fn fetch(&self) -> BoxStream<'static, Result<T, SqlExecError>> {
        let union = self.clone();
        stream::once(union.open()).try_flatten().boxed()
    }

    async fn open(self) -> Result<BoxStream<'static, Result<T, SqlExecError>>, SqlExecError> {
        let connection = require_connection(self.provider.as_ref()).await?;
        let serialized = self.to_sql()?;
        let projection = self
            .parts
            .first()
            .map(|part| part.projection().clone())
            .ok_or_else(|| SqlExecError::ConfigError("union has no parts".to_string()))?;
        open_statement(
            connection.as_ref(),
            &serialized,
            &self.metadata.params,
            projection,
        )
    }

    /// # Errors
    /// Returns the first error raised while executing or projecting.
    pub async fn fetch_all(&self) -> Result<Vec<T>, SqlExecError> {
        self.fetch().try_collect().await
    }

    /// The single row of the combined result, or `None` when there is none.
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

    /// The first row of the combined result, limiting the statement to one row.
    ///
    /// # Errors
    /// Returns any error raised while executing or projecting.
    pub async fn fetch_first(&self) -> Result<Option<T>, SqlExecError> {
        let mut union = self.clone();
        union.metadata.limit = Some(1);
        union.fetch_one().await
    }

    /// # Errors
    /// Returns `SqlExecError::NullResult` when no row comes back for a required projection.
    pub async fn fetch_one_required(&self) -> Result<T, SqlExecError> {
        let value = self.fetch_one().await?;
        match (value, self.parts.first()) {
            (Some(value), _) => Ok(value),
            (None, Some(part)) => part.projection().absent(),
            (None, None) => Err(SqlExecError::ConfigError(
                "union has no parts".to_string(),
            )),
        }
    }
}
