use std::sync::Arc;

use crate::config::Configuration;
use crate::dml::{DeleteClause, InsertClause, UpdateClause};
use crate::driver::ConnectionProvider;
use crate::results::Projection;
use crate::sql::{Expression, Table};
use crate::types::SqlValue;

use super::{Query, Union};

/// Entry point creating queries and clauses that share one provider and configuration.
///
/// ```rust,no_run
/// use sql_exec_engine::prelude::*;
///
/// # async fn run(connection: std::sync::Arc<dyn Connection>) -> Result<(), SqlExecError> {
/// let factory = QueryFactory::new(
///     FixedConnectionProvider::shared(connection),
///     Configuration::new(Dialect::Postgres),
/// );
/// let mut survey = Table::new("survey");
/// let name = survey.add_column("name", SqlType::Text);
/// let names = factory
///     .select(Projection::<String>::scalar(&name))
///     .from(&survey)
///     .fetch_all()
///     .await?;
/// # let _ = names;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryFactory {
    provider: Option<Arc<dyn ConnectionProvider>>,
    configuration: Configuration,
}

impl std::fmt::Debug for QueryFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFactory")
            .field("configuration", &self.configuration)
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

impl QueryFactory {
    #[must_use]
    pub fn new(provider: Arc<dyn ConnectionProvider>, configuration: Configuration) -> Self {
        Self {
            provider: Some(provider),
            configuration,
        }
    }

    /// A factory that can build and render statements but not execute them.
    #[must_use]
    pub fn without_connection(configuration: Configuration) -> Self {
        Self {
            provider: None,
            configuration,
        }
    }

    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    #[must_use]
    pub fn select<T>(&self, projection: Projection<T>) -> Query<T> {
        Query::new(
            self.provider.clone(),
            self.configuration.clone(),
            projection,
        )
    }

    /// Select every column of `table`.
    #[must_use]
    pub fn select_from(&self, table: &Table) -> Query<Vec<SqlValue>> {
        self.select(Projection::wildcard()).from(table)
    }

    #[must_use]
    pub fn select_one(&self) -> Query<i64> {
        self.select(Projection::scalar(Expression::raw("1")))
    }

    #[must_use]
    pub fn select_zero(&self) -> Query<i64> {
        self.select(Projection::scalar(Expression::raw("0")))
    }

    /// `union` of `parts`, removing duplicate rows.
    #[must_use]
    pub fn union<T>(&self, parts: Vec<Query<T>>) -> Union<T> {
        Union::new(
            self.provider.clone(),
            self.configuration.clone(),
            parts,
            false,
        )
    }

    #[must_use]
    pub fn union_all<T>(&self, parts: Vec<Query<T>>) -> Union<T> {
        Union::new(
            self.provider.clone(),
            self.configuration.clone(),
            parts,
            true,
        )
    }

    #[must_use]
    pub fn insert(&self, table: &Table) -> InsertClause {
        InsertClause::new(
            self.provider.clone(),
            self.configuration.clone(),
            table.clone(),
        )
    }

    #[must_use]
    pub fn update(&self, table: &Table) -> UpdateClause {
        UpdateClause::new(
            self.provider.clone(),
            self.configuration.clone(),
            table.clone(),
        )
    }

    #[must_use]
    pub fn delete(&self, table: &Table) -> DeleteClause {
        DeleteClause::new(
            self.provider.clone(),
            self.configuration.clone(),
            table.clone(),
        )
    }
}
