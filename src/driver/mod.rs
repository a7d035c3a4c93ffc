//! Driver seam: the minimal statement/result surface the execution layer talks to.
//!
//! Adapters for `tokio-postgres` and `rusqlite` live in their own modules; the scripted driver in
//! `test_utils` implements the same traits for tests.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::SqlExecError;
use crate::results::RowMetadata;
use crate::translation::PlaceholderStyle;
use crate::types::{SqlType, SqlValue};

mod provider;

pub use provider::FixedConnectionProvider;

/// Stream of driver results produced by one physical execution.
pub type ResultStream = BoxStream<'static, Result<Box<dyn DriverResult>, SqlExecError>>;

/// Stream of rows belonging to one driver result.
pub type RowStream = BoxStream<'static, Result<Box<dyn Row>, SqlExecError>>;

/// Lends the ambient connection to the execution layer.
///
/// The execution layer never opens or closes connections; it only borrows what the provider
/// hands out.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn connection(&self) -> Result<Arc<dyn Connection>, SqlExecError>;
}

/// A borrowed driver connection.
pub trait Connection: Send + Sync {
    /// Create a statement for already-translated SQL text.
    fn create_statement(&self, sql: &str) -> Box<dyn Statement>;

    /// Parameter-marker syntax the driver expects.
    fn placeholder_style(&self) -> PlaceholderStyle;
}

/// A prepared statement accumulating parameter sets until executed.
pub trait Statement: Send {
    /// Bind `value` at the zero-based `index` of the pending parameter set.
    fn bind(&mut self, index: usize, value: SqlValue);

    /// Bind a NULL of the declared type at the zero-based `index`.
    fn bind_null(&mut self, index: usize, ty: SqlType);

    /// Commit the pending parameter set and start a new one.
    fn add(&mut self);

    /// Ask the driver to return the given (already quoted) columns of affected rows.
    fn return_generated_values(&mut self, columns: &[String]);

    /// Execute once per committed parameter set (or once when `add` was never called).
    ///
    /// Nothing runs until the returned stream is polled; dropping it stops further delivery.
    fn execute(self: Box<Self>) -> ResultStream;
}

/// One result of an execution: either affected-row count or returned rows.
#[async_trait]
pub trait DriverResult: Send {
    async fn rows_updated(self: Box<Self>) -> Result<u64, SqlExecError>;

    fn rows(self: Box<Self>) -> RowStream;
}

/// Read-only accessor for one driver row.
pub trait Row: Send {
    fn metadata(&self) -> &RowMetadata;

    /// The value at `index` in the driver's natural representation.
    ///
    /// # Errors
    /// Returns an error if the index is out of range or the driver cannot decode the value.
    fn value(&self, index: usize) -> Result<SqlValue, SqlExecError>;

    /// The value at `index` read as `ty`.
    ///
    /// # Errors
    /// Returns an error if the value cannot be represented as `ty`.
    fn get(&self, index: usize, ty: SqlType) -> Result<SqlValue, SqlExecError> {
        self.value(index)?.coerce(ty)
    }
}

/// Borrow the ambient connection, failing when no provider was configured.
pub(crate) async fn require_connection(
    provider: Option<&Arc<dyn ConnectionProvider>>,
) -> Result<Arc<dyn Connection>, SqlExecError> {
    match provider {
        Some(provider) => provider.connection().await,
        None => Err(SqlExecError::ConnectionUnavailable(
            "No connection provided".to_string(),
        )),
    }
}

/// Append a `returning` list for generated-key retrieval.
#[cfg(any(feature = "postgres", feature = "sqlite"))]
pub(crate) fn with_returning(sql: String, columns: &[String]) -> String {
    if columns.is_empty() {
        sql
    } else {
        format!("{sql} returning {}", columns.join(", "))
    }
}
