//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::Configuration;
pub use crate::dml::{BatchPlan, DeleteClause, InsertClause, UpdateClause};
pub use crate::driver::{
    Connection, ConnectionProvider, DriverResult, FixedConnectionProvider, ResultStream, Row,
    RowStream, Statement,
};
pub use crate::error::SqlExecError;
pub use crate::query::{Query, QueryFactory, Union};
pub use crate::results::{ColumnMetadata, FactoryExpression, Projection, RowMetadata, ValueRow};
pub use crate::sql::{
    ColumnPath, CompareOp, Dialect, Expression, FlagPosition, OrderSpecifier, Param, Predicate,
    QueryFlag, SqlTemplates, Table,
};
pub use crate::translation::{PlaceholderStyle, count_placeholders, replace_binding_arguments};
pub use crate::types::{FromSqlValue, SqlType, SqlValue};

#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresConnection;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;
