//! Async statement execution and typed row projection.
//!
//! Queries and insert/update/delete clauses built over a small table metamodel are rendered to
//! SQL with `?` placeholders, translated to the driver's marker syntax, bound (one parameter set
//! per batch row, or one merged multi-row insert), executed on a borrowed connection, and
//! projected into typed values as lazy streams.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use futures_util::TryStreamExt;
//! use sql_exec_engine::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlExecError> {
//! let conn = SqliteConnection::open_in_memory()?;
//! conn.execute_batch("create table person (id integer primary key, name text)").await?;
//!
//! let mut person = Table::new("person");
//! let id = person.add_column("id", SqlType::Int);
//! let name = person.add_column("name", SqlType::Text);
//! person.add_primary_key(&id);
//!
//! let factory = QueryFactory::new(
//!     FixedConnectionProvider::shared(Arc::new(conn)),
//!     Configuration::new(Dialect::Sqlite),
//! );
//! factory
//!     .insert(&person)
//!     .set(&name, "alice")
//!     .execute()
//!     .await?;
//!
//! let names: Vec<String> = factory
//!     .select(Projection::<String>::scalar(&name))
//!     .from(&person)
//!     .fetch()
//!     .try_collect()
//!     .await?;
//! assert_eq!(names, vec!["alice".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod dml;
pub mod driver;
pub mod error;
pub mod prelude;
pub mod query;
pub mod results;
pub mod sql;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Configuration;
pub use error::SqlExecError;
pub use query::{Query, QueryFactory, Union};
pub use types::{FromSqlValue, SqlType, SqlValue};
