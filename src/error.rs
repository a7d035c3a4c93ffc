use thiserror::Error;

use crate::sql::Param;

#[derive(Debug, Error)]
pub enum SqlExecError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("Expected {values} paths, but got {paths}")]
    ArgumentCountMismatch { values: usize, paths: usize },

    #[error("Parameter {0} is not set")]
    ParameterNotSet(Param),

    #[error("Unsupported combination: {0}")]
    UnsupportedCombination(String),

    #[error("{0}")]
    NullResult(String),

    #[error("Expected at most one result, but more than one row was returned")]
    NonUniqueResult,

    #[error("Unknown runtime type for column {index} ({name})")]
    UnknownColumnType { index: usize, name: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl SqlExecError {
    pub(crate) fn null_result() -> Self {
        SqlExecError::NullResult("Null result".to_string())
    }
}
