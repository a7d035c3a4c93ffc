use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value;
use tokio_postgres::types::Type;

use crate::driver::Row;
use crate::error::SqlExecError;
use crate::results::{ColumnMetadata, RowMetadata};
use crate::types::{SqlType, SqlValue};

/// Runtime type of a Postgres column, when it maps onto a `SqlType`.
#[must_use]
pub fn pg_sql_type(ty: &Type) -> Option<SqlType> {
    match ty.name() {
        "int2" | "int4" | "int8" => Some(SqlType::Int),
        "float4" | "float8" => Some(SqlType::Float),
        "bool" => Some(SqlType::Bool),
        "timestamp" | "timestamptz" => Some(SqlType::Timestamp),
        "json" | "jsonb" => Some(SqlType::Json),
        "bytea" => Some(SqlType::Blob),
        "text" | "varchar" | "bpchar" | "char" | "name" => Some(SqlType::Text),
        _ => None,
    }
}

/// Column metadata of a prepared statement.
pub(crate) fn statement_metadata(stmt: &tokio_postgres::Statement) -> RowMetadata {
    RowMetadata::new(
        stmt.columns()
            .iter()
            .map(|col| ColumnMetadata::new(col.name(), pg_sql_type(col.type_())))
            .collect(),
    )
}

/// Extracts a `SqlValue` from a `tokio_postgres` Row at the given index.
///
/// # Errors
/// Returns `SqlExecError` if the column cannot be retrieved.
pub fn postgres_extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
) -> Result<SqlValue, SqlExecError> {
    let column = row.columns().get(idx).ok_or_else(|| {
        SqlExecError::ExecutionError(format!(
            "column index {idx} out of range ({} columns)",
            row.columns().len()
        ))
    })?;

    match column.type_().name() {
        "int2" => {
            let val: Option<i16> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Int))
        }
        "float4" => {
            let val: Option<f32> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, |v| SqlValue::Float(f64::from(v))))
        }
        "float8" => {
            let val: Option<f64> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Float))
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Bool))
        }
        "timestamp" => {
            let val: Option<NaiveDateTime> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Timestamp))
        }
        "timestamptz" => {
            let val: Option<chrono::DateTime<chrono::Utc>> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, |v| SqlValue::Timestamp(v.naive_utc())))
        }
        "json" | "jsonb" => {
            let val: Option<Value> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Json))
        }
        "bytea" => {
            let val: Option<Vec<u8>> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Blob))
        }
        _ => {
            // For other types, attempt to get as string
            let val: Option<String> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Text))
        }
    }
}

/// A streamed Postgres row plus the metadata of its statement.
pub(crate) struct PgRow {
    pub(crate) row: tokio_postgres::Row,
    pub(crate) metadata: Arc<RowMetadata>,
}

impl Row for PgRow {
    fn metadata(&self) -> &RowMetadata {
        &self.metadata
    }

    fn value(&self, index: usize) -> Result<SqlValue, SqlExecError> {
        postgres_extract_value(&self.row, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_runtime_types() {
        assert_eq!(pg_sql_type(&Type::INT4), Some(SqlType::Int));
        assert_eq!(pg_sql_type(&Type::JSONB), Some(SqlType::Json));
        assert_eq!(pg_sql_type(&Type::BPCHAR), Some(SqlType::Text));
        assert_eq!(pg_sql_type(&Type::UUID), None);
    }
}
