use std::sync::Arc;

use rusqlite::types::Value;

use crate::error::SqlExecError;
use crate::results::{ColumnMetadata, RowMetadata, ValueRow};
use crate::types::SqlValue;

use super::params::sql_type_from_decl;

/// Extract a `SqlValue` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlExecError` if the value cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<SqlValue, SqlExecError> {
    let value: Value = row.get(idx)?;
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Integer(i) => Ok(SqlValue::Int(i)),
        Value::Real(f) => Ok(SqlValue::Float(f)),
        Value::Text(s) => Ok(SqlValue::Text(s)),
        Value::Blob(b) => Ok(SqlValue::Blob(b)),
    }
}

/// Name and declared type of every result column of a prepared statement.
pub(crate) fn declared_columns(stmt: &rusqlite::Statement<'_>) -> Vec<ColumnMetadata> {
    stmt.columns()
        .iter()
        .map(|column| {
            ColumnMetadata::new(column.name(), column.decl_type().and_then(sql_type_from_decl))
        })
        .collect()
}

/// Build rows sharing one metadata; columns without a declared type take the type of their
/// first non-null value.
pub(crate) fn build_rows(
    mut columns: Vec<ColumnMetadata>,
    rows: Vec<Vec<SqlValue>>,
) -> Vec<ValueRow> {
    for (idx, column) in columns.iter_mut().enumerate() {
        if column.sql_type.is_none() {
            column.sql_type = rows
                .iter()
                .filter_map(|values| values.get(idx))
                .find_map(SqlValue::sql_type);
        }
    }
    let metadata = Arc::new(RowMetadata::new(columns));
    rows.into_iter()
        .map(|values| ValueRow::new(Arc::clone(&metadata), values))
        .collect()
}
