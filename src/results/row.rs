use std::collections::HashMap;
use std::sync::Arc;

use crate::driver::Row;
use crate::error::SqlExecError;
use crate::types::{SqlType, SqlValue};

/// Name and inferred runtime type of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub name: String,
    /// `None` when the driver cannot tell the type (e.g. an untyped SQLite expression).
    pub sql_type: Option<SqlType>,
}

impl ColumnMetadata {
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: Option<SqlType>) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

/// Columns of a result in positional order.
///
/// Shared by every row of one result.
#[derive(Debug, Clone, Default)]
pub struct RowMetadata {
    columns: Vec<ColumnMetadata>,
    // name -> index, built once per result instead of per lookup
    #[doc(hidden)]
    column_index_cache: HashMap<String, usize>,
}

impl RowMetadata {
    #[must_use]
    pub fn new(columns: Vec<ColumnMetadata>) -> Self {
        let column_index_cache = columns
            .iter()
            .enumerate()
            .map(|(i, col)| (col.name.clone(), i))
            .collect::<HashMap<_, _>>();
        Self {
            columns,
            column_index_cache,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }

        // drivers may report a different case than the one requested
        self.columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(column_name))
    }
}

/// A fully materialized row: values plus the shared metadata of its result.
#[derive(Debug, Clone)]
pub struct ValueRow {
    metadata: Arc<RowMetadata>,
    values: Vec<SqlValue>,
}

impl ValueRow {
    #[must_use]
    pub fn new(metadata: Arc<RowMetadata>, values: Vec<SqlValue>) -> Self {
        Self { metadata, values }
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get_by_name(&self, column_name: &str) -> Option<&SqlValue> {
        self.metadata
            .get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

impl Row for ValueRow {
    fn metadata(&self) -> &RowMetadata {
        &self.metadata
    }

    fn value(&self, index: usize) -> Result<SqlValue, SqlExecError> {
        self.values.get(index).cloned().ok_or_else(|| {
            SqlExecError::ExecutionError(format!(
                "column index {index} out of range ({} columns)",
                self.values.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_columns_by_name_and_index() {
        let meta = Arc::new(RowMetadata::new(vec![
            ColumnMetadata::new("id", Some(SqlType::Int)),
            ColumnMetadata::new("Name", Some(SqlType::Text)),
        ]));
        let row = ValueRow::new(meta, vec![SqlValue::Int(3), SqlValue::Text("x".into())]);
        assert_eq!(row.get_by_name("id"), Some(&SqlValue::Int(3)));
        assert_eq!(row.get_by_name("name"), Some(&SqlValue::Text("x".into())));
        assert_eq!(row.value(1).unwrap(), SqlValue::Text("x".into()));
        assert!(row.value(2).is_err());
        assert_eq!(row.metadata().column_count(), 2);
    }
}
