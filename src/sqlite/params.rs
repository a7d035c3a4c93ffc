use rusqlite::types::Value;

use crate::types::{SqlType, SqlValue};

/// Convert a single `SqlValue` to a rusqlite `Value`.
///
/// Booleans are stored as integers and timestamps as text, matching how SQLite keeps them.
#[must_use]
pub fn sql_value_to_sqlite_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Int(i) => Value::Integer(i),
        SqlValue::Float(f) => Value::Real(f),
        SqlValue::Text(s) => Value::Text(s),
        SqlValue::Bool(b) => Value::Integer(i64::from(b)),
        SqlValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        SqlValue::Null => Value::Null,
        SqlValue::Json(json) => Value::Text(json.to_string()),
        SqlValue::Blob(bytes) => Value::Blob(bytes),
    }
}

/// Map a declared column type to a `SqlType`, loosely following SQLite's affinity rules.
#[must_use]
pub fn sql_type_from_decl(decl: &str) -> Option<SqlType> {
    let decl = decl.to_ascii_uppercase();
    if decl.contains("BOOL") {
        Some(SqlType::Bool)
    } else if decl.contains("INT") {
        Some(SqlType::Int)
    } else if decl.contains("TIMESTAMP") || decl.contains("DATETIME") {
        Some(SqlType::Timestamp)
    } else if decl.contains("JSON") {
        Some(SqlType::Json)
    } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
        Some(SqlType::Text)
    } else if decl.contains("BLOB") {
        Some(SqlType::Blob)
    } else if decl.contains("REAL")
        || decl.contains("FLOA")
        || decl.contains("DOUB")
        || decl.contains("NUMERIC")
        || decl.contains("DECIMAL")
    {
        Some(SqlType::Float)
    } else {
        None
    }
}
