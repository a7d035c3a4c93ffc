use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SqlExecError;

/// Values bound as statement parameters or read back from a driver row.
///
/// The same enum is used for every backend, so binding and projection code never branches on
/// driver types:
/// ```rust
/// use sql_exec_engine::prelude::*;
///
/// let values = vec![
///     SqlValue::Int(1),
///     SqlValue::Text("alice".into()),
///     SqlValue::Null,
/// ];
/// assert!(values[2].is_null());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

/// Declared SQL type of a column, parameter, or projected expression.
///
/// Used to bind typed NULLs and to request a value type when reading a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    Int,
    Float,
    Text,
    Bool,
    Timestamp,
    Json,
    Blob,
}

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The runtime type of this value; `None` for NULL.
    #[must_use]
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            SqlValue::Int(_) => Some(SqlType::Int),
            SqlValue::Float(_) => Some(SqlType::Float),
            SqlValue::Text(_) => Some(SqlType::Text),
            SqlValue::Bool(_) => Some(SqlType::Bool),
            SqlValue::Timestamp(_) => Some(SqlType::Timestamp),
            SqlValue::Json(_) => Some(SqlType::Json),
            SqlValue::Blob(_) => Some(SqlType::Blob),
            SqlValue::Null => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let SqlValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let SqlValue::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let SqlValue::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            for format in TIMESTAMP_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                    return Some(dt);
                }
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SqlValue::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Decode into a Rust type; `Ok(None)` for NULL.
    ///
    /// # Errors
    /// Returns `SqlExecError::TypeMismatch` if the value holds a different type.
    pub fn into_typed<T: FromSqlValue>(self) -> Result<Option<T>, SqlExecError> {
        T::from_sql_value(self)
    }

    /// Convert a value read from a driver into the requested type.
    ///
    /// Drivers with loose storage classes (SQLite keeps booleans as integers and timestamps
    /// as text) hand back their natural value; this widens it to what the caller asked for.
    /// NULL stays NULL for every requested type.
    ///
    /// # Errors
    /// Returns `SqlExecError::TypeMismatch` if the value cannot represent the requested type.
    pub fn coerce(self, ty: SqlType) -> Result<SqlValue, SqlExecError> {
        if self.is_null() || self.sql_type() == Some(ty) {
            return Ok(self);
        }
        let coerced = match ty {
            SqlType::Bool => self.as_bool().copied().map(SqlValue::Bool),
            SqlType::Float => self.as_float().map(SqlValue::Float),
            SqlType::Timestamp => self.as_timestamp().map(SqlValue::Timestamp),
            SqlType::Json => match &self {
                SqlValue::Text(s) => serde_json::from_str(s).ok().map(SqlValue::Json),
                _ => None,
            },
            SqlType::Text => match &self {
                SqlValue::Json(json) => Some(SqlValue::Text(json.to_string())),
                _ => None,
            },
            SqlType::Int => match &self {
                SqlValue::Bool(b) => Some(SqlValue::Int(i64::from(*b))),
                _ => None,
            },
            SqlType::Blob => match &self {
                SqlValue::Text(s) => Some(SqlValue::Blob(s.as_bytes().to_vec())),
                _ => None,
            },
        };
        coerced.ok_or_else(|| {
            SqlExecError::TypeMismatch(format!("cannot read {self:?} as {ty:?}"))
        })
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(value: JsonValue) -> Self {
        SqlValue::Json(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Rust types that can be decoded from a single column.
///
/// `sql_type` is the type requested from the driver row; `from_sql_value` returns `Ok(None)`
/// for NULL so projections decide whether absence is an error.
pub trait FromSqlValue: Sized + Send + 'static {
    fn sql_type() -> SqlType;

    /// # Errors
    /// Returns `SqlExecError::TypeMismatch` if the value holds a different type.
    fn from_sql_value(value: SqlValue) -> Result<Option<Self>, SqlExecError>;
}

macro_rules! impl_from_sql_value {
    ($ty:ty, $sql_type:expr, $variant:ident) => {
        impl FromSqlValue for $ty {
            fn sql_type() -> SqlType {
                $sql_type
            }

            fn from_sql_value(value: SqlValue) -> Result<Option<Self>, SqlExecError> {
                match value {
                    SqlValue::Null => Ok(None),
                    SqlValue::$variant(v) => Ok(Some(v)),
                    other => Err(SqlExecError::TypeMismatch(format!(
                        "expected {:?}, got {other:?}",
                        $sql_type
                    ))),
                }
            }
        }
    };
}

impl_from_sql_value!(i64, SqlType::Int, Int);
impl_from_sql_value!(f64, SqlType::Float, Float);
impl_from_sql_value!(String, SqlType::Text, Text);
impl_from_sql_value!(bool, SqlType::Bool, Bool);
impl_from_sql_value!(NaiveDateTime, SqlType::Timestamp, Timestamp);
impl_from_sql_value!(JsonValue, SqlType::Json, Json);
impl_from_sql_value!(Vec<u8>, SqlType::Blob, Blob);

impl FromSqlValue for i32 {
    fn sql_type() -> SqlType {
        SqlType::Int
    }

    fn from_sql_value(value: SqlValue) -> Result<Option<Self>, SqlExecError> {
        match i64::from_sql_value(value)? {
            Some(v) => i32::try_from(v)
                .map(Some)
                .map_err(|_| SqlExecError::TypeMismatch(format!("{v} does not fit in i32"))),
            None => Ok(None),
        }
    }
}
