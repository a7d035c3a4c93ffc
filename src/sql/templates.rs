use std::fmt::Write;

use clap::ValueEnum;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::translation::PlaceholderStyle;
use crate::types::SqlValue;

use super::metadata::{FlagPosition, QueryFlag};

lazy_static! {
    static ref PLAIN_IDENTIFIER: Regex =
        Regex::new(r"^[a-z_][a-z0-9_]*$").expect("identifier pattern is valid");
}

const RESERVED_WORDS: &[&str] = &[
    "all", "alter", "and", "as", "asc", "between", "by", "case", "check", "column", "create",
    "default", "delete", "desc", "distinct", "drop", "else", "end", "from", "grant", "group",
    "having", "in", "index", "insert", "into", "is", "join", "key", "like", "limit", "not",
    "null", "offset", "on", "or", "order", "primary", "references", "select", "set", "table",
    "then", "to", "union", "update", "user", "values", "when", "where", "with",
];

/// SQL dialect the statements are rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    Sqlite,
}

/// Dialect-specific rendering rules shared by the serializer and the clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlTemplates {
    dialect: Dialect,
    quote: bool,
    batch_to_bulk_supported: bool,
    dml_limit_supported: bool,
}

impl SqlTemplates {
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            quote: false,
            batch_to_bulk_supported: true,
            dml_limit_supported: false,
        }
    }

    /// Always quote identifiers instead of only when required.
    #[must_use]
    pub fn with_quote(mut self, quote: bool) -> Self {
        self.quote = quote;
        self
    }

    #[must_use]
    pub fn with_batch_to_bulk_supported(mut self, supported: bool) -> Self {
        self.batch_to_bulk_supported = supported;
        self
    }

    /// Allow `limit n` on update and delete, e.g. for SQLite builds compiled with
    /// `SQLITE_ENABLE_UPDATE_DELETE_LIMIT`.
    #[must_use]
    pub fn with_dml_limit_supported(mut self, supported: bool) -> Self {
        self.dml_limit_supported = supported;
        self
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    #[must_use]
    pub fn placeholder_style(&self) -> PlaceholderStyle {
        match self.dialect {
            Dialect::Postgres => PlaceholderStyle::Postgres,
            Dialect::Sqlite => PlaceholderStyle::Sqlite,
        }
    }

    /// Whether multi-row `values (..), (..)` inserts may replace per-row executions.
    #[must_use]
    pub fn is_batch_to_bulk_supported(&self) -> bool {
        self.batch_to_bulk_supported
    }

    #[must_use]
    pub fn is_dml_limit_supported(&self) -> bool {
        self.dml_limit_supported
    }

    /// Whether each part of a union is wrapped in parentheses.
    #[must_use]
    pub fn is_unions_wrapped(&self) -> bool {
        matches!(self.dialect, Dialect::Postgres)
    }

    /// Whether `distinct on (..)` and lock targets (`for update of t`) are available.
    #[must_use]
    pub fn is_postgres_select_extension_supported(&self) -> bool {
        matches!(self.dialect, Dialect::Postgres)
    }

    #[must_use]
    pub fn is_for_share_supported(&self) -> bool {
        matches!(self.dialect, Dialect::Postgres)
    }

    #[must_use]
    pub fn for_update_flag(&self) -> Option<QueryFlag> {
        match self.dialect {
            Dialect::Postgres => Some(QueryFlag::new(FlagPosition::End, " for update")),
            Dialect::Sqlite => None,
        }
    }

    #[must_use]
    pub fn for_share_flag(&self) -> Option<QueryFlag> {
        match self.dialect {
            Dialect::Postgres => Some(QueryFlag::new(FlagPosition::End, " for share")),
            Dialect::Sqlite => None,
        }
    }

    #[must_use]
    pub fn no_wait_flag(&self) -> Option<QueryFlag> {
        match self.dialect {
            Dialect::Postgres => Some(QueryFlag::new(FlagPosition::End, " nowait")),
            Dialect::Sqlite => None,
        }
    }

    /// Quote an identifier when it is not a plain lower-case name or collides with a keyword.
    #[must_use]
    pub fn quote_identifier(&self, name: &str) -> String {
        let plain = PLAIN_IDENTIFIER.is_match(name) && !RESERVED_WORDS.contains(&name);
        if plain && !self.quote {
            name.to_string()
        } else {
            format!("\"{}\"", name.replace('"', "\"\""))
        }
    }

    /// Render a value inline as a SQL literal.
    #[must_use]
    pub fn literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) if f.is_finite() => {
                let text = f.to_string();
                if text.contains(['.', 'e', 'E']) {
                    text
                } else {
                    format!("{text}.0")
                }
            }
            SqlValue::Float(f) => quote_string(&f.to_string()),
            SqlValue::Text(s) => quote_string(s),
            SqlValue::Bool(b) => match self.dialect {
                Dialect::Postgres => b.to_string(),
                Dialect::Sqlite => i64::from(*b).to_string(),
            },
            SqlValue::Timestamp(dt) => {
                let text = quote_string(&dt.format("%Y-%m-%d %H:%M:%S%.f").to_string());
                match self.dialect {
                    Dialect::Postgres => format!("timestamp {text}"),
                    Dialect::Sqlite => text,
                }
            }
            SqlValue::Json(json) => quote_string(&json.to_string()),
            SqlValue::Blob(bytes) => {
                let mut hex = String::with_capacity(bytes.len() * 2);
                for byte in bytes {
                    let _ = write!(hex, "{byte:02x}");
                }
                match self.dialect {
                    Dialect::Postgres => format!("'\\x{hex}'::bytea"),
                    Dialect::Sqlite => format!("X'{hex}'"),
                }
            }
            SqlValue::Null => "null".to_string(),
        }
    }
}

fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
