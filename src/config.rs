use serde::Deserialize;

use crate::error::SqlExecError;
use crate::sql::{Dialect, SqlTemplates};

/// Settings shared by every query and clause created from one factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    templates: SqlTemplates,
    use_literals: bool,
}

/// On-disk shape of a [`Configuration`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    dialect: Dialect,
    #[serde(default)]
    use_literals: bool,
    #[serde(default)]
    quote_identifiers: bool,
    #[serde(default = "default_batch_to_bulk")]
    batch_to_bulk: bool,
}

fn default_batch_to_bulk() -> bool {
    true
}

impl Configuration {
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self::with_templates(SqlTemplates::new(dialect))
    }

    #[must_use]
    pub fn with_templates(templates: SqlTemplates) -> Self {
        Self {
            templates,
            use_literals: false,
        }
    }

    /// Render values inline instead of binding them.
    #[must_use]
    pub fn with_use_literals(mut self, use_literals: bool) -> Self {
        self.use_literals = use_literals;
        self
    }

    #[must_use]
    pub fn templates(&self) -> &SqlTemplates {
        &self.templates
    }

    #[must_use]
    pub fn use_literals(&self) -> bool {
        self.use_literals
    }

    /// Parse a configuration from JSON.
    ///
    /// ```rust
    /// use sql_exec_engine::prelude::*;
    ///
    /// let config = Configuration::from_json(r#"{"dialect": "sqlite", "batch_to_bulk": false}"#)?;
    /// assert_eq!(config.templates().dialect(), Dialect::Sqlite);
    /// assert!(!config.templates().is_batch_to_bulk_supported());
    /// # Ok::<(), SqlExecError>(())
    /// ```
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` for malformed JSON, unknown keys, or an unknown dialect.
    pub fn from_json(json: &str) -> Result<Self, SqlExecError> {
        let file: ConfigFile = serde_json::from_str(json)
            .map_err(|e| SqlExecError::ConfigError(format!("invalid configuration: {e}")))?;
        let templates = SqlTemplates::new(file.dialect)
            .with_quote(file.quote_identifiers)
            .with_batch_to_bulk_supported(file.batch_to_bulk);
        Ok(Self::with_templates(templates).with_use_literals(file.use_literals))
    }
}
