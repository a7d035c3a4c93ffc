use std::sync::Arc;

use crate::types::{SqlType, SqlValue};

use super::expr::{CompareOp, Expression, OrderSpecifier, Param, Predicate};

/// A typed column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnPath {
    table: Arc<str>,
    name: Arc<str>,
    ty: SqlType,
}

impl ColumnPath {
    #[must_use]
    pub fn new(table: &str, name: &str, ty: SqlType) -> Self {
        Self {
            table: Arc::from(table),
            name: Arc::from(name),
            ty,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn sql_type(&self) -> SqlType {
        self.ty
    }

    fn compare(&self, op: CompareOp, right: Expression) -> Predicate {
        Predicate::Compare {
            left: Expression::Column(self.clone()),
            op,
            right,
        }
    }

    #[must_use]
    pub fn eq(&self, value: impl Into<SqlValue>) -> Predicate {
        self.compare(CompareOp::Eq, Expression::value(value))
    }

    #[must_use]
    pub fn ne(&self, value: impl Into<SqlValue>) -> Predicate {
        self.compare(CompareOp::Ne, Expression::value(value))
    }

    #[must_use]
    pub fn lt(&self, value: impl Into<SqlValue>) -> Predicate {
        self.compare(CompareOp::Lt, Expression::value(value))
    }

    #[must_use]
    pub fn le(&self, value: impl Into<SqlValue>) -> Predicate {
        self.compare(CompareOp::Le, Expression::value(value))
    }

    #[must_use]
    pub fn gt(&self, value: impl Into<SqlValue>) -> Predicate {
        self.compare(CompareOp::Gt, Expression::value(value))
    }

    #[must_use]
    pub fn ge(&self, value: impl Into<SqlValue>) -> Predicate {
        self.compare(CompareOp::Ge, Expression::value(value))
    }

    #[must_use]
    pub fn like(&self, pattern: &str) -> Predicate {
        self.compare(CompareOp::Like, Expression::value(pattern))
    }

    /// Compare against a late-bound named parameter.
    #[must_use]
    pub fn eq_param(&self, param: &Param) -> Predicate {
        self.compare(CompareOp::Eq, Expression::Param(param.clone()))
    }

    /// Compare against an arbitrary expression, e.g. another column.
    #[must_use]
    pub fn eq_expr(&self, expr: impl Into<Expression>) -> Predicate {
        self.compare(CompareOp::Eq, expr.into())
    }

    #[must_use]
    pub fn is_null(&self) -> Predicate {
        Predicate::IsNull(Expression::Column(self.clone()))
    }

    #[must_use]
    pub fn is_not_null(&self) -> Predicate {
        Predicate::IsNotNull(Expression::Column(self.clone()))
    }

    #[must_use]
    pub fn in_list<V: Into<SqlValue>>(&self, values: impl IntoIterator<Item = V>) -> Predicate {
        Predicate::In(
            Expression::Column(self.clone()),
            values.into_iter().map(Expression::value).collect(),
        )
    }

    #[must_use]
    pub fn asc(&self) -> OrderSpecifier {
        OrderSpecifier::asc(self.clone())
    }

    #[must_use]
    pub fn desc(&self) -> OrderSpecifier {
        OrderSpecifier::desc(self.clone())
    }
}

/// A table: its name, columns, and primary key.
///
/// ```rust
/// use sql_exec_engine::prelude::*;
///
/// let mut users = Table::new("users");
/// let id = users.add_column("id", SqlType::Int);
/// users.add_primary_key(&id);
/// let name = users.add_column("name", SqlType::Text);
/// assert_eq!(users.columns().len(), 2);
/// assert_eq!(users.primary_key(), &[id]);
/// # let _ = name;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: Arc<str>,
    schema: Option<String>,
    columns: Vec<ColumnPath>,
    primary_key: Vec<ColumnPath>,
}

impl Table {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            schema: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    /// Declare a column and return its path.
    pub fn add_column(&mut self, name: &str, ty: SqlType) -> ColumnPath {
        let column = ColumnPath::new(&self.name, name, ty);
        self.columns.push(column.clone());
        column
    }

    pub fn add_primary_key(&mut self, column: &ColumnPath) {
        if !self.primary_key.contains(column) {
            self.primary_key.push(column.clone());
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnPath] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnPath> {
        self.columns.iter().find(|col| col.name() == name)
    }

    #[must_use]
    pub fn primary_key(&self) -> &[ColumnPath] {
        &self.primary_key
    }
}
