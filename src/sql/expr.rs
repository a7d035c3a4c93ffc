use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::{SqlType, SqlValue};

use super::path::ColumnPath;

/// Late-bound values keyed by their named parameter.
pub type ParamMap = HashMap<Param, SqlValue>;

/// A named parameter whose value is supplied at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    name: Arc<str>,
    ty: SqlType,
}

impl Param {
    #[must_use]
    pub fn new(name: &str, ty: SqlType) -> Self {
        Self {
            name: Arc::from(name),
            ty,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn sql_type(&self) -> SqlType {
        self.ty
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.ty)
    }
}

/// Value-producing part of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Column(ColumnPath),
    Value(SqlValue),
    Param(Param),
    Null,
    /// SQL text rendered verbatim; must not contain the reserved placeholder.
    Raw(String),
}

impl Expression {
    #[must_use]
    pub fn value(value: impl Into<SqlValue>) -> Self {
        match value.into() {
            SqlValue::Null => Expression::Null,
            other => Expression::Value(other),
        }
    }

    #[must_use]
    pub fn raw(sql: &str) -> Self {
        Expression::Raw(sql.to_string())
    }

    /// Declared type when it can be known without running the statement.
    #[must_use]
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            Expression::Column(column) => Some(column.sql_type()),
            Expression::Value(value) => value.sql_type(),
            Expression::Param(param) => Some(param.sql_type()),
            Expression::Null | Expression::Raw(_) => None,
        }
    }
}

impl From<ColumnPath> for Expression {
    fn from(column: ColumnPath) -> Self {
        Expression::Column(column)
    }
}

impl From<&ColumnPath> for Expression {
    fn from(column: &ColumnPath) -> Self {
        Expression::Column(column.clone())
    }
}

impl From<Param> for Expression {
    fn from(param: Param) -> Self {
        Expression::Param(param)
    }
}

impl From<&Param> for Expression {
    fn from(param: &Param) -> Self {
        Expression::Param(param.clone())
    }
}

impl From<SqlValue> for Expression {
    fn from(value: SqlValue) -> Self {
        Expression::value(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "like",
        }
    }
}

/// Boolean condition used in where clauses and join conditions.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        left: Expression,
        op: CompareOp,
        right: Expression,
    },
    IsNull(Expression),
    IsNotNull(Expression),
    In(Expression, Vec<Expression>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    #[must_use]
    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::And(mut items) => {
                items.push(other);
                Predicate::And(items)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    #[must_use]
    pub fn or(self, other: Predicate) -> Predicate {
        match self {
            Predicate::Or(mut items) => {
                items.push(other);
                Predicate::Or(items)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    #[must_use]
    pub fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpecifier {
    pub(crate) target: Expression,
    pub(crate) ascending: bool,
}

impl OrderSpecifier {
    #[must_use]
    pub fn asc(target: impl Into<Expression>) -> Self {
        Self {
            target: target.into(),
            ascending: true,
        }
    }

    #[must_use]
    pub fn desc(target: impl Into<Expression>) -> Self {
        Self {
            target: target.into(),
            ascending: false,
        }
    }
}
