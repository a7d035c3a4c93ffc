use super::expr::{Expression, OrderSpecifier, ParamMap, Predicate};
use super::path::Table;

/// Where a flag's text is spliced into the rendered statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagPosition {
    /// Replaces the statement keyword prefix, e.g. `insert or replace into `.
    StartOverride,
    /// Right after `select `.
    AfterSelect,
    /// Appended to the end of the statement.
    End,
}

/// Raw SQL text attached to a statement at a fixed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFlag {
    pub position: FlagPosition,
    pub text: String,
}

impl QueryFlag {
    #[must_use]
    pub fn new(position: FlagPosition, text: &str) -> Self {
        Self {
            position,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            JoinType::Inner => "inner join",
            JoinType::Left => "left join",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinExpression {
    pub kind: JoinType,
    pub table: Table,
    pub on: Option<Predicate>,
}

/// Everything a statement is built from apart from its projection or assignments.
///
/// Update and delete clauses use the filter, flag, limit and parameter parts only.
#[derive(Debug, Clone, Default)]
pub struct QueryMetadata {
    pub from: Vec<Table>,
    pub joins: Vec<JoinExpression>,
    pub predicates: Vec<Predicate>,
    pub group_by: Vec<Expression>,
    pub having: Vec<Predicate>,
    pub order_by: Vec<OrderSpecifier>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub distinct: bool,
    /// PostgreSQL `distinct on (..)` targets.
    pub distinct_on: Vec<Expression>,
    pub flags: Vec<QueryFlag>,
    pub params: ParamMap,
}

impl QueryMetadata {
    /// Add a flag unless an identical one is already present.
    pub fn add_flag(&mut self, flag: QueryFlag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }
}
