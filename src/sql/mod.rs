//! Statement metamodel and its SQL rendering.
//!
//! Queries and clauses describe statements with tables, typed column paths, expressions and
//! predicates; [`SqlSerializer`] renders them to SQL text with the reserved `?` placeholder and
//! collects the values to bind.

mod expr;
mod metadata;
mod path;
mod serializer;
mod templates;

pub use expr::{CompareOp, Expression, OrderSpecifier, Param, ParamMap, Predicate};
pub use metadata::{FlagPosition, JoinExpression, JoinType, QueryFlag, QueryMetadata};
pub use path::{ColumnPath, Table};
pub use serializer::{Constant, InsertRow, SerializedStatement, SqlSerializer};
pub use templates::{Dialect, SqlTemplates};
