use std::sync::Arc;

use crate::driver::Row;
use crate::error::SqlExecError;
use crate::sql::Expression;
use crate::types::{FromSqlValue, SqlType, SqlValue};

type Factory<T> = dyn Fn(Vec<SqlValue>) -> Option<T> + Send + Sync;

/// Builds a `T` from the values of several projected expressions.
pub struct FactoryExpression<T> {
    args: Vec<Expression>,
    factory: Arc<Factory<T>>,
}

impl<T> FactoryExpression<T> {
    #[must_use]
    pub fn new(
        args: Vec<Expression>,
        factory: impl Fn(Vec<SqlValue>) -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            args,
            factory: Arc::new(factory),
        }
    }

    #[must_use]
    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    /// Read the arguments starting at column `offset` and build the instance.
    ///
    /// # Errors
    /// Returns `SqlExecError::NullResult` if the factory produces nothing.
    pub fn new_instance(&self, row: &dyn Row, offset: usize) -> Result<T, SqlExecError> {
        let mut values = Vec::with_capacity(self.args.len());
        for (i, arg) in self.args.iter().enumerate() {
            let value = match arg.sql_type() {
                Some(ty) => row.get(offset + i, ty)?,
                None => row.value(offset + i)?,
            };
            values.push(value);
        }
        (self.factory)(values).ok_or_else(SqlExecError::null_result)
    }
}

impl<T> Clone for FactoryExpression<T> {
    fn clone(&self) -> Self {
        Self {
            args: self.args.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> std::fmt::Debug for FactoryExpression<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryExpression")
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// How result rows are turned into `T`.
///
/// The shape is fixed when the query is built; per row only the matching arm runs.
pub enum Projection<T> {
    /// One column that must not be NULL.
    Scalar {
        expr: Expression,
        ty: SqlType,
        decode: fn(SqlValue) -> Result<Option<T>, SqlExecError>,
    },
    /// One column whose NULL maps to an absent value.
    OptionalScalar {
        expr: Expression,
        ty: SqlType,
        decode: fn(SqlValue) -> Result<T, SqlExecError>,
    },
    /// Several columns fed to a constructor.
    Factory(FactoryExpression<T>),
    /// Every result column, each read as its reported runtime type.
    Wildcard {
        assemble: fn(Vec<SqlValue>) -> T,
    },
}

impl<T> Clone for Projection<T> {
    fn clone(&self) -> Self {
        match self {
            Projection::Scalar { expr, ty, decode } => Projection::Scalar {
                expr: expr.clone(),
                ty: *ty,
                decode: *decode,
            },
            Projection::OptionalScalar { expr, ty, decode } => Projection::OptionalScalar {
                expr: expr.clone(),
                ty: *ty,
                decode: *decode,
            },
            Projection::Factory(factory) => Projection::Factory(factory.clone()),
            Projection::Wildcard { assemble } => Projection::Wildcard {
                assemble: *assemble,
            },
        }
    }
}

impl<T> std::fmt::Debug for Projection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Projection::Scalar { expr, ty, .. } => {
                f.debug_struct("Scalar").field("expr", expr).field("ty", ty).finish()
            }
            Projection::OptionalScalar { expr, ty, .. } => f
                .debug_struct("OptionalScalar")
                .field("expr", expr)
                .field("ty", ty)
                .finish(),
            Projection::Factory(factory) => f.debug_tuple("Factory").field(factory).finish(),
            Projection::Wildcard { .. } => f.write_str("Wildcard"),
        }
    }
}

impl<T: FromSqlValue> Projection<T> {
    /// Project a single non-null column decoded as `T`.
    #[must_use]
    pub fn scalar(expr: impl Into<Expression>) -> Self {
        Projection::Scalar {
            expr: expr.into(),
            ty: T::sql_type(),
            decode: T::from_sql_value,
        }
    }
}

impl<U: FromSqlValue> Projection<Option<U>> {
    /// Project a single column where NULL becomes `None`.
    #[must_use]
    pub fn optional(expr: impl Into<Expression>) -> Self {
        Projection::OptionalScalar {
            expr: expr.into(),
            ty: U::sql_type(),
            decode: U::from_sql_value,
        }
    }
}

impl Projection<Vec<SqlValue>> {
    /// Project every column of the result.
    #[must_use]
    pub fn wildcard() -> Self {
        Projection::Wildcard {
            assemble: std::convert::identity,
        }
    }

    /// Project the given expressions as a row of values.
    #[must_use]
    pub fn tuple(exprs: Vec<Expression>) -> Self {
        Projection::Factory(FactoryExpression::new(exprs, Some))
    }
}

impl<T> Projection<T> {
    /// Project several expressions through a constructor.
    ///
    /// ```rust
    /// use sql_exec_engine::prelude::*;
    ///
    /// #[derive(Debug)]
    /// struct Named {
    ///     id: i64,
    ///     name: String,
    /// }
    ///
    /// let mut people = Table::new("people");
    /// let id = people.add_column("id", SqlType::Int);
    /// let name = people.add_column("name", SqlType::Text);
    /// let projection = Projection::factory(vec![id.into(), name.into()], |values| {
    ///     let mut values = values.into_iter();
    ///     Some(Named {
    ///         id: values.next()?.into_typed::<i64>().ok()??,
    ///         name: values.next()?.into_typed::<String>().ok()??,
    ///     })
    /// });
    /// assert_eq!(projection.select_list().map(<[Expression]>::len), Some(2));
    /// ```
    #[must_use]
    pub fn factory(
        args: Vec<Expression>,
        factory: impl Fn(Vec<SqlValue>) -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        Projection::Factory(FactoryExpression::new(args, factory))
    }

    /// Expressions to render in the select list; `None` renders `*`.
    #[must_use]
    pub fn select_list(&self) -> Option<&[Expression]> {
        match self {
            Projection::Scalar { expr, .. } | Projection::OptionalScalar { expr, .. } => {
                Some(std::slice::from_ref(expr))
            }
            Projection::Factory(factory) => Some(factory.args()),
            Projection::Wildcard { .. } => None,
        }
    }

    /// Map one driver row into `T`.
    ///
    /// # Errors
    /// - `SqlExecError::NullResult` for a NULL scalar or a factory producing nothing
    /// - `SqlExecError::UnknownColumnType` when a wildcard column has no runtime type
    /// - `SqlExecError::TypeMismatch` when a value cannot be read as the requested type
    pub fn project(&self, row: &dyn Row) -> Result<T, SqlExecError> {
        match self {
            Projection::Scalar { ty, decode, .. } => {
                decode(row.get(0, *ty)?)?.ok_or_else(SqlExecError::null_result)
            }
            Projection::OptionalScalar { ty, decode, .. } => decode(row.get(0, *ty)?),
            Projection::Factory(factory) => factory.new_instance(row, 0),
            Projection::Wildcard { assemble } => {
                let metadata = row.metadata();
                let mut values = Vec::with_capacity(metadata.column_count());
                for (index, column) in metadata.columns().iter().enumerate() {
                    let ty = column.sql_type.ok_or_else(|| SqlExecError::UnknownColumnType {
                        index,
                        name: column.name.clone(),
                    })?;
                    values.push(row.get(index, ty)?);
                }
                Ok(assemble(values))
            }
        }
    }

    /// The value a single-row fetch yields when no row came back, if absence is allowed.
    ///
    /// # Errors
    /// Returns `SqlExecError::NullResult` unless the projection is optional.
    pub fn absent(&self) -> Result<T, SqlExecError> {
        match self {
            Projection::OptionalScalar { decode, .. } => decode(SqlValue::Null),
            _ => Err(SqlExecError::null_result()),
        }
    }
}
