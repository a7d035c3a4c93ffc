//! Binds serialized constants onto a driver statement.

use tracing::debug;

use crate::driver::Statement;
use crate::error::SqlExecError;
use crate::sql::{ColumnPath, Constant, ParamMap};
use crate::types::SqlValue;

/// Bind `constants` into `statement` as the `offset`-th parameter set.
///
/// Slots are `offset * constants.len() + i`, so a multi-row statement binds each row with its
/// own offset. A NULL with a known column is bound as a typed NULL; a NULL without one is
/// skipped, leaving the slot to the driver's default.
///
/// Every named parameter is resolved before the first bind, so a failure never leaves a
/// partially filled set behind.
///
/// # Errors
/// - `SqlExecError::ArgumentCountMismatch` when `constants` and `paths` differ in length
/// - `SqlExecError::ParameterNotSet` when a named parameter has no value in `params`
pub fn bind_parameters(
    statement: &mut dyn Statement,
    constants: &[Constant],
    paths: &[Option<ColumnPath>],
    params: &ParamMap,
    offset: usize,
) -> Result<(), SqlExecError> {
    if constants.len() != paths.len() {
        return Err(SqlExecError::ArgumentCountMismatch {
            values: constants.len(),
            paths: paths.len(),
        });
    }
    let values = resolve_constants(constants, params)?;

    let width = values.len();
    for (i, (value, path)) in values.into_iter().zip(paths).enumerate() {
        let slot = offset * width + i;
        if !value.is_null() {
            statement.bind(slot, value);
        } else if let Some(path) = path {
            statement.bind_null(slot, path.sql_type());
        } else {
            debug!(slot, "skipping untyped null");
        }
    }
    Ok(())
}

fn resolve_constants(
    constants: &[Constant],
    params: &ParamMap,
) -> Result<Vec<SqlValue>, SqlExecError> {
    constants
        .iter()
        .map(|constant| match constant {
            Constant::Value(value) => Ok(value.clone()),
            Constant::Param(param) => params
                .get(param)
                .cloned()
                .ok_or_else(|| SqlExecError::ParameterNotSet(param.clone())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ResultStream;
    use crate::sql::Param;
    use crate::types::SqlType;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Statement for Recorder {
        fn bind(&mut self, index: usize, value: SqlValue) {
            self.calls.push(format!("bind {index} {value:?}"));
        }

        fn bind_null(&mut self, index: usize, ty: SqlType) {
            self.calls.push(format!("null {index} {ty:?}"));
        }

        fn add(&mut self) {
            self.calls.push("add".to_string());
        }

        fn return_generated_values(&mut self, _columns: &[String]) {}

        fn execute(self: Box<Self>) -> ResultStream {
            Box::pin(futures_util::stream::empty())
        }
    }

    fn name_path() -> Option<ColumnPath> {
        Some(ColumnPath::new("t", "name", SqlType::Text))
    }

    #[test]
    fn binds_at_offset_slots() {
        let mut stmt = Recorder::default();
        let constants = vec![
            Constant::Value(SqlValue::Int(1)),
            Constant::Value(SqlValue::Text("a".into())),
        ];
        let paths = vec![None, name_path()];
        bind_parameters(&mut stmt, &constants, &paths, &ParamMap::new(), 2).unwrap();
        assert_eq!(stmt.calls, vec!["bind 4 Int(1)", "bind 5 Text(\"a\")"]);
    }

    #[test]
    fn typed_null_binds_and_untyped_null_skips() {
        let mut stmt = Recorder::default();
        let constants = vec![
            Constant::Value(SqlValue::Null),
            Constant::Value(SqlValue::Null),
        ];
        let paths = vec![name_path(), None];
        bind_parameters(&mut stmt, &constants, &paths, &ParamMap::new(), 0).unwrap();
        assert_eq!(stmt.calls, vec!["null 0 Text"]);
    }

    #[test]
    fn resolves_named_params() {
        let param = Param::new("id", SqlType::Int);
        let mut params = ParamMap::new();
        params.insert(param.clone(), SqlValue::Int(9));
        let mut stmt = Recorder::default();
        bind_parameters(&mut stmt, &[Constant::Param(param)], &[None], &params, 0).unwrap();
        assert_eq!(stmt.calls, vec!["bind 0 Int(9)"]);
    }

    #[test]
    fn missing_param_binds_nothing() {
        let mut stmt = Recorder::default();
        let constants = vec![
            Constant::Value(SqlValue::Int(1)),
            Constant::Param(Param::new("later", SqlType::Text)),
        ];
        let err = bind_parameters(&mut stmt, &constants, &[None, None], &ParamMap::new(), 0)
            .unwrap_err();
        assert!(matches!(
            &err,
            SqlExecError::ParameterNotSet(param) if *param == Param::new("later", SqlType::Text)
        ));
        assert_eq!(err.to_string(), "Parameter later (Text) is not set");
        assert!(stmt.calls.is_empty());
    }

    #[test]
    fn length_mismatch_fails_fast() {
        let mut stmt = Recorder::default();
        let err = bind_parameters(
            &mut stmt,
            &[Constant::Value(SqlValue::Int(1))],
            &[],
            &ParamMap::new(),
            0,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Expected 1 paths, but got 0");
        assert!(stmt.calls.is_empty());
    }
}
