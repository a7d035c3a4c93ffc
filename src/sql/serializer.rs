use crate::error::SqlExecError;
use crate::translation::PLACEHOLDER;
use crate::types::SqlValue;

use super::expr::{Expression, Param, ParamMap, Predicate};
use super::metadata::{FlagPosition, QueryFlag, QueryMetadata};
use super::path::{ColumnPath, Table};
use super::templates::{Dialect, SqlTemplates};

/// A value collected while rendering; named parameters are resolved only at bind time.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Value(SqlValue),
    Param(Param),
}

/// SQL text with `?` placeholders plus the values and column descriptors that fill them.
///
/// `constants` and `constant_paths` are parallel: the path is the column a constant is
/// compared with or assigned to, used to bind a typed NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedStatement {
    pub sql: String,
    pub constants: Vec<Constant>,
    pub constant_paths: Vec<Option<ColumnPath>>,
}

/// Column/value pairs of one inserted row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertRow {
    pub columns: Vec<ColumnPath>,
    pub values: Vec<Expression>,
}

/// Renders statement metadata into SQL text for one dialect.
///
/// With `use_literals` every value is inlined and no constants are collected; named
/// parameters must then already have values in `params`.
pub struct SqlSerializer<'a> {
    templates: &'a SqlTemplates,
    use_literals: bool,
    params: &'a ParamMap,
    qualify: bool,
    out: SerializedStatement,
}

impl<'a> SqlSerializer<'a> {
    #[must_use]
    pub fn new(templates: &'a SqlTemplates, use_literals: bool, params: &'a ParamMap) -> Self {
        Self {
            templates,
            use_literals,
            params,
            qualify: false,
            out: SerializedStatement::default(),
        }
    }

    /// Render a select. `select_list` of `None` renders `*`.
    ///
    /// # Errors
    /// Returns `SqlExecError::ParameterNotSet` when literal rendering meets an unset parameter.
    pub fn serialize_select(
        mut self,
        metadata: &QueryMetadata,
        select_list: Option<&[Expression]>,
    ) -> Result<SerializedStatement, SqlExecError> {
        self.qualify = !metadata.joins.is_empty() || metadata.from.len() > 1;

        self.push("select ");
        self.flags(&metadata.flags, FlagPosition::AfterSelect);
        if metadata.distinct {
            self.push("distinct ");
        }
        if !metadata.distinct_on.is_empty() {
            self.push("distinct on (");
            self.expression_list(&metadata.distinct_on)?;
            self.push(") ");
        }
        match select_list {
            None => self.push("*"),
            Some(list) => self.expression_list(list)?,
        }

        if !metadata.from.is_empty() {
            self.push(" from ");
            for (i, table) in metadata.from.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.table(table);
            }
        }
        for join in &metadata.joins {
            self.push(" ");
            self.push(join.kind.as_sql());
            self.push(" ");
            self.table(&join.table);
            if let Some(on) = &join.on {
                self.push(" on ");
                self.predicate(on)?;
            }
        }
        self.where_clause(&metadata.predicates)?;
        self.grouping(metadata)?;
        self.order_by(metadata)?;
        self.modifiers(metadata);
        self.flags(&metadata.flags, FlagPosition::End);
        Ok(self.out)
    }

    /// Render the union of already rendered selects, followed by the outer grouping, ordering
    /// and limit of `outer`.
    ///
    /// Each part keeps its own constants, in order, so the union binds as one parameter set.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` when there are no parts.
    pub fn serialize_union(
        mut self,
        parts: Vec<SerializedStatement>,
        all: bool,
        outer: &QueryMetadata,
    ) -> Result<SerializedStatement, SqlExecError> {
        if parts.is_empty() {
            return Err(SqlExecError::ConfigError(
                "union needs at least one subquery".to_string(),
            ));
        }
        let wrapped = self.templates.is_unions_wrapped();
        let separator = if all { " union all " } else { " union " };
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            if wrapped {
                self.push("(");
            }
            self.out.sql.push_str(&part.sql);
            self.out.constants.extend(part.constants);
            self.out.constant_paths.extend(part.constant_paths);
            if wrapped {
                self.push(")");
            }
        }
        self.grouping(outer)?;
        self.order_by(outer)?;
        self.modifiers(outer);
        self.flags(&outer.flags, FlagPosition::End);
        Ok(self.out)
    }

    fn grouping(&mut self, metadata: &QueryMetadata) -> Result<(), SqlExecError> {
        if !metadata.group_by.is_empty() {
            self.push(" group by ");
            self.expression_list(&metadata.group_by)?;
        }
        if !metadata.having.is_empty() {
            self.push(" having ");
            self.junction(&metadata.having, " and ", "1 = 1")?;
        }
        Ok(())
    }

    fn order_by(&mut self, metadata: &QueryMetadata) -> Result<(), SqlExecError> {
        if !metadata.order_by.is_empty() {
            self.push(" order by ");
            for (i, order) in metadata.order_by.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.expression(&order.target, None)?;
                self.push(if order.ascending { " asc" } else { " desc" });
            }
        }
        Ok(())
    }

    fn modifiers(&mut self, metadata: &QueryMetadata) {
        match (metadata.limit, metadata.offset) {
            (Some(limit), Some(offset)) => self.push(&format!(" limit {limit} offset {offset}")),
            (Some(limit), None) => self.push(&format!(" limit {limit}")),
            // sqlite only accepts offset after a limit
            (None, Some(offset)) if self.templates.dialect() == Dialect::Sqlite => {
                self.push(&format!(" limit -1 offset {offset}"));
            }
            (None, Some(offset)) => self.push(&format!(" offset {offset}")),
            (None, None) => {}
        }
    }

    /// Render an insert of one row, or a multi-row `values` list when `rows` has several.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` when rows differ in shape or columns and values
    /// disagree in count.
    pub fn serialize_insert(
        mut self,
        table: &Table,
        flags: &[QueryFlag],
        rows: &[InsertRow],
    ) -> Result<SerializedStatement, SqlExecError> {
        let Some(first) = rows.first() else {
            return Err(SqlExecError::ConfigError("insert has no rows".to_string()));
        };
        for row in rows {
            if row.columns != first.columns {
                return Err(SqlExecError::ConfigError(
                    "every batch row must set the same columns".to_string(),
                ));
            }
            if !row.columns.is_empty() && row.columns.len() != row.values.len() {
                return Err(SqlExecError::ConfigError(format!(
                    "insert sets {} columns but {} values",
                    row.columns.len(),
                    row.values.len()
                )));
            }
        }

        self.start(flags, "insert into ");
        self.table(table);

        if first.columns.is_empty() && first.values.is_empty() {
            if rows.len() > 1 {
                return Err(SqlExecError::ConfigError(
                    "default values cannot be inserted in bulk".to_string(),
                ));
            }
            self.push(" default values");
        } else {
            if !first.columns.is_empty() {
                self.push(" (");
                for (i, column) in first.columns.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.column(column);
                }
                self.push(")");
            }
            self.push(" values ");
            for (r, row) in rows.iter().enumerate() {
                if r > 0 {
                    self.push(", ");
                }
                self.push("(");
                for (i, value) in row.values.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expression(value, row.columns.get(i))?;
                }
                self.push(")");
            }
        }
        self.flags(flags, FlagPosition::End);
        Ok(self.out)
    }

    /// Render an update using the filters, flags and limit of `metadata`.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` when there is nothing to assign or a limit is set
    /// for a dialect without update limits.
    pub fn serialize_update(
        mut self,
        table: &Table,
        updates: &[(ColumnPath, Expression)],
        metadata: &QueryMetadata,
    ) -> Result<SerializedStatement, SqlExecError> {
        if updates.is_empty() {
            return Err(SqlExecError::ConfigError(
                "update has no assignments".to_string(),
            ));
        }
        self.start(&metadata.flags, "update ");
        self.table(table);
        self.push(" set ");
        for (i, (column, value)) in updates.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.column(column);
            self.push(" = ");
            self.expression(value, Some(column))?;
        }
        self.where_clause(&metadata.predicates)?;
        self.dml_limit(metadata.limit)?;
        self.flags(&metadata.flags, FlagPosition::End);
        Ok(self.out)
    }

    /// # Errors
    /// Returns `SqlExecError::ParameterNotSet` when literal rendering meets an unset parameter,
    /// or `SqlExecError::ConfigError` for a limit the dialect cannot render.
    pub fn serialize_delete(
        mut self,
        table: &Table,
        metadata: &QueryMetadata,
    ) -> Result<SerializedStatement, SqlExecError> {
        self.start(&metadata.flags, "delete from ");
        self.table(table);
        self.where_clause(&metadata.predicates)?;
        self.dml_limit(metadata.limit)?;
        self.flags(&metadata.flags, FlagPosition::End);
        Ok(self.out)
    }

    // the last start override replaces the statement keywords
    fn start(&mut self, flags: &[QueryFlag], default: &str) {
        let start = flags
            .iter()
            .rev()
            .find(|flag| flag.position == FlagPosition::StartOverride)
            .map_or(default, |flag| flag.text.as_str());
        self.out.sql.push_str(start);
    }

    fn dml_limit(&mut self, limit: Option<u64>) -> Result<(), SqlExecError> {
        let Some(limit) = limit else {
            return Ok(());
        };
        if !self.templates.is_dml_limit_supported() {
            return Err(SqlExecError::ConfigError(format!(
                "limit on update or delete is not supported by {:?}",
                self.templates.dialect()
            )));
        }
        self.push(&format!(" limit {limit}"));
        Ok(())
    }

    fn expression_list(&mut self, list: &[Expression]) -> Result<(), SqlExecError> {
        for (i, expr) in list.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expression(expr, None)?;
        }
        Ok(())
    }

    fn push(&mut self, sql: &str) {
        self.out.sql.push_str(sql);
    }

    fn flags(&mut self, flags: &[QueryFlag], position: FlagPosition) {
        for flag in flags.iter().filter(|flag| flag.position == position) {
            self.out.sql.push_str(&flag.text);
        }
    }

    fn table(&mut self, table: &Table) {
        if let Some(schema) = table.schema() {
            let schema = self.templates.quote_identifier(schema);
            self.push(&schema);
            self.push(".");
        }
        let name = self.templates.quote_identifier(table.name());
        self.push(&name);
    }

    fn column(&mut self, column: &ColumnPath) {
        if self.qualify {
            let table = self.templates.quote_identifier(column.table());
            self.push(&table);
            self.push(".");
        }
        let name = self.templates.quote_identifier(column.name());
        self.push(&name);
    }

    fn placeholder(&mut self, constant: Constant, path: Option<&ColumnPath>) {
        self.out.sql.push(PLACEHOLDER);
        self.out.constants.push(constant);
        self.out.constant_paths.push(path.cloned());
    }

    fn expression(
        &mut self,
        expr: &Expression,
        context: Option<&ColumnPath>,
    ) -> Result<(), SqlExecError> {
        match expr {
            Expression::Column(column) => self.column(column),
            Expression::Value(SqlValue::Null) | Expression::Null => self.null(context),
            Expression::Value(value) => {
                if self.use_literals {
                    let literal = self.templates.literal(value);
                    self.push(&literal);
                } else {
                    self.placeholder(Constant::Value(value.clone()), context);
                }
            }
            Expression::Param(param) => {
                if self.use_literals {
                    let value = self
                        .params
                        .get(param)
                        .ok_or_else(|| SqlExecError::ParameterNotSet(param.clone()))?;
                    let literal = self.templates.literal(value);
                    self.push(&literal);
                } else {
                    self.placeholder(Constant::Param(param.clone()), context);
                }
            }
            Expression::Raw(sql) => self.push(sql),
        }
        Ok(())
    }

    // a null with a known column is bound so the driver gets a typed NULL
    fn null(&mut self, context: Option<&ColumnPath>) {
        match context {
            Some(path) if !self.use_literals => {
                self.placeholder(Constant::Value(SqlValue::Null), Some(path));
            }
            _ => self.push("null"),
        }
    }

    fn where_clause(&mut self, predicates: &[Predicate]) -> Result<(), SqlExecError> {
        if predicates.is_empty() {
            return Ok(());
        }
        self.push(" where ");
        self.junction(predicates, " and ", "1 = 1")
    }

    fn junction(
        &mut self,
        items: &[Predicate],
        separator: &str,
        empty: &str,
    ) -> Result<(), SqlExecError> {
        if items.is_empty() {
            self.push(empty);
            return Ok(());
        }
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            if matches!(item, Predicate::And(_) | Predicate::Or(_)) {
                self.push("(");
                self.predicate(item)?;
                self.push(")");
            } else {
                self.predicate(item)?;
            }
        }
        Ok(())
    }

    fn predicate(&mut self, predicate: &Predicate) -> Result<(), SqlExecError> {
        match predicate {
            Predicate::Compare { left, op, right } => {
                self.expression(left, column_of(right))?;
                self.push(" ");
                self.push(op.as_sql());
                self.push(" ");
                self.expression(right, column_of(left))?;
            }
            Predicate::IsNull(expr) => {
                self.expression(expr, None)?;
                self.push(" is null");
            }
            Predicate::IsNotNull(expr) => {
                self.expression(expr, None)?;
                self.push(" is not null");
            }
            Predicate::In(expr, list) => {
                if list.is_empty() {
                    self.push("1 = 0");
                    return Ok(());
                }
                self.expression(expr, None)?;
                self.push(" in (");
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expression(item, column_of(expr))?;
                }
                self.push(")");
            }
            Predicate::And(items) => self.junction(items, " and ", "1 = 1")?,
            Predicate::Or(items) => self.junction(items, " or ", "1 = 0")?,
            Predicate::Not(inner) => {
                self.push("not (");
                self.predicate(inner)?;
                self.push(")");
            }
        }
        Ok(())
    }
}

fn column_of(expr: &Expression) -> Option<&ColumnPath> {
    match expr {
        Expression::Column(column) => Some(column),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::metadata::{JoinExpression, JoinType};
    use crate::types::SqlType;

    struct Survey {
        table: Table,
        id: ColumnPath,
        name: ColumnPath,
    }

    fn survey() -> Survey {
        let mut table = Table::new("survey");
        let id = table.add_column("id", SqlType::Int);
        table.add_primary_key(&id);
        let name = table.add_column("name", SqlType::Text);
        Survey { table, id, name }
    }

    #[test]
    fn renders_select_with_placeholders() {
        let s = survey();
        let templates = SqlTemplates::new(Dialect::Postgres);
        let params = ParamMap::new();
        let metadata = QueryMetadata {
            from: vec![s.table.clone()],
            predicates: vec![s.name.eq("bob"), s.id.gt(3)],
            order_by: vec![s.id.desc()],
            limit: Some(10),
            ..QueryMetadata::default()
        };
        let out = SqlSerializer::new(&templates, false, &params)
            .serialize_select(&metadata, Some(&[Expression::from(&s.id)]))
            .unwrap();
        assert_eq!(
            out.sql,
            "select id from survey where name = ? and id > ? order by id desc limit 10"
        );
        assert_eq!(
            out.constants,
            vec![
                Constant::Value(SqlValue::Text("bob".into())),
                Constant::Value(SqlValue::Int(3))
            ]
        );
        assert_eq!(out.constant_paths, vec![Some(s.name.clone()), Some(s.id.clone())]);
    }

    #[test]
    fn qualifies_columns_when_joining() {
        let s = survey();
        let mut answers = Table::new("answer");
        let survey_id = answers.add_column("survey_id", SqlType::Int);
        let templates = SqlTemplates::new(Dialect::Sqlite);
        let params = ParamMap::new();
        let metadata = QueryMetadata {
            from: vec![s.table.clone()],
            joins: vec![JoinExpression {
                kind: JoinType::Left,
                table: answers,
                on: Some(survey_id.eq_expr(&s.id)),
            }],
            offset: Some(5),
            ..QueryMetadata::default()
        };
        let out = SqlSerializer::new(&templates, false, &params)
            .serialize_select(&metadata, None)
            .unwrap();
        assert_eq!(
            out.sql,
            "select * from survey left join answer on answer.survey_id = survey.id limit -1 offset 5"
        );
        assert!(out.constants.is_empty());
    }

    #[test]
    fn literal_mode_inlines_values_and_params() {
        let s = survey();
        let templates = SqlTemplates::new(Dialect::Postgres);
        let param = Param::new("name", SqlType::Text);
        let mut params = ParamMap::new();
        params.insert(param.clone(), SqlValue::Text("o'neil".into()));
        let metadata = QueryMetadata {
            from: vec![s.table.clone()],
            predicates: vec![s.name.eq_param(&param).or(s.id.eq(1))],
            ..QueryMetadata::default()
        };
        let out = SqlSerializer::new(&templates, true, &params)
            .serialize_select(&metadata, Some(&[Expression::from(&s.id)]))
            .unwrap();
        assert_eq!(
            out.sql,
            "select id from survey where (name = 'o''neil' or id = 1)"
        );
        assert!(out.constants.is_empty());
    }

    #[test]
    fn literal_mode_requires_params() {
        let s = survey();
        let templates = SqlTemplates::new(Dialect::Postgres);
        let params = ParamMap::new();
        let metadata = QueryMetadata {
            from: vec![s.table.clone()],
            predicates: vec![s.name.eq_param(&Param::new("name", SqlType::Text))],
            ..QueryMetadata::default()
        };
        let err = SqlSerializer::new(&templates, true, &params)
            .serialize_select(&metadata, None)
            .unwrap_err();
        assert!(matches!(err, SqlExecError::ParameterNotSet(param) if param.name() == "name"));
    }

    #[test]
    fn typed_null_becomes_a_placeholder() {
        let s = survey();
        let templates = SqlTemplates::new(Dialect::Postgres);
        let params = ParamMap::new();
        let row = InsertRow {
            columns: vec![s.id.clone(), s.name.clone()],
            values: vec![Expression::value(5), Expression::Null],
        };
        let out = SqlSerializer::new(&templates, false, &params)
            .serialize_insert(&s.table, &[], &[row])
            .unwrap();
        assert_eq!(out.sql, "insert into survey (id, name) values (?, ?)");
        assert_eq!(out.constants[1], Constant::Value(SqlValue::Null));
        assert_eq!(out.constant_paths[1], Some(s.name.clone()));
    }

    #[test]
    fn bulk_insert_requires_equal_shapes() {
        let s = survey();
        let templates = SqlTemplates::new(Dialect::Sqlite);
        let params = ParamMap::new();
        let rows = vec![
            InsertRow {
                columns: vec![s.id.clone(), s.name.clone()],
                values: vec![Expression::value(1), Expression::value("a")],
            },
            InsertRow {
                columns: vec![s.id.clone(), s.name.clone()],
                values: vec![Expression::value(2), Expression::value("b")],
            },
        ];
        let out = SqlSerializer::new(&templates, false, &params)
            .serialize_insert(&s.table, &[], &rows)
            .unwrap();
        assert_eq!(out.sql, "insert into survey (id, name) values (?, ?), (?, ?)");
        assert_eq!(out.constants.len(), 4);

        let uneven = vec![
            rows[0].clone(),
            InsertRow {
                columns: vec![s.id.clone()],
                values: vec![Expression::value(3)],
            },
        ];
        assert!(matches!(
            SqlSerializer::new(&templates, false, &params).serialize_insert(&s.table, &[], &uneven),
            Err(SqlExecError::ConfigError(_))
        ));
    }

    #[test]
    fn insert_flags_and_default_values() {
        let s = survey();
        let templates = SqlTemplates::new(Dialect::Sqlite);
        let params = ParamMap::new();
        let flags = vec![QueryFlag::new(
            FlagPosition::StartOverride,
            "insert or replace into ",
        )];
        let out = SqlSerializer::new(&templates, false, &params)
            .serialize_insert(&s.table, &flags, &[InsertRow::default()])
            .unwrap();
        assert_eq!(out.sql, "insert or replace into survey default values");
    }

    fn filtered(predicates: Vec<Predicate>) -> QueryMetadata {
        QueryMetadata {
            predicates,
            ..QueryMetadata::default()
        }
    }

    #[test]
    fn renders_update_and_delete() {
        let s = survey();
        let templates = SqlTemplates::new(Dialect::Postgres);
        let params = ParamMap::new();
        let out = SqlSerializer::new(&templates, false, &params)
            .serialize_update(
                &s.table,
                &[(s.name.clone(), Expression::value("S"))],
                &filtered(vec![s.id.eq(1)]),
            )
            .unwrap();
        assert_eq!(out.sql, "update survey set name = ? where id = ?");

        let out = SqlSerializer::new(&templates, false, &params)
            .serialize_delete(
                &s.table,
                &filtered(vec![s.name.is_null(), s.id.in_list([1, 2])]),
            )
            .unwrap();
        assert_eq!(out.sql, "delete from survey where name is null and id in (?, ?)");

        assert!(matches!(
            SqlSerializer::new(&templates, false, &params).serialize_update(
                &s.table,
                &[],
                &QueryMetadata::default()
            ),
            Err(SqlExecError::ConfigError(_))
        ));
    }

    #[test]
    fn dml_flags_and_limits() {
        let s = survey();
        let params = ParamMap::new();
        let mut metadata = filtered(vec![s.id.eq(1)]);
        metadata.add_flag(QueryFlag::new(FlagPosition::StartOverride, "update or ignore "));
        metadata.add_flag(QueryFlag::new(FlagPosition::End, " returning id"));
        metadata.limit = Some(2);

        let lite = SqlTemplates::new(Dialect::Sqlite).with_dml_limit_supported(true);
        let out = SqlSerializer::new(&lite, false, &params)
            .serialize_update(&s.table, &[(s.name.clone(), Expression::value("S"))], &metadata)
            .unwrap();
        assert_eq!(
            out.sql,
            "update or ignore survey set name = ? where id = ? limit 2 returning id"
        );

        let pg = SqlTemplates::new(Dialect::Postgres);
        assert!(matches!(
            SqlSerializer::new(&pg, false, &params).serialize_delete(&s.table, &metadata),
            Err(SqlExecError::ConfigError(_))
        ));
    }

    #[test]
    fn renders_grouping_and_distinct_on() {
        let s = survey();
        let templates = SqlTemplates::new(Dialect::Postgres);
        let params = ParamMap::new();
        let metadata = QueryMetadata {
            from: vec![s.table.clone()],
            group_by: vec![Expression::from(&s.name)],
            having: vec![Predicate::Compare {
                left: Expression::raw("count(*)"),
                op: crate::sql::CompareOp::Gt,
                right: Expression::value(1),
            }],
            distinct_on: vec![Expression::from(&s.name)],
            order_by: vec![s.name.asc()],
            ..QueryMetadata::default()
        };
        let out = SqlSerializer::new(&templates, false, &params)
            .serialize_select(&metadata, Some(&[Expression::from(&s.name)]))
            .unwrap();
        assert_eq!(
            out.sql,
            "select distinct on (name) name from survey group by name having count(*) > ? \
             order by name asc"
        );
        assert_eq!(out.constants, vec![Constant::Value(SqlValue::Int(1))]);
    }

    #[test]
    fn union_parts_keep_their_constants() {
        let s = survey();
        let params = ParamMap::new();
        let part = |templates: &SqlTemplates, id: i64| {
            let metadata = QueryMetadata {
                from: vec![s.table.clone()],
                predicates: vec![s.id.eq(id)],
                ..QueryMetadata::default()
            };
            SqlSerializer::new(templates, false, &params)
                .serialize_select(&metadata, Some(&[Expression::from(&s.name)]))
                .unwrap()
        };
        let outer = QueryMetadata {
            order_by: vec![s.name.desc()],
            limit: Some(1),
            ..QueryMetadata::default()
        };

        let pg = SqlTemplates::new(Dialect::Postgres);
        let out = SqlSerializer::new(&pg, false, &params)
            .serialize_union(vec![part(&pg, 1), part(&pg, 2)], true, &outer)
            .unwrap();
        assert_eq!(
            out.sql,
            "(select name from survey where id = ?) union all \
             (select name from survey where id = ?) order by name desc limit 1"
        );
        assert_eq!(
            out.constants,
            vec![
                Constant::Value(SqlValue::Int(1)),
                Constant::Value(SqlValue::Int(2))
            ]
        );

        let lite = SqlTemplates::new(Dialect::Sqlite);
        let out = SqlSerializer::new(&lite, false, &params)
            .serialize_union(vec![part(&lite, 1), part(&lite, 2)], false, &QueryMetadata::default())
            .unwrap();
        assert_eq!(
            out.sql,
            "select name from survey where id = ? union select name from survey where id = ?"
        );
        assert!(matches!(
            SqlSerializer::new(&lite, false, &params).serialize_union(
                Vec::new(),
                false,
                &QueryMetadata::default()
            ),
            Err(SqlExecError::ConfigError(_))
        ));
    }
}
