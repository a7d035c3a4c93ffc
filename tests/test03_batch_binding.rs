use futures_util::TryStreamExt;
use sql_exec_engine::prelude::*;
use sql_exec_engine::test_utils::{BindCall, ScriptedConnection, ScriptedResult};

struct Items {
    table: Table,
    id: ColumnPath,
    name: ColumnPath,
    qty: ColumnPath,
}

fn items() -> Items {
    let mut table = Table::new("item");
    let id = table.add_column("id", SqlType::Int);
    let name = table.add_column("name", SqlType::Text);
    let qty = table.add_column("qty", SqlType::Int);
    table.add_primary_key(&id);
    Items {
        table,
        id,
        name,
        qty,
    }
}

fn scripted() -> (ScriptedConnection, QueryFactory) {
    let conn = ScriptedConnection::new(PlaceholderStyle::Postgres);
    let factory = QueryFactory::new(conn.provider(), Configuration::new(Dialect::Postgres));
    (conn, factory)
}

fn value(index: usize, value: impl Into<SqlValue>) -> BindCall {
    BindCall::Value {
        index,
        value: value.into(),
    }
}

#[tokio::test]
async fn bulk_rows_bind_at_row_offsets() -> Result<(), SqlExecError> {
    let it = items();
    let (conn, factory) = scripted();

    let count = factory
        .insert(&it.table)
        .with_batch_to_bulk(true)
        .set(&it.name, "a")
        .set(&it.qty, 1)
        .add_batch()
        .set(&it.name, "b")
        .set(&it.qty, 2)
        .add_batch()
        .execute()
        .await?;
    assert_eq!(count, 1);

    let log = conn.statements();
    assert_eq!(log.len(), 1);
    assert_eq!(
        log[0].sql,
        "insert into item (name, qty) values ($1, $2), ($3, $4)"
    );
    assert_eq!(log[0].add_calls, 0);
    assert_eq!(
        log[0].parameter_sets,
        vec![vec![value(0, "a"), value(1, 1), value(2, "b"), value(3, 2)]]
    );
    assert_eq!(log[0].executions, 1);
    Ok(())
}

#[tokio::test]
async fn sequential_rows_bind_one_set_each() -> Result<(), SqlExecError> {
    let it = items();
    let (conn, factory) = scripted();
    conn.respond_with(vec![ScriptedResult::Updated(1), ScriptedResult::Updated(1)]);

    let count = factory
        .insert(&it.table)
        .set(&it.name, "a")
        .set(&it.qty, 1)
        .add_batch()
        .set(&it.name, "b")
        .set_null(&it.qty)
        .add_batch()
        .execute()
        .await?;
    assert_eq!(count, 2);

    let log = conn.statements();
    assert_eq!(log[0].sql, "insert into item (name, qty) values ($1, $2)");
    assert_eq!(log[0].add_calls, 2);
    assert_eq!(
        log[0].parameter_sets,
        vec![
            vec![value(0, "a"), value(1, 1)],
            vec![
                value(0, "b"),
                BindCall::Null {
                    index: 1,
                    ty: SqlType::Int
                }
            ],
        ]
    );
    assert_eq!(log[0].executions, 2);
    Ok(())
}

#[tokio::test]
async fn update_counts_are_summed() -> Result<(), SqlExecError> {
    let it = items();
    let (conn, factory) = scripted();
    conn.respond_with(vec![ScriptedResult::Updated(2), ScriptedResult::Updated(3)]);

    let count = factory
        .update(&it.table)
        .set(&it.qty, 0)
        .filter(it.name.eq("a"))
        .add_batch()
        .set(&it.qty, 0)
        .filter(it.name.eq("b"))
        .add_batch()
        .execute()
        .await?;
    assert_eq!(count, 5);
    assert_eq!(conn.statements()[0].sql, "update item set qty = $1 where name = $2");
    Ok(())
}

#[tokio::test]
async fn batches_with_different_shapes_are_rejected() {
    let it = items();
    let (conn, factory) = scripted();

    let result = factory
        .update(&it.table)
        .set(&it.qty, 1)
        .add_batch()
        .set(&it.name, "x")
        .add_batch()
        .execute()
        .await;
    assert!(matches!(result, Err(SqlExecError::ConfigError(_))));
    assert!(conn.statements().is_empty());
}

#[tokio::test]
async fn literal_batches_never_reach_the_driver() {
    let it = items();
    let (conn, factory) = scripted();

    let result = factory
        .delete(&it.table)
        .with_use_literals(true)
        .filter(it.id.eq(1))
        .add_batch()
        .execute()
        .await;
    assert!(matches!(
        result,
        Err(SqlExecError::UnsupportedCombination(_))
    ));
    assert!(conn.statements().is_empty());
}

#[tokio::test]
async fn queries_are_lazy() -> Result<(), SqlExecError> {
    let it = items();
    let (conn, factory) = scripted();
    conn.respond_with(vec![ScriptedResult::rows(
        &[("id", Some(SqlType::Int))],
        vec![vec![SqlValue::Int(9)]],
    )]);

    let stream = factory
        .select(Projection::<i64>::scalar(&it.id))
        .from(&it.table)
        .filter(it.name.eq("a"))
        .fetch();
    assert!(conn.statements().is_empty());

    let ids: Vec<i64> = stream.try_collect().await?;
    assert_eq!(ids, vec![9]);
    let log = conn.statements();
    assert_eq!(log[0].sql, "select id from item where name = $1");
    assert_eq!(log[0].parameter_sets, vec![vec![value(0, "a")]]);
    Ok(())
}

#[tokio::test]
async fn fetch_one_rejects_a_second_row() {
    let it = items();
    let (conn, factory) = scripted();
    conn.respond_with(vec![ScriptedResult::rows(
        &[("id", Some(SqlType::Int))],
        vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(2)]],
    )]);

    let result = factory
        .select(Projection::<i64>::scalar(&it.id))
        .from(&it.table)
        .fetch_one()
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, SqlExecError::NonUniqueResult));
    assert_eq!(
        err.to_string(),
        "Expected at most one result, but more than one row was returned"
    );
}

#[tokio::test]
async fn wildcard_needs_runtime_types() {
    let it = items();
    let (conn, factory) = scripted();
    conn.respond_with(vec![ScriptedResult::rows(
        &[("id", Some(SqlType::Int)), ("mystery", None)],
        vec![vec![SqlValue::Int(1), SqlValue::Null]],
    )]);

    let result = factory.select_from(&it.table).fetch_all().await;
    assert!(matches!(
        result,
        Err(SqlExecError::UnknownColumnType { index: 1, ref name }) if name == "mystery"
    ));
}

#[tokio::test]
async fn late_bound_params_use_declared_types() -> Result<(), SqlExecError> {
    let it = items();
    let (conn, factory) = scripted();
    let wanted = Param::new("wanted", SqlType::Int);
    conn.respond_with(vec![ScriptedResult::rows(&[("name", Some(SqlType::Text))], vec![])]);

    let names = factory
        .select(Projection::<String>::scalar(&it.name))
        .from(&it.table)
        .filter(it.qty.eq_param(&wanted))
        .set_param(&wanted, 4)
        .fetch_all()
        .await?;
    assert!(names.is_empty());
    assert_eq!(conn.statements()[0].parameter_sets, vec![vec![value(0, 4)]]);
    Ok(())
}

#[tokio::test]
async fn generated_keys_request_primary_key_columns() -> Result<(), SqlExecError> {
    let mut line = Table::new("order_line");
    let order_id = line.add_column("order_id", SqlType::Int);
    let line_no = line.add_column("line_no", SqlType::Int);
    let sku = line.add_column("sku", SqlType::Text);
    line.add_primary_key(&order_id);
    line.add_primary_key(&line_no);
    let (conn, factory) = scripted();
    conn.respond_with(vec![ScriptedResult::rows(
        &[("line_no", Some(SqlType::Int)), ("order_id", Some(SqlType::Int))],
        vec![vec![SqlValue::Int(3), SqlValue::Int(100)]],
    )]);

    let key = factory
        .insert(&line)
        .set(&order_id, 100)
        .set(&sku, "abc")
        .execute_with_key::<i64>(&line_no)
        .await?;
    assert_eq!(key, Some(3));
    assert_eq!(conn.statements()[0].returning, vec!["line_no", "order_id"]);
    Ok(())
}

#[tokio::test]
async fn reserved_table_names_are_quoted() {
    let mut user = Table::new("user");
    let id = user.add_column("id", SqlType::Int);
    let factory = QueryFactory::without_connection(Configuration::new(Dialect::Postgres));

    let sql = factory
        .select(Projection::<i64>::scalar(&id))
        .from(&user)
        .for_update()
        .and_then(Query::no_wait)
        .and_then(|query| query.to_sql())
        .map(|statement| statement.sql);
    assert_eq!(
        sql.ok().as_deref(),
        Some("select id from \"user\" for update nowait")
    );
}

#[tokio::test]
async fn update_rows_keep_their_own_params() -> Result<(), SqlExecError> {
    let it = items();
    let (conn, factory) = scripted();
    let target = Param::new("target", SqlType::Int);
    conn.respond_with(vec![ScriptedResult::Updated(1), ScriptedResult::Updated(1)]);

    let count = factory
        .update(&it.table)
        .set(&it.qty, 1)
        .filter(it.id.eq_param(&target))
        .set_param(&target, 10)
        .add_batch()
        .set(&it.qty, 2)
        .filter(it.id.eq_param(&target))
        .set_param(&target, 20)
        .add_batch()
        .execute()
        .await?;
    assert_eq!(count, 2);

    let log = conn.statements();
    assert_eq!(log[0].sql, "update item set qty = $1 where id = $2");
    assert_eq!(
        log[0].parameter_sets,
        vec![
            vec![value(0, 1), value(1, 10)],
            vec![value(0, 2), value(1, 20)],
        ]
    );
    Ok(())
}

#[tokio::test]
async fn delete_rows_keep_their_own_params() -> Result<(), SqlExecError> {
    let it = items();
    let (conn, factory) = scripted();
    let wanted = Param::new("wanted", SqlType::Text);
    conn.respond_with(vec![ScriptedResult::Updated(1), ScriptedResult::Updated(0)]);

    let count = factory
        .delete(&it.table)
        .filter(it.name.eq_param(&wanted))
        .set_param(&wanted, "a")
        .add_batch()
        .filter(it.name.eq_param(&wanted))
        .set_param(&wanted, "b")
        .add_batch()
        .execute()
        .await?;
    assert_eq!(count, 1);
    assert_eq!(
        conn.statements()[0].parameter_sets,
        vec![vec![value(0, "a")], vec![value(0, "b")]]
    );
    Ok(())
}

#[tokio::test]
async fn committed_params_do_not_leak_into_the_next_row() {
    let it = items();
    let (conn, factory) = scripted();
    let target = Param::new("target", SqlType::Int);

    // the second row never sets `target`, so it cannot bind
    let result = factory
        .update(&it.table)
        .set(&it.qty, 1)
        .filter(it.id.eq_param(&target))
        .set_param(&target, 10)
        .add_batch()
        .set(&it.qty, 2)
        .filter(it.id.eq_param(&target))
        .add_batch()
        .execute()
        .await;
    assert!(matches!(
        result,
        Err(SqlExecError::ParameterNotSet(ref param)) if *param == target
    ));
    assert!(conn.statements().is_empty());
}

#[tokio::test]
async fn clear_discards_params_and_flags() -> Result<(), SqlExecError> {
    let it = items();
    let (conn, factory) = scripted();
    let target = Param::new("target", SqlType::Int);

    let mut update = factory
        .update(&it.table)
        .add_flag(FlagPosition::End, " returning id")
        .set(&it.qty, 1)
        .filter(it.id.eq_param(&target))
        .set_param(&target, 10);
    update.clear();
    let update = update.set(&it.qty, 3).filter(it.id.eq_param(&target));
    assert!(matches!(
        update.execute().await,
        Err(SqlExecError::ParameterNotSet(_))
    ));
    assert_eq!(update.to_sql()?.sql, "update item set qty = ? where id = ?");

    let mut delete = factory
        .delete(&it.table)
        .add_flag(FlagPosition::End, " returning id")
        .filter(it.id.eq(1))
        .add_batch();
    delete.clear();
    assert_eq!(delete.batch_count(), 0);
    assert_eq!(delete.to_sql()?.sql, "delete from item");
    assert!(conn.statements().is_empty());
    Ok(())
}

#[tokio::test]
async fn update_and_delete_flags_render_per_row() -> Result<(), SqlExecError> {
    let it = items();
    let (conn, factory) = scripted();
    conn.respond_with(vec![ScriptedResult::Updated(1)]);

    factory
        .update(&it.table)
        .add_flag(FlagPosition::StartOverride, "update only ")
        .set(&it.qty, 1)
        .filter(it.id.eq(1))
        .execute()
        .await?;
    assert_eq!(
        conn.statements()[0].sql,
        "update only item set qty = $1 where id = $2"
    );

    let delete = factory
        .delete(&it.table)
        .add_flag(FlagPosition::End, " returning id")
        .filter(it.id.eq(1));
    assert_eq!(delete.to_sql()?.sql, "delete from item where id = ? returning id");

    let limited = factory.delete(&it.table).filter(it.id.gt(1)).limit(5);
    assert!(matches!(
        limited.execute().await,
        Err(SqlExecError::ConfigError(_))
    ));
    Ok(())
}

#[tokio::test]
async fn union_parts_bind_their_own_params() -> Result<(), SqlExecError> {
    let it = items();
    let (conn, factory) = scripted();
    let wanted = Param::new("wanted", SqlType::Text);
    conn.respond_with(vec![ScriptedResult::rows(
        &[("id", Some(SqlType::Int))],
        vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(2)]],
    )]);

    let part = |name: &str| {
        factory
            .select(Projection::<i64>::scalar(&it.id))
            .from(&it.table)
            .filter(it.name.eq_param(&wanted))
            .set_param(&wanted, name)
    };
    let union = factory.union_all(vec![part("a"), part("b")]).order_by(it.id.asc());
    assert!(conn.statements().is_empty());

    assert_eq!(union.fetch_all().await?, vec![1, 2]);
    let log = conn.statements();
    assert_eq!(
        log[0].sql,
        "(select id from item where name = $1) union all \
         (select id from item where name = $2) order by id asc"
    );
    assert_eq!(log[0].parameter_sets, vec![vec![value(0, "a"), value(1, "b")]]);
    Ok(())
}

#[tokio::test]
async fn union_having_uses_union_params() -> Result<(), SqlExecError> {
    let it = items();
    let (conn, factory) = scripted();
    let floor = Param::new("floor", SqlType::Int);
    conn.respond_with(vec![ScriptedResult::rows(
        &[("name", Some(SqlType::Text))],
        vec![],
    )]);

    let part = || {
        factory
            .select(Projection::<String>::scalar(&it.name))
            .from(&it.table)
    };
    let union = factory
        .union(vec![part(), part()])
        .group_by(&it.name)
        .having(it.qty.eq_param(&floor));
    assert!(matches!(
        union.fetch_all().await,
        Err(SqlExecError::ParameterNotSet(_))
    ));

    let first = union.set_param(&floor, 3).fetch_first().await?;
    assert_eq!(first, None);
    let log = conn.statements();
    assert_eq!(
        log[0].sql,
        "(select name from item) union (select name from item) group by name \
         having qty = $1 limit 1"
    );
    assert_eq!(log[0].parameter_sets, vec![vec![value(0, 3)]]);
    assert!(
        factory
            .union(Vec::<Query<i64>>::new())
            .fetch_one_required()
            .await
            .is_err()
    );
    Ok(())
}
