use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use futures_util::TryStreamExt;
use sql_exec_engine::prelude::*;
use sql_exec_engine::test_utils::{ScriptedConnection, ScriptedResult};
use tokio::runtime::Runtime;

// insert with `rows` value groups of four placeholders each
fn bulk_insert_sql(rows: usize) -> String {
    let groups = vec!["(?, ?, ?, ?)"; rows].join(", ");
    format!("insert into bench (a, b, c, d) values {groups}")
}

fn bench_translation(c: &mut Criterion) {
    let mut group = c.benchmark_group("replace_binding_arguments");
    for rows in [1usize, 100, 1000] {
        let sql = bulk_insert_sql(rows);
        group.bench_with_input(BenchmarkId::new("postgres", rows), &sql, |b, sql| {
            b.iter(|| replace_binding_arguments(black_box(sql), PlaceholderStyle::Postgres));
        });
        group.bench_with_input(BenchmarkId::new("sqlite", rows), &sql, |b, sql| {
            b.iter(|| replace_binding_arguments(black_box(sql), PlaceholderStyle::Sqlite));
        });
    }
    group.finish();
}

fn scripted_rows(rows: usize) -> ScriptedResult {
    ScriptedResult::rows(
        &[
            ("id", Some(SqlType::Int)),
            ("name", Some(SqlType::Text)),
            ("score", Some(SqlType::Float)),
            ("active", Some(SqlType::Int)),
        ],
        (0..rows)
            .map(|i| {
                vec![
                    SqlValue::Int(i64::try_from(i).unwrap_or(i64::MAX)),
                    SqlValue::Text(format!("name-{i}")),
                    SqlValue::Int(7),
                    SqlValue::Int(i64::from(i % 2 == 0)),
                ]
            })
            .collect(),
    )
}

fn bench_projection(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let mut table = Table::new("bench");
    let id = table.add_column("id", SqlType::Int);
    let name = table.add_column("name", SqlType::Text);
    let score = table.add_column("score", SqlType::Float);
    let active = table.add_column("active", SqlType::Bool);

    let mut group = c.benchmark_group("projection");
    for rows in [10usize, 1000] {
        group.bench_with_input(BenchmarkId::new("wildcard", rows), &rows, |b, &rows| {
            b.to_async(&rt).iter(|| async {
                let conn = ScriptedConnection::new(PlaceholderStyle::Sqlite);
                conn.respond_with(vec![scripted_rows(rows)]);
                let factory = QueryFactory::new(
                    FixedConnectionProvider::shared(Arc::new(conn)),
                    Configuration::new(Dialect::Sqlite),
                );
                let out: Vec<Vec<SqlValue>> = factory
                    .select_from(&table)
                    .fetch()
                    .try_collect()
                    .await
                    .expect("fetch");
                black_box(out)
            });
        });

        group.bench_with_input(BenchmarkId::new("factory", rows), &rows, |b, &rows| {
            b.to_async(&rt).iter(|| async {
                let conn = ScriptedConnection::new(PlaceholderStyle::Sqlite);
                conn.respond_with(vec![scripted_rows(rows)]);
                let factory = QueryFactory::new(
                    conn.provider(),
                    Configuration::new(Dialect::Sqlite),
                );
                let projection = Projection::factory(
                    vec![
                        id.clone().into(),
                        name.clone().into(),
                        score.clone().into(),
                        active.clone().into(),
                    ],
                    |values| {
                        let mut values = values.into_iter();
                        let id = values.next()?.into_typed::<i64>().ok()??;
                        let name = values.next()?.into_typed::<String>().ok()??;
                        let score = values.next()?.into_typed::<f64>().ok()??;
                        let active = values.next()?.into_typed::<bool>().ok()??;
                        Some((id, name, score, active))
                    },
                );
                let out = factory
                    .select(projection)
                    .from(&table)
                    .fetch_all()
                    .await
                    .expect("fetch");
                black_box(out)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_translation, bench_projection);
criterion_main!(benches);
