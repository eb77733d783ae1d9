mod common;

use common::{Book, Shelf, book_pages, book_row, book_title, scalar_row};
use sqlchain_core::{
    config::{ConfigError, CoreConfig},
    expr::TypeRef,
    obs::{CacheOutcome, MetricsEvent, MetricsSink},
    parse::ParseError,
    prelude::*,
    session::QueryError,
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

const BOOK_COLUMNS: &str = "t0.book_id AS id, t0.book_title AS title, t0.pages AS pages";

fn session() -> QuerySession {
    let config = CoreConfig::from_toml_str("[plan_cache]\ndepth = 8\n").expect("config");

    QuerySession::from_config(Arc::new(MappingSchema::new("library")), &config).expect("session")
}

fn shelf() -> Shelf {
    Shelf::with_rows(vec![
        book_row(1, "Dune", 412),
        book_row(2, "Middlemarch", 880),
    ])
}

fn longer_than(min: i32) -> Queryable<Book> {
    let env = Arc::new(ClosureEnv::new().with("min", min));

    Queryable::<Book>::table()
        .filter(|x| {
            x.field(book_pages())
                .greater_than(Expr::captured(&env, "min", TypeRef::of::<i32>()))
        })
        .order_by_descending(|x| x.field(book_title()))
        .take(2)
}

#[test]
fn chain_runs_against_the_connection() {
    let session = session();
    let shelf = shelf();

    let books = session.query(&shelf, &longer_than(300)).expect("query");

    assert_eq!(books.len(), 2);
    assert_eq!(books[1].title, "Middlemarch");

    let log = shelf.log();
    assert_eq!(
        log[0].0,
        format!(
            "SELECT {BOOK_COLUMNS} FROM books t0 \
             WHERE (t0.pages > @p0) ORDER BY t0.book_title DESC LIMIT 2"
        )
    );
    assert_eq!(log[0].1, [Value::Int(300)]);
}

#[test]
fn same_shape_reuses_one_plan_with_fresh_values() {
    let session = session();
    let shelf = shelf();

    session.query(&shelf, &longer_than(100)).expect("first");
    session.query(&shelf, &longer_than(500)).expect("second");

    let stats = session.cache().stats();
    assert_eq!((stats.misses, stats.hits, stats.size), (1, 1, 1));

    let log = shelf.log();
    assert_eq!(log[0].0, log[1].0);
    assert_eq!(log[0].1, [Value::Int(100)]);
    assert_eq!(log[1].1, [Value::Int(500)]);
}

#[test]
fn prepared_query_enumerates_lazily() {
    let session = session();
    let shelf = shelf();
    let prepared = session.prepare(&longer_than(250)).expect("prepare");

    let query = prepared.query(&shelf).expect("bind");
    assert!(shelf.log().is_empty());

    let titles: Vec<String> = query
        .iter()
        .map(|book| book.map(|book| book.title))
        .collect::<Result<_, _>>()
        .expect("rows");
    assert_eq!(titles, ["Dune", "Middlemarch"]);

    for book in &query {
        book.expect("row");
    }
    assert_eq!(shelf.log().len(), 2);
}

#[test]
fn scalar_projection_reads_one_column() {
    let session = session();
    let shelf = Shelf::with_rows(vec![scalar_row(Value::Text("Dune".into()))]);
    let titles = Queryable::<Book>::table()
        .select::<String>(|x| x.field(book_title()))
        .skip(1);

    let result = session.query(&shelf, &titles).expect("query");

    assert_eq!(result, ["Dune"]);
    assert_eq!(
        shelf.log()[0].0,
        "SELECT t0.book_title AS value FROM books t0 OFFSET 1"
    );
}

#[test]
fn schema_controls_table_names() {
    let schema = MappingSchema::new("archive")
        .with_qualifier("archive")
        .with_table::<Book>("old_books");
    let session = QuerySession::new(Arc::new(schema));

    let sql = session
        .explain(&Queryable::<Book>::table().take(1))
        .expect("explain");

    assert_eq!(
        sql,
        format!("SELECT {BOOK_COLUMNS} FROM archive.old_books t0 LIMIT 1")
    );
}

#[test]
fn unsupported_shapes_fail_with_parse_errors() {
    let session = session();
    let query = Queryable::<Book>::table().filter(|x| Expr::type_is(x, TypeRef::of::<Book>()));

    let err = session.explain(&query).expect_err("unsupported");

    assert!(matches!(
        err,
        QueryError::Parse(ParseError::UnsupportedExpression { .. })
    ));
    assert!(session.cache().is_empty());
}

#[test]
fn config_rejects_bad_documents() {
    assert!(matches!(
        CoreConfig::from_toml_str("[plan_cache]\ndepth = 0\n"),
        Err(ConfigError::ZeroDepth)
    ));
    assert!(matches!(
        CoreConfig::from_toml_str("[plan_cache]\nsize = 3\n"),
        Err(ConfigError::Parse(_))
    ));

    let config = CoreConfig::from_toml_str("").expect("defaults");
    assert_eq!(config, CoreConfig::default());
}

///
/// CountingSink
///

#[derive(Default)]
struct CountingSink {
    misses: AtomicU64,
    queries: AtomicU64,
    rows: AtomicU64,
}

impl MetricsSink for CountingSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::PlanCache {
                outcome: CacheOutcome::Miss,
            } => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
            MetricsEvent::ExecStart { .. } => {
                self.queries.fetch_add(1, Ordering::Relaxed);
            }
            MetricsEvent::ExecFinish { rows, .. } => {
                self.rows.fetch_add(rows, Ordering::Relaxed);
            }
            _ => {}
        }
    }
}

#[test]
fn session_sink_sees_cache_and_execution_events() {
    let sink: &'static CountingSink = Box::leak(Box::new(CountingSink::default()));
    let session = session().metrics_sink(sink).debug(true);
    let shelf = shelf();

    session.query(&shelf, &longer_than(1)).expect("query");

    assert_eq!(sink.misses.load(Ordering::Relaxed), 1);
    assert_eq!(sink.queries.load(Ordering::Relaxed), 1);
    assert_eq!(sink.rows.load(Ordering::Relaxed), 2);
}
