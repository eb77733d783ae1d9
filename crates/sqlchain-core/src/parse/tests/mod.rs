
use super::*;
use crate::{
    chain::{QueryOps, Queryable},
    expr::{ExprExt, MethodRef, TypeRef},
    test_support::{Person, person_age},
};

/// Columns of an unprojected `Person` root scope.
const PERSON_COLUMNS: &str = "t0.person_id AS id, t0.full_name AS name, t0.age AS age";

/// Columns of an unprojected `Person` scope reading a nested scope.
const NESTED_COLUMNS: &str = "t0.id AS id, t0.name AS name, t0.age AS age";

fn compile_with<T: 'static>(
    registry: &ParserRegistry,
    schema: &MappingSchema,
    query: &Queryable<T>,
) -> Result<SqlQuery, ParseError> {
    ExpressionParser::new(registry, schema, query.expr()).compile()
}

fn compile<T: 'static>(query: &Queryable<T>) -> Result<SqlQuery, ParseError> {
    compile_with(&ParserRegistry::default(), &MappingSchema::new("parse"), query)
}

fn sql<T: 'static>(query: &Queryable<T>) -> String {
    compile(query).expect("query compiles").to_string()
}

#[test]
fn default_registry_priority() {
    let registry = ParserRegistry::default();

    assert_eq!(
        registry.names(),
        ["table", "where", "select", "order_by", "take_skip"]
    );
    assert_eq!(registry.len(), 5);
}

#[test]
fn table_alone_selects_every_mapped_column() {
    assert_eq!(
        sql(&Queryable::<Person>::table()),
        format!("SELECT {PERSON_COLUMNS} FROM people t0")
    );
}

#[test]
fn empty_registry_accepts_nothing() {
    let err = compile_with(
        &ParserRegistry::empty(),
        &MappingSchema::new("empty"),
        &Queryable::<Person>::table(),
    )
    .expect_err("no parsers");

    assert!(matches!(err, ParseError::UnsupportedOperator { .. }));
}

#[test]
fn unknown_operator_is_rejected() {
    let source = Queryable::<Person>::table();
    let lambda = Expr::lambda1("x", TypeRef::of::<Person>(), |x| x.field(person_age()));
    let group = Expr::call(
        MethodRef::of::<QueryOps>("GroupBy"),
        TypeRef::of::<Queryable<Person>>(),
        None,
        vec![source.into_expr(), Expr::quote(lambda)],
    );

    let err = compile(&Queryable::<Person>::from_expr(group)).expect_err("unsupported");

    let ParseError::UnsupportedOperator { link } = err else {
        panic!("expected unsupported operator, got {err:?}");
    };
    assert_eq!(link, "call to GroupBy");
}

#[test]
fn strict_schema_reports_unmapped_source() {
    let schema = MappingSchema::new("strict").strict();
    let err = compile_with(
        &ParserRegistry::default(),
        &schema,
        &Queryable::<Person>::table().take(1),
    )
    .expect_err("unmapped");

    assert!(matches!(
        err,
        ParseError::UnmappedSource {
            path: "test_support::Person"
        }
    ));
}

#[test]
fn parse_sequence_builds_innermost_first() {
    let query = Queryable::<Person>::table()
        .take(10)
        .filter(|x| x.field(person_age()).greater_than(Expr::int(1)));
    let registry = ParserRegistry::default();
    let schema = MappingSchema::new("parse");
    let parser = ExpressionParser::new(&registry, &schema, query.expr());

    let ctx = parser.parse_sequence(query.expr()).expect("parses");

    // Take ran first, so the filter had to open an outer scope.
    assert_eq!(ctx.scopes().len(), 2);
    assert!(ctx.scopes()[0].take.is_some());
    assert!(ctx.current().filter.is_some());
}

#[test]
fn links_outside_the_root_cannot_record_parameters() {
    let registry = ParserRegistry::default();
    let schema = MappingSchema::new("detached");
    let root = Queryable::<Person>::table().take(1);
    let stranger = Queryable::<Person>::table()
        .filter(|x| x.field(person_age()).greater_than(Expr::int(3)));
    let parser = ExpressionParser::new(&registry, &schema, root.expr());

    let err = parser
        .parse_sequence(stranger.expr())
        .expect_err("not part of the root");

    assert!(matches!(err, ParseError::DetachedLink { .. }));
}
