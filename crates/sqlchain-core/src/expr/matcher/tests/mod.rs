
use super::*;
use crate::{
    chain::Queryable,
    expr::{
        ArrayKind, BinaryOp, ConstructorRef, ElementInit, ExprExt, MemberRef, MethodRef, Param,
        TypeRef,
    },
    test_support::{Person, person_age, person_id, person_name},
    value::ClosureEnv,
};
use std::sync::Arc;

fn person_query(min_age: i32) -> ExprRef {
    Queryable::<Person>::table()
        .filter(|x| x.field(person_age()).greater_than(Expr::int(min_age)))
        .order_by(|x| x.field(person_name()))
        .into_expr()
}

#[test]
fn absent_templates() {
    let one = Expr::int(1);

    assert!(matches(None, None));
    assert!(!matches(Some(&*one), None));
    assert!(!matches(None, Some(&*one)));
}

#[test]
fn identical_node_short_circuits() {
    let query = person_query(3);

    assert!(matches(Some(&*query), Some(&*query)));
}

#[test]
fn separately_built_chains_match() {
    assert!(expr_matches(&person_query(30), &person_query(30)));
}

#[test]
fn i32_literals_compare_by_value() {
    assert!(expr_matches(&Expr::int(5), &Expr::int(5)));
    assert!(!expr_matches(&Expr::int(5), &Expr::int(6)));
    assert!(!expr_matches(&person_query(30), &person_query(31)));
}

#[test]
fn string_literals_compare_by_value() {
    assert!(expr_matches(&Expr::text("ada"), &Expr::text("ada")));
    assert!(!expr_matches(&Expr::text("ada"), &Expr::text("bob")));
}

#[test]
fn opaque_literals_match_any_value() {
    assert!(expr_matches(&Expr::long(1), &Expr::long(2)));
    assert!(expr_matches(&Expr::bool(true), &Expr::bool(false)));
    assert!(expr_matches(&Expr::float(0.5), &Expr::float(9.0)));

    let first = Arc::new(ClosureEnv::new().with("limit", 3));
    let second = Arc::new(ClosureEnv::new().with("limit", 9));
    assert!(expr_matches(&Expr::closure(&first), &Expr::closure(&second)));
}

#[test]
fn literal_types_must_agree() {
    assert!(!expr_matches(&Expr::int(1), &Expr::long(1)));
    assert!(!expr_matches(&Expr::null(TypeRef::of::<String>()), &Expr::text("")));
}

#[test]
fn captured_variables_match_across_environments() {
    let build = |limit: i64| {
        let env = Arc::new(ClosureEnv::new().with("limit", limit));
        Queryable::<Person>::table()
            .filter(|x| {
                Expr::convert(x.field(person_age()), TypeRef::of::<i64>())
                    .less_than(Expr::captured(&env, "limit", TypeRef::of::<i64>()))
            })
            .into_expr()
    };

    assert!(expr_matches(&build(10), &build(99)));
}

#[test]
fn operator_kind_must_agree() {
    let x = Expr::param("x", TypeRef::of::<i32>());
    let lt = x.less_than(Expr::int(1));
    let le = x.less_or_equal(Expr::int(1));

    assert!(!expr_matches(&lt, &le));
}

#[test]
fn operator_method_identity_must_agree() {
    let custom = MethodRef::of::<Person>("op_add");
    let plain = Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(2));
    let overloaded = Expr::binary_with(
        BinaryOp::Add,
        TypeRef::of::<i32>(),
        Some(custom),
        Expr::int(1),
        Expr::int(2),
        None,
    );

    assert!(!expr_matches(&plain, &overloaded));
}

#[test]
fn parameters_match_by_name() {
    let ty = TypeRef::of::<Person>();

    assert!(expr_matches(&Expr::param("x", ty), &Expr::param("x", ty)));
    assert!(!expr_matches(&Expr::param("x", ty), &Expr::param("y", ty)));
}

#[test]
fn lambda_parameters_compare_name_and_type() {
    let by_x = Expr::lambda1("x", TypeRef::of::<Person>(), |x| x.field(person_id()));
    let by_y = Expr::lambda1("y", TypeRef::of::<Person>(), |y| y.field(person_id()));
    let two = Expr::lambda(
        vec![
            Param::new("x", TypeRef::of::<Person>()),
            Param::new("i", TypeRef::of::<i32>()),
        ],
        Expr::param("i", TypeRef::of::<i32>()),
    );

    assert!(!expr_matches(&by_x, &by_y));
    assert!(!expr_matches(&by_x, &two));
}

#[test]
fn member_identity_includes_declaring_type() {
    let x = Expr::param("x", TypeRef::of::<Person>());
    let other = MemberRef::of::<String, i32>("age");

    assert!(!expr_matches(&x.field(person_age()), &x.field(other)));
}

#[test]
fn call_argument_counts_must_agree() {
    let method = MethodRef::of::<Person>("Between");
    let one = Expr::call(method, TypeRef::of::<bool>(), None, vec![Expr::int(1)]);
    let two = Expr::call(
        method,
        TypeRef::of::<bool>(),
        None,
        vec![Expr::int(1), Expr::int(2)],
    );

    assert!(!expr_matches(&one, &two));
}

#[test]
fn invoke_matches_target_and_args() {
    let target = Expr::param("f", TypeRef::of::<fn(i32) -> i32>());
    let a = Expr::invoke(TypeRef::of::<i32>(), Arc::clone(&target), vec![Expr::long(1)]);
    let b = Expr::invoke(TypeRef::of::<i32>(), Arc::clone(&target), vec![Expr::long(2)]);
    let c = Expr::invoke(TypeRef::of::<i32>(), target, vec![Expr::int(2)]);

    assert!(expr_matches(&a, &b));
    assert!(!expr_matches(&a, &c));
}

#[test]
fn anonymous_members_compare_by_identity() {
    let x = Expr::param("x", TypeRef::of::<Person>());
    let shape = |name: &'static str| {
        Expr::anonymous::<(i32,)>(vec![(
            MemberRef::of::<(i32,), i32>(name),
            x.field(person_age()),
        )])
    };

    assert!(expr_matches(&shape("a"), &shape("a")));
    assert!(!expr_matches(&shape("a"), &shape("b")));
}

#[test]
fn member_init_compares_binding_kinds_and_payloads() {
    let ctor = ConstructorRef::of::<Person>(0);
    let assign = |value: i32| {
        Expr::member_init(
            ctor,
            Vec::new(),
            vec![MemberBinding::Assignment {
                member: person_age(),
                value: Expr::int(value),
            }],
        )
    };
    let nested = Expr::member_init(
        ctor,
        Vec::new(),
        vec![MemberBinding::Member {
            member: person_age(),
            bindings: Vec::new(),
        }],
    );

    assert!(expr_matches(&assign(1), &assign(1)));
    assert!(!expr_matches(&assign(1), &assign(2)));
    assert!(!expr_matches(&assign(1), &nested));
}

#[test]
fn list_init_compares_add_methods() {
    let ctor = ConstructorRef::of::<Vec<i32>>(0);
    let add = MethodRef::of::<Vec<i32>>("push");
    let insert = MethodRef::of::<Vec<i32>>("insert");
    let list = |method: MethodRef| {
        Expr::list_init(
            ctor,
            vec![ElementInit {
                add_method: method,
                args: vec![Expr::int(1)],
            }],
        )
    };

    assert!(expr_matches(&list(add), &list(add)));
    assert!(!expr_matches(&list(add), &list(insert)));
}

#[test]
fn array_kinds_are_distinct() {
    let ty = TypeRef::of::<Vec<i32>>();
    let init = Expr::new_array(ArrayKind::Init, ty, vec![Expr::int(3)]);
    let bounds = Expr::new_array(ArrayKind::Bounds, ty, vec![Expr::int(3)]);
    let longer = Expr::new_array(ArrayKind::Init, ty, vec![Expr::int(3), Expr::int(4)]);

    assert!(!expr_matches(&init, &bounds));
    assert!(!expr_matches(&init, &longer));
}

#[test]
fn type_tests_compare_tested_type() {
    let x = Expr::param("x", TypeRef::of::<Person>());
    let is_person = Expr::type_is(Arc::clone(&x), TypeRef::of::<Person>());
    let is_string = Expr::type_is(x, TypeRef::of::<String>());

    assert!(!expr_matches(&is_person, &is_string));
}

#[test]
fn different_sources_do_not_match() {
    let persons = Queryable::<Person>::table().take(1).into_expr();
    let strings = Queryable::<Person>::table()
        .select::<String>(|x| x.field(person_name()))
        .into_expr();

    assert!(!expr_matches(&persons, &strings));
}
