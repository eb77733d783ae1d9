use super::*;
use crate::test_support::{Person, person_age, person_name};
use std::sync::Arc;

fn sample() -> ExprRef {
    // x => x.age > 30 && x.name != "bob"
    Expr::lambda1("x", TypeRef::of::<Person>(), |x| {
        x.field(person_age())
            .greater_than(Expr::int(30))
            .and_also(x.field(person_name()).not_equal(Expr::text("bob")))
    })
}

#[test]
fn binary_predicates_are_typed_bool() {
    let lhs = Expr::int(1);
    let compare = lhs.less_than(Expr::int(2));
    let sum = lhs.plus(Expr::int(2));

    assert!(compare.ty().is::<bool>());
    assert!(sum.ty().is::<i32>());
    assert_eq!(compare.kind(), ExprKind::Binary(BinaryOp::LessThan));
}

#[test]
fn children_follow_operand_order() {
    let test = Expr::bool(true);
    let yes = Expr::int(1);
    let no = Expr::int(2);
    let cond = Expr::conditional(Arc::clone(&test), Arc::clone(&yes), Arc::clone(&no));

    let children = cond.children();
    assert_eq!(children.len(), 3);
    assert!(Arc::ptr_eq(children[0], &test));
    assert!(Arc::ptr_eq(children[1], &yes));
    assert!(Arc::ptr_eq(children[2], &no));
}

#[test]
fn children_include_member_init_payloads() {
    let value = Expr::int(7);
    let init = Expr::member_init(
        ConstructorRef::of::<Person>(0),
        Vec::new(),
        vec![
            MemberBinding::Assignment {
                member: person_age(),
                value: Arc::clone(&value),
            },
            MemberBinding::Member {
                member: person_name(),
                bindings: vec![MemberBinding::Assignment {
                    member: person_age(),
                    value: Expr::int(8),
                }],
            },
        ],
    );

    let children = init.children();
    assert_eq!(children.len(), 2);
    assert!(Arc::ptr_eq(children[0], &value));
}

#[test]
fn unwrap_quotes_strips_nested_quotes() {
    let lambda = sample();
    let quoted = Expr::quote(Expr::quote(Arc::clone(&lambda)));

    assert!(std::ptr::eq(quoted.unwrap_quotes(), &*lambda));
    assert!(quoted.as_lambda().is_some());
    assert!(Expr::int(1).as_lambda().is_none());
}

#[test]
fn path_locates_and_resolves_a_node() {
    let lambda = sample();
    let (_, body) = lambda.as_lambda().expect("lambda");
    let ExprNode::Binary { right, .. } = body.node() else {
        panic!("expected and-also body");
    };
    let ExprNode::Binary { right: literal, .. } = right.node() else {
        panic!("expected comparison");
    };

    let path = ExprPath::locate(&lambda, literal).expect("literal is reachable");

    assert_eq!(path.to_string(), "$.0.1.1");
    assert!(std::ptr::eq(
        path.resolve(&lambda).expect("path resolves"),
        &**literal
    ));
}

#[test]
fn path_resolves_across_matching_templates() {
    let first = sample();
    let second = sample();
    let (_, body) = first.as_lambda().expect("lambda");
    let ExprNode::Binary { left, .. } = body.node() else {
        panic!("expected and-also body");
    };

    let path = ExprPath::locate(&first, left).expect("reachable");
    let other = path.resolve(&second).expect("resolves in matching template");

    assert!(expr_matches(left, other));
    assert!(!std::ptr::eq(&**left, other));
}

#[test]
fn path_misses_foreign_nodes() {
    let lambda = sample();
    let stranger = Expr::int(30);

    assert!(ExprPath::locate(&lambda, &stranger).is_none());
    assert_eq!(ExprPath::default().to_string(), "$");
}

#[test]
fn child_paths_extend_without_touching_the_parent() {
    let lambda = sample();
    let body = ExprPath::default().child(0);
    let right = body.child(1);

    assert_eq!(body.to_string(), "$.0");
    assert_eq!(right.child(1).to_string(), "$.0.1.1");

    let ExprNode::Binary {
        right: comparison, ..
    } = lambda.as_lambda().expect("lambda").1.node()
    else {
        panic!("expected and-also body");
    };
    assert!(std::ptr::eq(
        right.resolve(&lambda).expect("resolves"),
        &**comparison
    ));
}

#[test]
fn literal_classification() {
    assert!(TypeRef::of::<i32>().is_parameter_worthy());
    assert!(TypeRef::of::<String>().is_parameter_worthy());
    assert!(!TypeRef::of::<i64>().is_parameter_worthy());
    assert!(!TypeRef::of::<bool>().is_parameter_worthy());
    assert!(!TypeRef::of::<f64>().is_parameter_worthy());
    assert!(!TypeRef::of::<crate::value::ClosureEnv>().is_parameter_worthy());
}
