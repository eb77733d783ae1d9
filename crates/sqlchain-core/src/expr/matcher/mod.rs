//! Structural template matching.
//!
//! Two templates match when a plan compiled from one is safe to run for the
//! other. Matching is structural, never by reference, except that identical
//! nodes short-circuit. Literals are compared by value only when their type
//! is parameter-worthy (see `TypeRef::is_parameter_worthy`).
//!
//! Every arm below matches on the left node's variant with no wildcard, so a
//! new node kind cannot be added without teaching the matcher about it.

#[cfg(test)]
mod tests;

use crate::expr::{ElementInit, Expr, ExprNode, ExprRef, MemberBinding, NewExpr};
use std::ptr;

/// Match two optional templates; both absent is a match.
#[must_use]
pub fn matches(left: Option<&Expr>, right: Option<&Expr>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(left), Some(right)) => expr_matches(left, right),
        _ => false,
    }
}

/// Match two templates.
#[must_use]
pub fn expr_matches(a: &Expr, b: &Expr) -> bool {
    if ptr::eq(a, b) {
        return true;
    }

    if a.kind() != b.kind() || a.ty() != b.ty() {
        return false;
    }

    // Kinds are equal past this point, so each `let .. else` below only
    // rejects on a variant the kind check already ruled out.
    match a.node() {
        ExprNode::Binary {
            method,
            left,
            right,
            conversion,
            ..
        } => {
            let ExprNode::Binary {
                method: b_method,
                left: b_left,
                right: b_right,
                conversion: b_conversion,
                ..
            } = b.node()
            else {
                return false;
            };

            method == b_method
                && opt_matches(conversion.as_ref(), b_conversion.as_ref())
                && expr_matches(left, b_left)
                && expr_matches(right, b_right)
        }

        ExprNode::Unary {
            method, operand, ..
        } => {
            let ExprNode::Unary {
                method: b_method,
                operand: b_operand,
                ..
            } = b.node()
            else {
                return false;
            };

            method == b_method && expr_matches(operand, b_operand)
        }

        ExprNode::Call {
            method,
            object,
            args,
        } => {
            let ExprNode::Call {
                method: b_method,
                object: b_object,
                args: b_args,
            } = b.node()
            else {
                return false;
            };

            args.len() == b_args.len()
                && method == b_method
                && opt_matches(object.as_ref(), b_object.as_ref())
                && all_match(args, b_args)
        }

        ExprNode::Invoke { target, args } => {
            let ExprNode::Invoke {
                target: b_target,
                args: b_args,
            } = b.node()
            else {
                return false;
            };

            args.len() == b_args.len() && expr_matches(target, b_target) && all_match(args, b_args)
        }

        ExprNode::Conditional {
            test,
            if_true,
            if_false,
        } => {
            let ExprNode::Conditional {
                test: b_test,
                if_true: b_true,
                if_false: b_false,
            } = b.node()
            else {
                return false;
            };

            expr_matches(test, b_test)
                && expr_matches(if_true, b_true)
                && expr_matches(if_false, b_false)
        }

        ExprNode::Constant(value) => {
            let ExprNode::Constant(b_value) = b.node() else {
                return false;
            };

            // Opaque literals match whatever they carry.
            !a.ty().is_parameter_worthy() || value == b_value
        }

        ExprNode::Member { member, object } => {
            let ExprNode::Member {
                member: b_member,
                object: b_object,
            } = b.node()
            else {
                return false;
            };

            member == b_member && opt_matches(object.as_ref(), b_object.as_ref())
        }

        ExprNode::New(new) => {
            let ExprNode::New(b_new) = b.node() else {
                return false;
            };

            new_matches(new, b_new)
        }

        ExprNode::MemberInit { new, bindings } => {
            let ExprNode::MemberInit {
                new: b_new,
                bindings: b_bindings,
            } = b.node()
            else {
                return false;
            };

            bindings.len() == b_bindings.len()
                && new_matches(new, b_new)
                && bindings
                    .iter()
                    .zip(b_bindings)
                    .all(|(left, right)| binding_matches(left, right))
        }

        ExprNode::ListInit { new, initializers } => {
            let ExprNode::ListInit {
                new: b_new,
                initializers: b_initializers,
            } = b.node()
            else {
                return false;
            };

            initializers.len() == b_initializers.len()
                && new_matches(new, b_new)
                && initializers_match(initializers, b_initializers)
        }

        ExprNode::NewArray { elements, .. } => {
            let ExprNode::NewArray {
                elements: b_elements,
                ..
            } = b.node()
            else {
                return false;
            };

            elements.len() == b_elements.len() && all_match(elements, b_elements)
        }

        ExprNode::Lambda { params, body } => {
            let ExprNode::Lambda {
                params: b_params,
                body: b_body,
            } = b.node()
            else {
                return false;
            };

            params.len() == b_params.len()
                && expr_matches(body, b_body)
                && params
                    .iter()
                    .zip(b_params)
                    .all(|(left, right)| left.name == right.name && left.ty == right.ty)
        }

        // Parameters match by declared name, never by identity.
        ExprNode::Parameter { name } => {
            let ExprNode::Parameter { name: b_name } = b.node() else {
                return false;
            };

            name == b_name
        }

        ExprNode::TypeIs {
            operand,
            type_operand,
        } => {
            let ExprNode::TypeIs {
                operand: b_operand,
                type_operand: b_type_operand,
            } = b.node()
            else {
                return false;
            };

            type_operand == b_type_operand && expr_matches(operand, b_operand)
        }
    }
}

fn opt_matches(a: Option<&ExprRef>, b: Option<&ExprRef>) -> bool {
    matches(a.map(|e| &**e), b.map(|e| &**e))
}

fn all_match(a: &[ExprRef], b: &[ExprRef]) -> bool {
    a.iter()
        .zip(b)
        .all(|(left, right)| expr_matches(left, right))
}

// Constructor identity and the member list compare by identity; only the
// arguments recurse structurally.
fn new_matches(a: &NewExpr, b: &NewExpr) -> bool {
    a.args.len() == b.args.len()
        && a.members.len() == b.members.len()
        && a.constructor == b.constructor
        && a.members == b.members
        && all_match(&a.args, &b.args)
}

fn initializers_match(a: &[ElementInit], b: &[ElementInit]) -> bool {
    a.iter().zip(b).all(|(left, right)| {
        left.add_method == right.add_method
            && left.args.len() == right.args.len()
            && all_match(&left.args, &right.args)
    })
}

fn binding_matches(a: &MemberBinding, b: &MemberBinding) -> bool {
    if ptr::eq(a, b) {
        return true;
    }

    if a.kind() != b.kind() || a.member() != b.member() {
        return false;
    }

    match (a, b) {
        (
            MemberBinding::Assignment { value, .. },
            MemberBinding::Assignment { value: b_value, .. },
        ) => expr_matches(value, b_value),

        (
            MemberBinding::Member { bindings, .. },
            MemberBinding::Member {
                bindings: b_bindings,
                ..
            },
        ) => {
            bindings.len() == b_bindings.len()
                && bindings
                    .iter()
                    .zip(b_bindings)
                    .all(|(left, right)| binding_matches(left, right))
        }

        (
            MemberBinding::List { initializers, .. },
            MemberBinding::List {
                initializers: b_initializers,
                ..
            },
        ) => {
            initializers.len() == b_initializers.len()
                && initializers_match(initializers, b_initializers)
        }

        // binding kinds were compared above
        _ => false,
    }
}
