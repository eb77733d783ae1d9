//! Operator-chain builder.
//!
//! `Queryable<T>` grows an expression template one operator call at a time.
//! Each call wraps the previous template as its first argument, so the
//! outermost call is the last operator applied and the table literal sits
//! at the innermost position.


use crate::{
    expr::{Expr, ExprRef, MethodRef, TypeRef},
    traits::EntityKind,
    value::{TableRef, Value},
};
use std::{fmt, marker::PhantomData, sync::Arc};

/// Lambda parameter name used by the closure-based builders.
pub const ELEMENT_PARAM: &str = "x";

///
/// QueryOps
/// Declaring type of every chain operator method.
///

pub struct QueryOps;

///
/// Table
/// Static type of a table-source literal.
///

pub struct Table<E>(PhantomData<fn() -> E>);

///
/// Operator
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operator {
    Where,
    Select,
    OrderBy,
    OrderByDescending,
    ThenBy,
    ThenByDescending,
    Take,
    Skip,
}

impl Operator {
    pub const ALL: [Self; 8] = [
        Self::Where,
        Self::Select,
        Self::OrderBy,
        Self::OrderByDescending,
        Self::ThenBy,
        Self::ThenByDescending,
        Self::Take,
        Self::Skip,
    ];

    /// Method name as carried by the template.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Self::Where => "Where",
            Self::Select => "Select",
            Self::OrderBy => "OrderBy",
            Self::OrderByDescending => "OrderByDescending",
            Self::ThenBy => "ThenBy",
            Self::ThenByDescending => "ThenByDescending",
            Self::Take => "Take",
            Self::Skip => "Skip",
        }
    }

    #[must_use]
    pub fn method(self) -> MethodRef {
        MethodRef::of::<QueryOps>(self.method_name())
    }

    /// Resolve a chain operator from a method identity.
    #[must_use]
    pub fn from_method(method: &MethodRef) -> Option<Self> {
        if !method.declaring.is::<QueryOps>() {
            return None;
        }

        Self::ALL
            .into_iter()
            .find(|op| op.method_name() == method.name)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method_name())
    }
}

///
/// Queryable
///
/// Typed handle over one operator-chain template. Every builder returns a
/// new handle sharing the previous template, so a base query can be reused
/// as the prefix of several chains.
///

pub struct Queryable<T> {
    expr: ExprRef,
    _marker: PhantomData<fn() -> T>,
}

impl<E: EntityKind> Queryable<E> {
    /// Start a chain reading every row of an entity's table.
    #[must_use]
    pub fn table() -> Self {
        let table = TableRef {
            model: E::MODEL,
            element: TypeRef::of::<E>(),
        };

        Self::from_expr(Expr::constant(
            Value::Table(table),
            TypeRef::of::<Table<E>>(),
        ))
    }
}

impl<T: 'static> Queryable<T> {
    /// Wrap a hand-built template.
    #[must_use]
    pub const fn from_expr(expr: ExprRef) -> Self {
        Self {
            expr,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn expr(&self) -> &ExprRef {
        &self.expr
    }

    #[must_use]
    pub fn into_expr(self) -> ExprRef {
        self.expr
    }

    /// Static type of the chain's elements.
    #[must_use]
    pub fn element_type() -> TypeRef {
        TypeRef::of::<T>()
    }

    /// Parameter reference for lambdas over this chain's elements.
    #[must_use]
    pub fn element() -> ExprRef {
        Expr::param(ELEMENT_PARAM, Self::element_type())
    }

    #[must_use]
    pub fn filter(&self, predicate: impl FnOnce(ExprRef) -> ExprRef) -> Self {
        self.with_lambda(Operator::Where, predicate)
    }

    /// Project each element; the selector body must be typed `P`.
    #[must_use]
    pub fn select<P: 'static>(&self, selector: impl FnOnce(ExprRef) -> ExprRef) -> Queryable<P> {
        let lambda = Expr::lambda1(ELEMENT_PARAM, Self::element_type(), selector);

        Queryable::from_expr(self.call::<P>(Operator::Select, vec![Expr::quote(lambda)]))
    }

    #[must_use]
    pub fn order_by(&self, key: impl FnOnce(ExprRef) -> ExprRef) -> Self {
        self.with_lambda(Operator::OrderBy, key)
    }

    #[must_use]
    pub fn order_by_descending(&self, key: impl FnOnce(ExprRef) -> ExprRef) -> Self {
        self.with_lambda(Operator::OrderByDescending, key)
    }

    #[must_use]
    pub fn then_by(&self, key: impl FnOnce(ExprRef) -> ExprRef) -> Self {
        self.with_lambda(Operator::ThenBy, key)
    }

    #[must_use]
    pub fn then_by_descending(&self, key: impl FnOnce(ExprRef) -> ExprRef) -> Self {
        self.with_lambda(Operator::ThenByDescending, key)
    }

    #[must_use]
    pub fn take(&self, count: i32) -> Self {
        self.take_expr(Expr::int(count))
    }

    /// Take with a count expression, usually a captured variable.
    #[must_use]
    pub fn take_expr(&self, count: ExprRef) -> Self {
        Self::from_expr(self.call::<T>(Operator::Take, vec![count]))
    }

    #[must_use]
    pub fn skip(&self, count: i32) -> Self {
        self.skip_expr(Expr::int(count))
    }

    #[must_use]
    pub fn skip_expr(&self, count: ExprRef) -> Self {
        Self::from_expr(self.call::<T>(Operator::Skip, vec![count]))
    }

    /// Apply a lambda-taking operator with an already built lambda.
    #[must_use]
    pub fn apply(&self, op: Operator, lambda: ExprRef) -> Self {
        Self::from_expr(self.call::<T>(op, vec![Expr::quote(lambda)]))
    }

    fn with_lambda(&self, op: Operator, body: impl FnOnce(ExprRef) -> ExprRef) -> Self {
        let lambda = Expr::lambda1(ELEMENT_PARAM, Self::element_type(), body);

        self.apply(op, lambda)
    }

    fn call<P: 'static>(&self, op: Operator, extra: Vec<ExprRef>) -> ExprRef {
        let mut args = Vec::with_capacity(extra.len() + 1);
        args.push(Arc::clone(&self.expr));
        args.extend(extra);

        Expr::call(op.method(), TypeRef::of::<Queryable<P>>(), None, args)
    }
}

impl<T> Clone for Queryable<T> {
    fn clone(&self) -> Self {
        Self {
            expr: Arc::clone(&self.expr),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Queryable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queryable")
            .field("expr", &self.expr)
            .finish()
    }
}
