//! SQL query model built by the operator parsers.
//!
//! This is a dialect-neutral tree. Rendering for a concrete database lives
//! with the driver; `explain` renders a generic form for diagnostics.

mod context;
mod explain;


use crate::{model::EntityModel, value::Value};
use derive_more::Display;

// re-exports
pub use context::{ElementShape, ParamSlot, ParamSource, QueryContext, SCALAR_COLUMN, SqlQuery};

///
/// ScopeId
/// Index of one scope inside a query context's arena.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("t{_0}")]
pub struct ScopeId(pub(crate) usize);

impl ScopeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

///
/// TableSource
/// Resolved table a root scope reads from.
///

#[derive(Clone, Debug)]
pub struct TableSource {
    pub qualifier: Option<String>,
    pub name: String,
    pub model: &'static EntityModel,
}

///
/// SqlBinaryOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SqlBinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// Equality that treats two nulls as equal.
    NotDistinctFrom,
    /// Inequality that treats two nulls as equal.
    DistinctFrom,
    Coalesce,
}

///
/// SqlUnaryOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SqlUnaryOp {
    Not,
    Negate,
}

///
/// SqlExpr
///

#[derive(Clone, Debug, PartialEq)]
pub enum SqlExpr {
    /// Column of a scope's source: a table column for a root scope, or a
    /// projected alias of the nested scope otherwise.
    Column { scope: ScopeId, name: String },
    /// Inlined literal.
    Value(Value),
    /// Bound parameter, by slot index.
    Parameter(usize),
    Binary {
        op: SqlBinaryOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    Unary {
        op: SqlUnaryOp,
        operand: Box<Self>,
    },
    IsNull {
        operand: Box<Self>,
        negated: bool,
    },
    Case {
        when: Box<Self>,
        then: Box<Self>,
        otherwise: Box<Self>,
    },
}

impl SqlExpr {
    #[must_use]
    pub fn column(scope: ScopeId, name: impl Into<String>) -> Self {
        Self::Column {
            scope,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn binary(op: SqlBinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn unary(op: SqlUnaryOp, operand: Self) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    #[must_use]
    pub fn is_null(operand: Self, negated: bool) -> Self {
        Self::IsNull {
            operand: Box::new(operand),
            negated,
        }
    }

    #[must_use]
    pub fn case(when: Self, then: Self, otherwise: Self) -> Self {
        Self::Case {
            when: Box::new(when),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// `CASE WHEN pred THEN 1 ELSE 0 END`, for predicates used as values.
    #[must_use]
    pub fn predicate_value(predicate: Self) -> Self {
        Self::case(
            predicate,
            Self::Value(Value::Int(1)),
            Self::Value(Value::Int(0)),
        )
    }

    /// Combine two predicates with `AND`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(SqlBinaryOp::And, self, other)
    }
}

///
/// OrderItem
///

#[derive(Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub expr: SqlExpr,
    pub descending: bool,
}

///
/// SelectColumn
///

#[derive(Clone, Debug, PartialEq)]
pub struct SelectColumn {
    pub expr: SqlExpr,
    pub alias: String,
}

///
/// QueryScope
///
/// One `SELECT` level. A root scope reads `source`; a nested scope reads
/// the output of its `parent` scope.
///

#[derive(Clone, Debug, Default)]
pub struct QueryScope {
    pub parent: Option<ScopeId>,
    pub source: Option<TableSource>,
    pub columns: Vec<SelectColumn>,
    pub filter: Option<SqlExpr>,
    pub order_by: Vec<OrderItem>,
    pub take: Option<SqlExpr>,
    pub skip: Option<SqlExpr>,
}

impl QueryScope {
    /// True once a take or skip bound applies at this level; any further
    /// filtering or ordering must happen in an outer scope.
    #[must_use]
    pub const fn is_paged(&self) -> bool {
        self.take.is_some() || self.skip.is_some()
    }
}
