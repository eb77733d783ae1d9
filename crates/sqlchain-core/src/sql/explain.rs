//! Generic SQL rendering for diagnostics and tests.

use crate::sql::{ScopeId, SqlBinaryOp, SqlExpr, SqlQuery, SqlUnaryOp, TableSource};
use std::fmt::{self, Write as _};

impl fmt::Display for SqlBinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::And => "AND",
            Self::Or => "OR",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::NotDistinctFrom => "IS NOT DISTINCT FROM",
            Self::DistinctFrom => "IS DISTINCT FROM",
            Self::Coalesce => "COALESCE",
        };
        write!(f, "{symbol}")
    }
}

impl fmt::Display for SqlExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column { scope, name } => write!(f, "{scope}.{name}"),
            Self::Value(value) => write!(f, "{value}"),
            Self::Parameter(index) => write!(f, "@p{index}"),
            Self::Binary {
                op: SqlBinaryOp::Coalesce,
                left,
                right,
            } => write!(f, "COALESCE({left}, {right})"),
            Self::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            Self::Unary {
                op: SqlUnaryOp::Not,
                operand,
            } => write!(f, "NOT {operand}"),
            Self::Unary {
                op: SqlUnaryOp::Negate,
                operand,
            } => write!(f, "-{operand}"),
            Self::IsNull {
                operand,
                negated: false,
            } => write!(f, "{operand} IS NULL"),
            Self::IsNull {
                operand,
                negated: true,
            } => write!(f, "{operand} IS NOT NULL"),
            Self::Case {
                when,
                then,
                otherwise,
            } => write!(f, "CASE WHEN {when} THEN {then} ELSE {otherwise} END"),
        }
    }
}

impl fmt::Display for TableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{qualifier}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Display for SqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render_scope(self.root_id(), &mut out)?;

        f.write_str(&out)
    }
}

impl SqlQuery {
    fn render_scope(&self, id: ScopeId, out: &mut String) -> fmt::Result {
        let Some(scope) = self.scope(id) else {
            return Err(fmt::Error);
        };

        out.push_str("SELECT ");
        if scope.columns.is_empty() {
            out.push('*');
        }
        for (i, column) in scope.columns.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            write!(out, "{} AS {}", column.expr, column.alias)?;
        }

        out.push_str(" FROM ");
        match (&scope.source, scope.parent) {
            (Some(source), _) => write!(out, "{source} {id}")?,
            (None, Some(parent)) => {
                out.push('(');
                self.render_scope(parent, out)?;
                write!(out, ") {parent}")?;
            }
            (None, None) => return Err(fmt::Error),
        }

        if let Some(filter) = &scope.filter {
            write!(out, " WHERE {filter}")?;
        }

        if !scope.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            for (i, item) in scope.order_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write!(out, "{}", item.expr)?;
                if item.descending {
                    out.push_str(" DESC");
                }
            }
        }

        if let Some(take) = &scope.take {
            write!(out, " LIMIT {take}")?;
        }
        if let Some(skip) = &scope.skip {
            write!(out, " OFFSET {skip}")?;
        }

        Ok(())
    }
}
