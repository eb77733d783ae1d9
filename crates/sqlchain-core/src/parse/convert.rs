//! Lambda-body conversion into SQL expressions.

use crate::{
    expr::{BinaryOp, Expr, ExprNode, ExprPath, MemberBinding, TypeRef, UnaryOp},
    parse::ParseError,
    sql::{ElementShape, ParamSlot, ParamSource, QueryContext, SqlBinaryOp, SqlExpr, SqlUnaryOp},
    value::Value,
};

///
/// ConvertMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ConvertMode {
    /// One SQL expression per body.
    Value,
    /// Sort keys: a composite `New` or member-init body expands to one term
    /// per member.
    Key,
}

///
/// Term
/// One converted expression and the static type it was converted from.
///

#[derive(Clone, Debug)]
pub(crate) struct Term {
    pub expr: SqlExpr,
    pub ty: TypeRef,
}

impl Term {
    /// Predicates become `1`/`0` values so they can be sorted or selected.
    pub fn into_value(self) -> SqlExpr {
        if self.ty.is::<bool>() && is_predicate(&self.expr) {
            SqlExpr::predicate_value(self.expr)
        } else {
            self.expr
        }
    }
}

/// Convert a one-parameter lambda's body under `mode`. `path` locates the
/// (possibly quoted) lambda in the template root.
pub(crate) fn convert_lambda(
    ctx: &mut QueryContext,
    lambda: &Expr,
    path: ExprPath,
    mode: ConvertMode,
    context: &'static str,
) -> Result<Vec<Term>, ParseError> {
    let Some((params, body)) = lambda.as_lambda() else {
        return Err(ParseError::UnsupportedExpression {
            kind: lambda.kind(),
            context,
        });
    };

    let [param] = params else {
        return Err(ParseError::UnsupportedExpression {
            kind: lambda.kind(),
            context,
        });
    };

    let mut converter = Converter {
        ctx,
        param: Some(param.name.as_str()),
        path: body_path(lambda, path),
        context,
    };

    match (mode, body.node()) {
        (ConvertMode::Key, ExprNode::New(new)) => new
            .args
            .iter()
            .enumerate()
            .map(|(index, arg)| converter.at(index, |this| this.term(arg)))
            .collect(),
        (ConvertMode::Key, ExprNode::MemberInit { new, bindings }) => bindings
            .iter()
            .enumerate()
            .map(|(index, binding)| match binding {
                // Plain assignments each contribute one child after the
                // constructor arguments.
                MemberBinding::Assignment { value, .. } => {
                    converter.at(new.args.len() + index, |this| this.term(value))
                }
                MemberBinding::Member { .. } | MemberBinding::List { .. } => {
                    Err(ParseError::UnsupportedExpression {
                        kind: body.kind(),
                        context,
                    })
                }
            })
            .collect(),
        _ => Ok(vec![converter.term(body)?]),
    }
}

/// Convert a free-standing expression with no lambda parameter in scope,
/// such as a paging bound.
pub(crate) fn convert_free(
    ctx: &mut QueryContext,
    expr: &Expr,
    path: ExprPath,
    context: &'static str,
) -> Result<SqlExpr, ParseError> {
    Converter {
        ctx,
        param: None,
        path,
        context,
    }
    .convert(expr)
}

/// Path of a lambda's body, looking through quotes the way `as_lambda` does.
pub(crate) fn body_path(lambda: &Expr, mut path: ExprPath) -> ExprPath {
    let mut current = lambda;
    while let ExprNode::Unary {
        op: UnaryOp::Quote,
        operand,
        ..
    } = current.node()
    {
        current = &**operand;
        path.push(0);
    }
    path.push(0);

    path
}

///
/// Converter
///
/// Walks one expression tree. `path` always names the node being converted,
/// so every parameter slot records exactly where its literal sits.
///

pub(crate) struct Converter<'a> {
    pub ctx: &'a mut QueryContext,
    pub param: Option<&'a str>,
    pub path: ExprPath,
    pub context: &'static str,
}

impl Converter<'_> {
    pub fn term(&mut self, expr: &Expr) -> Result<Term, ParseError> {
        Ok(Term {
            expr: self.convert(expr)?,
            ty: expr.ty(),
        })
    }

    /// Run `f` with the path moved to child `index` of the current node.
    pub fn at<T>(&mut self, index: usize, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(index);
        let out = f(self);
        self.path.pop();

        out
    }

    pub fn convert(&mut self, expr: &Expr) -> Result<SqlExpr, ParseError> {
        match expr.node() {
            ExprNode::Parameter { name } => self.element(expr, name),

            ExprNode::Member { member, object } => {
                let Some(object) = object else {
                    return Err(self.unsupported(expr));
                };

                match object.node() {
                    ExprNode::Parameter { name } if self.is_param(name) => self
                        .ctx
                        .shape()
                        .member(member.name)
                        .cloned()
                        .ok_or_else(|| ParseError::UnknownMember {
                            member: member.name.to_string(),
                        }),
                    ExprNode::Parameter { name } => Err(ParseError::UnboundParameter {
                        name: name.clone(),
                    }),
                    ExprNode::Constant(Value::Closure(_)) => {
                        Ok(self.at(0, |this| this.param_slot(ParamSource::Captured(member.name))))
                    }
                    _ => Err(self.unsupported(expr)),
                }
            }

            ExprNode::Constant(value) => {
                if expr.ty().is_parameter_worthy() {
                    // Matching compares these by value, so inlining is safe.
                    Ok(SqlExpr::Value(value.clone()))
                } else if value.is_scalar() {
                    // Opaque values, null included, differ between matching
                    // templates and must be bound.
                    Ok(self.param_slot(ParamSource::Literal))
                } else {
                    Err(self.unsupported(expr))
                }
            }

            ExprNode::Binary {
                op, left, right, ..
            } => self.binary(expr, *op, left, right),

            ExprNode::Unary { op, operand, .. } => {
                let sql_op = match op {
                    UnaryOp::Not => SqlUnaryOp::Not,
                    UnaryOp::Negate => SqlUnaryOp::Negate,
                    UnaryOp::Convert | UnaryOp::Quote | UnaryOp::TypeAs | UnaryOp::UnaryPlus => {
                        return self.at(0, |this| this.convert(operand));
                    }
                    UnaryOp::ArrayLength => return Err(self.unsupported(expr)),
                };

                Ok(SqlExpr::unary(
                    sql_op,
                    self.at(0, |this| this.convert(operand))?,
                ))
            }

            ExprNode::Conditional {
                test,
                if_true,
                if_false,
            } => Ok(SqlExpr::case(
                self.at(0, |this| this.convert(test))?,
                self.at(1, |this| this.convert(if_true))?,
                self.at(2, |this| this.convert(if_false))?,
            )),

            ExprNode::Call { .. }
            | ExprNode::Invoke { .. }
            | ExprNode::New(_)
            | ExprNode::MemberInit { .. }
            | ExprNode::ListInit { .. }
            | ExprNode::NewArray { .. }
            | ExprNode::Lambda { .. }
            | ExprNode::TypeIs { .. } => Err(self.unsupported(expr)),
        }
    }

    fn is_param(&self, name: &str) -> bool {
        self.param == Some(name)
    }

    // A bare parameter is the whole element: fine for scalars only.
    fn element(&self, expr: &Expr, name: &str) -> Result<SqlExpr, ParseError> {
        if !self.is_param(name) {
            return Err(ParseError::UnboundParameter {
                name: name.to_string(),
            });
        }

        match self.ctx.shape() {
            ElementShape::Scalar(sql) => Ok(sql.clone()),
            ElementShape::Members(_) => Err(self.unsupported(expr)),
        }
    }

    fn binary(
        &mut self,
        expr: &Expr,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<SqlExpr, ParseError> {
        if matches!(op, BinaryOp::Equal | BinaryOp::NotEqual) {
            let negated = op == BinaryOp::NotEqual;
            if is_inline_null(right) {
                let operand = self.at(0, |this| this.convert(left))?;
                return Ok(SqlExpr::is_null(operand, negated));
            }
            if is_inline_null(left) {
                let operand = self.at(1, |this| this.convert(right))?;
                return Ok(SqlExpr::is_null(operand, negated));
            }
        }

        let logical = expr.ty().is::<bool>();
        let sql_op = match op {
            BinaryOp::Add => SqlBinaryOp::Add,
            BinaryOp::Subtract => SqlBinaryOp::Subtract,
            BinaryOp::Multiply => SqlBinaryOp::Multiply,
            BinaryOp::Divide => SqlBinaryOp::Divide,
            BinaryOp::Modulo => SqlBinaryOp::Modulo,
            BinaryOp::AndAlso => SqlBinaryOp::And,
            BinaryOp::OrElse => SqlBinaryOp::Or,
            BinaryOp::And if logical => SqlBinaryOp::And,
            BinaryOp::Or if logical => SqlBinaryOp::Or,
            BinaryOp::And => SqlBinaryOp::BitAnd,
            BinaryOp::Or => SqlBinaryOp::BitOr,
            BinaryOp::ExclusiveOr => SqlBinaryOp::BitXor,
            BinaryOp::Equal => SqlBinaryOp::Equal,
            BinaryOp::NotEqual => SqlBinaryOp::NotEqual,
            BinaryOp::LessThan => SqlBinaryOp::LessThan,
            BinaryOp::LessThanOrEqual => SqlBinaryOp::LessThanOrEqual,
            BinaryOp::GreaterThan => SqlBinaryOp::GreaterThan,
            BinaryOp::GreaterThanOrEqual => SqlBinaryOp::GreaterThanOrEqual,
            BinaryOp::Coalesce => SqlBinaryOp::Coalesce,
            BinaryOp::Power | BinaryOp::ArrayIndex | BinaryOp::LeftShift | BinaryOp::RightShift => {
                return Err(self.unsupported(expr));
            }
        };

        let left = self.at(0, |this| this.convert(left))?;
        let right = self.at(1, |this| this.convert(right))?;

        // A bound value may be null in the next matching template.
        let bound =
            matches!(left, SqlExpr::Parameter(_)) || matches!(right, SqlExpr::Parameter(_));
        let sql_op = match sql_op {
            SqlBinaryOp::Equal if bound => SqlBinaryOp::NotDistinctFrom,
            SqlBinaryOp::NotEqual if bound => SqlBinaryOp::DistinctFrom,
            other => other,
        };

        Ok(SqlExpr::binary(sql_op, left, right))
    }

    // The plan re-reads the value at this path from each caller's template
    // at execution time.
    fn param_slot(&mut self, source: ParamSource) -> SqlExpr {
        self.ctx.add_param(ParamSlot {
            path: self.path.clone(),
            source,
        })
    }

    fn unsupported(&self, expr: &Expr) -> ParseError {
        ParseError::UnsupportedExpression {
            kind: expr.kind(),
            context: self.context,
        }
    }
}

// Null compared by value during matching, so `IS NULL` is safe to bake in.
fn is_inline_null(expr: &Expr) -> bool {
    expr.ty().is_parameter_worthy() && expr.as_constant().is_some_and(Value::is_null)
}

const fn is_predicate(expr: &SqlExpr) -> bool {
    match expr {
        SqlExpr::Binary { op, .. } => matches!(
            op,
            SqlBinaryOp::And
                | SqlBinaryOp::Or
                | SqlBinaryOp::Equal
                | SqlBinaryOp::NotEqual
                | SqlBinaryOp::LessThan
                | SqlBinaryOp::LessThanOrEqual
                | SqlBinaryOp::GreaterThan
                | SqlBinaryOp::GreaterThanOrEqual
                | SqlBinaryOp::NotDistinctFrom
                | SqlBinaryOp::DistinctFrom
        ),
        SqlExpr::Unary {
            op: SqlUnaryOp::Not,
            ..
        }
        | SqlExpr::IsNull { .. } => true,
        _ => false,
    }
}
