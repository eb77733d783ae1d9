use crate::{
    expr::{
        ArrayKind, BinaryOp, ConstructorRef, ElementInit, Expr, ExprNode, ExprRef, MemberBinding,
        MemberRef, MethodRef, NewExpr, Param, TypeRef, UnaryOp,
    },
    value::{ClosureEnv, Value},
};
use std::sync::Arc;

///
/// Constructors
///
/// Every constructor returns a shared `ExprRef`; the result type is either
/// explicit or derived from the operands the way the source language does.
///

impl Expr {
    #[must_use]
    pub fn constant(value: Value, ty: TypeRef) -> ExprRef {
        Arc::new(Self::new(ty, ExprNode::Constant(value)))
    }

    #[must_use]
    pub fn int(value: i32) -> ExprRef {
        Self::constant(Value::Int(value), TypeRef::of::<i32>())
    }

    #[must_use]
    pub fn long(value: i64) -> ExprRef {
        Self::constant(Value::Long(value), TypeRef::of::<i64>())
    }

    #[must_use]
    pub fn float(value: f64) -> ExprRef {
        Self::constant(Value::Float(value), TypeRef::of::<f64>())
    }

    #[must_use]
    pub fn bool(value: bool) -> ExprRef {
        Self::constant(Value::Bool(value), TypeRef::of::<bool>())
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> ExprRef {
        Self::constant(Value::Text(value.into()), TypeRef::of::<String>())
    }

    /// Typed `null` literal.
    #[must_use]
    pub fn null(ty: TypeRef) -> ExprRef {
        Self::constant(Value::Null, ty)
    }

    /// Literal holding a captured-variable environment.
    #[must_use]
    pub fn closure(env: &Arc<ClosureEnv>) -> ExprRef {
        Self::constant(Value::Closure(Arc::clone(env)), TypeRef::of::<ClosureEnv>())
    }

    /// Read of one captured variable: member access on a closure literal.
    #[must_use]
    pub fn captured(env: &Arc<ClosureEnv>, name: &'static str, ty: TypeRef) -> ExprRef {
        let member = MemberRef {
            declaring: TypeRef::of::<ClosureEnv>(),
            name,
            ty,
        };

        Self::member(Some(Self::closure(env)), member)
    }

    #[must_use]
    pub fn param(name: impl Into<String>, ty: TypeRef) -> ExprRef {
        Arc::new(Self::new(ty, ExprNode::Parameter { name: name.into() }))
    }

    /// Lambda typed by its body.
    #[must_use]
    pub fn lambda(params: Vec<Param>, body: ExprRef) -> ExprRef {
        Arc::new(Self::new(body.ty(), ExprNode::Lambda { params, body }))
    }

    /// Build a one-parameter lambda from a closure over the parameter reference.
    #[must_use]
    pub fn lambda1(name: &str, ty: TypeRef, body: impl FnOnce(ExprRef) -> ExprRef) -> ExprRef {
        let param = Param::new(name, ty);
        let body = body(Self::param(name, ty));

        Self::lambda(vec![param], body)
    }

    /// Member access; `object` is `None` for static members.
    #[must_use]
    pub fn member(object: Option<ExprRef>, member: MemberRef) -> ExprRef {
        Arc::new(Self::new(member.ty, ExprNode::Member { member, object }))
    }

    /// Binary operation typed `bool` for predicates and by the left operand otherwise.
    #[must_use]
    pub fn binary(op: BinaryOp, left: ExprRef, right: ExprRef) -> ExprRef {
        let ty = if op.is_predicate() {
            TypeRef::of::<bool>()
        } else {
            left.ty()
        };

        Self::binary_with(op, ty, None, left, right, None)
    }

    #[must_use]
    pub fn binary_with(
        op: BinaryOp,
        ty: TypeRef,
        method: Option<MethodRef>,
        left: ExprRef,
        right: ExprRef,
        conversion: Option<ExprRef>,
    ) -> ExprRef {
        Arc::new(Self::new(
            ty,
            ExprNode::Binary {
                op,
                method,
                left,
                right,
                conversion,
            },
        ))
    }

    #[must_use]
    pub fn unary(op: UnaryOp, ty: TypeRef, operand: ExprRef) -> ExprRef {
        Arc::new(Self::new(
            ty,
            ExprNode::Unary {
                op,
                method: None,
                operand,
            },
        ))
    }

    #[must_use]
    pub fn not(operand: ExprRef) -> ExprRef {
        let ty = operand.ty();
        Self::unary(UnaryOp::Not, ty, operand)
    }

    #[must_use]
    pub fn negate(operand: ExprRef) -> ExprRef {
        let ty = operand.ty();
        Self::unary(UnaryOp::Negate, ty, operand)
    }

    #[must_use]
    pub fn convert(operand: ExprRef, ty: TypeRef) -> ExprRef {
        Self::unary(UnaryOp::Convert, ty, operand)
    }

    /// Quote a lambda so it is carried as data rather than compiled code.
    #[must_use]
    pub fn quote(lambda: ExprRef) -> ExprRef {
        let ty = lambda.ty();
        Self::unary(UnaryOp::Quote, ty, lambda)
    }

    #[must_use]
    pub fn call(
        method: MethodRef,
        ty: TypeRef,
        object: Option<ExprRef>,
        args: Vec<ExprRef>,
    ) -> ExprRef {
        Arc::new(Self::new(
            ty,
            ExprNode::Call {
                method,
                object,
                args,
            },
        ))
    }

    #[must_use]
    pub fn invoke(ty: TypeRef, target: ExprRef, args: Vec<ExprRef>) -> ExprRef {
        Arc::new(Self::new(ty, ExprNode::Invoke { target, args }))
    }

    #[must_use]
    pub fn conditional(test: ExprRef, if_true: ExprRef, if_false: ExprRef) -> ExprRef {
        let ty = if_true.ty();

        Arc::new(Self::new(
            ty,
            ExprNode::Conditional {
                test,
                if_true,
                if_false,
            },
        ))
    }

    /// Constructor call; pass `members` for anonymous shapes, empty otherwise.
    #[must_use]
    pub fn new_object(
        constructor: ConstructorRef,
        args: Vec<ExprRef>,
        members: Vec<MemberRef>,
    ) -> ExprRef {
        Arc::new(Self::new(
            constructor.ty,
            ExprNode::New(NewExpr {
                constructor,
                args,
                members,
            }),
        ))
    }

    /// Anonymous shape `new { a = .., b = .. }` with one member per argument.
    #[must_use]
    pub fn anonymous<T: 'static>(members: Vec<(MemberRef, ExprRef)>) -> ExprRef {
        let (members, args): (Vec<_>, Vec<_>) = members.into_iter().unzip();
        let constructor = ConstructorRef::of::<T>(args.len());

        Self::new_object(constructor, args, members)
    }

    #[must_use]
    pub fn member_init(
        constructor: ConstructorRef,
        args: Vec<ExprRef>,
        bindings: Vec<MemberBinding>,
    ) -> ExprRef {
        let new = NewExpr {
            constructor,
            args,
            members: Vec::new(),
        };

        Arc::new(Self::new(
            constructor.ty,
            ExprNode::MemberInit { new, bindings },
        ))
    }

    #[must_use]
    pub fn list_init(constructor: ConstructorRef, initializers: Vec<ElementInit>) -> ExprRef {
        let new = NewExpr {
            constructor,
            args: Vec::new(),
            members: Vec::new(),
        };

        Arc::new(Self::new(
            constructor.ty,
            ExprNode::ListInit { new, initializers },
        ))
    }

    #[must_use]
    pub fn new_array(kind: ArrayKind, ty: TypeRef, elements: Vec<ExprRef>) -> ExprRef {
        Arc::new(Self::new(ty, ExprNode::NewArray { kind, elements }))
    }

    #[must_use]
    pub fn type_is(operand: ExprRef, type_operand: TypeRef) -> ExprRef {
        Arc::new(Self::new(
            TypeRef::of::<bool>(),
            ExprNode::TypeIs {
                operand,
                type_operand,
            },
        ))
    }
}

///
/// ExprExt
/// Fluent helpers for writing lambda bodies.
///

pub trait ExprExt {
    #[must_use]
    fn field(&self, member: MemberRef) -> ExprRef;

    #[must_use]
    fn equal(&self, rhs: ExprRef) -> ExprRef;

    #[must_use]
    fn not_equal(&self, rhs: ExprRef) -> ExprRef;

    #[must_use]
    fn less_than(&self, rhs: ExprRef) -> ExprRef;

    #[must_use]
    fn less_or_equal(&self, rhs: ExprRef) -> ExprRef;

    #[must_use]
    fn greater_than(&self, rhs: ExprRef) -> ExprRef;

    #[must_use]
    fn greater_or_equal(&self, rhs: ExprRef) -> ExprRef;

    #[must_use]
    fn and_also(&self, rhs: ExprRef) -> ExprRef;

    #[must_use]
    fn or_else(&self, rhs: ExprRef) -> ExprRef;

    #[must_use]
    fn plus(&self, rhs: ExprRef) -> ExprRef;

    #[must_use]
    fn minus(&self, rhs: ExprRef) -> ExprRef;

    #[must_use]
    fn times(&self, rhs: ExprRef) -> ExprRef;

    #[must_use]
    fn coalesce(&self, rhs: ExprRef) -> ExprRef;
}

impl ExprExt for ExprRef {
    fn field(&self, member: MemberRef) -> ExprRef {
        Expr::member(Some(Arc::clone(self)), member)
    }

    fn equal(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::Equal, Arc::clone(self), rhs)
    }

    fn not_equal(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::NotEqual, Arc::clone(self), rhs)
    }

    fn less_than(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::LessThan, Arc::clone(self), rhs)
    }

    fn less_or_equal(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::LessThanOrEqual, Arc::clone(self), rhs)
    }

    fn greater_than(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::GreaterThan, Arc::clone(self), rhs)
    }

    fn greater_or_equal(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::GreaterThanOrEqual, Arc::clone(self), rhs)
    }

    fn and_also(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::AndAlso, Arc::clone(self), rhs)
    }

    fn or_else(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::OrElse, Arc::clone(self), rhs)
    }

    fn plus(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::Add, Arc::clone(self), rhs)
    }

    fn minus(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::Subtract, Arc::clone(self), rhs)
    }

    fn times(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::Multiply, Arc::clone(self), rhs)
    }

    fn coalesce(&self, rhs: ExprRef) -> ExprRef {
        Expr::binary(BinaryOp::Coalesce, Arc::clone(self), rhs)
    }
}
