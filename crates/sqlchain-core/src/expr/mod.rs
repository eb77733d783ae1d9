//! Expression templates.
//!
//! A template is the immutable syntax tree of one operator chain. Nodes are
//! shared through `Arc` so a chain builder can extend a template without
//! copying it, and so identical subtrees short-circuit during matching.
//!
//! The node-kind set is closed: `ExprNode` is the only representation, and
//! every pass over it (matching, child enumeration, conversion) matches on
//! it exhaustively.

mod build;
pub mod matcher;
mod path;

use crate::value::Value;
use std::{
    any::{TypeId, type_name},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

// re-exports
pub use build::ExprExt;
pub use matcher::{expr_matches, matches};
pub use path::ExprPath;

/// Shared handle to one template node.
pub type ExprRef = Arc<Expr>;

///
/// TypeRef
/// Static type identity of a node, member, or constructor.
///

#[derive(Clone, Copy)]
pub struct TypeRef {
    id: TypeId,
    name: &'static str,
}

impl TypeRef {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is<T: ?Sized + 'static>(self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Literal classification used by template matching.
    ///
    /// Only `i32` and `String` literals take part in equality; every other
    /// literal type is opaque and matches regardless of value.
    #[must_use]
    pub fn is_parameter_worthy(self) -> bool {
        self.is::<i32>() || self.is::<String>()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

///
/// MemberRef
/// Identity of a field or property on a declaring type.
///

#[derive(Clone, Copy, Debug)]
pub struct MemberRef {
    pub declaring: TypeRef,
    pub name: &'static str,
    pub ty: TypeRef,
}

impl MemberRef {
    #[must_use]
    pub fn of<D: ?Sized + 'static, T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            declaring: TypeRef::of::<D>(),
            name,
            ty: TypeRef::of::<T>(),
        }
    }
}

impl PartialEq for MemberRef {
    fn eq(&self, other: &Self) -> bool {
        self.declaring == other.declaring && self.name == other.name
    }
}

impl Eq for MemberRef {}

///
/// MethodRef
/// Identity of a callable: operator overload, instance or static method.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MethodRef {
    pub declaring: TypeRef,
    pub name: &'static str,
}

impl MethodRef {
    #[must_use]
    pub fn of<D: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            declaring: TypeRef::of::<D>(),
            name,
        }
    }
}

///
/// ConstructorRef
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConstructorRef {
    pub ty: TypeRef,
    pub arity: usize,
}

impl ConstructorRef {
    #[must_use]
    pub fn of<T: ?Sized + 'static>(arity: usize) -> Self {
        Self {
            ty: TypeRef::of::<T>(),
            arity,
        }
    }
}

///
/// Param
/// Lambda parameter declaration.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

///
/// BinaryOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    And,
    Or,
    ExclusiveOr,
    AndAlso,
    OrElse,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Coalesce,
    ArrayIndex,
    LeftShift,
    RightShift,
}

impl BinaryOp {
    /// True for operators whose result is always `bool`.
    #[must_use]
    pub const fn is_predicate(self) -> bool {
        matches!(
            self,
            Self::AndAlso
                | Self::OrElse
                | Self::Equal
                | Self::NotEqual
                | Self::LessThan
                | Self::LessThanOrEqual
                | Self::GreaterThan
                | Self::GreaterThanOrEqual
        )
    }
}

///
/// UnaryOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnaryOp {
    Negate,
    Not,
    Convert,
    Quote,
    TypeAs,
    UnaryPlus,
    ArrayLength,
}

///
/// ArrayKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ArrayKind {
    /// `new T[] { a, b }`
    Init,
    /// `new T[n]`
    Bounds,
}

///
/// ExprKind
/// Node kind including the operator, compared before any structural descent.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ExprKind {
    Binary(BinaryOp),
    Unary(UnaryOp),
    Call,
    Invoke,
    Conditional,
    Constant,
    Member,
    New,
    MemberInit,
    ListInit,
    NewArray(ArrayKind),
    Lambda,
    Parameter,
    TypeIs,
}

///
/// NewExpr
/// Constructor invocation; `members` is populated for anonymous shapes.
///

#[derive(Clone, Debug)]
pub struct NewExpr {
    pub constructor: ConstructorRef,
    pub args: Vec<ExprRef>,
    pub members: Vec<MemberRef>,
}

///
/// ElementInit
/// One `Add(..)` call of a collection initializer.
///

#[derive(Clone, Debug)]
pub struct ElementInit {
    pub add_method: MethodRef,
    pub args: Vec<ExprRef>,
}

///
/// BindingKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BindingKind {
    Assignment,
    MemberBinding,
    ListBinding,
}

///
/// MemberBinding
/// One member initializer inside an object-with-bindings construction.
///

#[derive(Clone, Debug)]
pub enum MemberBinding {
    Assignment {
        member: MemberRef,
        value: ExprRef,
    },
    Member {
        member: MemberRef,
        bindings: Vec<Self>,
    },
    List {
        member: MemberRef,
        initializers: Vec<ElementInit>,
    },
}

impl MemberBinding {
    #[must_use]
    pub const fn kind(&self) -> BindingKind {
        match self {
            Self::Assignment { .. } => BindingKind::Assignment,
            Self::Member { .. } => BindingKind::MemberBinding,
            Self::List { .. } => BindingKind::ListBinding,
        }
    }

    #[must_use]
    pub const fn member(&self) -> &MemberRef {
        match self {
            Self::Assignment { member, .. }
            | Self::Member { member, .. }
            | Self::List { member, .. } => member,
        }
    }
}

///
/// ExprNode
///

#[derive(Clone, Debug)]
pub enum ExprNode {
    Binary {
        op: BinaryOp,
        method: Option<MethodRef>,
        left: ExprRef,
        right: ExprRef,
        conversion: Option<ExprRef>,
    },
    Unary {
        op: UnaryOp,
        method: Option<MethodRef>,
        operand: ExprRef,
    },
    Call {
        method: MethodRef,
        object: Option<ExprRef>,
        args: Vec<ExprRef>,
    },
    Invoke {
        target: ExprRef,
        args: Vec<ExprRef>,
    },
    Conditional {
        test: ExprRef,
        if_true: ExprRef,
        if_false: ExprRef,
    },
    Constant(Value),
    Member {
        member: MemberRef,
        object: Option<ExprRef>,
    },
    New(NewExpr),
    MemberInit {
        new: NewExpr,
        bindings: Vec<MemberBinding>,
    },
    ListInit {
        new: NewExpr,
        initializers: Vec<ElementInit>,
    },
    NewArray {
        kind: ArrayKind,
        elements: Vec<ExprRef>,
    },
    Lambda {
        params: Vec<Param>,
        body: ExprRef,
    },
    Parameter {
        name: String,
    },
    TypeIs {
        operand: ExprRef,
        type_operand: TypeRef,
    },
}

///
/// Expr
/// One typed template node.
///

#[derive(Clone, Debug)]
pub struct Expr {
    ty: TypeRef,
    node: ExprNode,
}

impl Expr {
    #[must_use]
    pub const fn new(ty: TypeRef, node: ExprNode) -> Self {
        Self { ty, node }
    }

    /// Static result type of this node.
    #[must_use]
    pub const fn ty(&self) -> TypeRef {
        self.ty
    }

    #[must_use]
    pub const fn node(&self) -> &ExprNode {
        &self.node
    }

    #[must_use]
    pub const fn kind(&self) -> ExprKind {
        match &self.node {
            ExprNode::Binary { op, .. } => ExprKind::Binary(*op),
            ExprNode::Unary { op, .. } => ExprKind::Unary(*op),
            ExprNode::Call { .. } => ExprKind::Call,
            ExprNode::Invoke { .. } => ExprKind::Invoke,
            ExprNode::Conditional { .. } => ExprKind::Conditional,
            ExprNode::Constant(_) => ExprKind::Constant,
            ExprNode::Member { .. } => ExprKind::Member,
            ExprNode::New(_) => ExprKind::New,
            ExprNode::MemberInit { .. } => ExprKind::MemberInit,
            ExprNode::ListInit { .. } => ExprKind::ListInit,
            ExprNode::NewArray { kind, .. } => ExprKind::NewArray(*kind),
            ExprNode::Lambda { .. } => ExprKind::Lambda,
            ExprNode::Parameter { .. } => ExprKind::Parameter,
            ExprNode::TypeIs { .. } => ExprKind::TypeIs,
        }
    }

    /// Strip any number of enclosing `Quote` nodes.
    #[must_use]
    pub fn unwrap_quotes(&self) -> &Self {
        let mut current = self;
        while let ExprNode::Unary {
            op: UnaryOp::Quote,
            operand,
            ..
        } = &current.node
        {
            current = &**operand;
        }

        current
    }

    /// View this node as a lambda, looking through quotes.
    #[must_use]
    pub fn as_lambda(&self) -> Option<(&[Param], &ExprRef)> {
        match &self.unwrap_quotes().node {
            ExprNode::Lambda { params, body } => Some((params, body)),
            _ => None,
        }
    }

    /// Literal value carried by a constant node.
    #[must_use]
    pub const fn as_constant(&self) -> Option<&Value> {
        match &self.node {
            ExprNode::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Direct children in a fixed order.
    ///
    /// Two templates that match have child lists of equal length whose
    /// positions correspond, which is what `ExprPath` relies on.
    #[must_use]
    pub fn children(&self) -> Vec<&ExprRef> {
        let mut out = Vec::new();

        match &self.node {
            ExprNode::Binary {
                left,
                right,
                conversion,
                ..
            } => {
                out.push(left);
                out.push(right);
                out.extend(conversion);
            }
            ExprNode::Unary { operand, .. } => out.push(operand),
            ExprNode::Call { object, args, .. } => {
                out.extend(object);
                out.extend(args);
            }
            ExprNode::Invoke { target, args } => {
                out.push(target);
                out.extend(args);
            }
            ExprNode::Conditional {
                test,
                if_true,
                if_false,
            } => {
                out.push(test);
                out.push(if_true);
                out.push(if_false);
            }
            ExprNode::Constant(_) | ExprNode::Parameter { .. } => {}
            ExprNode::Member { object, .. } => out.extend(object),
            ExprNode::New(new) => out.extend(&new.args),
            ExprNode::MemberInit { new, bindings } => {
                out.extend(&new.args);
                for binding in bindings {
                    push_binding_children(binding, &mut out);
                }
            }
            ExprNode::ListInit { new, initializers } => {
                out.extend(&new.args);
                for init in initializers {
                    out.extend(&init.args);
                }
            }
            ExprNode::NewArray { elements, .. } => out.extend(elements),
            ExprNode::Lambda { body, .. } => out.push(body),
            ExprNode::TypeIs { operand, .. } => out.push(operand),
        }

        out
    }
}

fn push_binding_children<'a>(binding: &'a MemberBinding, out: &mut Vec<&'a ExprRef>) {
    match binding {
        MemberBinding::Assignment { value, .. } => out.push(value),
        MemberBinding::Member { bindings, .. } => {
            for nested in bindings {
                push_binding_children(nested, out);
            }
        }
        MemberBinding::List { initializers, .. } => {
            for init in initializers {
                out.extend(&init.args);
            }
        }
    }
}

#[cfg(test)]
mod tests;
