use crate::{
    error::InternalError,
    expr::{Expr, ExprPath, TypeRef},
    sql::{QueryScope, ScopeId, SelectColumn, SqlExpr, TableSource},
    value::Value,
};

/// Alias of the single column a scalar-shaped query produces.
pub const SCALAR_COLUMN: &str = "value";

///
/// ElementShape
///
/// How member access on the current element resolves to SQL. Entities and
/// projections expose named members; scalar results expose a single value.
///

#[derive(Clone, Debug, PartialEq)]
pub enum ElementShape {
    Members(Vec<(String, SqlExpr)>),
    Scalar(SqlExpr),
}

impl ElementShape {
    /// Resolve a member of the current element.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&SqlExpr> {
        match self {
            Self::Members(members) => members
                .iter()
                .find(|(member, _)| member == name)
                .map(|(_, expr)| expr),
            Self::Scalar(_) => None,
        }
    }

    /// Output columns when this shape is selected.
    #[must_use]
    pub fn to_columns(&self) -> Vec<SelectColumn> {
        match self {
            Self::Members(members) => members
                .iter()
                .map(|(name, expr)| SelectColumn {
                    expr: expr.clone(),
                    alias: name.clone(),
                })
                .collect(),
            Self::Scalar(expr) => vec![SelectColumn {
                expr: expr.clone(),
                alias: SCALAR_COLUMN.to_string(),
            }],
        }
    }

    // Same members, now read from a nested scope's output.
    fn project_through(&self, scope: ScopeId) -> Self {
        match self {
            Self::Members(members) => Self::Members(
                members
                    .iter()
                    .map(|(name, _)| (name.clone(), SqlExpr::column(scope, name.as_str())))
                    .collect(),
            ),
            Self::Scalar(_) => Self::Scalar(SqlExpr::column(scope, SCALAR_COLUMN)),
        }
    }
}

///
/// ParamSource
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamSource {
    /// The slot path names an opaque literal; bind its value.
    Literal,
    /// The slot path names a closure literal; bind the named capture.
    Captured(&'static str),
}

///
/// ParamSlot
///
/// One bound parameter. Values are never stored here: they are re-read from
/// the caller's template at execution time, so one plan serves every
/// matching template.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamSlot {
    pub path: ExprPath,
    pub source: ParamSource,
}

impl ParamSlot {
    /// Read this slot's value from a template that matches the plan's.
    pub fn bind(&self, template: &Expr) -> Result<Value, InternalError> {
        let node = self.path.resolve(template).ok_or_else(|| {
            InternalError::executor_invariant(format!(
                "parameter path {} does not resolve in template",
                self.path
            ))
        })?;

        let literal = node.as_constant().ok_or_else(|| {
            InternalError::executor_invariant(format!(
                "parameter path {} resolves to {:?}, expected a literal",
                self.path,
                node.kind()
            ))
        })?;

        let value = match (self.source, literal) {
            (ParamSource::Literal, value) => value.clone(),
            (ParamSource::Captured(name), Value::Closure(env)) => {
                env.get(name).cloned().ok_or_else(|| {
                    InternalError::executor_invariant(format!(
                        "captured variable '{name}' missing at {}",
                        self.path
                    ))
                })?
            }
            (ParamSource::Captured(name), other) => {
                return Err(InternalError::executor_invariant(format!(
                    "captured variable '{name}' expected a closure at {}, found {}",
                    self.path,
                    other.label()
                )));
            }
        };

        if !value.is_scalar() {
            return Err(InternalError::executor_unsupported(format!(
                "{} value at {} cannot be bound as a parameter",
                value.label(),
                self.path
            )));
        }

        Ok(value)
    }
}

///
/// QueryContext
///
/// Composable SQL-building state threaded through the operator parsers.
/// Scopes live in an arena; `current` is the outermost one. Wrapping only
/// ever appends, so a parent index is always lower than its child's.
///

#[derive(Clone, Debug)]
pub struct QueryContext {
    scopes: Vec<QueryScope>,
    current: ScopeId,
    shape: ElementShape,
    element: TypeRef,
    params: Vec<ParamSlot>,
}

impl QueryContext {
    /// Start with one root scope reading `source`; members map to its columns.
    #[must_use]
    pub fn new(source: TableSource, element: TypeRef) -> Self {
        let root = ScopeId(0);
        let shape = ElementShape::Members(
            source
                .model
                .fields
                .iter()
                .map(|field| {
                    (
                        field.name.to_string(),
                        SqlExpr::column(root, field.column),
                    )
                })
                .collect(),
        );

        Self {
            scopes: vec![QueryScope {
                source: Some(source),
                ..QueryScope::default()
            }],
            current: root,
            shape,
            element,
            params: Vec::new(),
        }
    }

    #[must_use]
    pub const fn current_id(&self) -> ScopeId {
        self.current
    }

    #[must_use]
    pub fn current(&self) -> &QueryScope {
        &self.scopes[self.current.0]
    }

    pub fn current_mut(&mut self) -> &mut QueryScope {
        &mut self.scopes[self.current.0]
    }

    #[must_use]
    pub fn scopes(&self) -> &[QueryScope] {
        &self.scopes
    }

    #[must_use]
    pub const fn shape(&self) -> &ElementShape {
        &self.shape
    }

    #[must_use]
    pub const fn element(&self) -> TypeRef {
        self.element
    }

    /// Replace the element shape, as a projection does.
    pub fn set_shape(&mut self, shape: ElementShape, element: TypeRef) {
        self.shape = shape;
        self.element = element;
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSlot] {
        &self.params
    }

    /// Register a bound parameter and return its SQL reference.
    pub fn add_param(&mut self, slot: ParamSlot) -> SqlExpr {
        self.params.push(slot);

        SqlExpr::Parameter(self.params.len() - 1)
    }

    /// Close the current scope as a subquery and continue in a fresh scope
    /// that reads from it.
    pub fn wrap_subquery(&mut self) {
        let inner = self.current;
        self.scopes[inner.0].columns = self.shape.to_columns();

        let outer = ScopeId(self.scopes.len());
        self.scopes.push(QueryScope {
            parent: Some(inner),
            ..QueryScope::default()
        });

        self.shape = self.shape.project_through(inner);
        self.current = outer;
    }

    /// Select the element shape from the current scope and seal the query.
    #[must_use]
    pub fn finish(mut self) -> SqlQuery {
        let columns = self.shape.to_columns();
        self.current_mut().columns = columns;

        SqlQuery {
            scopes: self.scopes,
            root: self.current,
            params: self.params,
            element: self.element,
        }
    }
}

///
/// SqlQuery
/// Finished query: the scope arena, its outermost scope, and parameter slots.
///

#[derive(Clone, Debug)]
pub struct SqlQuery {
    scopes: Vec<QueryScope>,
    root: ScopeId,
    params: Vec<ParamSlot>,
    element: TypeRef,
}

impl SqlQuery {
    #[must_use]
    pub const fn root_id(&self) -> ScopeId {
        self.root
    }

    #[must_use]
    pub fn root(&self) -> &QueryScope {
        &self.scopes[self.root.0]
    }

    #[must_use]
    pub fn scope(&self, id: ScopeId) -> Option<&QueryScope> {
        self.scopes.get(id.0)
    }

    #[must_use]
    pub fn scopes(&self) -> &[QueryScope] {
        &self.scopes
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSlot] {
        &self.params
    }

    #[must_use]
    pub const fn element(&self) -> TypeRef {
        self.element
    }

    /// Output column aliases, in select order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.root()
            .columns
            .iter()
            .map(|column| column.alias.as_str())
            .collect()
    }

    /// Number of nested scopes below the outermost one.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.root();
        while let Some(parent) = scope.parent.and_then(|id| self.scope(id)) {
            depth += 1;
            scope = parent;
        }

        depth
    }
}
