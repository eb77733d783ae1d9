//! Operator-parsing pipeline.
//!
//! A chain is parsed outside-in: the outermost call is dispatched to the
//! first registered parser that accepts it, and that parser resolves its
//! upstream link through the same dispatch before extending the context.
//! Contexts are therefore built innermost-first.

mod convert;
mod filter;
mod order;
mod page;
mod select;
mod source;

#[cfg(test)]
mod tests;

use crate::{
    chain::Operator,
    expr::{Expr, ExprKind, ExprNode, ExprPath, ExprRef},
    model::MappingSchema,
    sql::{QueryContext, SqlQuery},
};
use std::ptr;
use thiserror::Error as ThisError;

// re-exports
pub use filter::WhereParser;
pub use order::{OrderByParser, SortKind};
pub use page::TakeSkipParser;
pub use select::SelectParser;
pub use source::TableParser;

///
/// ParseError
///

#[derive(Debug, ThisError)]
pub enum ParseError {
    #[error("explicit construction of entity type '{ty}' in {operator} is not allowed")]
    UnsupportedConstruction {
        ty: &'static str,
        operator: &'static str,
    },

    #[error("no parser accepts {link}")]
    UnsupportedOperator { link: String },

    #[error("expression kind {kind:?} is not supported in {context}")]
    UnsupportedExpression {
        kind: ExprKind,
        context: &'static str,
    },

    #[error("member '{member}' is not mapped on the current element")]
    UnknownMember { member: String },

    #[error("parameter '{name}' is not bound by the enclosing lambda")]
    UnboundParameter { name: String },

    #[error("table source for '{path}' cannot be resolved")]
    UnmappedSource { path: &'static str },

    #[error("chain link of type {ty} is not part of the template being parsed")]
    DetachedLink { ty: &'static str },
}

///
/// OperatorParser
///
/// One chain operator. `can_parse` must be cheap and side-effect free;
/// `parse` resolves the upstream link through `parser` and extends it.
///

pub trait OperatorParser: Send + Sync {
    /// Stable name for diagnostics.
    fn name(&self) -> &'static str;

    fn can_parse(&self, link: &Expr) -> bool;

    fn parse(&self, parser: &ExpressionParser<'_>, link: &Expr)
    -> Result<QueryContext, ParseError>;
}

///
/// ParserRegistry
/// Priority-ordered parser table; the first parser that accepts a link wins.
///

pub struct ParserRegistry {
    parsers: Vec<Box<dyn OperatorParser>>,
}

impl ParserRegistry {
    /// Registry with no parsers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Append a parser at the lowest priority.
    #[must_use]
    pub fn with(mut self, parser: impl OperatorParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    /// First parser that accepts `link`.
    #[must_use]
    pub fn find(&self, link: &Expr) -> Option<&dyn OperatorParser> {
        self.parsers
            .iter()
            .map(|parser| &**parser)
            .find(|parser| parser.can_parse(link))
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|parser| parser.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::empty()
            .with(TableParser)
            .with(WhereParser)
            .with(SelectParser)
            .with(OrderByParser)
            .with(TakeSkipParser)
    }
}

///
/// ExpressionParser
///
/// Parse state for one template: the registry to dispatch through, the
/// schema that names tables, and the template root that parameter paths
/// are recorded against.
///

pub struct ExpressionParser<'a> {
    registry: &'a ParserRegistry,
    schema: &'a MappingSchema,
    root: &'a Expr,
}

impl<'a> ExpressionParser<'a> {
    #[must_use]
    pub const fn new(
        registry: &'a ParserRegistry,
        schema: &'a MappingSchema,
        root: &'a Expr,
    ) -> Self {
        Self {
            registry,
            schema,
            root,
        }
    }

    #[must_use]
    pub const fn schema(&self) -> &'a MappingSchema {
        self.schema
    }

    #[must_use]
    pub const fn root(&self) -> &'a Expr {
        self.root
    }

    /// Path from the root to argument `index` of an operator call `link`,
    /// counting the arguments that follow the source.
    ///
    /// Links nest through their first child (the upstream source), so the
    /// link is found by walking that spine; arguments follow the source.
    pub fn arg_path(&self, link: &Expr, index: usize) -> Result<ExprPath, ParseError> {
        let mut path = ExprPath::default();
        let mut current = self.root;

        while !ptr::eq(current, link) {
            let Some(source) = current.children().first().copied() else {
                return Err(ParseError::DetachedLink {
                    ty: link.ty().name(),
                });
            };
            current = &**source;
            path.push(0);
        }

        Ok(path.child(index + 1))
    }

    /// Parse one chain link and everything upstream of it.
    pub fn parse_sequence(&self, link: &Expr) -> Result<QueryContext, ParseError> {
        let Some(parser) = self.registry.find(link) else {
            return Err(ParseError::UnsupportedOperator {
                link: describe_link(link),
            });
        };

        tracing::trace!(parser = parser.name(), link = %describe_link(link), "dispatch");

        parser.parse(self, link)
    }

    /// Parse the whole template into a finished query.
    pub fn compile(&self) -> Result<SqlQuery, ParseError> {
        self.parse_sequence(self.root).map(QueryContext::finish)
    }
}

///
/// OperatorCall
/// A chain operator call split into its upstream link and remaining arguments.
///

pub(crate) struct OperatorCall<'a> {
    pub operator: Operator,
    pub source: &'a ExprRef,
    pub args: &'a [ExprRef],
}

impl<'a> OperatorCall<'a> {
    /// View `link` as a chain operator call taking exactly `arity` extra arguments.
    pub fn of(link: &'a Expr, arity: usize) -> Option<Self> {
        let ExprNode::Call {
            method,
            object: None,
            args,
        } = link.node()
        else {
            return None;
        };

        let operator = Operator::from_method(method)?;
        let (source, rest) = args.split_first()?;

        (rest.len() == arity).then_some(Self {
            operator,
            source,
            args: rest,
        })
    }
}

fn describe_link(link: &Expr) -> String {
    match link.node() {
        ExprNode::Call { method, .. } => format!("call to {}", method.name),
        _ => format!("{:?} of type {}", link.kind(), link.ty()),
    }
}
