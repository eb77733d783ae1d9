//! Sort operators: `OrderBy`, `OrderByDescending`, `ThenBy`,
//! `ThenByDescending`.
//!
//! A primary sort replaces any ordering already on the current scope; a
//! "then" sort appends to it. Sorting a paged scope first closes that scope
//! as a subquery so the page keeps its rows.

use crate::{
    chain::Operator,
    expr::{BindingKind, Expr, ExprNode, ExprPath},
    parse::{
        ExpressionParser, OperatorCall, OperatorParser, ParseError,
        convert::{self, ConvertMode},
    },
    sql::{OrderItem, QueryContext},
};

///
/// SortKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortKind {
    OrderBy,
    OrderByDescending,
    ThenBy,
    ThenByDescending,
}

impl SortKind {
    #[must_use]
    pub const fn from_operator(operator: Operator) -> Option<Self> {
        match operator {
            Operator::OrderBy => Some(Self::OrderBy),
            Operator::OrderByDescending => Some(Self::OrderByDescending),
            Operator::ThenBy => Some(Self::ThenBy),
            Operator::ThenByDescending => Some(Self::ThenByDescending),
            Operator::Where | Operator::Select | Operator::Take | Operator::Skip => None,
        }
    }

    #[must_use]
    pub const fn operator(self) -> Operator {
        match self {
            Self::OrderBy => Operator::OrderBy,
            Self::OrderByDescending => Operator::OrderByDescending,
            Self::ThenBy => Operator::ThenBy,
            Self::ThenByDescending => Operator::ThenByDescending,
        }
    }

    /// "Then" sorts extend the existing ordering instead of replacing it.
    #[must_use]
    pub fn is_then(self) -> bool {
        self.operator().method_name().starts_with("Then")
    }

    #[must_use]
    pub fn is_descending(self) -> bool {
        self.operator().method_name().ends_with("Descending")
    }
}

///
/// OrderByParser
///

pub struct OrderByParser;

impl OperatorParser for OrderByParser {
    fn name(&self) -> &'static str {
        "order_by"
    }

    fn can_parse(&self, link: &Expr) -> bool {
        OperatorCall::of(link, 1)
            .and_then(|call| SortKind::from_operator(call.operator))
            .is_some()
    }

    fn parse(
        &self,
        parser: &ExpressionParser<'_>,
        link: &Expr,
    ) -> Result<QueryContext, ParseError> {
        let Some((call, kind)) = OperatorCall::of(link, 1)
            .and_then(|call| SortKind::from_operator(call.operator).map(|kind| (call, kind)))
        else {
            return Err(ParseError::UnsupportedOperator {
                link: format!("{:?}", link.kind()),
            });
        };

        let selector = call.args[0].unwrap_quotes();

        // Reject disallowed key shapes before doing any upstream work.
        validate_key_selector(selector, kind)?;

        let mut ctx = parser.parse_sequence(call.source)?;
        apply_order(&mut ctx, kind, &call.args[0], parser.arg_path(link, 0)?)?;

        Ok(ctx)
    }
}

/// Reject a member-init key selector that constructs an entity explicitly:
/// one whose constructor takes arguments, that binds no members, or that
/// binds anything other than plain assignments.
pub(crate) fn validate_key_selector(selector: &Expr, kind: SortKind) -> Result<(), ParseError> {
    let Some((_, body)) = selector.as_lambda() else {
        return Ok(());
    };

    if let ExprNode::MemberInit { new, bindings } = body.node() {
        let explicit = !new.args.is_empty()
            || bindings.is_empty()
            || bindings
                .iter()
                .any(|binding| binding.kind() != BindingKind::Assignment);

        if explicit {
            return Err(ParseError::UnsupportedConstruction {
                ty: body.ty().name(),
                operator: kind.operator().method_name(),
            });
        }
    }

    Ok(())
}

/// Extend `ctx` with the ordering described by `selector`.
pub(crate) fn apply_order(
    ctx: &mut QueryContext,
    kind: SortKind,
    selector: &Expr,
    path: ExprPath,
) -> Result<(), ParseError> {
    if ctx.current().is_paged() {
        ctx.wrap_subquery();
    }

    let terms = convert::convert_lambda(ctx, selector, path, ConvertMode::Key, "order by")?;

    let descending = kind.is_descending();
    let scope = ctx.current_mut();
    if !kind.is_then() {
        scope.order_by.clear();
    }
    scope
        .order_by
        .extend(terms.into_iter().map(|term| OrderItem {
            expr: term.into_value(),
            descending,
        }));

    tracing::trace!(
        operator = %kind.operator(),
        items = scope.order_by.len(),
        "ordering applied"
    );

    Ok(())
}
