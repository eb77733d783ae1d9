use crate::{
    chain::Operator,
    expr::Expr,
    parse::{ExpressionParser, OperatorCall, OperatorParser, ParseError, convert},
    sql::QueryContext,
};

///
/// TakeSkipParser
///
/// `Take(source, n)` and `Skip(source, n)`. A second `Take`, or a `Skip`
/// over an already paged scope, starts a subquery so bounds compose in
/// chain order.
///

pub struct TakeSkipParser;

impl OperatorParser for TakeSkipParser {
    fn name(&self) -> &'static str {
        "take_skip"
    }

    fn can_parse(&self, link: &Expr) -> bool {
        OperatorCall::of(link, 1)
            .is_some_and(|call| matches!(call.operator, Operator::Take | Operator::Skip))
    }

    fn parse(
        &self,
        parser: &ExpressionParser<'_>,
        link: &Expr,
    ) -> Result<QueryContext, ParseError> {
        let Some(call) = OperatorCall::of(link, 1) else {
            return Err(ParseError::UnsupportedOperator {
                link: format!("{:?}", link.kind()),
            });
        };

        let mut ctx = parser.parse_sequence(call.source)?;

        let scope = ctx.current();
        let wrap = match call.operator {
            Operator::Take => scope.take.is_some(),
            _ => scope.is_paged(),
        };
        if wrap {
            ctx.wrap_subquery();
        }

        let context = if call.operator == Operator::Take {
            "take"
        } else {
            "skip"
        };
        let path = parser.arg_path(link, 0)?;
        let bound = convert::convert_free(&mut ctx, &call.args[0], path, context)?;

        let scope = ctx.current_mut();
        if call.operator == Operator::Take {
            scope.take = Some(bound);
        } else {
            scope.skip = Some(bound);
        }

        Ok(ctx)
    }
}
