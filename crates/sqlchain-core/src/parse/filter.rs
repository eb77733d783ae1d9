use crate::{
    chain::Operator,
    expr::Expr,
    parse::{
        ExpressionParser, OperatorCall, OperatorParser, ParseError,
        convert::{self, ConvertMode},
    },
    sql::QueryContext,
};

///
/// WhereParser
/// `Where(source, predicate)`: AND-combines into the current scope's filter.
///

pub struct WhereParser;

impl OperatorParser for WhereParser {
    fn name(&self) -> &'static str {
        "where"
    }

    fn can_parse(&self, link: &Expr) -> bool {
        OperatorCall::of(link, 1).is_some_and(|call| call.operator == Operator::Where)
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

        // Filtering a paged result must not change which rows the page holds.
        if ctx.current().is_paged() {
            ctx.wrap_subquery();
        }

        let terms = convert::convert_lambda(
            &mut ctx,
            &call.args[0],
            parser.arg_path(link, 0)?,
            ConvertMode::Value,
            "where",
        )?;

        let scope = ctx.current_mut();
        for term in terms {
            scope.filter = Some(match scope.filter.take() {
                Some(existing) => existing.and(term.expr),
                None => term.expr,
            });
        }

        Ok(ctx)
    }
}
