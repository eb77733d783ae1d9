use crate::{
    expr::{Expr, ExprNode},
    parse::{ExpressionParser, OperatorParser, ParseError},
    sql::QueryContext,
    value::Value,
};

///
/// TableParser
/// Table-source literal: the innermost link of every chain.
///

pub struct TableParser;

impl OperatorParser for TableParser {
    fn name(&self) -> &'static str {
        "table"
    }

    fn can_parse(&self, link: &Expr) -> bool {
        matches!(link.node(), ExprNode::Constant(Value::Table(_)))
    }

    fn parse(
        &self,
        parser: &ExpressionParser<'_>,
        link: &Expr,
    ) -> Result<QueryContext, ParseError> {
        let ExprNode::Constant(Value::Table(table)) = link.node() else {
            return Err(ParseError::UnsupportedOperator {
                link: format!("{:?}", link.kind()),
            });
        };

        let source = parser
            .schema()
            .table_source(table.model)
            .ok_or(ParseError::UnmappedSource {
                path: table.model.path,
            })?;

        Ok(QueryContext::new(source, table.element))
    }
}
