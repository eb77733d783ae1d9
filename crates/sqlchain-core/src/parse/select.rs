use crate::{
    chain::Operator,
    expr::{Expr, ExprNode, MemberBinding},
    parse::{
        ExpressionParser, OperatorCall, OperatorParser, ParseError,
        convert::{self, Converter, Term},
    },
    sql::{ElementShape, QueryContext},
};

///
/// SelectParser
///
/// `Select(source, selector)`. Anonymous and member-init bodies become a
/// member projection, the bare element is an identity projection, and any
/// other body becomes a single scalar value.
///

pub struct SelectParser;

impl OperatorParser for SelectParser {
    fn name(&self) -> &'static str {
        "select"
    }

    fn can_parse(&self, link: &Expr) -> bool {
        OperatorCall::of(link, 1).is_some_and(|call| call.operator == Operator::Select)
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

        let selector = call.args[0].unwrap_quotes();
        let Some((params, body)) = selector.as_lambda() else {
            return Err(ParseError::UnsupportedExpression {
                kind: selector.kind(),
                context: "select",
            });
        };
        let [param] = params else {
            return Err(ParseError::UnsupportedExpression {
                kind: selector.kind(),
                context: "select",
            });
        };

        let mut ctx = parser.parse_sequence(call.source)?;

        // Identity projection keeps the current shape.
        if matches!(body.node(), ExprNode::Parameter { name } if *name == param.name) {
            return Ok(ctx);
        }

        let shape = {
            let mut converter = Converter {
                ctx: &mut ctx,
                param: Some(param.name.as_str()),
                path: convert::body_path(&call.args[0], parser.arg_path(link, 0)?),
                context: "select",
            };

            match body.node() {
                ExprNode::New(new) if !new.members.is_empty() => {
                    let mut members = Vec::with_capacity(new.args.len());
                    for (index, (member, arg)) in new.members.iter().zip(&new.args).enumerate() {
                        let term = converter.at(index, |this| this.term(arg))?;
                        members.push((member.name.to_string(), term.into_value()));
                    }

                    ElementShape::Members(members)
                }

                ExprNode::MemberInit { new, bindings } => {
                    let mut members = Vec::with_capacity(bindings.len());
                    for (index, binding) in bindings.iter().enumerate() {
                        let MemberBinding::Assignment { member, value } = binding else {
                            return Err(ParseError::UnsupportedExpression {
                                kind: body.kind(),
                                context: "select",
                            });
                        };
                        let term =
                            converter.at(new.args.len() + index, |this| this.term(value))?;
                        members.push((member.name.to_string(), term.into_value()));
                    }

                    ElementShape::Members(members)
                }

                _ => ElementShape::Scalar(converter.term(body).map(Term::into_value)?),
            }
        };

        ctx.set_shape(shape, body.ty());

        Ok(ctx)
    }
}
