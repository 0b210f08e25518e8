//! A `nom`-based parser for the XPath 1.0 expression language.

use super::ast::*;
use crate::error::XPathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0},
    combinator::{map, map_res, opt, peek, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

// --- Main Public Parser ---

pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(XPathError::XPathParse(
            input.to_string(),
            format!("Parser did not consume all input. Remainder: '{}'", rem),
        )),
        Err(e) => Err(XPathError::XPathParse(input.to_string(), e.to_string())),
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;

        for (op, right) in remainder {
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

/// Matches an operator name (`and`, `div`, ...) only when it is not the start
/// of a longer name such as `android` or `divider`.
fn operator_name<'a>(
    name: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(
        tag(name),
        peek(nom::combinator::not(take_while1(is_name_char))),
    )
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str) -> IResult<&str, Expression> {
    or_expr(input)
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::Or, operator_name("or")).parse(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::And, operator_name("and")).parse(input)
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(equality_expr, and_op)(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Equals, tag("=")),
        value(BinaryOperator::NotEquals, tag("!=")),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::LessThanOrEqual, tag("<=")),
        value(BinaryOperator::LessThanOrEqual, tag("&lt;=")),
        value(BinaryOperator::GreaterThanOrEqual, tag(">=")),
        value(BinaryOperator::GreaterThanOrEqual, tag("&gt;=")),
        value(BinaryOperator::LessThan, tag("<")),
        value(BinaryOperator::LessThan, tag("&lt;")),
        value(BinaryOperator::GreaterThan, tag(">")),
        value(BinaryOperator::GreaterThan, tag("&gt;")),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Plus, char('+')),
        value(BinaryOperator::Minus, char('-')),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Multiply, char('*')),
        value(BinaryOperator::Divide, operator_name("div")),
        value(BinaryOperator::Modulo, operator_name("mod")),
    ))
    .parse(input)
}

fn union_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::Union, char('|')).parse(input)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(additive_expr, relational_op)(input)
}

fn additive_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(multiplicative_expr, additive_op)(input)
}

fn multiplicative_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(unary_expr, multiplicative_op)(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    let (i, neg_op) = opt(ws(char('-'))).parse(input)?;
    let (i, expr) = union_expr(i)?;

    if neg_op.is_some() {
        Ok((
            i,
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(expr),
            },
        ))
    } else {
        Ok((i, expr))
    }
}

fn union_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(path_expr, union_op)(input)
}

/// Handles the ambiguity between location paths and primary expressions that
/// may be followed by a path (`id('x')/item`, `(a|b)/c`).
fn path_expr(input: &str) -> IResult<&str, Expression> {
    // Primary first: `count(x)` would otherwise be taken as a step named `count`.
    let (i, start_expr) =
        alt((filter_expr, map(location_path, Expression::LocationPath))).parse(input)?;

    let (i, remainder_steps) = many0(pair(alt((tag("//"), tag("/"))), step)).parse(i)?;

    if remainder_steps.is_empty() {
        return Ok((i, start_expr));
    }

    let (start_point, is_absolute, mut steps) = match start_expr {
        Expression::LocationPath(lp) => (lp.start_point, lp.is_absolute, lp.steps),
        other => (Some(Box::new(other)), false, vec![]),
    };

    for (sep, next_step) in remainder_steps {
        if sep == "//" {
            steps.push(Step::descendant_or_self());
        }
        steps.push(next_step);
    }

    Ok((
        i,
        Expression::LocationPath(LocationPath {
            start_point,
            is_absolute,
            steps,
        }),
    ))
}

/// `PrimaryExpr Predicate*`. Predicates on a primary expression count
/// positions in document order.
fn filter_expr(input: &str) -> IResult<&str, Expression> {
    let (i, expr) = primary_expr(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    if predicates.is_empty() {
        return Ok((i, expr));
    }
    Ok((
        i,
        Expression::Filter {
            expr: Box::new(expr),
            predicates,
        },
    ))
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(number, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

// --- Literal Parsers ---

/// `Digits ('.' Digits?)? | '.' Digits`. Deliberately narrower than a float
/// parser: names like `info` or `nan` must stay names.
fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        ))),
        |s: &str| s.parse::<f64>(),
    )
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

// --- Name and NodeTest Parsers ---

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(is_name_start_char),
        take_while(is_name_char),
    ))
    .parse(input)
}

fn q_name(input: &str) -> IResult<&str, NameTest> {
    map(
        pair(nc_name, opt(preceded(char(':'), nc_name))),
        |(first, second)| match second {
            Some(local) => NameTest {
                prefix: Some(first.to_string()),
                local_part: local.to_string(),
            },
            None => NameTest {
                prefix: None,
                local_part: first.to_string(),
            },
        },
    )
    .parse(input)
}

fn node_type_test(input: &str) -> IResult<&str, NodeTest> {
    map(
        terminated(
            alt((
                tag("text"),
                tag("node"),
                tag("comment"),
                tag("processing-instruction"),
            )),
            pair(ws(char('(')), ws(char(')'))),
        ),
        |node_type: &str| match node_type {
            "text" => NodeTest::NodeType(NodeTypeTest::Text),
            "comment" => NodeTest::NodeType(NodeTypeTest::Comment),
            "processing-instruction" => NodeTest::NodeType(NodeTypeTest::ProcessingInstruction),
            _ => NodeTest::NodeType(NodeTypeTest::Node),
        },
    )
    .parse(input)
}

pub fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        map(tag("*"), |_| NodeTest::Wildcard),
        node_type_test,
        map(terminated(nc_name, tag(":*")), |p: &str| {
            NodeTest::PrefixWildcard(p.to_string())
        }),
        map(q_name, NodeTest::Name),
    ))
    .parse(input)
}

// --- Path Parsers ---

fn axis(input: &str) -> IResult<&str, Axis> {
    terminated(
        alt((
            value(Axis::Child, tag("child")),
            value(Axis::DescendantOrSelf, tag("descendant-or-self")),
            value(Axis::Descendant, tag("descendant")),
            value(Axis::Attribute, tag("attribute")),
            value(Axis::Parent, tag("parent")),
            value(Axis::AncestorOrSelf, tag("ancestor-or-self")),
            value(Axis::Ancestor, tag("ancestor")),
            value(Axis::SelfAxis, tag("self")),
            value(Axis::FollowingSibling, tag("following-sibling")),
            value(Axis::PrecedingSibling, tag("preceding-sibling")),
            value(Axis::Following, tag("following")),
            value(Axis::Preceding, tag("preceding")),
        )),
        tag("::"),
    )
    .parse(input)
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    let any_node = || NodeTest::NodeType(NodeTypeTest::Node);
    let (i, (axis, node_test)) = alt((
        map(tag(".."), |_| (Axis::Parent, any_node())),
        map(tag("."), |_| (Axis::SelfAxis, any_node())),
        map(preceded(char('@'), node_test), |nt| (Axis::Attribute, nt)),
        map(pair(opt(axis), node_test), |(ax, nt)| {
            (ax.unwrap_or(Axis::Child), nt)
        }),
    ))
    .parse(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    Ok((
        i,
        Step {
            axis,
            node_test,
            predicates,
        },
    ))
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let (i, (is_absolute, mut steps)) =
        if let Ok((rem, _)) = tag::<&str, &str, nom::error::Error<&str>>("//")(input) {
            let (rem, step) = step(rem)?;
            (rem, (true, vec![Step::descendant_or_self(), step]))
        } else if let Ok((rem, _)) = tag::<&str, &str, nom::error::Error<&str>>("/")(input) {
            if let Ok((rem, first_step)) = step(rem) {
                (rem, (true, vec![first_step]))
            } else {
                // A bare "/" selects the root.
                (rem, (true, vec![]))
            }
        } else {
            let (rem, first_step) = step(input)?;
            (rem, (false, vec![first_step]))
        };

    // After the first step, subsequent steps MUST be preceded by / or //.
    let (i, remainder) = many0(pair(alt((tag("//"), tag("/"))), step)).parse(i)?;

    for (sep, next_step) in remainder {
        if sep == "//" {
            steps.push(Step::descendant_or_self());
        }
        steps.push(next_step);
    }

    Ok((
        i,
        LocationPath {
            start_point: None,
            is_absolute,
            steps,
        },
    ))
}

// --- Function Call Parser ---

fn function_call(input: &str) -> IResult<&str, Expression> {
    let (i, name) = q_name(input)?;
    // The lookahead keeps a step name (`foo` in `foo/bar`) from becoming a call.
    let (i, _) = peek(ws(char('('))).parse(i)?;

    // Node-type tests like text() are handled by the step parser.
    if name.prefix.is_none()
        && matches!(
            name.local_part.as_str(),
            "text" | "node" | "comment" | "processing-instruction"
        )
    {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let name = match name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local_part),
        None => name.local_part,
    };

    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        char(')'),
    )
    .parse(i)?;

    Ok((i, Expression::FunctionCall { name, args }))
}
