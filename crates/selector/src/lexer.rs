//! A `nom`-based lexer turning selector text into a flat token stream.
//!
//! Whitespace is significant only between compound selectors, where it is the
//! descendant combinator. Whitespace around `>` and `,` is absorbed into those
//! tokens.

use crate::error::SelectorError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, opt, recognize, value},
    sequence::{delimited, pair, preceded},
};

/// A possibly namespace-qualified name, written `prefix|local` in a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub prefix: Option<String>,
    /// `*` for the universal selector.
    pub local: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// `[a="v"]`
    Equals,
    /// `[a~="v"]`, whitespace-separated word match.
    Includes,
    /// `[a*="v"]`, substring match.
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Element(Name),
    Id(String),
    Class(String),
    Attribute {
        name: Name,
        op: AttributeOp,
        value: String,
    },
    Child,
    Descendant,
    Comma,
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn tokenize(selector: &str) -> Result<Vec<Spanned>, SelectorError> {
    let body = selector.trim_end();
    let mut rest = body.trim_start();
    let mut tokens = Vec::new();

    while !rest.is_empty() {
        let offset = body.len() - rest.len();
        match token(rest) {
            Ok((remaining, token)) => {
                if let Token::Element(Name {
                    prefix: Some(prefix),
                    ..
                }) = &token
                {
                    if prefix == "*" {
                        return Err(SelectorError::unsupported(
                            selector,
                            offset,
                            "any-namespace qualifier",
                        ));
                    }
                }
                tokens.push(Spanned { token, offset });
                rest = remaining;
            }
            Err(_) => return Err(diagnose(selector, offset, rest)),
        }
    }
    Ok(tokens)
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Child, delimited(multispace0, char('>'), multispace0)),
        value(Token::Comma, delimited(multispace0, char(','), multispace0)),
        value(Token::Descendant, multispace1),
        map(preceded(char('#'), identifier), |id| Token::Id(id.to_string())),
        map(preceded(char('.'), identifier), |class| {
            Token::Class(class.to_string())
        }),
        attribute,
        map(element_name, Token::Element),
    ))
    .parse(input)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(take_while1(is_name_start), take_while(is_name_char))).parse(input)
}

fn qualified(input: &str) -> IResult<&str, Name> {
    let (input, first) = alt((tag("*"), identifier)).parse(input)?;
    let (input, second) = opt(preceded(char('|'), alt((tag("*"), identifier)))).parse(input)?;
    let name = match second {
        Some(local) => Name {
            prefix: Some(first.to_string()),
            local: local.to_string(),
        },
        None => Name {
            prefix: None,
            local: first.to_string(),
        },
    };
    Ok((input, name))
}

fn element_name(input: &str) -> IResult<&str, Name> {
    qualified(input)
}

fn attribute_value(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        identifier,
    ))
    .parse(input)
}

fn attribute(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('[').parse(input)?;
    let (input, name) = delimited(multispace0, qualified, multispace0).parse(input)?;
    let (input, op) = alt((
        value(AttributeOp::Equals, tag("=")),
        value(AttributeOp::Includes, tag("~=")),
        value(AttributeOp::Contains, tag("*=")),
    ))
    .parse(input)?;
    let (input, value) = delimited(multispace0, attribute_value, multispace0).parse(input)?;
    let (input, _) = char(']').parse(input)?;
    Ok((
        input,
        Token::Attribute {
            name,
            op,
            value: value.to_string(),
        },
    ))
}

/// Explains why no token starts at `offset`.
fn diagnose(selector: &str, offset: usize, rest: &str) -> SelectorError {
    let Some(first) = rest.chars().next() else {
        return SelectorError::syntax(selector, offset, "unexpected end of selector");
    };
    match first {
        ':' => SelectorError::unsupported(selector, offset, "pseudo-class"),
        '+' | '~' => SelectorError::unsupported(selector, offset, "sibling combinator"),
        '[' => diagnose_attribute(selector, offset, rest),
        ']' => SelectorError::syntax(selector, offset, "unbalanced ']'"),
        '"' | '\'' => SelectorError::syntax(selector, offset, "unexpected string"),
        '#' | '.' => SelectorError::syntax(
            selector,
            offset,
            format!("expected a name after '{first}'"),
        ),
        other => SelectorError::syntax(selector, offset, format!("unexpected '{other}'")),
    }
}

fn diagnose_attribute(selector: &str, offset: usize, rest: &str) -> SelectorError {
    let Some(close) = rest.find(']') else {
        return SelectorError::syntax(selector, offset, "unbalanced '['");
    };
    let inner = &rest[1..close];
    for op in ["^=", "$=", "|="] {
        if let Some(at) = inner.find(op) {
            return SelectorError::unsupported(selector, offset + 1 + at, "attribute operator");
        }
    }
    if !inner.contains('=') {
        return SelectorError::unsupported(selector, offset, "attribute presence selector");
    }
    if inner.matches('"').count() % 2 == 1 || inner.matches('\'').count() % 2 == 1 {
        return SelectorError::syntax(selector, offset, "unterminated string");
    }
    SelectorError::syntax(selector, offset, "malformed attribute selector")
}
