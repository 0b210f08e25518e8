//! Groups tokens into compound selectors and emits XPath location paths.

use crate::error::SelectorError;
use crate::lexer::{AttributeOp, Name, Spanned, Token, tokenize};
use log::debug;
use std::fmt;

/// Where the emitted paths start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// `//...`: anywhere in the document.
    #[default]
    Document,
    /// `.//...`: anywhere below the context node.
    Context,
}

/// The XPath for a selector: one location path per comma-separated branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    branches: Vec<String>,
}

impl CompiledQuery {
    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    pub fn into_branches(self) -> Vec<String> {
        self.branches
    }

    /// All branches as a single union expression.
    pub fn to_xpath(&self) -> String {
        self.branches.join(" | ")
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xpath())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Child,
    Descendant,
}

#[derive(Debug)]
enum Filter {
    Id(String),
    Class(String),
    Attribute {
        name: Name,
        op: AttributeOp,
        value: String,
    },
}

#[derive(Debug, Default)]
struct Compound {
    element: Option<Name>,
    filters: Vec<Filter>,
}

type Branch = Vec<(Combinator, Compound)>;

pub fn compile(selector: &str) -> Result<CompiledQuery, SelectorError> {
    compile_with(selector, Anchor::Document)
}

/// Compiles paths that start at the context node, e.g. `.//li`.
pub fn compile_relative(selector: &str) -> Result<CompiledQuery, SelectorError> {
    compile_with(selector, Anchor::Context)
}

pub fn compile_with(selector: &str, anchor: Anchor) -> Result<CompiledQuery, SelectorError> {
    let tokens = tokenize(selector)?;
    if tokens.is_empty() {
        return Err(SelectorError::Empty);
    }
    let branches = group(selector, tokens)?
        .iter()
        .map(|branch| emit_branch(branch, anchor))
        .collect();
    let compiled = CompiledQuery { branches };
    debug!("Compiled selector '{selector}' to '{compiled}'");
    Ok(compiled)
}

/// Builds the branch/compound structure, rejecting misplaced tokens.
fn group(selector: &str, tokens: Vec<Spanned>) -> Result<Vec<Branch>, SelectorError> {
    let mut branches: Vec<Branch> = Vec::new();
    let mut steps: Branch = Vec::new();
    let mut current: Option<Compound> = None;
    // The combinator in front of the compound being built, and where it was written.
    let mut pending = (Combinator::Descendant, None::<usize>);

    for Spanned { token, offset } in tokens {
        match token {
            Token::Element(name) => {
                if current.is_some() {
                    return Err(SelectorError::syntax(
                        selector,
                        offset,
                        "element name must start a compound selector",
                    ));
                }
                current = Some(Compound {
                    element: Some(name),
                    filters: Vec::new(),
                });
            }
            Token::Id(id) => filters(&mut current).push(Filter::Id(id)),
            Token::Class(class) => filters(&mut current).push(Filter::Class(class)),
            Token::Attribute { name, op, value } => {
                filters(&mut current).push(Filter::Attribute { name, op, value })
            }
            Token::Child | Token::Descendant => {
                let Some(compound) = current.take() else {
                    return Err(SelectorError::syntax(
                        selector,
                        offset,
                        "combinator without a preceding selector",
                    ));
                };
                steps.push((pending.0, compound));
                let combinator = if token == Token::Child {
                    Combinator::Child
                } else {
                    Combinator::Descendant
                };
                pending = (combinator, Some(offset));
            }
            Token::Comma => {
                branches.push(finish_branch(selector, offset, steps, current.take(), pending)?);
                steps = Vec::new();
                pending = (Combinator::Descendant, None);
            }
        }
    }
    branches.push(finish_branch(selector, selector.len(), steps, current, pending)?);
    Ok(branches)
}

fn filters(current: &mut Option<Compound>) -> &mut Vec<Filter> {
    &mut current.get_or_insert_with(Compound::default).filters
}

fn finish_branch(
    selector: &str,
    offset: usize,
    mut steps: Branch,
    current: Option<Compound>,
    pending: (Combinator, Option<usize>),
) -> Result<Branch, SelectorError> {
    match (current, pending.1) {
        (Some(compound), _) => {
            steps.push((pending.0, compound));
            Ok(steps)
        }
        (None, Some(at)) => Err(SelectorError::syntax(
            selector,
            at,
            "combinator without a following selector",
        )),
        (None, None) => Err(SelectorError::EmptyBranch {
            selector: selector.to_string(),
            offset,
        }),
    }
}

fn emit_branch(branch: &Branch, anchor: Anchor) -> String {
    let mut out = String::new();
    if anchor == Anchor::Context {
        out.push('.');
    }
    for (combinator, compound) in branch {
        out.push_str(match combinator {
            Combinator::Child => "/",
            Combinator::Descendant => "//",
        });
        emit_compound(compound, &mut out);
    }
    out
}

fn emit_compound(compound: &Compound, out: &mut String) {
    match &compound.element {
        Some(name) => out.push_str(&qualified(name)),
        None => out.push('*'),
    }
    for filter in &compound.filters {
        out.push('[');
        match filter {
            Filter::Id(id) => {
                out.push_str("@id=");
                out.push_str(&literal(id));
            }
            Filter::Class(class) => out.push_str(&word_match("@class", class)),
            Filter::Attribute { name, op, value } => {
                let attr = format!("@{}", qualified(name));
                match op {
                    AttributeOp::Equals => {
                        out.push_str(&attr);
                        out.push('=');
                        out.push_str(&literal(value));
                    }
                    AttributeOp::Includes => out.push_str(&word_match(&attr, value)),
                    AttributeOp::Contains => {
                        out.push_str(&format!("contains({attr}, {})", literal(value)));
                    }
                }
            }
        }
        out.push(']');
    }
}

fn qualified(name: &Name) -> String {
    match &name.prefix {
        Some(prefix) => format!("{prefix}:{}", name.local),
        None => name.local.clone(),
    }
}

/// True when `word` is one of the whitespace-separated tokens of `attr`.
fn word_match(attr: &str, word: &str) -> String {
    format!(
        "contains(concat(' ', normalize-space({attr}), ' '), {})",
        literal(&format!(" {word} "))
    )
}

/// Quotes a string as an XPath literal, falling back to `concat()` when it
/// contains both quote characters.
fn literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{part}'"))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
