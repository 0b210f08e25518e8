//! The evaluation engine for executing a parsed XPath AST against a generic `DataSourceNode`.

use super::ast::{
    Axis, Expression, LocationPath, NameTest, NodeTest, NodeTypeTest, Step, UnaryOperator,
};
use super::functions;
use super::{axes, operators};
use crate::datasource::{DataSourceNode, NodeType, XML_NAMESPACE};
use crate::error::XPathError;
use crate::parser::parse_expression;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// Prefix to namespace URI bindings visible to name tests.
pub type NamespaceBindings = HashMap<String, String>;

/// Represents the possible result types of an XPath expression evaluation.
#[derive(Debug, Clone)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

/// Converts a string to a number the way `number()` does: optional
/// surrounding whitespace, an optional minus sign and a decimal literal.
/// Anything else (exponents, `inf`, a leading `+`) is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return f64::NAN,
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// Formats a number as XPath's `string()` does.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    /// Coerces the XPath value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the XPath value to a number as per XPath 1.0 rules.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => string_to_number(s),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|n| string_to_number(&n.string_value()))
                .unwrap_or(f64::NAN),
        }
    }
}

impl<'a, N: DataSourceNode<'a>> fmt::Display for XPathValue<N> {
    /// Coerces the XPath value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(
                f,
                "{}",
                nodes.first().map(|n| n.string_value()).unwrap_or_default()
            ),
            XPathValue::String(s) => write!(f, "{}", s),
            XPathValue::Number(n) => write!(f, "{}", number_to_string(*n)),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A container for all state needed during expression evaluation.
/// `'a` is the lifetime of the underlying data source.
/// `'d` is the lifetime of the evaluation context itself.
pub struct EvaluationContext<'a, 'd, N: DataSourceNode<'a>> {
    pub context_node: N,
    pub root_node: N,
    pub namespaces: &'d NamespaceBindings,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
    _marker: PhantomData<&'a ()>,
}

impl<'a, 'd, N: DataSourceNode<'a>> EvaluationContext<'a, 'd, N> {
    pub fn new(
        context_node: N,
        root_node: N,
        namespaces: &'d NamespaceBindings,
        context_position: usize,
        context_size: usize,
    ) -> Self {
        Self {
            context_node,
            root_node,
            namespaces,
            context_position,
            context_size,
            _marker: PhantomData,
        }
    }

    fn with_focus(&self, node: N, position: usize, size: usize) -> Self {
        Self::new(node, self.root_node, self.namespaces, position, size)
    }
}

/// Parses `query`, checks every prefix it uses is bound, and evaluates it
/// with `context` as the context node. The result must be a node-set.
pub fn select_nodes<'a, N>(
    query: &str,
    root: N,
    context: N,
    namespaces: &NamespaceBindings,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let expr = parse_expression(query)?;
    if let Some(unbound) = expr
        .prefixes()
        .into_iter()
        .find(|p| *p != "xml" && !namespaces.contains_key(*p))
    {
        return Err(XPathError::UnboundPrefix(unbound.to_string()));
    }
    let e_ctx = EvaluationContext::new(context, root, namespaces, 1, 1);
    match evaluate(&expr, &e_ctx)? {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        _ => Err(XPathError::NotANodeSet(query.to_string())),
    }
}

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            let right_val = evaluate(right, e_ctx)?;
            operators::evaluate(*op, left_val, right_val)
        }
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, e_ctx)?;
            match op {
                UnaryOperator::Minus => Ok(XPathValue::Number(-val.to_number())),
            }
        }
        Expression::Filter { expr, predicates } => match evaluate(expr, e_ctx)? {
            XPathValue::NodeSet(mut nodes) => {
                nodes.sort();
                nodes.dedup();
                Ok(XPathValue::NodeSet(apply_predicates(nodes, predicates, e_ctx)?))
            }
            _ => Err(XPathError::TypeError(
                "Only a node-set can be filtered by a predicate.".to_string(),
            )),
        },
    }
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let initial_context = if let Some(start_expr) = &path.start_point {
        match evaluate(start_expr, e_ctx)? {
            XPathValue::NodeSet(nodes) => nodes,
            _ => {
                return Err(XPathError::TypeError(
                    "A path can only continue from a node-set.".to_string(),
                ));
            }
        }
    } else if path.is_absolute {
        vec![e_ctx.root_node]
    } else {
        vec![e_ctx.context_node]
    };

    let mut current_nodes = initial_context;
    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
    }
    Ok(current_nodes)
}

/// Evaluates a step once per context node, so positions in predicates are
/// relative to each node's own axis, then merges into document order.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let test = ResolvedNodeTest::resolve(&step.node_test, e_ctx.namespaces)?;
    let mut merged = Vec::new();
    for &node in context_nodes {
        let axis_nodes: Vec<N> = axes::collect(step.axis, node)
            .into_iter()
            .filter(|n| test.matches(n, step.axis))
            .collect();
        merged.extend(apply_predicates(axis_nodes, &step.predicates, e_ctx)?);
    }
    if context_nodes.len() > 1 || step.axis.is_reverse() {
        merged.sort();
        merged.dedup();
    }
    Ok(merged)
}

/// A node test with its prefix already resolved to a namespace URI.
enum ResolvedNodeTest<'t> {
    Name {
        namespace: Option<&'t str>,
        local_part: &'t str,
    },
    Namespace(&'t str),
    Wildcard,
    Kind(NodeTypeTest),
}

impl<'t> ResolvedNodeTest<'t> {
    fn resolve(test: &'t NodeTest, namespaces: &'t NamespaceBindings) -> Result<Self, XPathError> {
        Ok(match test {
            NodeTest::Name(NameTest { prefix, local_part }) => ResolvedNodeTest::Name {
                namespace: match prefix {
                    Some(p) => Some(resolve_prefix(namespaces, p)?),
                    None => None,
                },
                local_part,
            },
            NodeTest::PrefixWildcard(p) => {
                ResolvedNodeTest::Namespace(resolve_prefix(namespaces, p)?)
            }
            NodeTest::Wildcard => ResolvedNodeTest::Wildcard,
            NodeTest::NodeType(kind) => ResolvedNodeTest::Kind(*kind),
        })
    }

    fn matches<'a, N: DataSourceNode<'a>>(&self, node: &N, axis: Axis) -> bool {
        let principal = if axis == Axis::Attribute {
            NodeType::Attribute
        } else {
            NodeType::Element
        };
        match self {
            ResolvedNodeTest::Name {
                namespace,
                local_part,
            } => {
                node.node_type() == principal
                    && node.namespace_uri() == *namespace
                    && node.name().is_some_and(|q| q.local_part == *local_part)
            }
            ResolvedNodeTest::Namespace(uri) => {
                node.node_type() == principal && node.namespace_uri() == Some(*uri)
            }
            ResolvedNodeTest::Wildcard => node.node_type() == principal,
            ResolvedNodeTest::Kind(kind) => match kind {
                NodeTypeTest::Text => node.node_type() == NodeType::Text,
                NodeTypeTest::Comment => node.node_type() == NodeType::Comment,
                NodeTypeTest::ProcessingInstruction => {
                    node.node_type() == NodeType::ProcessingInstruction
                }
                NodeTypeTest::Node => true,
            },
        }
    }
}

fn resolve_prefix<'t>(
    namespaces: &'t NamespaceBindings,
    prefix: &str,
) -> Result<&'t str, XPathError> {
    match namespaces.get(prefix) {
        Some(uri) => Ok(uri.as_str()),
        None if prefix == "xml" => Ok(XML_NAMESPACE),
        None => Err(XPathError::UnboundPrefix(prefix.to_string())),
    }
}

/// Filters the nodes of one axis, in proximity order, through each predicate in turn.
fn apply_predicates<'a, N>(
    nodes: Vec<N>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut final_nodes = nodes;
    for predicate in predicates {
        let context_size = final_nodes.len();
        let mut kept = Vec::with_capacity(context_size);
        for (i, node) in final_nodes.into_iter().enumerate() {
            let predicate_e_ctx = e_ctx.with_focus(node, i + 1, context_size);
            let keep = match evaluate(predicate, &predicate_e_ctx)? {
                XPathValue::Number(n) => n == (i + 1) as f64,
                other => other.to_bool(),
            };
            if keep {
                kept.push(node);
            }
        }
        final_nodes = kept;
    }
    Ok(final_nodes)
}
