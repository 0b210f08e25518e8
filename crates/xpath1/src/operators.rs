//! Contains pure functions for evaluating XPath binary operators.

use super::ast::BinaryOperator;
use super::engine::{XPathValue, string_to_number};
use crate::datasource::DataSourceNode;
use crate::error::XPathError;

pub fn evaluate<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    use BinaryOperator::*;
    match op {
        Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),
        Equals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            Ok(XPathValue::Boolean(compare(op, &left, &right)))
        }
        Plus => Ok(XPathValue::Number(left.to_number() + right.to_number())),
        Minus => Ok(XPathValue::Number(left.to_number() - right.to_number())),
        Multiply => Ok(XPathValue::Number(left.to_number() * right.to_number())),
        Divide => Ok(XPathValue::Number(left.to_number() / right.to_number())),
        Modulo => Ok(XPathValue::Number(left.to_number() % right.to_number())),
        Union => evaluate_union(left, right),
    }
}

/// A comparison involving a node-set is true when it holds for at least one node.
fn compare<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
            let right_strings: Vec<String> = r.iter().map(|n| n.string_value()).collect();
            l.iter().any(|ln| {
                let ls = ln.string_value();
                right_strings
                    .iter()
                    .any(|rs| compare_atomic(op, &Atomic::Str(&ls), &Atomic::Str(rs)))
            })
        }
        (XPathValue::NodeSet(nodes), other) => compare_node_set(op, nodes, other, false),
        (other, XPathValue::NodeSet(nodes)) => compare_node_set(op, nodes, other, true),
        (l, r) => compare_atomic(op, &Atomic::from_value(l), &Atomic::from_value(r)),
    }
}

fn compare_node_set<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    nodes: &[N],
    other: &XPathValue<N>,
    swapped: bool,
) -> bool {
    let ordered = |a: &Atomic<'_>, b: &Atomic<'_>| compare_ordered(op, a, b, swapped);
    match other {
        XPathValue::Boolean(b) => ordered(&Atomic::Bool(!nodes.is_empty()), &Atomic::Bool(*b)),
        XPathValue::Number(n) => nodes
            .iter()
            .any(|node| {
                let value = Atomic::Num(string_to_number(&node.string_value()));
                ordered(&value, &Atomic::Num(*n))
            }),
        XPathValue::String(s) => nodes.iter().any(|node| {
            let value = node.string_value();
            ordered(&Atomic::Str(&value), &Atomic::Str(s))
        }),
        XPathValue::NodeSet(_) => false,
    }
}

fn compare_ordered(op: BinaryOperator, a: &Atomic<'_>, b: &Atomic<'_>, swapped: bool) -> bool {
    if swapped {
        compare_atomic(op, b, a)
    } else {
        compare_atomic(op, a, b)
    }
}

enum Atomic<'s> {
    Bool(bool),
    Num(f64),
    Str(&'s str),
}

impl<'s> Atomic<'s> {
    fn from_value<'a, N: DataSourceNode<'a> + 'a>(value: &'s XPathValue<N>) -> Self {
        match value {
            XPathValue::Boolean(b) => Atomic::Bool(*b),
            XPathValue::Number(n) => Atomic::Num(*n),
            XPathValue::String(s) => Atomic::Str(s),
            XPathValue::NodeSet(nodes) => Atomic::Bool(!nodes.is_empty()),
        }
    }

    fn to_bool(&self) -> bool {
        match self {
            Atomic::Bool(b) => *b,
            Atomic::Num(n) => *n != 0.0 && !n.is_nan(),
            Atomic::Str(s) => !s.is_empty(),
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Atomic::Bool(b) => f64::from(u8::from(*b)),
            Atomic::Num(n) => *n,
            Atomic::Str(s) => string_to_number(s),
        }
    }
}

fn compare_atomic(op: BinaryOperator, left: &Atomic<'_>, right: &Atomic<'_>) -> bool {
    use BinaryOperator::*;
    match op {
        Equals | NotEquals => {
            let equal = match (left, right) {
                (Atomic::Bool(_), _) | (_, Atomic::Bool(_)) => left.to_bool() == right.to_bool(),
                (Atomic::Num(_), _) | (_, Atomic::Num(_)) => left.to_number() == right.to_number(),
                (Atomic::Str(l), Atomic::Str(r)) => l == r,
            };
            if op == Equals { equal } else { !equal }
        }
        LessThan => left.to_number() < right.to_number(),
        LessThanOrEqual => left.to_number() <= right.to_number(),
        GreaterThan => left.to_number() > right.to_number(),
        GreaterThanOrEqual => left.to_number() >= right.to_number(),
        _ => false,
    }
}

fn evaluate_union<'a, N: DataSourceNode<'a> + 'a>(
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    let XPathValue::NodeSet(l_nodes) = left else {
        return Err(XPathError::TypeError(
            "Left-hand side of '|' must be a node-set.".to_string(),
        ));
    };
    let XPathValue::NodeSet(r_nodes) = right else {
        return Err(XPathError::TypeError(
            "Right-hand side of '|' must be a node-set.".to_string(),
        ));
    };

    let mut merged = l_nodes;
    merged.extend(r_nodes);
    merged.sort();
    merged.dedup();
    Ok(XPathValue::NodeSet(merged))
}
