//! Contains pure functions for collecting nodes along each XPath axis.
//!
//! Every collector appends in proximity order: document order for forward axes,
//! reverse document order for reverse axes. Positional predicates depend on it.

use crate::ast::Axis;
use crate::datasource::DataSourceNode;

/// Collects the nodes on `axis` relative to a single context node.
pub fn collect<'a, N: DataSourceNode<'a>>(axis: Axis, node: N) -> Vec<N> {
    let mut results = Vec::new();
    match axis {
        Axis::Child => collect_child_nodes(node, &mut results),
        Axis::Attribute => collect_attribute_nodes(node, &mut results),
        Axis::Descendant => collect_descendant_nodes(node, &mut results),
        Axis::DescendantOrSelf => collect_descendant_or_self_nodes(node, &mut results),
        Axis::Parent => collect_parent_nodes(node, &mut results),
        Axis::Ancestor => collect_ancestor_nodes(node, &mut results),
        Axis::AncestorOrSelf => {
            results.push(node);
            collect_ancestor_nodes(node, &mut results);
        }
        Axis::SelfAxis => results.push(node),
        Axis::FollowingSibling => collect_following_sibling_nodes(node, &mut results),
        Axis::PrecedingSibling => collect_preceding_sibling_nodes(node, &mut results),
        Axis::Following => collect_following_nodes(node, &mut results),
        Axis::Preceding => collect_preceding_nodes(node, &mut results),
    }
    results
}

pub fn collect_child_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(node.children());
}

pub fn collect_attribute_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(node.attributes());
}

/// Pre-order walk, which is document order.
pub fn collect_descendant_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut stack: Vec<N> = node.children().collect();
    stack.reverse();
    while let Some(current) = stack.pop() {
        results.push(current);
        let start = stack.len();
        stack.extend(current.children());
        stack[start..].reverse();
    }
}

pub fn collect_descendant_or_self_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    results.push(node);
    collect_descendant_nodes(node, results);
}

pub fn collect_parent_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if let Some(parent) = node.parent() {
        results.push(parent);
    }
}

pub fn collect_ancestor_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node.parent();
    while let Some(p) = current {
        results.push(p);
        current = p.parent();
    }
}

/// Attributes have no siblings.
fn is_attribute<'a, N: DataSourceNode<'a>>(node: N) -> bool {
    node.node_type() == crate::datasource::NodeType::Attribute
}

pub fn collect_following_sibling_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    if is_attribute(node) {
        return;
    }
    if let Some(parent) = node.parent() {
        results.extend(parent.children().skip_while(|s| *s != node).skip(1));
    }
}

pub fn collect_preceding_sibling_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    if is_attribute(node) {
        return;
    }
    if let Some(parent) = node.parent() {
        let mut siblings: Vec<N> = parent.children().take_while(|s| *s != node).collect();
        siblings.reverse();
        results.extend(siblings);
    }
}

/// Everything after the node in document order, excluding its descendants.
pub fn collect_following_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node;
    // An attribute's following nodes start with its owner's children.
    if is_attribute(node) {
        match node.parent() {
            Some(owner) => {
                collect_descendant_nodes(owner, results);
                current = owner;
            }
            None => return,
        }
    }
    loop {
        let Some(parent) = current.parent() else {
            break;
        };
        for sibling in parent.children().skip_while(|s| *s != current).skip(1) {
            collect_descendant_or_self_nodes(sibling, results);
        }
        current = parent;
    }
}

/// Everything before the node in document order, excluding its ancestors,
/// nearest first.
pub fn collect_preceding_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = if is_attribute(node) {
        match node.parent() {
            Some(owner) => owner,
            None => return,
        }
    } else {
        node
    };
    loop {
        let Some(parent) = current.parent() else {
            break;
        };
        let siblings: Vec<N> = parent.children().take_while(|s| *s != current).collect();
        for sibling in siblings.into_iter().rev() {
            let mut subtree = Vec::new();
            collect_descendant_or_self_nodes(sibling, &mut subtree);
            results.extend(subtree.into_iter().rev());
        }
        current = parent;
    }
}
