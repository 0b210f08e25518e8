//! Absolute location paths for nodes, in the style libxml2 produces them.
//!
//! Steps use the names as written in the markup, so an element in a default
//! namespace appears unprefixed even though a query needs a prefix to match
//! it. [`PathSegment`] keeps the namespace URI next to the written name so a
//! caller can re-prefix the steps before running the path as a query.

use crate::tree::{Document, NodeId, NodeKind};
use std::fmt;

/// The node test of one path step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Element {
        prefix: Option<String>,
        local: String,
        namespace: Option<String>,
    },
    Attribute {
        prefix: Option<String>,
        local: String,
        namespace: Option<String>,
    },
    Text,
    Comment,
    ProcessingInstruction(String),
}

/// One `/`-separated step of a node path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub step: PathStep,
    /// 1-based position among same-named siblings, present only when the
    /// name alone is ambiguous.
    pub index: Option<usize>,
}

impl PathSegment {
    /// The namespace of a named step, if it has one.
    pub fn namespace(&self) -> Option<&str> {
        match &self.step {
            PathStep::Element { namespace, .. } | PathStep::Attribute { namespace, .. } => {
                namespace.as_deref()
            }
            _ => None,
        }
    }

    /// The written prefix of a named step.
    pub fn prefix(&self) -> Option<&str> {
        match &self.step {
            PathStep::Element { prefix, .. } | PathStep::Attribute { prefix, .. } => {
                prefix.as_deref()
            }
            _ => None,
        }
    }

    /// Rewrites the prefix of a named step; other steps are left alone.
    pub fn set_prefix(&mut self, new_prefix: Option<&str>) {
        if let PathStep::Element { prefix, .. } | PathStep::Attribute { prefix, .. } =
            &mut self.step
        {
            *prefix = new_prefix.map(str::to_string);
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            PathStep::Element { prefix, local, .. } => match prefix {
                Some(p) => write!(f, "{p}:{local}")?,
                None => write!(f, "{local}")?,
            },
            PathStep::Attribute { prefix, local, .. } => match prefix {
                Some(p) => write!(f, "@{p}:{local}")?,
                None => write!(f, "@{local}")?,
            },
            PathStep::Text => f.write_str("text()")?,
            PathStep::Comment => f.write_str("comment()")?,
            PathStep::ProcessingInstruction(target) => {
                write!(f, "processing-instruction('{target}')")?
            }
        }
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

/// Joins segments into an absolute path. No segments is the document node.
pub fn render_path(segments: &[PathSegment]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    segments.iter().map(|s| format!("/{s}")).collect()
}

impl Document {
    /// Path from the top of the node's tree down to the node.
    ///
    /// `attribute` selects one of the element's attributes by index.
    pub fn path_segments(&self, id: NodeId, attribute: Option<usize>) -> Vec<PathSegment> {
        let mut segments: Vec<PathSegment> = self
            .ancestors(id)
            .filter_map(|node| self.segment_for(node))
            .collect();
        segments.reverse();

        if let Some(attr) = attribute.and_then(|index| self.attributes(id).get(index)) {
            segments.push(PathSegment {
                step: PathStep::Attribute {
                    prefix: attr.prefix.clone(),
                    local: attr.name.clone(),
                    namespace: attr.namespace.clone(),
                },
                index: None,
            });
        }
        segments
    }

    /// The node's absolute path, e.g. `/html/body/div[2]/text()`.
    pub fn node_path(&self, id: NodeId) -> String {
        render_path(&self.path_segments(id, None))
    }

    fn segment_for(&self, node: NodeId) -> Option<PathSegment> {
        let step = match self.kind(node) {
            NodeKind::Document => return None,
            NodeKind::Element {
                name,
                prefix,
                namespace,
                ..
            } => PathStep::Element {
                prefix: prefix.clone(),
                local: name.clone(),
                namespace: namespace.clone(),
            },
            NodeKind::Text { .. } => PathStep::Text,
            NodeKind::Comment { .. } => PathStep::Comment,
            NodeKind::ProcessingInstruction { target, .. } => {
                PathStep::ProcessingInstruction(target.clone())
            }
        };

        let index = self.parent(node).and_then(|parent| {
            let alike: Vec<NodeId> = self
                .children(parent)
                .filter(|&sibling| self.same_test(node, sibling))
                .collect();
            if alike.len() > 1 {
                alike.iter().position(|&s| s == node).map(|p| p + 1)
            } else {
                None
            }
        });

        Some(PathSegment { step, index })
    }

    /// Whether two nodes would be matched by the same path step.
    fn same_test(&self, a: NodeId, b: NodeId) -> bool {
        match (self.kind(a), self.kind(b)) {
            (
                NodeKind::Element {
                    name: n1,
                    namespace: ns1,
                    ..
                },
                NodeKind::Element {
                    name: n2,
                    namespace: ns2,
                    ..
                },
            ) => n1 == n2 && ns1 == ns2,
            (NodeKind::Text { .. }, NodeKind::Text { .. })
            | (NodeKind::Comment { .. }, NodeKind::Comment { .. }) => true,
            (
                NodeKind::ProcessingInstruction { target: t1, .. },
                NodeKind::ProcessingInstruction { target: t2, .. },
            ) => t1 == t2,
            _ => false,
        }
    }
}
