//! `DataSourceNode` implementation so the XPath evaluator can walk a [`Document`].

use crate::tree::{Document, NodeId, NodeKind};
use domq_xpath1::{DataSourceNode, NodeType, QName};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A borrowed view of a node, or of one attribute of an element.
///
/// Attributes are not arena nodes, so they are addressed by their owner and
/// their index in the owner's attribute list.
#[derive(Clone, Copy)]
pub struct DomNode<'a> {
    doc: &'a Document,
    id: NodeId,
    attribute: Option<usize>,
}

impl<'a> DomNode<'a> {
    pub fn new(doc: &'a Document, id: NodeId) -> Self {
        Self {
            doc,
            id,
            attribute: None,
        }
    }

    pub fn attribute(doc: &'a Document, owner: NodeId, index: usize) -> Self {
        Self {
            doc,
            id: owner,
            attribute: Some(index),
        }
    }

    /// The document node of `doc`.
    pub fn root(doc: &'a Document) -> Self {
        Self::new(doc, doc.root())
    }

    /// The arena node, or the owning element for an attribute.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn attribute_index(&self) -> Option<usize> {
        self.attribute
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    fn key(&self) -> (u32, NodeId, Option<usize>) {
        (self.doc.document_order(self.id), self.id, self.attribute)
    }
}

impl fmt::Debug for DomNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomNode")
            .field("id", &self.id)
            .field("attribute", &self.attribute)
            .finish()
    }
}

impl PartialEq for DomNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc)
            && self.id == other.id
            && self.attribute == other.attribute
    }
}

impl Eq for DomNode<'_> {}

impl Hash for DomNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.attribute.hash(state);
    }
}

impl PartialOrd for DomNode<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DomNode<'_> {
    /// Document order; attributes sort after their owner and before its children.
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl<'a> DataSourceNode<'a> for DomNode<'a> {
    fn node_type(&self) -> NodeType {
        if self.attribute.is_some() {
            return NodeType::Attribute;
        }
        match self.doc.kind(self.id) {
            NodeKind::Document => NodeType::Root,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Text { .. } => NodeType::Text,
            NodeKind::Comment { .. } => NodeType::Comment,
            NodeKind::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        let doc = self.doc;
        if let Some(index) = self.attribute {
            return doc.attributes(self.id).get(index).map(|attr| QName {
                prefix: attr.prefix.as_deref(),
                local_part: attr.name.as_str(),
            });
        }
        match doc.kind(self.id) {
            NodeKind::Element { name, prefix, .. } => Some(QName {
                prefix: prefix.as_deref(),
                local_part: name.as_str(),
            }),
            NodeKind::ProcessingInstruction { target, .. } => Some(QName {
                prefix: None,
                local_part: target.as_str(),
            }),
            _ => None,
        }
    }

    fn namespace_uri(&self) -> Option<&'a str> {
        let doc = self.doc;
        match self.attribute {
            Some(index) => doc
                .attributes(self.id)
                .get(index)
                .and_then(|attr| attr.namespace.as_deref()),
            None => doc.namespace_uri(self.id),
        }
    }

    fn string_value(&self) -> String {
        match self.attribute {
            Some(index) => self
                .doc
                .attributes(self.id)
                .get(index)
                .map(|attr| attr.value.clone())
                .unwrap_or_default(),
            None => self.doc.text_content(self.id),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        if self.attribute.is_some() {
            return Box::new(std::iter::empty());
        }
        let doc = self.doc;
        let owner = self.id;
        let count = doc.attributes(owner).len();
        Box::new((0..count).map(move |index| DomNode::attribute(doc, owner, index)))
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        if self.attribute.is_some() {
            return Box::new(std::iter::empty());
        }
        let doc = self.doc;
        Box::new(doc.children(self.id).map(move |child| DomNode::new(doc, child)))
    }

    fn parent(&self) -> Option<Self> {
        if self.attribute.is_some() {
            return Some(DomNode::new(self.doc, self.id));
        }
        self.doc
            .parent(self.id)
            .map(|parent| DomNode::new(self.doc, parent))
    }
}
