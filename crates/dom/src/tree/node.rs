//! Node payloads stored in the document arena.
//!
//! Navigation links live in [`super::NodeData`]; this module only describes
//! what a node *is*.

/// The kind of a node and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. There is exactly one per [`super::Document`].
    Document,

    /// An element, e.g. `<mml:math xmlns:mml="...">`.
    Element {
        /// The local name.
        name: String,
        /// The prefix as written in the markup, if any.
        prefix: Option<String>,
        /// The namespace URI the element belongs to, if any.
        namespace: Option<String>,
        attributes: Vec<Attribute>,
        /// Namespace declarations made on this element (`xmlns`, `xmlns:p`).
        namespaces: Vec<NamespaceDecl>,
    },

    /// Character data. CDATA sections are folded into text on parse.
    Text { content: String },

    Comment { content: String },

    ProcessingInstruction { target: String, data: Option<String> },
}

impl NodeKind {
    /// Builds an element payload with no attributes or declarations.
    pub fn element(name: &str, prefix: Option<&str>, namespace: Option<&str>) -> Self {
        NodeKind::Element {
            name: name.to_string(),
            prefix: prefix.map(str::to_string),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Element { .. })
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The local name (`lang` for `xml:lang`).
    pub name: String,
    pub value: String,
    /// The prefix as written, if any.
    pub prefix: Option<String>,
    pub namespace: Option<String>,
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Self {
        Attribute {
            name: name.to_string(),
            value: value.to_string(),
            prefix: None,
            namespace: None,
        }
    }

    /// `prefix:name`, or just `name` when unprefixed.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A namespace declaration. `prefix` is `None` for the default namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

impl NamespaceDecl {
    pub fn new(prefix: Option<&str>, uri: &str) -> Self {
        NamespaceDecl {
            prefix: prefix.map(str::to_string),
            uri: uri.to_string(),
        }
    }
}
