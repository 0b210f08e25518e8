//! The arena-backed document tree.
//!
//! All nodes of a [`Document`] live in a single `Vec`, addressed by [`NodeId`].
//! Nodes are never freed: removing a node only unlinks it, so a `NodeId`
//! handed out earlier stays valid (and readable) for the document's lifetime.

mod node;

pub use node::{Attribute, NamespaceDecl, NodeKind};

use crate::error::DomError;
use std::cell::OnceCell;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

/// A typed index into a document's node arena.
///
/// `Option<NodeId>` is the same size as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().and_then(NonZeroU32::new).map(Self)
    }

    fn as_index(self) -> usize {
        self.0.get() as usize
    }

    /// The raw, always non-zero, arena index.
    pub fn into_raw(self) -> u32 {
        self.0.get()
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Process-unique identity of a document.
///
/// Node handles carry it so a handle from one tree is never silently
/// interpreted against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        DocumentId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Storage for a single node: its payload and its links.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    /// Kept for O(1) append.
    pub last_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// A mutable XML document.
///
/// Navigation goes through `&Document`, mutation through `&mut Document`.
///
/// ```
/// use domq_dom::Document;
///
/// let doc = Document::parse("<note><to>Tove</to></note>").unwrap();
/// let note = doc.root_element().unwrap();
/// assert_eq!(doc.local_name(note), Some("note"));
/// assert_eq!(doc.text_content(note), "Tove");
/// ```
#[derive(Debug)]
pub struct Document {
    /// Index 0 is a placeholder so ids can be `NonZeroU32`.
    nodes: Vec<NodeData>,
    root: NodeId,
    id: DocumentId,
    /// Pre-order position of every attached node, rebuilt lazily after a mutation.
    order: OnceCell<Vec<u32>>,
}

impl Document {
    /// Creates a document holding only the document node.
    pub fn new() -> Self {
        let nodes = vec![
            NodeData::new(NodeKind::Document),
            NodeData::new(NodeKind::Document),
        ];
        Self {
            nodes,
            root: NodeId(NonZeroU32::MIN),
            id: DocumentId::next(),
            order: OnceCell::new(),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// The document node (not the root element).
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The first element child of the document node.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root).find(|&c| self.is_element(c))
    }

    /// Whether `id` was allocated by this document.
    pub fn contains(&self, id: NodeId) -> bool {
        id.as_index() < self.nodes.len()
    }

    /// # Panics
    ///
    /// Panics if `id` was not allocated by this document.
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.order.take();
        &mut self.nodes[id.as_index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.node_mut(id).kind
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.kind(id).is_element()
    }

    // --- Names ---

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { prefix, .. } => prefix.as_deref(),
            _ => None,
        }
    }

    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// The element name as written: `prefix:local` or `local`.
    pub fn qualified_name(&self, id: NodeId) -> Option<String> {
        match self.kind(id) {
            NodeKind::Element {
                name,
                prefix: Some(p),
                ..
            } => Some(format!("{p}:{name}")),
            NodeKind::Element { name, .. } => Some(name.clone()),
            _ => None,
        }
    }

    // --- Content ---

    /// Concatenation of all descendant text, or the node's own text for
    /// text and comment nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::Text { content } | NodeKind::Comment { content } => content.clone(),
            NodeKind::ProcessingInstruction { data, .. } => data.clone().unwrap_or_default(),
            NodeKind::Element { .. } | NodeKind::Document => self
                .descendants(id)
                .filter_map(|d| match self.kind(d) {
                    NodeKind::Text { content } => Some(content.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Value of the attribute with this qualified name (`id`, `xml:lang`).
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.qualified_name() == name)
            .map(|a| a.value.as_str())
    }

    /// Declarations made directly on this element.
    pub fn namespace_declarations(&self, id: NodeId) -> &[NamespaceDecl] {
        match self.kind(id) {
            NodeKind::Element { namespaces, .. } => namespaces,
            _ => &[],
        }
    }

    /// Declarations in scope at `id`, nearest first, one per prefix.
    pub fn in_scope_namespaces(&self, id: NodeId) -> Vec<NamespaceDecl> {
        let mut scope: Vec<NamespaceDecl> = Vec::new();
        for ancestor in self.ancestors(id) {
            for decl in self.namespace_declarations(ancestor) {
                if !scope.iter().any(|d| d.prefix == decl.prefix) {
                    scope.push(decl.clone());
                }
            }
        }
        scope
    }

    // --- Navigation ---

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// The node itself followed by its ancestors up to the top of its tree.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Pre-order walk of everything below `id`, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// Whether `id` is reachable from the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == self.root)
    }

    /// Position of `id` in document order. Detached nodes sort last.
    pub(crate) fn document_order(&self, id: NodeId) -> u32 {
        let order = self.order.get_or_init(|| {
            let mut order = vec![u32::MAX; self.nodes.len()];
            order[self.root.as_index()] = 0;
            for (position, node) in self.descendants(self.root).enumerate() {
                order[node.as_index()] = u32::try_from(position + 1).unwrap_or(u32::MAX);
            }
            order
        });
        order.get(id.as_index()).copied().unwrap_or(u32::MAX)
    }

    // --- Mutation ---

    /// Allocates a detached node.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData::new(kind));
        self.order.take();
        match NodeId::from_index(self.nodes.len() - 1) {
            Some(id) => id,
            None => unreachable!("arena index overflowed u32"),
        }
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create_node(NodeKind::element(name, None, None))
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::Text {
            content: content.to_string(),
        })
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        for id in [parent, child] {
            if !self.contains(id) {
                return Err(DomError::UnknownNode(id.into_raw()));
            }
        }
        match self.kind(parent) {
            NodeKind::Element { .. } | NodeKind::Document => {}
            _ => {
                return Err(DomError::Hierarchy(format!(
                    "node {parent} cannot have children"
                )));
            }
        }
        if matches!(self.kind(child), NodeKind::Document) {
            return Err(DomError::Hierarchy(
                "the document node cannot be inserted".to_string(),
            ));
        }
        if self.ancestors(parent).any(|a| a == child) {
            return Err(DomError::Hierarchy(format!(
                "node {child} is an ancestor of {parent}"
            )));
        }
        Ok(())
    }

    /// Makes `child` the last child of `parent`, moving it if it is attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child);

        self.node_mut(child).parent = Some(parent);
        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
        } else {
            self.node_mut(parent).first_child = Some(child);
        }
        self.node_mut(parent).last_child = Some(child);
        Ok(())
    }

    /// Inserts `new_child` immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, new_child: NodeId) -> Result<(), DomError> {
        if reference == new_child {
            return Ok(());
        }
        let parent = self
            .parent(reference)
            .ok_or_else(|| DomError::Hierarchy(format!("node {reference} has no parent")))?;
        self.check_insert(parent, new_child)?;
        self.detach(new_child);

        self.node_mut(new_child).parent = Some(parent);
        if let Some(prev) = self.node(reference).prev_sibling {
            self.node_mut(prev).next_sibling = Some(new_child);
            self.node_mut(new_child).prev_sibling = Some(prev);
        } else {
            self.node_mut(parent).first_child = Some(new_child);
        }
        self.node_mut(new_child).next_sibling = Some(reference);
        self.node_mut(reference).prev_sibling = Some(new_child);
        Ok(())
    }

    /// Inserts `new_child` immediately after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, new_child: NodeId) -> Result<(), DomError> {
        match self.next_sibling(reference) {
            Some(next) => self.insert_before(next, new_child),
            None => {
                let parent = self.parent(reference).ok_or_else(|| {
                    DomError::Hierarchy(format!("node {reference} has no parent"))
                })?;
                self.append_child(parent, new_child)
            }
        }
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        match self.first_child(parent) {
            Some(first) => self.insert_before(first, child),
            None => self.append_child(parent, child),
        }
    }

    /// Puts `new_child` where `old` was and detaches `old`.
    pub fn replace_child(&mut self, old: NodeId, new_child: NodeId) -> Result<(), DomError> {
        if old == new_child {
            return Ok(());
        }
        self.insert_before(old, new_child)?;
        self.detach(old);
        Ok(())
    }

    /// Unlinks `id` from its parent. The node stays readable.
    pub fn remove_child(&mut self, id: NodeId) -> Result<(), DomError> {
        if !self.contains(id) {
            return Err(DomError::UnknownNode(id.into_raw()));
        }
        if self.parent(id).is_none() {
            return Err(DomError::Hierarchy(format!("node {id} has no parent")));
        }
        self.detach(id);
        Ok(())
    }

    /// Unlinks a node from its parent; a no-op for a detached node.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Sets an unqualified attribute, replacing an existing one of the same name.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match self.kind_mut(id) {
            NodeKind::Element { attributes, .. } => {
                match attributes
                    .iter_mut()
                    .find(|a| a.namespace.is_none() && a.name == name)
                {
                    Some(existing) => existing.value = value.to_string(),
                    None => attributes.push(Attribute::new(name, value)),
                }
                Ok(())
            }
            _ => Err(DomError::NotAnElement(id.into_raw())),
        }
    }

    /// Removes an attribute by qualified name, returning whether one was removed.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        match self.kind_mut(id) {
            NodeKind::Element { attributes, .. } => {
                let before = attributes.len();
                attributes.retain(|a| a.qualified_name() != name);
                attributes.len() != before
            }
            _ => false,
        }
    }

    /// Adds or overwrites the declaration for `prefix` on an element.
    pub fn declare_namespace(
        &mut self,
        id: NodeId,
        prefix: Option<&str>,
        uri: &str,
    ) -> Result<(), DomError> {
        match self.kind_mut(id) {
            NodeKind::Element { namespaces, .. } => {
                match namespaces.iter_mut().find(|d| d.prefix.as_deref() == prefix) {
                    Some(existing) => existing.uri = uri.to_string(),
                    None => namespaces.push(NamespaceDecl::new(prefix, uri)),
                }
                Ok(())
            }
            _ => Err(DomError::NotAnElement(id.into_raw())),
        }
    }

    /// Number of arena slots in use, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        let mut cursor = Some(current);
        while let Some(node) = cursor {
            if node == self.root {
                break;
            }
            if let Some(sibling) = self.doc.next_sibling(node) {
                self.next = Some(sibling);
                return Some(current);
            }
            cursor = self.doc.parent(node);
        }

        self.next = None;
        Some(current)
    }
}
