//! Turning caller-supplied contexts into nodes of a document.
//!
//! A context node is handed to the query engine as an absolute path. Node
//! paths are written with the names as they appear in the markup, so an
//! element in a default namespace shows up unprefixed and would only match
//! elements in no namespace at all. [`ContextResolver::context_path`]
//! rewrites every namespaced step to a prefix the table binds to that
//! namespace before the path is used.

use crate::document::DomDoc;
use crate::error::{Error, Result};
use crate::namespace::NamespaceTable;
use crate::query::{NodeRef, QueryEngine, ResultList};
use domq_dom::{Document, DomError, NodeKind, render_path};
use log::debug;

/// Where a query or an edit applies.
#[derive(Debug, Clone, Copy, Default)]
pub enum ContextArgument<'a> {
    /// The whole document, or its root element for edits.
    #[default]
    None,
    /// The first node matched by a path query.
    Query(&'a str),
    Node(NodeRef),
    /// The first node of a list; [`DomDoc::remove`] uses all of them.
    List(&'a ResultList),
    /// A node of another document, imported before use.
    Foreign { doc: &'a DomDoc, node: NodeRef },
}

impl<'a> From<&'a str> for ContextArgument<'a> {
    fn from(query: &'a str) -> Self {
        ContextArgument::Query(query)
    }
}

impl From<NodeRef> for ContextArgument<'_> {
    fn from(node: NodeRef) -> Self {
        ContextArgument::Node(node)
    }
}

impl From<Option<NodeRef>> for ContextArgument<'_> {
    fn from(node: Option<NodeRef>) -> Self {
        node.map_or(ContextArgument::None, ContextArgument::Node)
    }
}

impl<'a> From<&'a ResultList> for ContextArgument<'a> {
    fn from(list: &'a ResultList) -> Self {
        ContextArgument::List(list)
    }
}

/// New content for the editing helpers.
#[derive(Debug, Clone, Copy)]
pub enum Content<'a> {
    /// Markup parsed with [`DomDoc::create_element_from_xml`].
    Markup(&'a str),
    /// A node of the same document, moved into place.
    Node(NodeRef),
    /// A node of another document, copied into place.
    Foreign { doc: &'a DomDoc, node: NodeRef },
    /// The root element of another document, copied into place.
    Document(&'a DomDoc),
}

impl<'a> From<&'a str> for Content<'a> {
    fn from(markup: &'a str) -> Self {
        Content::Markup(markup)
    }
}

impl From<NodeRef> for Content<'_> {
    fn from(node: NodeRef) -> Self {
        Content::Node(node)
    }
}

impl<'a> From<&'a DomDoc> for Content<'a> {
    fn from(doc: &'a DomDoc) -> Self {
        Content::Document(doc)
    }
}

pub struct ContextResolver<'d> {
    doc: &'d Document,
    namespaces: &'d NamespaceTable,
}

impl<'d> ContextResolver<'d> {
    pub fn new(doc: &'d Document, namespaces: &'d NamespaceTable) -> Self {
        Self { doc, namespaces }
    }

    /// Resolves `argument` to a node of this document, `None` meaning the
    /// whole document.
    ///
    /// A query that matches nothing and an empty list are resolution errors.
    /// A node of another document must be imported first; see
    /// [`DomDoc::adopt`].
    pub fn resolve(&self, argument: &ContextArgument<'_>) -> Result<Option<NodeRef>> {
        match self.resolve_lenient(argument)? {
            Some(node) => Ok(Some(node)),
            None => match argument {
                ContextArgument::None => Ok(None),
                ContextArgument::Query(query) => Err(Error::ContextResolution(format!(
                    "'{query}' matched no nodes"
                ))),
                _ => Err(Error::ContextResolution("the node list is empty".to_string())),
            },
        }
    }

    /// Like [`resolve`](Self::resolve), but a query or list without a first
    /// node resolves to `None`.
    pub fn resolve_lenient(&self, argument: &ContextArgument<'_>) -> Result<Option<NodeRef>> {
        match argument {
            ContextArgument::None => Ok(None),
            ContextArgument::Query(query) => {
                QueryEngine::new(self.doc, self.namespaces).single(query, None)
            }
            ContextArgument::Node(node) => self.check(*node).map(Some),
            ContextArgument::List(list) => list.first().map(|n| self.check(n)).transpose(),
            ContextArgument::Foreign { node, .. } => self.check(*node).map(Some),
        }
    }

    /// Resolves `argument`, defaulting to the root element.
    pub fn resolve_or_root(&self, argument: &ContextArgument<'_>) -> Result<NodeRef> {
        match self.resolve(argument)? {
            Some(node) => Ok(node),
            None => self
                .doc
                .root_element()
                .map(|root| NodeRef::new(self.doc.id(), root))
                .ok_or_else(|| {
                    Error::ContextResolution("the document has no root element".to_string())
                }),
        }
    }

    /// Ensures `node` belongs to this document.
    pub fn check(&self, node: NodeRef) -> Result<NodeRef> {
        if node.document() != self.doc.id() {
            return Err(Error::ContextResolution(format!(
                "node {} belongs to another document",
                node.node()
            )));
        }
        if !self.doc.contains(node.node()) {
            return Err(Error::ContextResolution(format!(
                "node {} does not exist",
                node.node()
            )));
        }
        Ok(node)
    }

    /// The absolute path of `node` with every namespaced step carrying a
    /// prefix the namespace table binds to that step's namespace.
    pub fn context_path(&self, node: NodeRef) -> Result<String> {
        let mut segments = self.doc.path_segments(node.node(), node.attribute());
        let mut repaired = false;

        for segment in &mut segments {
            let Some(uri) = segment.namespace().map(str::to_string) else {
                continue;
            };
            let bound = segment
                .prefix()
                .and_then(|p| self.namespaces.lookup_uri(p))
                .is_some_and(|u| u == uri);
            if bound {
                continue;
            }
            let prefix = self
                .namespaces
                .lookup_prefix(&uri)
                .ok_or_else(|| Error::MissingNamespacePrefix(uri.clone()))?;
            segment.set_prefix(Some(prefix));
            repaired = true;
        }

        let path = render_path(&segments);
        if repaired {
            debug!(
                "Repaired context path {} to {path}",
                self.doc.node_path(node.node())
            );
        }
        Ok(path)
    }
}

/// Copies `node` of `source` into `target`, registering the source's
/// namespace bindings in `namespaces`. The copy is detached.
pub(crate) fn import(
    target: &mut Document,
    namespaces: &mut NamespaceTable,
    source: &DomDoc,
    node: NodeRef,
) -> Result<NodeRef> {
    let source_doc = source.document();
    ContextResolver::new(source_doc, source.namespaces()).check(node)?;
    if node.is_attribute() {
        return Err(Error::Dom(DomError::Hierarchy(
            "an attribute cannot be imported as a node".to_string(),
        )));
    }
    if matches!(source_doc.kind(node.node()), NodeKind::Document)
        && source_doc.root_element().is_none()
    {
        return Err(Error::ContextResolution(
            "cannot import an empty document".to_string(),
        ));
    }

    let copy = target.import_node(source_doc, node.node())?;
    namespaces.merge(source.namespaces());
    debug!(
        "Imported {} with {} namespace bindings",
        source_doc.node_path(node.node()),
        source.namespaces().len()
    );
    Ok(NodeRef::new(target.id(), copy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocOptions;

    const FEED: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:m="urn:media"><entry><title>One</title></entry><entry><title>Two</title><m:thumb url="t.png"/></entry></feed>"#;

    fn atom_table() -> NamespaceTable {
        let mut table = NamespaceTable::new();
        table.register("a", "http://www.w3.org/2005/Atom");
        table.register("m", "urn:media");
        table
    }

    fn second_entry(doc: &Document, table: &NamespaceTable) -> NodeRef {
        QueryEngine::new(doc, table)
            .execute("/a:feed/a:entry", None)
            .unwrap()
            .item(1)
            .unwrap()
    }

    #[test]
    fn test_default_namespace_steps_are_prefixed() {
        let doc = Document::parse(FEED).unwrap();
        let table = atom_table();
        let entry = second_entry(&doc, &table);
        assert_eq!(doc.node_path(entry.node()), "/feed/entry[2]");

        let resolver = ContextResolver::new(&doc, &table);
        assert_eq!(resolver.context_path(entry).unwrap(), "/a:feed/a:entry[2]");
    }

    #[test]
    fn test_bound_prefixes_are_kept() {
        let doc = Document::parse(FEED).unwrap();
        let table = atom_table();
        let thumb = QueryEngine::new(&doc, &table)
            .single("//m:thumb", None)
            .unwrap()
            .unwrap();
        let path = ContextResolver::new(&doc, &table).context_path(thumb).unwrap();
        assert_eq!(path, "/a:feed/a:entry[2]/m:thumb");
    }

    #[test]
    fn test_missing_prefix() {
        let doc = Document::parse(FEED).unwrap();
        let mut table = atom_table();
        let entry = second_entry(&doc, &table);
        table.remove("a").unwrap();
        let err = ContextResolver::new(&doc, &table)
            .context_path(entry)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingNamespacePrefix(uri) if uri == "http://www.w3.org/2005/Atom"
        ));
    }

    #[test]
    fn test_resolve_forms() {
        let doc = Document::parse(FEED).unwrap();
        let table = atom_table();
        let resolver = ContextResolver::new(&doc, &table);

        assert_eq!(resolver.resolve(&ContextArgument::None).unwrap(), None);
        let root = resolver.resolve_or_root(&ContextArgument::None).unwrap();
        assert_eq!(Some(root.node()), doc.root_element());

        let entry = resolver.resolve(&"//a:entry".into()).unwrap().unwrap();
        assert_eq!(resolver.resolve(&entry.into()).unwrap(), Some(entry));

        assert!(matches!(
            resolver.resolve(&"//a:missing".into()),
            Err(Error::ContextResolution(_))
        ));
        assert_eq!(resolver.resolve_lenient(&"//a:missing".into()).unwrap(), None);

        let empty = ResultList::empty(doc.id());
        assert!(matches!(
            resolver.resolve(&(&empty).into()),
            Err(Error::ContextResolution(_))
        ));
    }

    #[test]
    fn test_nodes_of_other_documents_are_rejected() {
        let doc = Document::parse(FEED).unwrap();
        let other = Document::parse("<x/>").unwrap();
        let table = atom_table();
        let foreign = NodeRef::new(other.id(), other.root_element().unwrap());
        assert!(matches!(
            ContextResolver::new(&doc, &table).resolve(&foreign.into()),
            Err(Error::ContextResolution(_))
        ));
    }

    #[test]
    fn test_import_carries_bindings() {
        let options = DocOptions::default().with_default_prefix("atom");
        let mut source = DomDoc::parse(FEED, options).unwrap();
        let title = source
            .xpath_single("//atom:title", ContextArgument::None)
            .unwrap()
            .unwrap();

        let mut target = Document::parse("<list/>").unwrap();
        let mut table = NamespaceTable::new();
        let copy = import(&mut target, &mut table, &source, title).unwrap();
        assert_eq!(copy.document(), target.id());
        assert!(!target.is_attached(copy.node()));
        assert_eq!(table.lookup_uri("atom"), Some("http://www.w3.org/2005/Atom"));
        assert_eq!(table.lookup_uri("m"), Some("urn:media"));
    }
}
