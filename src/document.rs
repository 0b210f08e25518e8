//! [`DomDoc`]: a document together with the prefixes its queries use.

use crate::config::DocOptions;
use crate::context::{self, Content, ContextArgument, ContextResolver};
use crate::error::{Error, Result};
use crate::namespace::NamespaceTable;
use crate::query::{NodeRef, QueryEngine, ResultList};
use domq_dom::{Document, DomError, Edit, NodeId, NodeKind, SerializeOptions};
use domq_selector::{compile, compile_relative};
use domq_xpath1::DataSourceNode;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// What [`DomDoc::to_value`] attaches under `#raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Raw {
    #[default]
    None,
    /// The node's own markup.
    Full,
    /// The markup of the node's children.
    Inner,
}

#[derive(Debug)]
pub struct DomDoc {
    doc: Document,
    namespaces: NamespaceTable,
    options: DocOptions,
}

impl DomDoc {
    /// Parses `xml` and registers the root element's namespaces as
    /// `options.namespaces` asks.
    ///
    /// With `options.strict` off, markup that fails to parse gives an empty
    /// document instead of an error.
    pub fn parse(xml: &str, options: DocOptions) -> Result<Self> {
        let doc = match Document::parse(xml) {
            Ok(doc) => doc,
            Err(e) if !options.strict => {
                warn!("Could not parse markup, continuing with an empty document: {e}");
                Document::new()
            }
            Err(e) => return Err(Error::Parse(e)),
        };
        Ok(Self::with_document(doc, options))
    }

    pub fn empty() -> Self {
        Self::with_document(Document::new(), DocOptions::default())
    }

    fn with_document(doc: Document, options: DocOptions) -> Self {
        let mut namespaces = NamespaceTable::new();
        namespaces.discover(&doc, &options.namespaces);
        Self {
            doc,
            namespaces,
            options,
        }
    }

    /// A new document whose root element is a copy of `node` of `source`.
    ///
    /// The new document starts from the source's namespace table.
    pub fn from_node(source: &DomDoc, node: NodeRef, options: DocOptions) -> Result<Self> {
        let mut doc = Document::new();
        let mut namespaces = source.namespaces.clone();
        let copy = context::import(&mut doc, &mut namespaces, source, node)?;
        let root = doc.root();
        doc.append_child(root, copy.node())?;
        namespaces.discover(&doc, &options.namespaces);
        Ok(Self {
            doc,
            namespaces,
            options,
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn options(&self) -> &DocOptions {
        &self.options
    }

    fn resolver(&self) -> ContextResolver<'_> {
        ContextResolver::new(&self.doc, &self.namespaces)
    }

    fn engine(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.doc, &self.namespaces)
    }

    fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions {
            html_void_elements: self.options.html_void_elements,
        }
    }

    // --- Queries ---

    /// Runs an XPath query, scoped to `ctx` when one is given.
    ///
    /// A node of another document is imported first and the query runs
    /// against the detached copy, so the results belong to this document.
    pub fn xpath<'a>(
        &mut self,
        query: &str,
        ctx: impl Into<ContextArgument<'a>>,
    ) -> Result<ResultList> {
        let context = self.query_context(ctx.into())?;
        self.engine().execute(query, context)
    }

    /// The first match of `query`, `None` when nothing matches.
    pub fn xpath_single<'a>(
        &mut self,
        query: &str,
        ctx: impl Into<ContextArgument<'a>>,
    ) -> Result<Option<NodeRef>> {
        Ok(self.xpath(query, ctx)?.first())
    }

    /// Runs a CSS selector. With a context, only nodes below it match.
    pub fn select<'a>(
        &mut self,
        selector: &str,
        ctx: impl Into<ContextArgument<'a>>,
    ) -> Result<ResultList> {
        let context = self.query_context(ctx.into())?;
        let compiled = match context {
            Some(_) => compile_relative(selector)?,
            None => compile(selector)?,
        };
        self.engine().execute(&compiled.to_xpath(), context)
    }

    pub fn select_single<'a>(
        &mut self,
        selector: &str,
        ctx: impl Into<ContextArgument<'a>>,
    ) -> Result<Option<NodeRef>> {
        Ok(self.select(selector, ctx)?.first())
    }

    fn query_context(&mut self, ctx: ContextArgument<'_>) -> Result<Option<NodeRef>> {
        match ctx {
            ContextArgument::Foreign { doc, node } if doc.doc.id() != self.doc.id() => {
                self.adopt(doc, node).map(Some)
            }
            other => self.resolver().resolve(&other),
        }
    }

    /// The string value of a node: text content, or an attribute's value.
    pub fn value(&self, node: NodeRef) -> Result<String> {
        let node = self.resolver().check(node)?;
        Ok(node.dom(&self.doc).string_value())
    }

    /// The qualified name of an element, attribute or processing instruction.
    pub fn name(&self, node: NodeRef) -> Result<Option<String>> {
        let node = self.resolver().check(node)?;
        Ok(node.dom(&self.doc).name().map(|q| match q.prefix {
            Some(prefix) => format!("{prefix}:{}", q.local_part),
            None => q.local_part.to_string(),
        }))
    }

    // --- Namespaces ---

    pub fn register_namespace(&mut self, prefix: &str, uri: &str) {
        self.namespaces.register(prefix, uri);
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    pub fn lookup_prefix(&self, uri: &str) -> Option<&str> {
        self.namespaces.lookup_prefix(uri)
    }

    pub fn lookup_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces.lookup_uri(prefix)
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.namespaces.default_namespace()
    }

    /// Moves every node in the namespace bound to `prefix` into no namespace,
    /// drops the declarations of that namespace and unregisters `prefix`.
    ///
    /// The tree is either fully updated or left untouched.
    pub fn remove_namespace(&mut self, prefix: &str) -> Result<()> {
        let uri = self
            .namespaces
            .lookup_uri(prefix)
            .ok_or_else(|| Error::UnknownPrefix(prefix.to_string()))?
            .to_string();

        let mut edits = Vec::new();
        for node in self.doc.descendants(self.doc.root()) {
            let NodeKind::Element {
                namespace,
                attributes,
                namespaces,
                ..
            } = self.doc.kind(node)
            else {
                continue;
            };
            for decl in namespaces.iter().filter(|d| d.uri == uri) {
                edits.push(Edit::RemoveNamespaceDeclaration {
                    element: node,
                    prefix: decl.prefix.clone(),
                });
            }
            if namespace.as_deref() == Some(uri.as_str()) {
                edits.push(Edit::SetElementNamespace {
                    element: node,
                    prefix: None,
                    namespace: None,
                });
            }
            for (index, attr) in attributes.iter().enumerate() {
                if attr.namespace.as_deref() == Some(uri.as_str()) {
                    edits.push(Edit::SetAttributeNamespace {
                        element: node,
                        index,
                        prefix: None,
                        namespace: None,
                    });
                }
            }
        }

        let applied = self.doc.apply_edits(edits)?;
        self.namespaces.remove(prefix)?;
        if self.namespaces.default_namespace() == Some(uri.as_str()) {
            self.namespaces.set_default_namespace(None);
        }
        debug!("Removed namespace '{prefix}' ({uri}) with {applied} edits");
        Ok(())
    }

    /// Moves the element at `ctx` and every element below it into `uri`,
    /// written with `prefix`, and registers the prefix. Attributes keep
    /// their namespaces.
    pub fn change_namespace<'a>(
        &mut self,
        ctx: impl Into<ContextArgument<'a>>,
        prefix: &str,
        uri: &str,
    ) -> Result<NodeRef> {
        let target = self.target(ctx.into())?;
        if target.is_attribute() || !self.doc.is_element(target.node()) {
            return Err(Error::Dom(DomError::NotAnElement(target.node().into_raw())));
        }

        let mut edits = vec![Edit::DeclareNamespace {
            element: target.node(),
            prefix: Some(prefix.to_string()),
            uri: uri.to_string(),
        }];
        let subtree = std::iter::once(target.node()).chain(self.doc.descendants(target.node()));
        for node in subtree.filter(|&n| self.doc.is_element(n)) {
            edits.push(Edit::SetElementNamespace {
                element: node,
                prefix: Some(prefix.to_string()),
                namespace: Some(uri.to_string()),
            });
        }
        self.doc.apply_edits(edits)?;
        self.namespaces.register(prefix, uri);
        Ok(target)
    }

    // --- Editing ---

    /// Resolves a context for an edit: the root element by default, and a
    /// node of another document is imported first.
    fn target(&mut self, ctx: ContextArgument<'_>) -> Result<NodeRef> {
        match ctx {
            ContextArgument::Foreign { doc, node } if doc.doc.id() != self.doc.id() => {
                self.adopt(doc, node)
            }
            other => self.resolver().resolve_or_root(&other),
        }
    }

    /// Copies `node` of `source` into this document and registers the
    /// source's namespace bindings. The copy is not attached anywhere.
    pub fn adopt(&mut self, source: &DomDoc, node: NodeRef) -> Result<NodeRef> {
        context::import(&mut self.doc, &mut self.namespaces, source, node)
    }

    fn content(&mut self, content: Content<'_>) -> Result<NodeId> {
        let node = match content {
            Content::Markup(xml) => self.create_element_from_xml(xml)?,
            Content::Node(node) => self.resolver().check(node)?,
            Content::Foreign { doc, node } if doc.doc.id() == self.doc.id() => {
                self.resolver().check(node)?
            }
            Content::Foreign { doc, node } => self.adopt(doc, node)?,
            Content::Document(doc) => {
                let root = doc.doc.root_element().ok_or_else(|| {
                    Error::ContextResolution("cannot insert an empty document".to_string())
                })?;
                self.adopt(doc, NodeRef::new(doc.doc.id(), root))?
            }
        };
        if node.is_attribute() {
            return Err(Error::Dom(DomError::Hierarchy(
                "an attribute cannot be inserted as a node".to_string(),
            )));
        }
        Ok(node.node())
    }

    /// Makes `content` the last child of `ctx` (the root element by default).
    pub fn append<'a, 'b>(
        &mut self,
        content: impl Into<Content<'a>>,
        ctx: impl Into<ContextArgument<'b>>,
    ) -> Result<NodeRef> {
        let new = self.content(content.into())?;
        let target = self.target(ctx.into())?;
        self.doc.append_child(target.node(), new)?;
        Ok(NodeRef::new(self.doc.id(), new))
    }

    /// Makes `content` the first child of `ctx` (the root element by default).
    pub fn prepend<'a, 'b>(
        &mut self,
        content: impl Into<Content<'a>>,
        ctx: impl Into<ContextArgument<'b>>,
    ) -> Result<NodeRef> {
        let new = self.content(content.into())?;
        let target = self.target(ctx.into())?;
        self.doc.prepend_child(target.node(), new)?;
        Ok(NodeRef::new(self.doc.id(), new))
    }

    /// Inserts `content` right after `ctx`.
    pub fn append_sibling<'a, 'b>(
        &mut self,
        content: impl Into<Content<'a>>,
        ctx: impl Into<ContextArgument<'b>>,
    ) -> Result<NodeRef> {
        let new = self.content(content.into())?;
        let target = self.target(ctx.into())?;
        self.doc.insert_after(target.node(), new)?;
        Ok(NodeRef::new(self.doc.id(), new))
    }

    /// Inserts `content` right before `ctx`.
    pub fn prepend_sibling<'a, 'b>(
        &mut self,
        content: impl Into<Content<'a>>,
        ctx: impl Into<ContextArgument<'b>>,
    ) -> Result<NodeRef> {
        let new = self.content(content.into())?;
        let target = self.target(ctx.into())?;
        self.doc.insert_before(target.node(), new)?;
        Ok(NodeRef::new(self.doc.id(), new))
    }

    /// Puts `content` where `ctx` is, returning the inserted node.
    pub fn replace<'a, 'b>(
        &mut self,
        ctx: impl Into<ContextArgument<'a>>,
        content: impl Into<Content<'b>>,
    ) -> Result<NodeRef> {
        let target = self.target(ctx.into())?;
        let new = self.content(content.into())?;
        self.doc.replace_child(target.node(), new)?;
        Ok(NodeRef::new(self.doc.id(), new))
    }

    /// Removes every node `nodes` designates: all matches of a query, every
    /// item of a list, or a single node. Attributes are removed from their
    /// owners. Returns how many nodes were removed.
    pub fn remove<'a>(&mut self, nodes: impl Into<ContextArgument<'a>>) -> Result<usize> {
        let targets: Vec<NodeRef> = match nodes.into() {
            ContextArgument::None => Vec::new(),
            ContextArgument::Query(query) => {
                self.xpath(query, ContextArgument::None)?.into_iter().collect()
            }
            ContextArgument::List(list) => list
                .iter()
                .map(|n| self.resolver().check(n))
                .collect::<Result<_>>()?,
            ContextArgument::Node(node) | ContextArgument::Foreign { node, .. } => {
                vec![self.resolver().check(node)?]
            }
        };

        let mut attributes = Vec::new();
        let mut elements = Vec::new();
        for target in targets {
            match target.attribute() {
                Some(index) => {
                    if let Some(attr) = self.doc.attributes(target.node()).get(index) {
                        attributes.push((target.node(), attr.qualified_name()));
                    }
                }
                None => elements.push(target.node()),
            }
        }

        let mut removed = 0;
        for (owner, name) in attributes {
            if self.doc.remove_attribute(owner, &name) {
                removed += 1;
            }
        }
        for node in elements {
            if self.doc.parent(node).is_some() {
                self.doc.remove_child(node)?;
                removed += 1;
            }
        }
        debug!("Removed {removed} nodes");
        Ok(removed)
    }

    /// Parses a single-element fragment into a detached element of this
    /// document.
    ///
    /// Registered prefixes may be used in the fragment without declaring
    /// them, and namespaces declared on the fragment root are registered.
    pub fn create_element_from_xml(&mut self, xml: &str) -> Result<NodeRef> {
        let fragment = Document::parse_fragment(xml, &self.namespaces.hints())?;
        let mut found = NamespaceTable::new();
        found.discover(&fragment, &self.options.namespaces);
        self.namespaces.merge(&found);

        let root = fragment.root_element().ok_or(DomError::FragmentRoot(0))?;
        let copy = self.doc.import_node(&fragment, root)?;
        Ok(NodeRef::new(self.doc.id(), copy))
    }

    /// A new document holding a copy of `ctx`.
    ///
    /// A query that matches nothing gives an empty document.
    pub fn extract<'a>(&self, ctx: impl Into<ContextArgument<'a>>) -> Result<DomDoc> {
        let options = self.options.clone().with_strict(false);
        let ctx = ctx.into();
        if let ContextArgument::Foreign { doc, node } = ctx
            && doc.doc.id() != self.doc.id()
        {
            return DomDoc::from_node(doc, node, options);
        }
        let node = self.node_or_root(ctx)?;
        match node {
            Some(node) => DomDoc::from_node(self, node, options),
            None => Ok(Self {
                doc: Document::new(),
                namespaces: self.namespaces.clone(),
                options,
            }),
        }
    }

    // --- Output ---

    /// A node of another document, read in place by the output helpers.
    fn foreign<'a>(&self, ctx: &ContextArgument<'a>) -> Option<(&'a DomDoc, NodeRef)> {
        match *ctx {
            ContextArgument::Foreign { doc, node } if doc.doc.id() != self.doc.id() => {
                Some((doc, node))
            }
            _ => None,
        }
    }

    /// The root element when there is no context; `None` for a query that
    /// matches nothing.
    fn node_or_root(&self, ctx: ContextArgument<'_>) -> Result<Option<NodeRef>> {
        match ctx {
            ContextArgument::None => Ok(self
                .doc
                .root_element()
                .map(|root| NodeRef::new(self.doc.id(), root))),
            other => self.resolver().resolve_lenient(&other),
        }
    }

    /// Markup of `ctx`, or of the root element by default. Empty when the
    /// context is a query that matches nothing.
    pub fn out<'a>(&self, ctx: impl Into<ContextArgument<'a>>) -> Result<String> {
        let ctx = ctx.into();
        if let Some((doc, node)) = self.foreign(&ctx) {
            return doc.out(node);
        }
        let node = self.node_or_root(ctx)?;
        Ok(match node {
            Some(node) if node.is_attribute() => node.dom(&self.doc).string_value(),
            Some(node) => self.doc.to_xml(node.node(), &self.serialize_options()),
            None => String::new(),
        })
    }

    /// Markup of the children of `ctx`, or of the root element by default.
    pub fn inner_xml<'a>(&self, ctx: impl Into<ContextArgument<'a>>) -> Result<String> {
        let ctx = ctx.into();
        if let Some((doc, node)) = self.foreign(&ctx) {
            return doc.inner_xml(node);
        }
        let node = self.node_or_root(ctx)?;
        Ok(match node {
            Some(node) if !node.is_attribute() => {
                self.doc.inner_xml(node.node(), &self.serialize_options())
            }
            _ => String::new(),
        })
    }

    /// `ctx` (or the whole document) as nested JSON.
    ///
    /// An element becomes an object with `@name` keys for its attributes.
    /// Child elements are grouped into arrays under their qualified name; a
    /// lone text child becomes `#text` instead. `raw` adds the element's
    /// markup under `#raw`. A query that matches nothing gives `null`.
    pub fn to_value<'a>(&self, ctx: impl Into<ContextArgument<'a>>, raw: Raw) -> Result<Value> {
        let ctx = ctx.into();
        if let Some((doc, node)) = self.foreign(&ctx) {
            return doc.to_value(node, raw);
        }
        let node = match ctx {
            ContextArgument::None => None,
            other => match self.resolver().resolve_lenient(&other)? {
                Some(node) => Some(node),
                None => return Ok(Value::Null),
            },
        };
        Ok(match node {
            Some(node) if node.is_attribute() => {
                Value::String(node.dom(&self.doc).string_value())
            }
            Some(node) => self.element_value(node.node(), raw),
            None => {
                let mut object = Map::new();
                self.push_children(self.doc.root(), raw, &mut object);
                Value::Object(object)
            }
        })
    }

    fn element_value(&self, id: NodeId, raw: Raw) -> Value {
        let mut object = Map::new();
        match raw {
            Raw::Full => {
                let markup = self.doc.to_xml(id, &self.serialize_options());
                object.insert("#raw".into(), markup.into());
            }
            Raw::Inner => {
                let markup = self.doc.inner_xml(id, &self.serialize_options());
                object.insert("#raw".into(), markup.into());
            }
            Raw::None => {}
        }
        for attr in self.doc.attributes(id) {
            object.insert(format!("@{}", attr.qualified_name()), attr.value.clone().into());
        }

        let mut children = self.doc.children(id);
        match (children.next(), children.next()) {
            (Some(only), None) if matches!(self.doc.kind(only), NodeKind::Text { .. }) => {
                object.insert("#text".into(), self.doc.text_content(only).into());
            }
            _ => self.push_children(id, raw, &mut object),
        }
        Value::Object(object)
    }

    fn push_children(&self, id: NodeId, raw: Raw, object: &mut Map<String, Value>) {
        for child in self.doc.children(id).filter(|&c| self.doc.is_element(c)) {
            let Some(name) = self.doc.qualified_name(child) else {
                continue;
            };
            let entry = object
                .entry(name)
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(self.element_value(child, raw));
            }
        }
    }
}

impl Default for DomDoc {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for DomDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.doc.root_element() {
            Some(root) => f.write_str(&self.doc.to_xml(root, &self.serialize_options())),
            None => Ok(()),
        }
    }
}
