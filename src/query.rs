//! Runs path queries against a document and snapshots the matches.

use crate::context::ContextResolver;
use crate::error::{Error, Result};
use crate::namespace::NamespaceTable;
use domq_dom::{Document, DocumentId, DomNode, NodeId, NodeKind};
use domq_xpath1::select_nodes;
use log::{debug, trace};

/// A handle to a node of a particular document.
///
/// Handles stay valid after the node is removed from its tree; the node can
/// still be read, it just no longer matches queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    doc: DocumentId,
    node: NodeId,
    attribute: Option<usize>,
}

impl NodeRef {
    pub(crate) fn new(doc: DocumentId, node: NodeId) -> Self {
        Self {
            doc,
            node,
            attribute: None,
        }
    }

    fn from_dom(node: &DomNode<'_>) -> Self {
        Self {
            doc: node.document().id(),
            node: node.id(),
            attribute: node.attribute_index(),
        }
    }

    pub fn document(&self) -> DocumentId {
        self.doc
    }

    /// The node, or the owner element of an attribute.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Index into the owner's attributes when this is an attribute.
    pub fn attribute(&self) -> Option<usize> {
        self.attribute
    }

    pub fn is_attribute(&self) -> bool {
        self.attribute.is_some()
    }

    pub(crate) fn dom<'d>(&self, doc: &'d Document) -> DomNode<'d> {
        match self.attribute {
            Some(index) => DomNode::attribute(doc, self.node, index),
            None => DomNode::new(doc, self.node),
        }
    }
}

/// The matches of one query, in document order.
///
/// The list is a snapshot: editing the tree afterwards does not change its
/// length or what each index refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultList {
    doc: DocumentId,
    nodes: Vec<NodeRef>,
}

impl ResultList {
    pub fn empty(doc: DocumentId) -> Self {
        Self {
            doc,
            nodes: Vec::new(),
        }
    }

    pub fn document(&self) -> DocumentId {
        self.doc
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<NodeRef> {
        self.nodes.get(index).copied()
    }

    pub fn first(&self) -> Option<NodeRef> {
        self.item(0)
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, NodeRef>> {
        self.nodes.iter().copied()
    }

    pub fn as_slice(&self) -> &[NodeRef] {
        &self.nodes
    }
}

impl<'l> IntoIterator for &'l ResultList {
    type Item = NodeRef;
    type IntoIter = std::iter::Copied<std::slice::Iter<'l, NodeRef>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for ResultList {
    type Item = NodeRef;
    type IntoIter = std::vec::IntoIter<NodeRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

/// Evaluates queries with every prefix of a [`NamespaceTable`] bound.
pub struct QueryEngine<'d> {
    doc: &'d Document,
    namespaces: &'d NamespaceTable,
}

impl<'d> QueryEngine<'d> {
    pub fn new(doc: &'d Document, namespaces: &'d NamespaceTable) -> Self {
        Self { doc, namespaces }
    }

    /// Runs `query`, scoped to `context` when one is given.
    ///
    /// An attached context is addressed by its absolute path with namespace
    /// prefixes repaired, and the query is appended to that path. A detached
    /// context, or a query with a branch that starts with a function call, is
    /// bound as the evaluator's context node instead.
    pub fn execute(&self, query: &str, context: Option<NodeRef>) -> Result<ResultList> {
        let root = DomNode::root(self.doc);
        let (expression, context_node) = match context {
            None => (query.to_string(), root),
            Some(node) if self.is_document_node(node) => (query.to_string(), root),
            Some(node) if split_union(query).iter().any(|b| starts_with_call(b)) => {
                (query.to_string(), node.dom(self.doc))
            }
            Some(node) if self.doc.is_attached(node.node) => {
                let path = ContextResolver::new(self.doc, self.namespaces).context_path(node)?;
                (scope(&path, query), root)
            }
            Some(node) => (scope(".", query), node.dom(self.doc)),
        };

        debug!("Executing '{expression}'");
        let bindings = self.namespaces.bindings();
        let matches = select_nodes(&expression, root, context_node, &bindings)
            .map_err(|e| Error::query(&expression, e))?;
        trace!("'{expression}' matched {} nodes", matches.len());

        Ok(ResultList {
            doc: self.doc.id(),
            nodes: matches.iter().map(NodeRef::from_dom).collect(),
        })
    }

    /// The first match, or `None` when nothing matches.
    pub fn single(&self, query: &str, context: Option<NodeRef>) -> Result<Option<NodeRef>> {
        Ok(self.execute(query, context)?.first())
    }

    fn is_document_node(&self, node: NodeRef) -> bool {
        node.attribute.is_none() && matches!(self.doc.kind(node.node), NodeKind::Document)
    }
}

/// Prefixes every top-level branch of `query` with the context path.
///
/// `.` is the context itself, `./x` and `.//x` continue from it, a leading
/// `/` or `//` continues from it too, and anything else is a child step. A
/// parenthesised branch is scoped inside its parentheses, so `(.//b)[1]`
/// becomes `(<context>//b)[1]`.
pub fn scope(context: &str, query: &str) -> String {
    split_union(query)
        .into_iter()
        .map(|branch| {
            let branch = branch.trim();
            if branch == "." {
                return context.to_string();
            }
            if let Some(close) = closing_paren(branch) {
                let inner = scope(context, &branch[1..close]);
                return format!("({inner}){}", &branch[close + 1..]);
            }
            match branch.strip_prefix('.') {
                Some(rest) if rest.starts_with('/') => format!("{context}{rest}"),
                _ if branch.starts_with('/') => format!("{context}{branch}"),
                _ => format!("{context}/{branch}"),
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// The index of the `)` matching a leading `(`.
fn closing_paren(branch: &str) -> Option<usize> {
    if !branch.starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in branch.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

/// Whether `branch` starts with a function call such as `id('x')`. Node-type
/// tests like `text()` are steps, not calls.
fn starts_with_call(branch: &str) -> bool {
    let branch = branch.trim_start();
    let name_len = branch
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
        .unwrap_or(branch.len());
    let (name, rest) = branch.split_at(name_len);
    let starts_name = name.starts_with(|c: char| c.is_alphabetic() || c == '_');
    starts_name
        && !name.contains("::")
        && rest.trim_start().starts_with('(')
        && !matches!(name, "text" | "node" | "comment" | "processing-instruction")
}

/// Splits on `|` outside of literals, predicates and parentheses.
fn split_union(query: &str) -> Vec<&str> {
    let mut branches = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in query.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '[' | '(' => depth += 1,
                ']' | ')' => depth = depth.saturating_sub(1),
                '|' if depth == 0 => {
                    branches.push(&query[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    branches.push(&query[start..]);
    branches
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = "<note><to>Tove</to><from>Jani</from><body>Don't forget me</body></note>";

    fn values(doc: &Document, list: &ResultList) -> Vec<String> {
        use domq_xpath1::DataSourceNode;
        list.iter().map(|n| n.dom(doc).string_value()).collect()
    }

    #[test]
    fn test_scope_rules() {
        assert_eq!(scope("/a/b", "c"), "/a/b/c");
        assert_eq!(scope("/a/b", "//c"), "/a/b//c");
        assert_eq!(scope("/a/b", "/c"), "/a/b/c");
        assert_eq!(scope("/a/b", ".//c"), "/a/b//c");
        assert_eq!(scope("/a/b", "./c"), "/a/b/c");
        assert_eq!(scope("/a/b", "."), "/a/b");
        assert_eq!(scope("/a/b", "@id"), "/a/b/@id");
        assert_eq!(scope("/a", "x | .//y"), "/a/x | /a//y");
        assert_eq!(scope(".", "//c"), ".//c");
        assert_eq!(scope("/a/b", "(.//c)[1]"), "(/a/b//c)[1]");
        assert_eq!(scope("/a", "(x | y)[last()]/z"), "(/a/x | /a/y)[last()]/z");
    }

    #[test]
    fn test_function_call_branches() {
        assert!(starts_with_call("id('x')/y"));
        assert!(starts_with_call(" ex:f (1)"));
        assert!(!starts_with_call("text()"));
        assert!(!starts_with_call("child::x"));
        assert!(!starts_with_call("(x)[1]"));
        assert!(!starts_with_call("x[f(1)]"));
    }

    #[test]
    fn test_split_union_respects_nesting() {
        assert_eq!(
            split_union("a[@x='|'] | b[c|d]|(e|f)"),
            vec!["a[@x='|'] ", " b[c|d]", "(e|f)"]
        );
    }

    #[test]
    fn test_execute_without_context() {
        let doc = Document::parse(NOTE).unwrap();
        let table = NamespaceTable::new();
        let engine = QueryEngine::new(&doc, &table);
        let list = engine.execute("//from | //to", None).unwrap();
        assert_eq!(values(&doc, &list), vec!["Tove", "Jani"]);
        assert!(engine.execute("//missing", None).unwrap().is_empty());
        assert_eq!(engine.single("//missing", None).unwrap(), None);
    }

    #[test]
    fn test_execute_with_context() {
        let doc = Document::parse("<r><a><b>1</b></a><a><b>2</b><c><b>3</b></c></a></r>").unwrap();
        let table = NamespaceTable::new();
        let engine = QueryEngine::new(&doc, &table);
        let second = engine.execute("/r/a", None).unwrap().item(1).unwrap();

        let list = engine.execute("b", Some(second)).unwrap();
        assert_eq!(values(&doc, &list), vec!["2"]);
        let list = engine.execute(".//b", Some(second)).unwrap();
        assert_eq!(values(&doc, &list), vec!["2", "3"]);
        let list = engine.execute("//b", Some(second)).unwrap();
        assert_eq!(values(&doc, &list), vec!["2", "3"]);
    }

    #[test]
    fn test_parenthesised_query_with_context() {
        let doc = Document::parse("<r><a><b>1</b><c><b>2</b></c></a><a><b>3</b></a></r>").unwrap();
        let table = NamespaceTable::new();
        let engine = QueryEngine::new(&doc, &table);
        let first = engine.single("/r/a", None).unwrap();

        let list = engine.execute("(.//b)[last()]", first).unwrap();
        assert_eq!(values(&doc, &list), vec!["2"]);
        let list = engine.execute("(b | c/b)[1]", first).unwrap();
        assert_eq!(values(&doc, &list), vec!["1"]);
    }

    #[test]
    fn test_function_call_query_binds_context_natively() {
        let doc = Document::parse(r#"<r><a id="x"><b>1</b></a><b>2</b></r>"#).unwrap();
        let table = NamespaceTable::new();
        let engine = QueryEngine::new(&doc, &table);
        let a = engine.single("/r/a", None).unwrap();
        let list = engine.execute("id('x')/b", a).unwrap();
        assert_eq!(values(&doc, &list), vec!["1"]);
    }

    #[test]
    fn test_detached_context_binds_natively() {
        let mut doc = Document::parse(NOTE).unwrap();
        let fragment = Document::parse("<x><y>in</y></x>").unwrap();
        let copy = doc
            .import_node(&fragment, fragment.root_element().unwrap())
            .unwrap();
        let table = NamespaceTable::new();
        let engine = QueryEngine::new(&doc, &table);
        let context = NodeRef::new(doc.id(), copy);
        let list = engine.execute("//y", Some(context)).unwrap();
        assert_eq!(values(&doc, &list), vec!["in"]);
    }

    #[test]
    fn test_invalid_query_is_a_query_syntax_error() {
        let doc = Document::parse(NOTE).unwrap();
        let table = NamespaceTable::new();
        let engine = QueryEngine::new(&doc, &table);
        assert!(matches!(
            engine.execute("//to[", None),
            Err(Error::QuerySyntax { .. })
        ));
        assert!(matches!(
            engine.execute("//x:to", None),
            Err(Error::QuerySyntax { .. })
        ));
    }

    #[test]
    fn test_attribute_results() {
        let doc = Document::parse(r#"<a id="1"><b id="2"/></a>"#).unwrap();
        let table = NamespaceTable::new();
        let list = QueryEngine::new(&doc, &table).execute("//@id", None).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|n| n.is_attribute()));
        assert_eq!(values(&doc, &list), vec!["1", "2"]);
    }
}
