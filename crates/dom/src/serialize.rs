//! Turns nodes back into markup.
//!
//! Empty elements are written as `<x></x>`. In HTML-flavoured documents the
//! void elements (`br`, `img`, ...) are self-closed instead when they have no
//! children.

use crate::tree::{Document, NamespaceDecl, NodeId, NodeKind};
use quick_xml::escape::{escape, partial_escape};

pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Self-close empty HTML void elements when the document looks like HTML.
    pub html_void_elements: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            html_void_elements: true,
        }
    }
}

impl Document {
    /// Whether the root element is `html` or declares XHTML as its default namespace.
    pub fn is_html(&self) -> bool {
        let Some(root) = self.root_element() else {
            return false;
        };
        self.local_name(root)
            .is_some_and(|name| name.eq_ignore_ascii_case("html"))
            || self
                .namespace_declarations(root)
                .iter()
                .any(|d| d.prefix.is_none() && d.uri == XHTML_NAMESPACE)
    }

    /// Serializes the node at `id`.
    ///
    /// For an element, declarations its subtree needs from ancestors are
    /// written on the element itself so the output parses on its own. The
    /// document node serializes as its children, without an XML declaration.
    pub fn to_xml(&self, id: NodeId, options: &SerializeOptions) -> String {
        let mut out = String::new();
        let writer = Writer {
            doc: self,
            void_elements: options.html_void_elements && self.is_html(),
        };
        match self.kind(id) {
            NodeKind::Document => {
                for child in self.children(id) {
                    writer.write_top(child, &mut out);
                }
            }
            _ => writer.write_top(id, &mut out),
        }
        out
    }

    /// Serializes the children of `id`, each standing on its own.
    pub fn inner_xml(&self, id: NodeId, options: &SerializeOptions) -> String {
        self.children(id)
            .map(|child| self.to_xml(child, options))
            .collect()
    }
}

struct Writer<'d> {
    doc: &'d Document,
    void_elements: bool,
}

impl Writer<'_> {
    fn write_top(&self, id: NodeId, out: &mut String) {
        let extra = if self.doc.is_element(id) {
            self.doc.undeclared_namespaces(id)
        } else {
            Vec::new()
        };
        self.write_node(id, &extra, "", out);
    }

    /// `default` is the default namespace in effect in the output so far,
    /// empty for none.
    fn write_node<'a>(
        &'a self,
        id: NodeId,
        extra: &'a [NamespaceDecl],
        default: &'a str,
        out: &mut String,
    ) {
        match self.doc.kind(id) {
            NodeKind::Document => {
                for child in self.doc.children(id) {
                    self.write_node(child, &[], default, out);
                }
            }
            NodeKind::Element {
                name,
                prefix,
                attributes,
                namespace,
                namespaces,
                ..
            } => {
                let qname = match prefix {
                    Some(p) => format!("{p}:{name}"),
                    None => name.clone(),
                };
                let declarations = || namespaces.iter().chain(extra);
                // An unprefixed name takes the default namespace, so the
                // element's own namespace decides what the default must be.
                let scope_default = match (prefix, namespace) {
                    (None, namespace) => namespace.as_deref().unwrap_or_default(),
                    _ => declarations()
                        .find(|d| d.prefix.is_none())
                        .map_or(default, |d| d.uri.as_str()),
                };

                out.push('<');
                out.push_str(&qname);
                if scope_default != default {
                    write_declaration(None, scope_default, out);
                }
                for decl in declarations().filter(|d| d.prefix.is_some()) {
                    write_declaration(decl.prefix.as_deref(), &decl.uri, out);
                }
                for attr in attributes {
                    out.push(' ');
                    out.push_str(&attr.qualified_name());
                    out.push_str("=\"");
                    out.push_str(&escape(attr.value.as_str()));
                    out.push('"');
                }

                let is_empty = self.doc.first_child(id).is_none();
                if is_empty && self.void_elements && is_void(name) {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in self.doc.children(id) {
                    self.write_node(child, &[], scope_default, out);
                }
                out.push_str("</");
                out.push_str(&qname);
                out.push('>');
            }
            NodeKind::Text { content } => out.push_str(&partial_escape(content.as_str())),
            NodeKind::Comment { content } => {
                out.push_str("<!--");
                out.push_str(content);
                out.push_str("-->");
            }
            NodeKind::ProcessingInstruction { target, data } => {
                out.push_str("<?");
                out.push_str(target);
                if let Some(data) = data {
                    out.push(' ');
                    out.push_str(data);
                }
                out.push_str("?>");
            }
        }
    }
}

fn write_declaration(prefix: Option<&str>, uri: &str, out: &mut String) {
    match prefix {
        Some(p) => {
            out.push_str(" xmlns:");
            out.push_str(p);
        }
        None => out.push_str(" xmlns"),
    }
    out.push_str("=\"");
    out.push_str(&escape(uri));
    out.push('"');
}

fn is_void(name: &str) -> bool {
    HTML_VOID_ELEMENTS
        .iter()
        .any(|v| v.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::Edit;

    fn xml(doc: &Document, id: NodeId) -> String {
        doc.to_xml(id, &SerializeOptions::default())
    }

    #[test]
    fn test_empty_elements_are_not_self_closed() {
        let doc = Document::parse("<note><to>Tove</to><body/></note>").unwrap();
        let note = doc.root_element().unwrap();
        assert_eq!(xml(&doc, note), "<note><to>Tove</to><body></body></note>");
        assert_eq!(xml(&doc, doc.root()), xml(&doc, note));
    }

    #[test]
    fn test_escaping() {
        let doc = Document::parse(r#"<a title="&quot;x&quot; &amp; y">1 &lt; 2</a>"#).unwrap();
        assert_eq!(
            xml(&doc, doc.root()),
            r#"<a title="&quot;x&quot; &amp; y">1 &lt; 2</a>"#
        );
    }

    #[test]
    fn test_html_void_elements() {
        let doc = Document::parse(
            r#"<html><body><img class="image square" src="helloworld.jpg"/><p></p><br/></body></html>"#,
        )
        .unwrap();
        let img = doc
            .descendants(doc.root())
            .find(|&n| doc.local_name(n) == Some("img"))
            .unwrap();
        assert_eq!(
            xml(&doc, img),
            r#"<img class="image square" src="helloworld.jpg"/>"#
        );
        let body = doc.parent(img).unwrap();
        assert_eq!(
            xml(&doc, body),
            r#"<body><img class="image square" src="helloworld.jpg"/><p></p><br/></body>"#
        );

        let off = SerializeOptions {
            html_void_elements: false,
        };
        assert_eq!(
            doc.to_xml(img, &off),
            r#"<img class="image square" src="helloworld.jpg"></img>"#
        );
    }

    #[test]
    fn test_void_names_outside_html_are_plain() {
        let doc = Document::parse("<doc><br/></doc>").unwrap();
        assert_eq!(xml(&doc, doc.root()), "<doc><br></br></doc>");
    }

    #[test]
    fn test_subtree_carries_needed_declarations() {
        let doc = Document::parse(
            r#"<r xmlns="urn:r" xmlns:m="urn:m" xmlns:u="urn:u"><a><m:b/></a></r>"#,
        )
        .unwrap();
        let a = doc.first_child(doc.root_element().unwrap()).unwrap();
        assert_eq!(
            xml(&doc, a),
            r#"<a xmlns="urn:r" xmlns:m="urn:m"><m:b></m:b></a>"#
        );
    }

    #[test]
    fn test_inner_xml() {
        let doc = Document::parse("<p>Hello <b>World</b></p>").unwrap();
        let p = doc.root_element().unwrap();
        assert_eq!(
            doc.inner_xml(p, &SerializeOptions::default()),
            "Hello <b>World</b>"
        );
    }

    #[test]
    fn test_comments_and_processing_instructions() {
        let doc = Document::parse("<a><!--c--><?t d?></a>").unwrap();
        assert_eq!(xml(&doc, doc.root()), "<a><!--c--><?t d?></a>");
    }

    #[test]
    fn test_default_namespace_is_undeclared_where_needed() {
        let source = r#"<root xmlns="urn:d" xmlns:m="urn:m"><m:x><y/></m:x></root>"#;
        let mut doc = Document::parse(source).unwrap();
        let root = doc.root_element().unwrap();
        let x = doc.first_child(root).unwrap();
        doc.apply_edits(vec![
            Edit::SetElementNamespace {
                element: x,
                prefix: None,
                namespace: None,
            },
            Edit::RemoveNamespaceDeclaration {
                element: root,
                prefix: Some("m".to_string()),
            },
        ])
        .unwrap();

        let markup = xml(&doc, root);
        assert_eq!(
            markup,
            r#"<root xmlns="urn:d"><x xmlns=""><y xmlns="urn:d"></y></x></root>"#
        );
        assert_eq!(xml(&doc, x), r#"<x><y xmlns="urn:d"></y></x>"#);

        let reparsed = Document::parse(&markup).unwrap();
        let x = reparsed.first_child(reparsed.root_element().unwrap()).unwrap();
        assert_eq!(reparsed.namespace_uri(x), None);
        let y = reparsed.first_child(x).unwrap();
        assert_eq!(reparsed.namespace_uri(y), Some("urn:d"));
    }
}
