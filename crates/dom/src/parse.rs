//! Builds a [`Document`] from markup text using `roxmltree`.

use crate::error::DomError;
use crate::tree::{Attribute, Document, NamespaceDecl, NodeId, NodeKind};
use domq_xpath1::XML_NAMESPACE;
use log::debug;
use roxmltree::Node;

/// Local name of the element wrapped around fragments while they are parsed.
const FRAGMENT_HOLDER: &str = "domq-fragment";

impl Document {
    /// Parses a complete XML document. A DOCTYPE is accepted.
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let mut options = roxmltree::ParsingOptions::default();
        options.allow_dtd = true;
        let source = roxmltree::Document::parse_with_options(text, options)?;

        let mut doc = Document::new();
        let root = doc.root();
        for child in source.root().children() {
            copy_node(&mut doc, root, child, text)?;
        }
        debug!("Parsed document with {} nodes", doc.node_count());
        Ok(doc)
    }

    /// Parses a single-element fragment into its own document.
    ///
    /// `hints` are `(prefix, uri)` pairs treated as declared around the
    /// fragment, so markup like `<m:math/>` parses when `m` is known to the
    /// caller but not declared in the text. Hints the fragment uses are
    /// declared on its root element.
    pub fn parse_fragment(text: &str, hints: &[(String, String)]) -> Result<Self, DomError> {
        let body = strip_xml_declaration(text);

        let mut wrapped = format!("<{FRAGMENT_HOLDER}");
        for (prefix, uri) in hints {
            if prefix.is_empty() || prefix == "xml" || prefix == "xmlns" || prefix.contains(':') {
                continue;
            }
            let uri = quick_xml::escape::escape(uri.as_str());
            wrapped.push_str(&format!(" xmlns:{prefix}=\"{uri}\""));
        }
        wrapped.push('>');
        wrapped.push_str(body);
        wrapped.push_str(&format!("</{FRAGMENT_HOLDER}>"));

        let holder_doc = Document::parse(&wrapped)?;
        let holder = holder_doc
            .root_element()
            .ok_or(DomError::FragmentRoot(0))?;
        let elements: Vec<NodeId> = holder_doc
            .children(holder)
            .filter(|&c| holder_doc.is_element(c))
            .collect();
        let [element] = elements.as_slice() else {
            return Err(DomError::FragmentRoot(elements.len()));
        };

        let mut doc = Document::new();
        let imported = doc.import_node(&holder_doc, *element)?;
        let root = doc.root();
        doc.append_child(root, imported)?;
        Ok(doc)
    }
}

fn strip_xml_declaration(text: &str) -> &str {
    let trimmed = text.trim_start();
    if trimmed.starts_with("<?xml ") || trimmed.starts_with("<?xml?") {
        if let Some(end) = trimmed.find("?>") {
            return &trimmed[end + 2..];
        }
    }
    text
}

fn copy_node(
    doc: &mut Document,
    parent: NodeId,
    node: Node<'_, '_>,
    input: &str,
) -> Result<(), DomError> {
    let kind = match node.node_type() {
        roxmltree::NodeType::Root => return Ok(()),
        roxmltree::NodeType::Element => element_kind(node, input),
        roxmltree::NodeType::Text => NodeKind::Text {
            content: node.text().unwrap_or_default().to_string(),
        },
        roxmltree::NodeType::Comment => NodeKind::Comment {
            content: node.text().unwrap_or_default().to_string(),
        },
        roxmltree::NodeType::PI => match node.pi() {
            Some(pi) => NodeKind::ProcessingInstruction {
                target: pi.target.to_string(),
                data: pi.value.map(str::to_string),
            },
            None => return Ok(()),
        },
    };

    let id = doc.create_node(kind);
    doc.append_child(parent, id)?;
    for child in node.children() {
        copy_node(doc, id, child, input)?;
    }
    Ok(())
}

fn element_kind(node: Node<'_, '_>, input: &str) -> NodeKind {
    let tag = node.tag_name();
    // `xmlns=""` shows up as an empty namespace.
    let namespace = tag.namespace().filter(|uri| !uri.is_empty());
    let prefix = namespace.and_then(|_| written_prefix(node, input));

    let attributes = node
        .attributes()
        .map(|attr| Attribute {
            name: attr.name().to_string(),
            value: attr.value().to_string(),
            prefix: attr
                .namespace()
                .and_then(|uri| attribute_prefix(node, uri))
                .map(str::to_string),
            namespace: attr.namespace().map(str::to_string),
        })
        .collect();

    NodeKind::Element {
        name: tag.name().to_string(),
        prefix: prefix.map(str::to_string),
        namespace: namespace.map(str::to_string),
        attributes,
        namespaces: declared_namespaces(node),
    }
}

/// The prefix of the element's start tag as it appears in the source.
fn written_prefix<'i>(node: Node<'_, '_>, input: &'i str) -> Option<&'i str> {
    let tag = input.get(node.range().start + 1..)?;
    let end = tag
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(tag.len());
    tag[..end].split_once(':').map(|(prefix, _)| prefix)
}

/// Attributes cannot use the default namespace, so any prefixed binding works.
fn attribute_prefix<'a>(node: Node<'a, '_>, uri: &str) -> Option<&'a str> {
    if uri == XML_NAMESPACE {
        return Some("xml");
    }
    node.namespaces()
        .filter(|ns| ns.uri() == uri)
        .find_map(|ns| ns.name())
}

/// Namespaces in scope on `node` that were not already in scope on its parent.
fn declared_namespaces(node: Node<'_, '_>) -> Vec<NamespaceDecl> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| NamespaceDecl::new(ns.name(), ns.uri()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_prefixes_and_declarations() {
        let doc = Document::parse(
            r#"<html xmlns:mml="http://www.w3.org/1998/Math/MathML"><div><mml:math xml:lang="en"/></div></html>"#,
        )
        .unwrap();
        let html = doc.root_element().unwrap();
        assert_eq!(
            doc.namespace_declarations(html),
            &[NamespaceDecl::new(
                Some("mml"),
                "http://www.w3.org/1998/Math/MathML"
            )]
        );

        let math = doc
            .descendants(html)
            .find(|&n| doc.local_name(n) == Some("math"))
            .unwrap();
        assert_eq!(doc.prefix(math), Some("mml"));
        assert_eq!(
            doc.namespace_uri(math),
            Some("http://www.w3.org/1998/Math/MathML")
        );
        assert_eq!(doc.qualified_name(math).as_deref(), Some("mml:math"));
        assert_eq!(doc.attribute(math, "xml:lang"), Some("en"));
        assert!(doc.namespace_declarations(math).is_empty());
    }

    #[test]
    fn test_default_namespace_elements_are_unprefixed() {
        let doc = Document::parse(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>x</entry></feed>"#,
        )
        .unwrap();
        let feed = doc.root_element().unwrap();
        let entry = doc.first_child(feed).unwrap();
        assert_eq!(doc.prefix(entry), None);
        assert_eq!(doc.namespace_uri(entry), Some("http://www.w3.org/2005/Atom"));
        assert_eq!(
            doc.namespace_declarations(feed),
            &[NamespaceDecl::new(None, "http://www.w3.org/2005/Atom")]
        );
    }

    #[test]
    fn test_parse_keeps_comments_and_processing_instructions() {
        let doc = Document::parse("<?style href='a'?><a><!-- c --><![CDATA[<b>]]></a>").unwrap();
        let children: Vec<_> = doc.children(doc.root()).collect();
        assert!(matches!(
            doc.kind(children[0]),
            NodeKind::ProcessingInstruction { target, .. } if target == "style"
        ));
        let a = doc.root_element().unwrap();
        assert_eq!(doc.text_content(a), "<b>");
    }

    #[test]
    fn test_parse_accepts_doctype() {
        let doc = Document::parse("<!DOCTYPE html><html><body/></html>").unwrap();
        assert_eq!(doc.local_name(doc.root_element().unwrap()), Some("html"));
    }

    #[test]
    fn test_malformed_markup_is_an_error() {
        assert!(matches!(
            Document::parse("<a><b></a>"),
            Err(DomError::XmlParse(_))
        ));
    }

    #[test]
    fn test_fragment_uses_hints() {
        let hints = vec![(
            "mml".to_string(),
            "http://www.w3.org/1998/Math/MathML".to_string(),
        )];
        let doc = Document::parse_fragment("<mml:mi>x</mml:mi>", &hints).unwrap();
        let mi = doc.root_element().unwrap();
        assert_eq!(
            doc.namespace_uri(mi),
            Some("http://www.w3.org/1998/Math/MathML")
        );
        assert_eq!(
            doc.namespace_declarations(mi),
            &[NamespaceDecl::new(
                Some("mml"),
                "http://www.w3.org/1998/Math/MathML"
            )]
        );
    }

    #[test]
    fn test_fragment_unused_hints_are_not_declared() {
        let hints = vec![("x".to_string(), "urn:x".to_string())];
        let doc = Document::parse_fragment("<?xml version=\"1.0\"?><to>Bon</to>", &hints).unwrap();
        let to = doc.root_element().unwrap();
        assert!(doc.namespace_declarations(to).is_empty());
        assert_eq!(doc.text_content(to), "Bon");
    }

    #[test]
    fn test_fragment_hint_uris_are_escaped() {
        let hints = vec![
            ("q".to_string(), r#"urn:a&b"c"#.to_string()),
            ("".to_string(), "urn:ignored".to_string()),
        ];
        let doc = Document::parse_fragment("<q:item/>", &hints).unwrap();
        let item = doc.root_element().unwrap();
        assert_eq!(doc.namespace_uri(item), Some(r#"urn:a&b"c"#));
    }

    #[test]
    fn test_empty_default_declaration_means_no_namespace() {
        let doc = Document::parse(r#"<r xmlns="urn:r"><x xmlns=""><y/></x></r>"#).unwrap();
        let x = doc.first_child(doc.root_element().unwrap()).unwrap();
        assert_eq!(doc.namespace_uri(x), None);
        assert_eq!(doc.namespace_uri(doc.first_child(x).unwrap()), None);
        assert_eq!(doc.namespace_declarations(x), &[NamespaceDecl::new(None, "")]);
    }

    #[test]
    fn test_fragment_needs_exactly_one_element() {
        assert!(matches!(
            Document::parse_fragment("<a/><b/>", &[]),
            Err(DomError::FragmentRoot(2))
        ));
        assert!(matches!(
            Document::parse_fragment("just text", &[]),
            Err(DomError::FragmentRoot(0))
        ));
    }
}
