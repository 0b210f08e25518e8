//! Batched namespace edits, validated up front and then applied together.
//!
//! [`Document::apply_edits`] either applies every edit or none of them: all
//! edits are checked against the current tree before the first one runs, and
//! applying a checked edit cannot fail.

use crate::error::DomError;
use crate::tree::{Document, NamespaceDecl, NodeId, NodeKind};
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Moves an element into `namespace` (or out of any), written with `prefix`.
    SetElementNamespace {
        element: NodeId,
        prefix: Option<String>,
        namespace: Option<String>,
    },
    /// Same, for the attribute at `index` on `element`.
    SetAttributeNamespace {
        element: NodeId,
        index: usize,
        prefix: Option<String>,
        namespace: Option<String>,
    },
    DeclareNamespace {
        element: NodeId,
        prefix: Option<String>,
        uri: String,
    },
    RemoveNamespaceDeclaration {
        element: NodeId,
        prefix: Option<String>,
    },
}

impl Edit {
    fn element(&self) -> NodeId {
        match self {
            Edit::SetElementNamespace { element, .. }
            | Edit::SetAttributeNamespace { element, .. }
            | Edit::DeclareNamespace { element, .. }
            | Edit::RemoveNamespaceDeclaration { element, .. } => *element,
        }
    }
}

impl Document {
    /// Applies `edits` atomically, returning how many were applied.
    pub fn apply_edits(&mut self, edits: Vec<Edit>) -> Result<usize, DomError> {
        for edit in &edits {
            self.check_edit(edit)?;
        }
        let count = edits.len();
        for edit in edits {
            self.apply_checked(edit);
        }
        debug!("Applied {count} namespace edits");
        Ok(count)
    }

    fn check_edit(&self, edit: &Edit) -> Result<(), DomError> {
        let element = edit.element();
        if !self.contains(element) {
            return Err(DomError::UnknownNode(element.into_raw()));
        }
        if !self.is_element(element) {
            return Err(DomError::NotAnElement(element.into_raw()));
        }
        match edit {
            Edit::SetElementNamespace {
                prefix, namespace, ..
            } => check_binding(prefix.as_deref(), namespace.as_deref()),
            Edit::SetAttributeNamespace {
                index,
                prefix,
                namespace,
                ..
            } => {
                if *index >= self.attributes(element).len() {
                    return Err(DomError::InvalidEdit(format!(
                        "element {element} has no attribute {index}"
                    )));
                }
                if namespace.is_some() && prefix.is_none() {
                    return Err(DomError::InvalidEdit(
                        "a namespaced attribute needs a prefix".to_string(),
                    ));
                }
                check_binding(prefix.as_deref(), namespace.as_deref())
            }
            Edit::DeclareNamespace { prefix, uri, .. } => {
                check_binding(prefix.as_deref(), Some(uri.as_str()))
            }
            Edit::RemoveNamespaceDeclaration { .. } => Ok(()),
        }
    }

    fn apply_checked(&mut self, edit: Edit) {
        match edit {
            Edit::SetElementNamespace {
                element,
                prefix: new_prefix,
                namespace: new_namespace,
            } => {
                if let NodeKind::Element {
                    prefix, namespace, ..
                } = self.kind_mut(element)
                {
                    *prefix = new_prefix;
                    *namespace = new_namespace;
                }
            }
            Edit::SetAttributeNamespace {
                element,
                index,
                prefix,
                namespace,
            } => {
                if let NodeKind::Element { attributes, .. } = self.kind_mut(element) {
                    if let Some(attr) = attributes.get_mut(index) {
                        attr.prefix = prefix;
                        attr.namespace = namespace;
                    }
                }
            }
            Edit::DeclareNamespace {
                element,
                prefix,
                uri,
            } => {
                if let NodeKind::Element { namespaces, .. } = self.kind_mut(element) {
                    namespaces.retain(|d| d.prefix != prefix);
                    namespaces.push(NamespaceDecl { prefix, uri });
                }
            }
            Edit::RemoveNamespaceDeclaration { element, prefix } => {
                if let NodeKind::Element { namespaces, .. } = self.kind_mut(element) {
                    namespaces.retain(|d| d.prefix != prefix);
                }
            }
        }
    }
}

fn check_binding(prefix: Option<&str>, namespace: Option<&str>) -> Result<(), DomError> {
    match (prefix, namespace) {
        (Some("xmlns"), _) => Err(DomError::InvalidEdit(
            "the xmlns prefix cannot be bound".to_string(),
        )),
        (Some(p), None) => Err(DomError::InvalidEdit(format!(
            "prefix '{p}' needs a namespace"
        ))),
        (Some(""), _) => Err(DomError::InvalidEdit("empty prefix".to_string())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::SerializeOptions;

    const MATH: &str = "<html xmlns:mml='http://www.w3.org/1998/Math/MathML'><div><mml:math><mml:infinity /></mml:math></div></html>";

    fn strip_mml(doc: &Document) -> Vec<Edit> {
        let html = doc.root_element().unwrap();
        let mut edits = vec![Edit::RemoveNamespaceDeclaration {
            element: html,
            prefix: Some("mml".to_string()),
        }];
        for node in doc.descendants(html) {
            if doc.namespace_uri(node).is_some() {
                edits.push(Edit::SetElementNamespace {
                    element: node,
                    prefix: None,
                    namespace: None,
                });
            }
        }
        edits
    }

    #[test]
    fn test_removing_a_namespace() {
        let mut doc = Document::parse(MATH).unwrap();
        let edits = strip_mml(&doc);
        assert_eq!(doc.apply_edits(edits).unwrap(), 3);
        assert_eq!(
            doc.to_xml(doc.root(), &SerializeOptions::default()),
            "<html><div><math><infinity></infinity></math></div></html>"
        );
    }

    #[test]
    fn test_invalid_batch_changes_nothing() {
        let mut doc = Document::parse(MATH).unwrap();
        let before = doc.to_xml(doc.root(), &SerializeOptions::default());

        let mut edits = strip_mml(&doc);
        let text_parent = doc.root_element().unwrap();
        edits.push(Edit::SetAttributeNamespace {
            element: text_parent,
            index: 7,
            prefix: None,
            namespace: None,
        });
        assert!(matches!(
            doc.apply_edits(edits),
            Err(DomError::InvalidEdit(_))
        ));
        assert_eq!(doc.to_xml(doc.root(), &SerializeOptions::default()), before);
    }

    #[test]
    fn test_edits_on_non_elements_are_rejected() {
        let mut doc = Document::parse("<a>text</a>").unwrap();
        let text = doc.first_child(doc.root_element().unwrap()).unwrap();
        let result = doc.apply_edits(vec![Edit::DeclareNamespace {
            element: text,
            prefix: Some("p".to_string()),
            uri: "urn:p".to_string(),
        }]);
        assert!(matches!(result, Err(DomError::NotAnElement(_))));
    }

    #[test]
    fn test_declare_replaces_existing_binding() {
        let mut doc = Document::parse(r#"<a xmlns:p="urn:old"/>"#).unwrap();
        let a = doc.root_element().unwrap();
        doc.apply_edits(vec![Edit::DeclareNamespace {
            element: a,
            prefix: Some("p".to_string()),
            uri: "urn:new".to_string(),
        }])
        .unwrap();
        assert_eq!(
            doc.namespace_declarations(a),
            &[NamespaceDecl::new(Some("p"), "urn:new")]
        );
    }
}
