//! Copying subtrees between documents.

use crate::error::DomError;
use crate::tree::{Document, NamespaceDecl, NodeId, NodeKind};
use log::trace;

impl Document {
    /// Deep-copies the subtree at `id` in `source` into this document.
    ///
    /// The copy is returned detached. Namespace declarations the subtree
    /// relies on from its ancestors in `source` are declared on the copy.
    /// Importing a document node imports its root element.
    pub fn import_node(&mut self, source: &Document, id: NodeId) -> Result<NodeId, DomError> {
        if !source.contains(id) {
            return Err(DomError::UnknownNode(id.into_raw()));
        }
        let id = match source.kind(id) {
            NodeKind::Document => source.root_element().ok_or_else(|| {
                DomError::Hierarchy("cannot import an empty document".to_string())
            })?,
            _ => id,
        };

        let copy = self.copy_subtree(source, id)?;
        let inherited = source.undeclared_namespaces(id);
        if !inherited.is_empty() {
            trace!("Carrying {} namespace declarations into import", inherited.len());
            if let NodeKind::Element { namespaces, .. } = self.kind_mut(copy) {
                namespaces.extend(inherited);
            }
        }
        Ok(copy)
    }

    fn copy_subtree(&mut self, source: &Document, id: NodeId) -> Result<NodeId, DomError> {
        let copy = self.create_node(source.kind(id).clone());
        for child in source.children(id) {
            let child_copy = self.copy_subtree(source, child)?;
            self.append_child(copy, child_copy)?;
        }
        Ok(copy)
    }

    /// Namespace bindings used by names in the subtree at `id` that no element
    /// of the subtree declares itself.
    ///
    /// Bindings come from the written prefixes, so the result is what must be
    /// declared on `id` for the subtree to stand on its own. An unprefixed
    /// element in no namespace under an inherited default yields `xmlns=""`.
    pub fn undeclared_namespaces(&self, id: NodeId) -> Vec<NamespaceDecl> {
        let subtree: Vec<NodeId> = std::iter::once(id).chain(self.descendants(id)).collect();

        let declared: Vec<&NamespaceDecl> = subtree
            .iter()
            .flat_map(|&n| self.namespace_declarations(n))
            .collect();

        let mut missing: Vec<NamespaceDecl> = Vec::new();
        let mut top_default: Option<&str> = None;

        for &node in &subtree {
            let NodeKind::Element {
                prefix,
                namespace,
                attributes,
                ..
            } = self.kind(node)
            else {
                continue;
            };
            match (prefix, namespace) {
                (Some(p), Some(uri)) if p != "xml" => {
                    let decl = NamespaceDecl::new(Some(p.as_str()), uri.as_str());
                    if !declared.contains(&&decl) && !missing.contains(&decl) {
                        missing.push(decl);
                    }
                }
                // The first unprefixed element left to the default declared
                // on `id` fixes it; later conflicts are declared in place.
                (None, namespace)
                    if top_default.is_none() && self.subtree_default(node, id).is_none() =>
                {
                    top_default = Some(namespace.as_deref().unwrap_or_default());
                }
                _ => {}
            }
            for attr in attributes {
                if let (Some(p), Some(uri)) = (&attr.prefix, &attr.namespace)
                    && p != "xml"
                {
                    let decl = NamespaceDecl::new(Some(p.as_str()), uri.as_str());
                    if !declared.contains(&&decl) && !missing.contains(&decl) {
                        missing.push(decl);
                    }
                }
            }
        }

        let inherited = self
            .parent(id)
            .and_then(|p| {
                self.in_scope_namespaces(p)
                    .into_iter()
                    .find(|d| d.prefix.is_none())
            })
            .is_some_and(|d| !d.uri.is_empty());
        match top_default {
            Some("") if inherited => missing.insert(0, NamespaceDecl::new(None, "")),
            Some(uri) if !uri.is_empty() => missing.insert(0, NamespaceDecl::new(None, uri)),
            _ => {}
        }
        missing
    }

    /// The nearest default declaration from `node` up to `top`, inclusive.
    fn subtree_default(&self, node: NodeId, top: NodeId) -> Option<&str> {
        for ancestor in self.ancestors(node) {
            let decl = self
                .namespace_declarations(ancestor)
                .iter()
                .find(|d| d.prefix.is_none());
            if let Some(decl) = decl {
                return Some(&decl.uri);
            }
            if ancestor == top {
                break;
            }
        }
        None
    }
}
