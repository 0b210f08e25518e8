//! The prefix bindings queries are evaluated with.
//!
//! Registration order is kept: [`NamespaceTable::lookup_prefix`] answers with
//! the first prefix registered for a URI, and re-registering a prefix keeps
//! its original position.

use crate::config::AutoRegister;
use crate::error::{Error, Result};
use domq_dom::Document;
use domq_xpath1::{NamespaceBindings, XML_NAMESPACE};
use log::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceTable {
    entries: Vec<(String, String)>,
    default_namespace: Option<String>,
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `prefix` to `uri`, overwriting an existing binding.
    pub fn register(&mut self, prefix: &str, uri: &str) {
        match self.entries.iter_mut().find(|(p, _)| p == prefix) {
            Some(entry) => entry.1 = uri.to_string(),
            None => self.entries.push((prefix.to_string(), uri.to_string())),
        }
    }

    /// The first registered prefix bound to `uri`.
    pub fn lookup_prefix(&self, uri: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }

    pub fn lookup_uri(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.lookup_uri(prefix).is_some()
    }

    /// Drops the binding for `prefix`, returning the URI it was bound to.
    ///
    /// This only edits the table; `DomDoc::remove_namespace` also moves the
    /// tree's nodes out of the namespace.
    pub fn remove(&mut self, prefix: &str) -> Result<String> {
        let position = self
            .entries
            .iter()
            .position(|(p, _)| p == prefix)
            .ok_or_else(|| Error::UnknownPrefix(prefix.to_string()))?;
        Ok(self.entries.remove(position).1)
    }

    /// The unprefixed namespace found on the root element at load time.
    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    pub fn set_default_namespace(&mut self, uri: Option<&str>) {
        self.default_namespace = uri.map(str::to_string);
    }

    /// `(prefix, uri)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers every binding of `other` into this table.
    pub fn merge(&mut self, other: &NamespaceTable) {
        for (prefix, uri) in other.iter() {
            self.register(prefix, uri);
        }
    }

    /// The bindings handed to the XPath evaluator.
    pub fn bindings(&self) -> NamespaceBindings {
        self.entries.iter().cloned().collect()
    }

    /// Pairs usable as fragment parsing hints.
    pub fn hints(&self) -> Vec<(String, String)> {
        self.entries.clone()
    }

    /// Registers the namespaces declared on the root element of `doc`.
    pub fn discover(&mut self, doc: &Document, mode: &AutoRegister) {
        if *mode == AutoRegister::Off {
            return;
        }
        let Some(root) = doc.root_element() else {
            return;
        };

        let declarations: Vec<_> = doc
            .namespace_declarations(root)
            .iter()
            .filter(|d| !d.uri.is_empty() && d.uri != XML_NAMESPACE)
            .collect();

        // Prefixed declarations first, so the alias check sees all of them.
        for decl in &declarations {
            if let Some(prefix) = &decl.prefix {
                self.register(prefix, &decl.uri);
            }
        }
        if let Some(decl) = declarations.iter().find(|d| d.prefix.is_none()) {
            self.default_namespace = Some(decl.uri.clone());
            match mode {
                AutoRegister::DefaultAs(alias) => self.register(alias, &decl.uri),
                _ => {
                    let tag = doc.local_name(root).unwrap_or_default();
                    if self.contains(tag) {
                        warn!(
                            "Default namespace '{}' not aliased: prefix '{tag}' is taken",
                            decl.uri
                        );
                    } else {
                        self.register(tag, &decl.uri);
                    }
                }
            }
        }
        debug!("Discovered {} namespace bindings", self.entries.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut table = NamespaceTable::new();
        table.register("a", "urn:a");
        table.register("b", "urn:b");
        assert_eq!(table.lookup_uri("a"), Some("urn:a"));
        assert_eq!(table.lookup_prefix("urn:b"), Some("b"));
        assert_eq!(table.lookup_uri("c"), None);
        assert_eq!(table.lookup_prefix("urn:c"), None);
    }

    #[test]
    fn test_first_registered_prefix_wins() {
        let mut table = NamespaceTable::new();
        table.register("x", "urn:shared");
        table.register("y", "urn:shared");
        assert_eq!(table.lookup_prefix("urn:shared"), Some("x"));

        // Re-registering keeps the position.
        table.register("x", "urn:other");
        table.register("x", "urn:shared");
        assert_eq!(table.lookup_prefix("urn:shared"), Some("x"));
        assert_eq!(table.iter().collect::<Vec<_>>(), [("x", "urn:shared"), ("y", "urn:shared")]);
    }

    #[test]
    fn test_remove() {
        let mut table = NamespaceTable::new();
        table.register("a", "urn:a");
        assert_eq!(table.remove("a").unwrap(), "urn:a");
        assert!(table.is_empty());
        assert!(matches!(table.remove("a"), Err(Error::UnknownPrefix(p)) if p == "a"));
    }

    #[test]
    fn test_discover_aliases_default_under_root_tag() {
        let doc = Document::parse(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/"/>"#,
        )
        .unwrap();
        let mut table = NamespaceTable::new();
        table.discover(&doc, &AutoRegister::Auxiliary);
        assert_eq!(table.lookup_uri("feed"), Some("http://www.w3.org/2005/Atom"));
        assert_eq!(table.lookup_uri("media"), Some("http://search.yahoo.com/mrss/"));
        assert_eq!(table.default_namespace(), Some("http://www.w3.org/2005/Atom"));
        assert_eq!(table.lookup_uri("xml"), None);
    }

    #[test]
    fn test_discover_with_alias_and_off() {
        let doc = Document::parse(r#"<note xmlns="http://my-example-namespace"/>"#).unwrap();

        let mut table = NamespaceTable::new();
        table.discover(&doc, &AutoRegister::DefaultAs("n".into()));
        assert_eq!(table.lookup_prefix("http://my-example-namespace"), Some("n"));
        assert!(!table.contains("note"));

        let mut table = NamespaceTable::new();
        table.discover(&doc, &AutoRegister::Off);
        assert!(table.is_empty());
        assert_eq!(table.default_namespace(), None);
    }

    #[test]
    fn test_taken_alias_is_not_overwritten() {
        let doc = Document::parse(r#"<x xmlns="urn:default" xmlns:x="urn:x"/>"#).unwrap();
        let mut table = NamespaceTable::new();
        table.discover(&doc, &AutoRegister::Auxiliary);
        assert_eq!(table.lookup_uri("x"), Some("urn:x"));
        assert_eq!(table.default_namespace(), Some("urn:default"));
        assert_eq!(table.lookup_prefix("urn:default"), None);
    }

    #[test]
    fn test_discovery_ignores_declaration_order() {
        let orders = [
            r#"<x xmlns="urn:default" xmlns:x="urn:x"/>"#,
            r#"<x xmlns:x="urn:x" xmlns="urn:default"/>"#,
        ];
        let modes = [AutoRegister::Auxiliary, AutoRegister::DefaultAs("x".to_string())];
        for mode in &modes {
            let tables: Vec<Vec<(String, String)>> = orders
                .iter()
                .map(|xml| {
                    let doc = Document::parse(xml).unwrap();
                    let mut table = NamespaceTable::new();
                    table.discover(&doc, mode);
                    table
                        .iter()
                        .map(|(p, u)| (p.to_string(), u.to_string()))
                        .collect()
                })
                .collect();
            assert_eq!(tables[0], tables[1], "{mode:?}");
        }

        let doc = Document::parse(orders[1]).unwrap();
        let mut table = NamespaceTable::new();
        table.discover(&doc, &AutoRegister::Auxiliary);
        assert_eq!(table.lookup_uri("x"), Some("urn:x"));
        assert_eq!(table.lookup_prefix("urn:default"), None);
    }
}
