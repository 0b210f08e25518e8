//! Namespace-aware XPath and CSS selector queries over a mutable XML tree.
//!
//! ```
//! use domq::{ContextArgument, DocOptions, DomDoc};
//!
//! let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>One</title></entry></feed>"#;
//! let mut doc = DomDoc::parse(xml, DocOptions::default()).unwrap();
//!
//! // The default namespace is registered under the root element's name.
//! let entry = doc.xpath_single("//feed:entry", ContextArgument::None).unwrap().unwrap();
//! let title = doc.xpath_single("feed:title", entry).unwrap().unwrap();
//! assert_eq!(doc.value(title).unwrap(), "One");
//! ```
//!
//! The crate is layered: `domq-selector` compiles selectors to XPath,
//! `domq-xpath1` evaluates XPath, and `domq-dom` holds the tree. This crate
//! ties them together with a [`NamespaceTable`], a [`ContextResolver`], a
//! [`QueryEngine`] and the [`DomDoc`] facade.

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod namespace;
pub mod query;

pub use config::{AutoRegister, DocOptions};
pub use context::{Content, ContextArgument, ContextResolver};
pub use document::{DomDoc, Raw};
pub use error::{Error, Result};
pub use namespace::NamespaceTable;
pub use query::{NodeRef, QueryEngine, ResultList, scope};

pub use domq_dom as dom;
pub use domq_selector as selector;
