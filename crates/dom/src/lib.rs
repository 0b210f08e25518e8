//! A small mutable XML tree.
//!
//! Documents are parsed with `roxmltree` into an arena ([`Document`]) that
//! supports the editing operations a query layer needs: insertion, removal,
//! replacement, namespace edits applied as one batch, import of nodes from
//! other documents, libxml-style node paths, and serialization.
//!
//! [`DomNode`] exposes the tree to the `domq-xpath1` evaluator.

pub mod datasource;
pub mod edit;
pub mod error;
pub mod import;
pub mod parse;
pub mod path;
pub mod serialize;
pub mod tree;

pub use datasource::DomNode;
pub use edit::Edit;
pub use error::DomError;
pub use path::{PathSegment, PathStep, render_path};
pub use serialize::SerializeOptions;
pub use tree::{
    Attribute, Children, Document, DocumentId, NamespaceDecl, NodeData, NodeId, NodeKind,
};
