pub mod ast;
pub mod axes;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod functions;
pub mod operators;
pub mod parser;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NameTest, NodeTest, Step};
pub use datasource::{DataSourceNode, NodeType, QName, XML_NAMESPACE};
pub use engine::{EvaluationContext, NamespaceBindings, XPathValue, evaluate, select_nodes};

// Re-export test utilities for integration testing in downstream crates
pub use datasource::tests;
pub use error::XPathError;
pub use parser::parse_expression;
