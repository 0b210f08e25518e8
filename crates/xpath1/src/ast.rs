//! Defines the Abstract Syntax Tree (AST) for XPath 1.0 expressions.

/// The top-level expression that can be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(String),
    Number(f64),
    LocationPath(LocationPath),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    /// A primary expression filtered by predicates, like `(//a | //b)[1]`.
    Filter {
        expr: Box<Expression>,
        predicates: Vec<Expression>,
    },
}

impl Expression {
    /// Checks if the expression is a `LocationPath` variant.
    pub fn is_location_path(&self) -> bool {
        matches!(self, Expression::LocationPath(_))
    }

    /// Checks if the expression is a `BinaryOp` variant.
    pub fn is_binary_op(&self) -> bool {
        matches!(self, Expression::BinaryOp { .. })
    }

    /// Collects every namespace prefix referenced by a name test anywhere in the
    /// expression, including inside predicates and function arguments.
    pub fn prefixes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_prefixes(&mut out);
        out
    }

    fn collect_prefixes<'e>(&'e self, out: &mut Vec<&'e str>) {
        match self {
            Expression::Literal(_) | Expression::Number(_) => {}
            Expression::LocationPath(path) => {
                if let Some(start) = &path.start_point {
                    start.collect_prefixes(out);
                }
                for step in &path.steps {
                    match &step.node_test {
                        NodeTest::Name(NameTest {
                            prefix: Some(p), ..
                        })
                        | NodeTest::PrefixWildcard(p) => out.push(p.as_str()),
                        _ => {}
                    }
                    for predicate in &step.predicates {
                        predicate.collect_prefixes(out);
                    }
                }
            }
            Expression::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_prefixes(out);
                }
            }
            Expression::BinaryOp { left, right, .. } => {
                left.collect_prefixes(out);
                right.collect_prefixes(out);
            }
            Expression::UnaryOp { expr, .. } => expr.collect_prefixes(out),
            Expression::Filter { expr, predicates } => {
                expr.collect_prefixes(out);
                for predicate in predicates {
                    predicate.collect_prefixes(out);
                }
            }
        }
    }
}

/// A unary operator used in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
}

/// A binary operator used in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Logical
    Or,
    And,
    // Equality
    Equals,
    NotEquals,
    // Relational
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Additive
    Plus,
    Minus,
    // Multiplicative
    Multiply,
    Divide,
    Modulo,
    // Set
    Union,
}

/// Represents a full location path, like `/child::foo`, `descendant::bar[1]`, or `id('x')/item`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    /// An optional starting expression, for paths like `id('x')/foo`.
    /// If `None`, the path starts from the context node or root.
    pub start_point: Option<Box<Expression>>,
    /// True if the path starts from the document root (e.g., `/foo`).
    /// Meaningless if `start_point` is `Some`.
    pub is_absolute: bool,
    pub steps: Vec<Step>,
}

/// Represents a single step in a location path, like `child::foo[position() > 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expression>,
}

impl Step {
    /// The `descendant-or-self::node()` step that `//` abbreviates.
    pub fn descendant_or_self() -> Self {
        Step {
            axis: Axis::DescendantOrSelf,
            node_test: NodeTest::NodeType(NodeTypeTest::Node),
            predicates: vec![],
        }
    }
}

/// The axis of movement from the context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Attribute,
    Parent,
    Ancestor,
    AncestorOrSelf,
    SelfAxis,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

impl Axis {
    /// Reverse axes number their nodes in reverse document order for predicates.
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::PrecedingSibling | Axis::Preceding
        )
    }
}

/// A qualified name as written in a name test (`foo`, `ex:foo`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTest {
    pub prefix: Option<String>,
    pub local_part: String,
}

/// A test to apply to nodes on a given axis to see if they should be included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// A qualified name test (e.g., `foo`, `xsl:if`).
    Name(NameTest),
    /// Any name in the namespace bound to a prefix (e.g., `ex:*`).
    PrefixWildcard(String),
    /// A wildcard test (`*`).
    Wildcard,
    /// A node type test (e.g., `text()`, `node()`).
    NodeType(NodeTypeTest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTypeTest {
    Text,
    Node,
    Comment,
    ProcessingInstruction,
}
