//! Defines the core abstraction for a navigable, read-only view of a node tree.
use std::hash::Hash;

/// The namespace implicitly bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A qualified name, consisting of an optional prefix and a local part.
///
/// The prefix is the one written in the source markup; name tests never compare
/// it, they compare the namespace URI reported by [`DataSourceNode::namespace_uri`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

/// The type of a node in the data source tree, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The universal contract for a node in a hierarchical data source.
///
/// The evaluator is written exclusively against this trait, so any tree that
/// implements it can be queried.
///
/// `'a` is the lifetime of the borrow on the underlying tree.
///
/// `Ord` must be document order: node-sets are sorted with it, and unions rely
/// on it to interleave results from different branches.
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    /// The type of the node (Element, Text, Attribute, etc.).
    fn node_type(&self) -> NodeType;

    /// The qualified name of the node (e.g., `fo:block`). Returns `None` for node
    /// types that do not have names, such as text or root nodes. For a processing-
    /// instruction, this is its target.
    fn name(&self) -> Option<QName<'a>>;

    /// The namespace URI of an element or attribute, `None` when it is in no
    /// namespace or has no name.
    fn namespace_uri(&self) -> Option<&'a str>;

    /// The string value of the node, as defined by the XPath 1.0 `string()` function.
    fn string_value(&self) -> String;

    /// An iterator over the attribute nodes of this node.
    /// The iterator will be empty for non-element nodes.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// An iterator over the child nodes of this node, in document order.
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// A reference to the parent node. Returns `None` for the root node.
    /// The parent of an attribute is its owner element.
    fn parent(&self) -> Option<Self>;
}

// Test utilities - publicly available for integration testing in downstream crates
pub mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::collections::HashMap;
    use std::hash::Hasher;

    pub const EX_NS: &str = "http://example.com/ns";

    #[derive(Debug, Clone)]
    struct MockNodeData<'a> {
        node_type: NodeType,
        name: Option<QName<'a>>,
        namespace: Option<&'a str>,
        value: &'a str,
        children: Vec<usize>,
        attributes: Vec<usize>,
    }

    /// An in-memory tree whose ids are assigned in document order, so comparing
    /// ids is comparing document positions.
    #[derive(Debug, Default)]
    pub struct MockTree<'a> {
        nodes: HashMap<usize, MockNodeData<'a>>,
        parent_map: HashMap<usize, usize>,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree<'a>,
    }

    impl<'a> PartialEq for MockNode<'a> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl<'a> Eq for MockNode<'a> {}

    impl<'a> PartialOrd for MockNode<'a> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl<'a> Ord for MockNode<'a> {
        fn cmp(&self, other: &Self) -> Ordering {
            self.id.cmp(&other.id)
        }
    }

    impl<'a> Hash for MockNode<'a> {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl<'a> MockTree<'a> {
        fn add(
            &mut self,
            id: usize,
            parent: Option<usize>,
            node_type: NodeType,
            name: Option<(Option<&'a str>, &'a str, Option<&'a str>)>,
            value: &'a str,
        ) {
            let (qname, namespace) = match name {
                Some((prefix, local_part, ns)) => (Some(QName { prefix, local_part }), ns),
                None => (None, None),
            };
            self.nodes.insert(
                id,
                MockNodeData {
                    node_type,
                    name: qname,
                    namespace,
                    value,
                    children: vec![],
                    attributes: vec![],
                },
            );
            if let Some(pid) = parent {
                self.parent_map.insert(id, pid);
                if let Some(parent_data) = self.nodes.get_mut(&pid) {
                    if node_type == NodeType::Attribute {
                        parent_data.attributes.push(id);
                    } else {
                        parent_data.children.push(id);
                    }
                }
            }
        }

        pub fn node(&'a self, id: usize) -> MockNode<'a> {
            MockNode { id, tree: self }
        }
    }

    impl<'a> DataSourceNode<'a> for MockNode<'a> {
        fn node_type(&self) -> NodeType {
            self.tree.nodes[&self.id].node_type
        }

        fn name(&self) -> Option<QName<'a>> {
            self.tree.nodes[&self.id].name
        }

        fn namespace_uri(&self) -> Option<&'a str> {
            self.tree.nodes[&self.id].namespace
        }

        fn string_value(&self) -> String {
            match self.node_type() {
                NodeType::Root | NodeType::Element => {
                    let mut out = String::new();
                    for child in self.children() {
                        if matches!(child.node_type(), NodeType::Element | NodeType::Text) {
                            out.push_str(&child.string_value());
                        }
                    }
                    out
                }
                _ => self.tree.nodes[&self.id].value.to_string(),
            }
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            let attribute_ids = tree.nodes[&self.id].attributes.clone();
            Box::new(
                attribute_ids
                    .into_iter()
                    .map(move |id| MockNode { id, tree }),
            )
        }

        fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            let children_ids = tree.nodes[&self.id].children.clone();
            Box::new(
                children_ids
                    .into_iter()
                    .map(move |id| MockNode { id, tree }),
            )
        }

        fn parent(&self) -> Option<Self> {
            self.tree.parent_map.get(&self.id).map(|&pid| MockNode {
                id: pid,
                tree: self.tree,
            })
        }
    }

    /// Creates a mock tree for testing:
    /// ```text
    /// <doc xmlns:ex="http://example.com/ns">          <!-- id 1 -->
    ///   <para id="p1" xml:lang="en">Hello</para>       <!-- id 2, attrs 3 & 4, text 5 -->
    ///   <!-- comment node -->                          <!-- id 6 -->
    ///   <ex:item class="a b">World</ex:item>           <!-- id 7, attr 8, text 9 -->
    ///   <?pi-target pi-value?>                         <!-- id 10 -->
    ///   <para>Again</para>                             <!-- id 11, text 12 -->
    /// </doc>
    /// ```
    /// The root node has id 0.
    pub fn create_test_tree<'a>() -> MockTree<'a> {
        use NodeType::*;
        let mut tree = MockTree::default();
        tree.add(0, None, Root, None, "");
        tree.add(1, Some(0), Element, Some((None, "doc", None)), "");
        tree.add(2, Some(1), Element, Some((None, "para", None)), "");
        tree.add(3, Some(2), Attribute, Some((None, "id", None)), "p1");
        tree.add(
            4,
            Some(2),
            Attribute,
            Some((Some("xml"), "lang", Some(XML_NAMESPACE))),
            "en",
        );
        tree.add(5, Some(2), Text, None, "Hello");
        tree.add(6, Some(1), Comment, None, " comment node ");
        tree.add(7, Some(1), Element, Some((Some("ex"), "item", Some(EX_NS))), "");
        tree.add(8, Some(7), Attribute, Some((None, "class", None)), "a b");
        tree.add(9, Some(7), Text, None, "World");
        tree.add(
            10,
            Some(1),
            ProcessingInstruction,
            Some((None, "pi-target", None)),
            "pi-value",
        );
        tree.add(11, Some(1), Element, Some((None, "para", None)), "");
        tree.add(12, Some(11), Text, None, "Again");
        tree
    }
}
