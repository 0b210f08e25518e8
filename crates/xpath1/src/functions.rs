//! Built-in implementations of the XPath 1.0 core function library.

use super::engine::{EvaluationContext, XPathValue, string_to_number};
use crate::datasource::{DataSourceNode, NodeType, XML_NAMESPACE};
use crate::error::XPathError;
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Dispatches a function call to the correct implementation.
pub fn evaluate_function<'a, 'd, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    match name {
        // Node-set
        "last" => func_last(args, e_ctx),
        "position" => func_position(args, e_ctx),
        "count" => func_count(args),
        "id" => func_id(args, e_ctx),
        "local-name" => func_local_name(args, e_ctx),
        "namespace-uri" => func_namespace_uri(args, e_ctx),
        "name" => func_name(args, e_ctx),

        // String
        "string" => func_string(args, e_ctx),
        "concat" => func_concat(args),
        "starts-with" => func_starts_with(args),
        "contains" => func_contains(args),
        "substring-before" => func_substring_before(args),
        "substring-after" => func_substring_after(args),
        "substring" => func_substring(args),
        "string-length" => func_string_length(args, e_ctx),
        "normalize-space" => func_normalize_space(args, e_ctx),
        "translate" => func_translate(args),

        // Boolean
        "boolean" => func_boolean(args),
        "not" => func_not(args),
        "true" => func_true(args),
        "false" => func_false(args),
        "lang" => func_lang(args, e_ctx),

        // Number
        "number" => func_number(args, e_ctx),
        "sum" => func_sum(args),
        "floor" => func_floor(args),
        "ceiling" => func_ceiling(args),
        "round" => func_round(args),

        _ => Err(XPathError::FunctionError {
            function: name.to_string(),
            message: "Unknown XPath function".to_string(),
        }),
    }
}

fn check_arity<N>(
    function: &str,
    args: &[XPathValue<N>],
    expected: RangeInclusive<usize>,
) -> Result<(), XPathError> {
    if expected.contains(&args.len()) {
        return Ok(());
    }
    let message = match (expected.start(), expected.end()) {
        (lo, hi) if lo == hi => format!("Expected {} argument(s), got {}", lo, args.len()),
        (lo, &usize::MAX) => format!("Expected at least {} arguments, got {}", lo, args.len()),
        (lo, hi) => format!("Expected {} to {} arguments, got {}", lo, hi, args.len()),
    };
    Err(XPathError::FunctionError {
        function: format!("{}()", function),
        message,
    })
}

/// The optional node-set argument of `name()`, `local-name()` and
/// `namespace-uri()`; defaults to the context node.
fn optional_node_arg<'a, 'd, N: DataSourceNode<'a>>(
    function: &str,
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<Option<N>, XPathError> {
    check_arity(function, &args, 0..=1)?;
    if args.is_empty() {
        return Ok(Some(e_ctx.context_node));
    }
    match args.remove(0) {
        XPathValue::NodeSet(nodes) => Ok(nodes.into_iter().min()),
        v => Err(XPathError::TypeError(format!(
            "{}() argument must be a node-set, got {:?}",
            function, v
        ))),
    }
}

/// The optional string argument of `string-length()` and friends; defaults to
/// the string-value of the context node.
fn optional_string_arg<'a, 'd, N: DataSourceNode<'a>>(
    function: &str,
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<String, XPathError> {
    check_arity(function, &args, 0..=1)?;
    Ok(if args.is_empty() {
        e_ctx.context_node.string_value()
    } else {
        args.remove(0).to_string()
    })
}

fn two_strings<'a, N: DataSourceNode<'a>>(
    function: &str,
    mut args: Vec<XPathValue<N>>,
) -> Result<(String, String), XPathError> {
    check_arity(function, &args, 2..=2)?;
    let s2 = args.remove(1).to_string();
    let s1 = args.remove(0).to_string();
    Ok((s1, s2))
}

// --- Node-Set Functions ---

fn func_last<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("last", &args, 0..=0)?;
    Ok(XPathValue::Number(e_ctx.context_size as f64))
}

fn func_position<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("position", &args, 0..=0)?;
    Ok(XPathValue::Number(e_ctx.context_position as f64))
}

fn func_count<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("count", &args, 1..=1)?;
    match args.remove(0) {
        XPathValue::NodeSet(nodes) => Ok(XPathValue::Number(nodes.len() as f64)),
        v => Err(XPathError::TypeError(format!(
            "count() argument must be a node-set, got {:?}",
            v
        ))),
    }
}

/// Matches elements by an `id` or `xml:id` attribute; there is no DTD to
/// declare ID-typed attributes.
fn func_id<'a, 'd, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("id", &args, 1..=1)?;

    let id_string = match args.remove(0) {
        XPathValue::NodeSet(nodes) => nodes
            .iter()
            .map(|n| n.string_value())
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    };
    let ids_to_find: HashSet<_> = id_string.split_whitespace().collect();
    if ids_to_find.is_empty() {
        return Ok(XPathValue::NodeSet(vec![]));
    }

    let mut results = Vec::new();
    let mut stack = e_ctx.root_node.children().collect::<Vec<_>>();

    while let Some(node) = stack.pop() {
        if node.node_type() == NodeType::Element {
            let matched = node.attributes().any(|attr| {
                let is_id_attr = attr.name().is_some_and(|q| q.local_part == "id")
                    && matches!(attr.namespace_uri(), None | Some(XML_NAMESPACE));
                is_id_attr && ids_to_find.contains(attr.string_value().trim())
            });
            if matched {
                results.push(node);
            }
        }
        stack.extend(node.children());
    }

    results.sort();
    Ok(XPathValue::NodeSet(results))
}

fn func_local_name<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let node = optional_node_arg("local-name", args, e_ctx)?;
    let name = node
        .and_then(|n| n.name().map(|q| q.local_part.to_string()))
        .unwrap_or_default();
    Ok(XPathValue::String(name))
}

fn func_namespace_uri<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let node = optional_node_arg("namespace-uri", args, e_ctx)?;
    let uri = node
        .and_then(|n| n.namespace_uri())
        .unwrap_or_default()
        .to_string();
    Ok(XPathValue::String(uri))
}

fn func_name<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let node = optional_node_arg("name", args, e_ctx)?;
    let name = node
        .and_then(|n| {
            n.name().map(|q| match q.prefix {
                Some(prefix) => format!("{}:{}", prefix, q.local_part),
                None => q.local_part.to_string(),
            })
        })
        .unwrap_or_default();
    Ok(XPathValue::String(name))
}

// --- String Functions ---

fn func_string<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    Ok(XPathValue::String(optional_string_arg("string", args, e_ctx)?))
}

fn func_concat<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("concat", &args, 2..=usize::MAX)?;
    let result = args.iter().map(|v| v.to_string()).collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_starts_with<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    let (s1, s2) = two_strings("starts-with", args)?;
    Ok(XPathValue::Boolean(s1.starts_with(&s2)))
}

fn func_contains<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    let (s1, s2) = two_strings("contains", args)?;
    Ok(XPathValue::Boolean(s1.contains(&s2)))
}

fn func_substring_before<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    let (s1, s2) = two_strings("substring-before", args)?;
    let result = s1.find(&s2).map(|i| &s1[..i]).unwrap_or_default();
    Ok(XPathValue::String(result.to_string()))
}

fn func_substring_after<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    let (s1, s2) = two_strings("substring-after", args)?;
    let result = s1.find(&s2).map(|i| &s1[i + s2.len()..]).unwrap_or_default();
    Ok(XPathValue::String(result.to_string()))
}

fn func_substring<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("substring", &args, 2..=3)?;
    let length_val = if args.len() == 3 {
        Some(args.remove(2).to_number())
    } else {
        None
    };
    let start_val = args.remove(1).to_number();
    let s = args.remove(0).to_string();

    let first = xpath_round(start_val);
    let last = match length_val {
        Some(l) => first + xpath_round(l),
        None => f64::INFINITY,
    };

    let result = s
        .chars()
        .enumerate()
        .filter_map(|(i, c)| {
            let pos = (i + 1) as f64;
            (pos >= first && pos < last).then_some(c)
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_string_length<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let s = optional_string_arg("string-length", args, e_ctx)?;
    Ok(XPathValue::Number(s.chars().count() as f64))
}

fn func_normalize_space<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let s = optional_string_arg("normalize-space", args, e_ctx)?;
    let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(XPathValue::String(normalized))
}

fn func_translate<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("translate", &args, 3..=3)?;
    let to_str: Vec<char> = args.remove(2).to_string().chars().collect();
    let from_str: Vec<char> = args.remove(1).to_string().chars().collect();
    let source_str = args.remove(0).to_string();
    let result = source_str
        .chars()
        .filter_map(|c| match from_str.iter().position(|&fc| fc == c) {
            Some(pos) => to_str.get(pos).copied(),
            None => Some(c),
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

// --- Boolean Functions ---

fn func_boolean<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("boolean", &args, 1..=1)?;
    Ok(XPathValue::Boolean(args.remove(0).to_bool()))
}

fn func_not<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("not", &args, 1..=1)?;
    Ok(XPathValue::Boolean(!args.remove(0).to_bool()))
}

fn func_true<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("true", &args, 0..=0)?;
    Ok(XPathValue::Boolean(true))
}

fn func_false<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("false", &args, 0..=0)?;
    Ok(XPathValue::Boolean(false))
}

fn func_lang<'a, 'd, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("lang", &args, 1..=1)?;
    let test_lang = args.remove(0).to_string().to_lowercase();

    let mut current = Some(e_ctx.context_node);
    if current.is_some_and(|n| n.node_type() != NodeType::Element) {
        current = current.and_then(|n| n.parent());
    }

    while let Some(node) = current {
        let declared = node.attributes().find(|attr| {
            attr.namespace_uri() == Some(XML_NAMESPACE)
                && attr.name().is_some_and(|q| q.local_part == "lang")
        });
        if let Some(attr) = declared {
            // The nearest xml:lang decides, matching "en" against "en-GB" too.
            let node_lang = attr.string_value().to_lowercase();
            let matches =
                node_lang == test_lang || node_lang.starts_with(&format!("{}-", test_lang));
            return Ok(XPathValue::Boolean(matches));
        }
        current = node.parent();
    }
    Ok(XPathValue::Boolean(false))
}

// --- Number Functions ---

fn func_number<'a, 'd, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("number", &args, 0..=1)?;
    let n = if args.is_empty() {
        string_to_number(&e_ctx.context_node.string_value())
    } else {
        args.remove(0).to_number()
    };
    Ok(XPathValue::Number(n))
}

fn func_sum<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("sum", &args, 1..=1)?;
    match args.remove(0) {
        XPathValue::NodeSet(nodes) => Ok(XPathValue::Number(
            nodes
                .iter()
                .map(|node| string_to_number(&node.string_value()))
                .sum(),
        )),
        v => Err(XPathError::TypeError(format!(
            "sum() argument must be a node-set, got {:?}",
            v
        ))),
    }
}

fn func_floor<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("floor", &args, 1..=1)?;
    Ok(XPathValue::Number(args.remove(0).to_number().floor()))
}

fn func_ceiling<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("ceiling", &args, 1..=1)?;
    Ok(XPathValue::Number(args.remove(0).to_number().ceil()))
}

fn func_round<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("round", &args, 1..=1)?;
    Ok(XPathValue::Number(xpath_round(args.remove(0).to_number())))
}

/// Rounds halves towards positive infinity.
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        n
    } else {
        (n + 0.5).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, MockTree, create_test_tree};
    use crate::engine::NamespaceBindings;

    struct TestSetup<'a> {
        tree: &'a MockTree<'a>,
        namespaces: NamespaceBindings,
    }

    impl<'a> TestSetup<'a> {
        fn new(tree: &'a MockTree<'a>) -> Self {
            TestSetup {
                tree,
                namespaces: NamespaceBindings::new(),
            }
        }

        fn context<'s>(
            &'s self,
            context_node_id: usize,
            pos: usize,
            size: usize,
        ) -> EvaluationContext<'a, 's, MockNode<'a>> {
            EvaluationContext::new(
                self.tree.node(context_node_id),
                self.tree.node(0),
                &self.namespaces,
                pos,
                size,
            )
        }
    }

    fn eval_func<'a, 's>(
        name: &str,
        args: Vec<XPathValue<MockNode<'a>>>,
        e_ctx: &EvaluationContext<'a, 's, MockNode<'a>>,
    ) -> XPathValue<MockNode<'a>> {
        evaluate_function(name, args, e_ctx).unwrap()
    }

    fn s<'a>(value: &str) -> XPathValue<MockNode<'a>> {
        XPathValue::String(value.to_string())
    }

    #[test]
    fn test_func_concat() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(0, 1, 1);
        let args = vec![s("Hello"), s(" "), s("World"), XPathValue::Number(42.0)];
        assert_eq!(eval_func("concat", args, &e_ctx).to_string(), "Hello World42");
    }

    #[test]
    fn test_func_concat_builds_class_token_pattern() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(8, 1, 1);
        let normalized = eval_func("normalize-space", vec![], &e_ctx);
        let padded = eval_func("concat", vec![s(" "), normalized, s(" ")], &e_ctx);
        assert_eq!(padded.to_string(), " a b ");
        assert!(eval_func("contains", vec![padded.clone(), s(" b ")], &e_ctx).to_bool());
        assert!(!eval_func("contains", vec![padded, s(" ab ")], &e_ctx).to_bool());
    }

    #[test]
    fn test_func_starts_with() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(0, 1, 1);
        assert!(eval_func("starts-with", vec![s("abcdef"), s("abc")], &e_ctx).to_bool());
        assert!(!eval_func("starts-with", vec![s("abcdef"), s("def")], &e_ctx).to_bool());
    }

    #[test]
    fn test_func_substring() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(0, 1, 1);

        let args1 = vec![s("12345"), XPathValue::Number(2.0), XPathValue::Number(3.0)];
        assert_eq!(eval_func("substring", args1, &e_ctx).to_string(), "234");

        let args2 = vec![s("12345"), XPathValue::Number(2.0)];
        assert_eq!(eval_func("substring", args2, &e_ctx).to_string(), "2345");

        let args3 = vec![s("12345"), XPathValue::Number(1.5), XPathValue::Number(2.6)];
        assert_eq!(eval_func("substring", args3, &e_ctx).to_string(), "234");
    }

    #[test]
    fn test_func_substring_before_after() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(0, 1, 1);
        assert_eq!(
            eval_func("substring-before", vec![s("1999/04/01"), s("/")], &e_ctx).to_string(),
            "1999"
        );
        assert_eq!(
            eval_func("substring-after", vec![s("1999/04/01"), s("/")], &e_ctx).to_string(),
            "04/01"
        );
        assert_eq!(
            eval_func("substring-after", vec![s("abc"), s("z")], &e_ctx).to_string(),
            ""
        );
    }

    #[test]
    fn test_func_string_length() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx_para = setup.context(2, 1, 1);

        assert_eq!(
            eval_func("string-length", vec![], &e_ctx_para).to_number(),
            5.0
        );
        assert_eq!(
            eval_func("string-length", vec![s("four")], &e_ctx_para).to_number(),
            4.0
        );
    }

    #[test]
    fn test_func_normalize_space() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(0, 1, 1);
        let args = vec![s("  leading \n and   \t trailing  ")];
        assert_eq!(
            eval_func("normalize-space", args, &e_ctx).to_string(),
            "leading and trailing"
        );
    }

    #[test]
    fn test_func_translate() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(0, 1, 1);
        let args = vec![s("BAR"), s("ABC"), s("abc")];
        assert_eq!(eval_func("translate", args, &e_ctx).to_string(), "baR");

        let args2 = vec![s("--aaa--"), s("abc-"), s("ABC")];
        assert_eq!(eval_func("translate", args2, &e_ctx).to_string(), "AAA");
    }

    #[test]
    fn test_func_not_and_boolean() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(0, 1, 1);
        assert!(!eval_func("not", vec![XPathValue::Boolean(true)], &e_ctx).to_bool());
        assert!(eval_func("not", vec![XPathValue::Number(0.0)], &e_ctx).to_bool());
        assert!(eval_func("not", vec![s("")], &e_ctx).to_bool());
        assert!(
            !eval_func("boolean", vec![XPathValue::NodeSet(vec![])], &e_ctx).to_bool()
        );
        assert!(eval_func("boolean", vec![s("x")], &e_ctx).to_bool());
    }

    #[test]
    fn test_func_lang() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx_text = setup.context(5, 1, 1);
        let e_ctx_item = setup.context(7, 1, 1);

        assert!(eval_func("lang", vec![s("en")], &e_ctx_text).to_bool());
        assert!(!eval_func("lang", vec![s("en-GB")], &e_ctx_text).to_bool());
        assert!(!eval_func("lang", vec![s("en")], &e_ctx_item).to_bool());
    }

    #[test]
    fn test_func_number_and_sum() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(0, 1, 1);
        assert_eq!(eval_func("number", vec![s(" 12.5 ")], &e_ctx).to_number(), 12.5);
        assert!(eval_func("number", vec![s("p1")], &e_ctx).to_number().is_nan());
        assert_eq!(
            eval_func("number", vec![XPathValue::Boolean(true)], &e_ctx).to_number(),
            1.0
        );

        // "Hello" is not a number, so the sum is NaN.
        let args = vec![XPathValue::NodeSet(vec![tree.node(2), tree.node(3)])];
        assert!(eval_func("sum", args, &e_ctx).to_number().is_nan());
        assert_eq!(
            eval_func("sum", vec![XPathValue::NodeSet(vec![])], &e_ctx).to_number(),
            0.0
        );
    }

    #[test]
    fn test_func_round() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(0, 1, 1);
        let round = |n: f64| eval_func("round", vec![XPathValue::Number(n)], &e_ctx).to_number();
        assert_eq!(round(2.5), 3.0);
        assert_eq!(round(2.4), 2.0);
        assert_eq!(round(-2.5), -2.0);
        assert_eq!(round(-2.6), -3.0);
    }

    #[test]
    fn test_func_last_and_position() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(2, 2, 5);
        assert_eq!(eval_func("last", vec![], &e_ctx).to_number(), 5.0);
        assert_eq!(eval_func("position", vec![], &e_ctx).to_number(), 2.0);
    }

    #[test]
    fn test_name_functions() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx_item = setup.context(7, 1, 1);
        let e_ctx_text = setup.context(5, 1, 1);

        assert_eq!(eval_func("local-name", vec![], &e_ctx_item).to_string(), "item");
        assert_eq!(eval_func("name", vec![], &e_ctx_item).to_string(), "ex:item");
        assert_eq!(
            eval_func("namespace-uri", vec![], &e_ctx_item).to_string(),
            "http://example.com/ns"
        );
        assert_eq!(eval_func("local-name", vec![], &e_ctx_text).to_string(), "");

        let args = vec![XPathValue::NodeSet(vec![tree.node(11), tree.node(2)])];
        assert_eq!(eval_func("local-name", args, &e_ctx_item).to_string(), "para");
    }

    #[test]
    fn test_func_id() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(0, 1, 1);
        let XPathValue::NodeSet(nodes) = eval_func("id", vec![s("missing p1")], &e_ctx) else {
            panic!("Expected NodeSet");
        };
        assert_eq!(nodes, vec![tree.node(2)]);
    }

    #[test]
    fn test_arity_errors() {
        let tree = create_test_tree();
        let setup = TestSetup::new(&tree);
        let e_ctx = setup.context(0, 1, 1);
        assert!(matches!(
            evaluate_function("concat", vec![s("a")], &e_ctx),
            Err(XPathError::FunctionError { .. })
        ));
        assert!(matches!(
            evaluate_function("no-such-function", vec![], &e_ctx),
            Err(XPathError::FunctionError { .. })
        ));
    }
}
