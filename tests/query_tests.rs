mod common;

use common::fixtures::{LISTS, NOTE};
use common::{TestResult, load, values};
use domq::{ContextArgument, DomDoc, NamespaceTable, NodeRef, ResultList};

fn names(doc: &DomDoc, list: &ResultList) -> Vec<String> {
    list.iter()
        .map(|n| doc.name(n).ok().flatten().unwrap_or_default())
        .collect()
}

/// `a` and `b` merged in document order, each node once.
fn union(doc: &mut DomDoc, a: &ResultList, b: &ResultList) -> Vec<NodeRef> {
    let everything = doc.xpath("//node()", ContextArgument::None).expect("valid query");
    everything
        .iter()
        .filter(|n| a.as_slice().contains(n) || b.as_slice().contains(n))
        .collect()
}

#[test]
fn test_selector_list_is_an_ordered_union() -> TestResult {
    let mut doc = load(LISTS);
    for (left, right) in [("p", ".x"), ("span", "#main"), ("li", "ul > li"), ("div", "p")] {
        let combined = doc.select(&format!("{left}, {right}"), ContextArgument::None)?;
        let a = doc.select(left, ContextArgument::None)?;
        let b = doc.select(right, ContextArgument::None)?;
        assert_eq!(combined.as_slice(), union(&mut doc, &a, &b).as_slice(), "{left}, {right}");
    }
    Ok(())
}

#[test]
fn test_class_matches_whole_words() -> TestResult {
    let mut doc = load(LISTS);
    let foo = doc.select("div.foo", ContextArgument::None)?;
    assert_eq!(foo.len(), 1);
    assert_eq!(
        doc.document().attribute(foo.item(0).expect("one match").node(), "class"),
        Some("foo bar")
    );
    assert_eq!(doc.select("div.foo.bar", ContextArgument::None)?.len(), 1);
    assert!(doc.select("div.foo.baz", ContextArgument::None)?.is_empty());
    assert_eq!(doc.select("[class*=foo]", ContextArgument::None)?.len(), 2);
    Ok(())
}

#[test]
fn test_id_matches_any_element() -> TestResult {
    let mut doc = load(LISTS);
    let main = doc.select("#main", ContextArgument::None)?;
    assert_eq!(names(&doc, &main), vec!["div", "span"]);
    assert_eq!(doc.select("#other", ContextArgument::None)?.len(), 1);
    assert!(doc.select("div#other", ContextArgument::None)?.is_empty());
    Ok(())
}

#[test]
fn test_child_combinator() -> TestResult {
    let mut doc = load(LISTS);
    let direct = doc.select("ul > li", ContextArgument::None)?;
    assert_eq!(values(&doc, &direct), vec!["direct"]);
    let all = doc.select("ul li", ContextArgument::None)?;
    assert_eq!(values(&doc, &all), vec!["direct", "nested"]);
    Ok(())
}

#[test]
fn test_selector_with_context() -> TestResult {
    let mut doc = load(LISTS);
    let div = doc.select_single("div.foobar", ContextArgument::None)?;
    let inner = doc.select("p", div)?;
    assert_eq!(values(&doc, &inner), vec!["Third"]);
    Ok(())
}

#[test]
fn test_repeated_queries_are_equal() -> TestResult {
    let mut doc = load(LISTS);
    for query in ["//li", "//*[@id]", "//p | //span"] {
        assert_eq!(
            doc.xpath(query, ContextArgument::None)?,
            doc.xpath(query, ContextArgument::None)?
        );
    }
    Ok(())
}

#[test]
fn test_result_list_is_a_snapshot() -> TestResult {
    let mut doc = load(NOTE);
    let list = doc.xpath("/note/*", ContextArgument::None)?;
    let second = list.item(1).expect("four children");

    doc.remove(list.item(0).expect("four children"))?;
    doc.remove("//heading")?;

    assert_eq!(list.len(), 4);
    assert_eq!(list.item(1), Some(second));
    assert_eq!(
        values(&doc, &list),
        vec!["Tove", "Jani", "Reminder", "Don't forget me this weekend!"]
    );
    assert_eq!(doc.xpath("/note/*", ContextArgument::None)?.len(), 2);
    Ok(())
}

#[test]
fn test_iterating_while_editing() -> TestResult {
    let mut doc = load(NOTE);
    let list = doc.xpath("/note/*", ContextArgument::None)?;
    for node in &list {
        doc.replace(node, "<item/>")?;
    }
    assert_eq!(doc.xpath("/note/item", ContextArgument::None)?.len(), 4);
    Ok(())
}

#[test]
fn test_no_match_is_not_an_error() -> TestResult {
    let mut doc = load(NOTE);
    assert!(doc.xpath("//nothing", ContextArgument::None)?.is_empty());
    assert_eq!(doc.xpath_single("//nothing", ContextArgument::None)?, None);
    assert_eq!(doc.select_single("nothing", ContextArgument::None)?, None);
    Ok(())
}

#[test]
fn test_filtered_queries_with_context() -> TestResult {
    let mut doc = load("<r><a><b>1</b><c><b>2</b></c></a><a><b>3</b></a></r>");
    let list = doc.xpath("(.//b)[1]", "//a")?;
    assert_eq!(values(&doc, &list), vec!["1"]);
    let list = doc.xpath("(//b)[last()]", ContextArgument::None)?;
    assert_eq!(values(&doc, &list), vec!["3"]);
    let list = doc.xpath("//a[(.//b)[2]]/b", ContextArgument::None)?;
    assert_eq!(values(&doc, &list), vec!["1"]);
    Ok(())
}

#[test]
fn test_lookup_round_trip() {
    let mut table = NamespaceTable::new();
    let pairs = [("a", "urn:1"), ("b", "urn:2"), ("c", "urn:1"), ("a", "urn:3")];
    for (prefix, uri) in pairs {
        table.register(prefix, uri);
    }
    for (prefix, uri) in table.iter() {
        let last = pairs.iter().rev().find(|(p, _)| *p == prefix).map(|(_, u)| *u);
        assert_eq!(Some(uri), last);
        let found = table.lookup_prefix(uri).expect("uri is registered");
        assert_eq!(table.lookup_uri(found), Some(uri));
    }
    assert_eq!(table.lookup_prefix("urn:1"), Some("c"));
}
