//! End-to-end query scenarios plus a randomized check that the fast
//! paths return exactly what the full matcher would.

use arbor_dom::{Document, ElementIter, NodeId};

fn doc_with_body() -> (Document, NodeId) {
    let mut doc = Document::new();
    let html = doc.create_element("html").unwrap();
    let body = doc.create_element("body").unwrap();
    let doc_node = doc.document_node();
    doc.append_child(doc_node, html).unwrap();
    doc.append_child(html, body).unwrap();
    (doc, body)
}

/// Reference result: scan every element and apply the full matcher.
fn oracle(doc: &Document, root: NodeId, selectors: &str) -> Vec<NodeId> {
    ElementIter::new(doc, root)
        .filter(|&el| doc.matches(el, selectors).unwrap())
        .collect()
}

#[test]
fn get_element_by_id_follows_connectivity() {
    let (mut doc, body) = doc_with_body();
    let div = doc.create_element("div").unwrap();
    doc.set_attribute(div, "id", "target").unwrap();
    // Detached elements are not indexed.
    assert_eq!(doc.get_element_by_id("target"), None);
    doc.append_child(body, div).unwrap();
    assert_eq!(doc.get_element_by_id("target"), Some(div));
    doc.remove_child(body, div).unwrap();
    assert_eq!(doc.get_element_by_id("target"), None);
    // Reinsert and rename.
    doc.append_child(body, div).unwrap();
    doc.set_attribute(div, "id", "renamed").unwrap();
    assert_eq!(doc.get_element_by_id("target"), None);
    assert_eq!(doc.get_element_by_id("renamed"), Some(div));
    doc.remove_attribute(div, "id").unwrap();
    assert_eq!(doc.get_element_by_id("renamed"), None);
}

#[test]
fn class_query_returns_matches_in_tree_order() {
    let (mut doc, body) = doc_with_body();
    let a = doc.create_element("div").unwrap();
    let b = doc.create_element("div").unwrap();
    let c = doc.create_element("div").unwrap();
    doc.append_child(body, a).unwrap();
    doc.append_child(body, b).unwrap();
    doc.append_child(body, c).unwrap();
    doc.set_attribute(a, "class", "foo bar").unwrap();
    doc.set_attribute(b, "class", "baz").unwrap();
    doc.set_attribute(c, "class", "foo").unwrap();
    assert_eq!(doc.query_selector_all(".foo").unwrap(), vec![a, c]);
    assert_eq!(doc.query_selector(".foo").unwrap(), Some(a));
}

#[test]
fn class_tokens_are_whitespace_separated() {
    let (mut doc, body) = doc_with_body();
    let el = doc.create_element("div").unwrap();
    doc.append_child(body, el).unwrap();
    doc.set_attribute(el, "class", "  alpha\tbeta  gamma ").unwrap();
    assert_eq!(doc.query_selector_all(".beta").unwrap(), vec![el]);
    // Substrings of a token are not tokens.
    assert!(doc.query_selector_all(".bet").unwrap().is_empty());
    assert!(doc.query_selector_all(".alphabeta").unwrap().is_empty());
}

#[test]
fn scoped_query_agrees_with_oracle() {
    let (mut doc, body) = doc_with_body();
    let section = doc.create_element("section").unwrap();
    let inside = doc.create_element("p").unwrap();
    let outside = doc.create_element("p").unwrap();
    doc.append_child(body, section).unwrap();
    doc.append_child(section, inside).unwrap();
    doc.append_child(body, outside).unwrap();
    doc.set_attribute(section, "id", "scope").unwrap();
    doc.set_attribute(inside, "class", "hit").unwrap();
    doc.set_attribute(outside, "class", "hit").unwrap();
    let root = doc.document_node();
    let selector = "#scope .hit";
    assert_eq!(
        doc.query_selector_all(selector).unwrap(),
        oracle(&doc, root, selector)
    );
    assert_eq!(doc.query_selector_all(selector).unwrap(), vec![inside]);
}

#[test]
fn query_root_is_excluded_from_results() {
    let (mut doc, body) = doc_with_body();
    doc.set_attribute(body, "class", "hit").unwrap();
    let child = doc.create_element("div").unwrap();
    doc.append_child(body, child).unwrap();
    doc.set_attribute(child, "class", "hit").unwrap();
    assert_eq!(doc.query_selector_all_from(body, ".hit").unwrap(), vec![child]);
    // The matcher itself may still climb above the query root.
    assert_eq!(
        doc.query_selector_all_from(body, "html .hit").unwrap(),
        vec![child]
    );
}

#[test]
fn queries_work_on_detached_subtrees() {
    let mut doc = Document::new();
    let frag = doc.create_document_fragment().unwrap();
    let list = doc.create_element("ul").unwrap();
    let item = doc.create_element("li").unwrap();
    doc.append_child(frag, list).unwrap();
    doc.append_child(list, item).unwrap();
    doc.set_attribute(item, "id", "loose").unwrap();
    assert_eq!(doc.query_selector_all_from(frag, "ul li").unwrap(), vec![item]);
    assert_eq!(doc.query_selector_from(frag, "#loose").unwrap(), Some(item));
    // But the document-wide query sees nothing.
    assert!(doc.query_selector("li").unwrap().is_none());
}

#[test]
fn fragment_insertion_moves_children_into_queries() {
    let (mut doc, body) = doc_with_body();
    let frag = doc.create_document_fragment().unwrap();
    let a = doc.create_element("em").unwrap();
    let b = doc.create_element("em").unwrap();
    doc.append_child(frag, a).unwrap();
    doc.append_child(frag, b).unwrap();
    doc.set_attribute(a, "id", "first-em").unwrap();
    doc.append_child(body, frag).unwrap();
    assert_eq!(doc.query_selector_all("em").unwrap(), vec![a, b]);
    assert_eq!(doc.get_element_by_id("first-em"), Some(a));
    // The fragment is empty and yields nothing.
    assert!(doc.query_selector_from(frag, "em").unwrap().is_none());
}

mod prop {
    use super::*;
    use proptest::prelude::*;

    const TAGS: &[&str] = &["div", "p", "span", "ul", "li"];
    const CLASSES: &[&str] = &["", "c1", "c2", "c1 c2", "c3"];
    const SELECTORS: &[&str] = &[
        "*",
        "div",
        "p",
        "li",
        ".c1",
        ".c2",
        ".c3",
        "#u3",
        "#u7",
        "#dup",
        "div p",
        "div > span",
        "ul li",
        "p + span",
        "div ~ p",
        "#u3 .c1",
        "#u3 > *",
        "#u7 + div",
        "p:not(.c1)",
        "li:nth-child(2n+1)",
        "span:first-child",
        "div.c1, .c2, #u5",
    ];

    /// Build a connected tree from the op list: each op appends one
    /// element under a previously created node (or body).
    fn build(
        ops: &[(usize, usize, usize, u8)],
    ) -> (Document, NodeId) {
        let (mut doc, body) = doc_with_body();
        let mut created = vec![body];
        for (i, &(parent_pick, tag_pick, class_pick, id_pick)) in ops.iter().enumerate() {
            let tag = TAGS[tag_pick % TAGS.len()];
            let el = doc.create_element(tag).unwrap();
            let parent = created[parent_pick % created.len()];
            doc.append_child(parent, el).unwrap();
            let class = CLASSES[class_pick % CLASSES.len()];
            if !class.is_empty() {
                doc.set_attribute(el, "class", class).unwrap();
            }
            match id_pick % 4 {
                // Unique id derived from creation order.
                1 => doc.set_attribute(el, "id", &format!("u{i}")).unwrap(),
                // Deliberately duplicated id.
                2 => doc.set_attribute(el, "id", "dup").unwrap(),
                _ => {}
            }
            created.push(el);
        }
        (doc, body)
    }

    proptest! {
        #[test]
        fn fast_paths_agree_with_full_matcher(
            ops in proptest::collection::vec(
                (0usize..32, 0usize..5, 0usize..5, 0u8..4),
                1..40,
            ),
        ) {
            let (doc, body) = build(&ops);
            for selector in SELECTORS {
                let root = doc.document_node();
                prop_assert_eq!(
                    doc.query_selector_all(selector).unwrap(),
                    oracle(&doc, root, selector),
                    "document-rooted {}", selector
                );
                prop_assert_eq!(
                    doc.query_selector_all_from(body, selector).unwrap(),
                    oracle(&doc, body, selector),
                    "body-rooted {}", selector
                );
                prop_assert_eq!(
                    doc.query_selector_from(body, selector).unwrap(),
                    oracle(&doc, body, selector).first().copied(),
                    "first match {}", selector
                );
            }
        }

        #[test]
        fn class_matching_never_misses(
            class_pick in 0usize..5,
            probe in proptest::sample::select(vec!["c1", "c2", "c3"]),
        ) {
            let (mut doc, body) = doc_with_body();
            let el = doc.create_element("div").unwrap();
            doc.append_child(body, el).unwrap();
            let class = CLASSES[class_pick];
            if !class.is_empty() {
                doc.set_attribute(el, "class", class).unwrap();
            }
            let expected = class.split_ascii_whitespace().any(|t| t == probe);
            let found = doc
                .query_selector_all(&format!(".{probe}"))
                .unwrap()
                .contains(&el);
            prop_assert_eq!(found, expected);
        }
    }
}
