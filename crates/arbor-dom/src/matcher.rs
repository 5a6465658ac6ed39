//! Right-to-left selector evaluation against the live tree.
//!
//! A complex selector is evaluated key-compound-first: the candidate
//! element is checked against the rightmost compound, and only if that
//! matches does the matcher start walking combinators leftward. Fixed
//! combinators (`>`, `+`) advance to exactly one node; open combinators
//! (descendant, `~`) try every eligible node, recursing on the remaining
//! compounds.

use arbor_selectors::{
    AttrMatch, AttributeSelector, Combinator, ComplexSelector, CompoundSelector, PseudoClass,
    SelectorList, SimpleSelector,
};

use crate::document::Document;
use crate::node::{NodeId, NodeType};

/// Whether `id` matches any member of the selector list.
pub(crate) fn matches_selector_list(doc: &Document, id: NodeId, list: &SelectorList) -> bool {
    list.iter().any(|complex| matches_complex(doc, id, complex))
}

/// Whether `id` matches one complex selector.
pub(crate) fn matches_complex(doc: &Document, id: NodeId, selector: &ComplexSelector) -> bool {
    if !matches_compound(doc, id, &selector.key) {
        return false;
    }
    match_rest(doc, id, &selector.rest)
}

/// Walk the remaining (combinator, compound) pairs leftward from
/// `current`, which already matched everything to the right.
fn match_rest(doc: &Document, current: NodeId, rest: &[(Combinator, CompoundSelector)]) -> bool {
    let Some(((combinator, compound), tail)) = rest.split_first() else {
        return true;
    };
    match combinator {
        Combinator::Child => match parent_element(doc, current) {
            Some(parent) => matches_compound(doc, parent, compound) && match_rest(doc, parent, tail),
            None => false,
        },
        Combinator::Descendant => {
            let mut ancestor = parent_element(doc, current);
            while let Some(id) = ancestor {
                if matches_compound(doc, id, compound) && match_rest(doc, id, tail) {
                    return true;
                }
                ancestor = parent_element(doc, id);
            }
            false
        }
        Combinator::NextSibling => match previous_element_sibling(doc, current) {
            Some(prev) => matches_compound(doc, prev, compound) && match_rest(doc, prev, tail),
            None => false,
        },
        Combinator::SubsequentSibling => {
            let mut sibling = previous_element_sibling(doc, current);
            while let Some(id) = sibling {
                if matches_compound(doc, id, compound) && match_rest(doc, id, tail) {
                    return true;
                }
                sibling = previous_element_sibling(doc, id);
            }
            false
        }
    }
}

/// Whether `id` is an element matching every simple selector in the
/// compound.
pub(crate) fn matches_compound(doc: &Document, id: NodeId, compound: &CompoundSelector) -> bool {
    let Some(node) = doc.node(id) else {
        return false;
    };
    if !node.is_element() {
        return false;
    }
    compound
        .simples
        .iter()
        .all(|simple| matches_simple(doc, id, simple))
}

fn matches_simple(doc: &Document, id: NodeId, simple: &SimpleSelector) -> bool {
    let Some(element) = doc.node(id).and_then(|n| n.as_element()) else {
        return false;
    };
    let region = doc.region();
    match simple {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(name) => element.tag_name(region).eq_ignore_ascii_case(name),
        SimpleSelector::Class(name) => element.has_class(region, name),
        SimpleSelector::Id(value) => element.id(region) == Some(value.as_ref()),
        SimpleSelector::Attribute(attribute) => matches_attribute(doc, id, attribute),
        SimpleSelector::PseudoClass(pseudo) => matches_pseudo(doc, id, pseudo),
        SimpleSelector::Not(inner) => !matches_complex(doc, id, inner),
    }
}

fn matches_attribute(doc: &Document, id: NodeId, attribute: &AttributeSelector) -> bool {
    let Some(element) = doc.node(id).and_then(|n| n.as_element()) else {
        return false;
    };
    let Some(value) = element.attr_value(doc.region(), &attribute.name) else {
        return false;
    };
    let AttributeSelector {
        op, case_insensitive, ..
    } = attribute;
    match op {
        AttrMatch::Exists => true,
        AttrMatch::Equals(expected) => fold_eq(value, expected, *case_insensitive),
        AttrMatch::Includes(expected) => {
            !expected.is_empty()
                && value
                    .split_ascii_whitespace()
                    .any(|word| fold_eq(word, expected, *case_insensitive))
        }
        AttrMatch::DashMatch(expected) => {
            let (value, expected) = fold_pair(value, expected, *case_insensitive);
            match value.strip_prefix(&*expected) {
                Some(rest) => rest.is_empty() || rest.starts_with('-'),
                None => false,
            }
        }
        AttrMatch::Prefix(expected) => {
            let (value, expected) = fold_pair(value, expected, *case_insensitive);
            !expected.is_empty() && value.starts_with(&*expected)
        }
        AttrMatch::Suffix(expected) => {
            let (value, expected) = fold_pair(value, expected, *case_insensitive);
            !expected.is_empty() && value.ends_with(&*expected)
        }
        AttrMatch::Substring(expected) => {
            let (value, expected) = fold_pair(value, expected, *case_insensitive);
            !expected.is_empty() && value.contains(&*expected)
        }
    }
}

fn fold_eq(value: &str, expected: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        value.eq_ignore_ascii_case(expected)
    } else {
        value == expected
    }
}

fn fold_pair<'a>(
    value: &'a str,
    expected: &'a str,
    case_insensitive: bool,
) -> (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>) {
    if case_insensitive {
        (
            std::borrow::Cow::Owned(value.to_ascii_lowercase()),
            std::borrow::Cow::Owned(expected.to_ascii_lowercase()),
        )
    } else {
        (
            std::borrow::Cow::Borrowed(value),
            std::borrow::Cow::Borrowed(expected),
        )
    }
}

fn matches_pseudo(doc: &Document, id: NodeId, pseudo: &PseudoClass) -> bool {
    match pseudo {
        PseudoClass::Root => doc
            .node(id)
            .and_then(|n| doc.node_type(n.parent.to_option()?))
            .is_some_and(|kind| kind == NodeType::Document),
        PseudoClass::Empty => !has_content_children(doc, id),
        PseudoClass::FirstChild => previous_element_sibling(doc, id).is_none(),
        PseudoClass::LastChild => next_element_sibling(doc, id).is_none(),
        PseudoClass::OnlyChild => {
            previous_element_sibling(doc, id).is_none() && next_element_sibling(doc, id).is_none()
        }
        PseudoClass::FirstOfType => previous_of_type(doc, id).is_none(),
        PseudoClass::LastOfType => next_of_type(doc, id).is_none(),
        PseudoClass::OnlyOfType => {
            previous_of_type(doc, id).is_none() && next_of_type(doc, id).is_none()
        }
        PseudoClass::NthChild(nth) => nth.matches_index(element_index(doc, id, false)),
        PseudoClass::NthLastChild(nth) => nth.matches_index(element_index(doc, id, true)),
        PseudoClass::NthOfType(nth) => nth.matches_index(of_type_index(doc, id, false)),
        PseudoClass::NthLastOfType(nth) => nth.matches_index(of_type_index(doc, id, true)),
    }
}

/// Whether `id` has any element or text child. Comments and processing
/// instructions do not count against `:empty`.
fn has_content_children(doc: &Document, id: NodeId) -> bool {
    let Some(node) = doc.node(id) else {
        return false;
    };
    let mut child = node.first_child;
    while let Some(child_id) = child.to_option() {
        let Some(child_node) = doc.node(child_id) else {
            return false;
        };
        match child_node.node_type() {
            NodeType::Element | NodeType::Text => return true,
            _ => {}
        }
        child = child_node.next_sibling;
    }
    false
}

fn parent_element(doc: &Document, id: NodeId) -> Option<NodeId> {
    let parent = doc.node(id)?.parent.to_option()?;
    doc.node(parent)?.is_element().then_some(parent)
}

fn previous_element_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut sibling = doc.node(id)?.prev_sibling;
    while let Some(sib_id) = sibling.to_option() {
        let node = doc.node(sib_id)?;
        if node.is_element() {
            return Some(sib_id);
        }
        sibling = node.prev_sibling;
    }
    None
}

fn next_element_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut sibling = doc.node(id)?.next_sibling;
    while let Some(sib_id) = sibling.to_option() {
        let node = doc.node(sib_id)?;
        if node.is_element() {
            return Some(sib_id);
        }
        sibling = node.next_sibling;
    }
    None
}

fn previous_of_type(doc: &Document, id: NodeId) -> Option<NodeId> {
    let tag = doc.tag_name(id)?.to_owned();
    let mut sibling = previous_element_sibling(doc, id);
    while let Some(sib_id) = sibling {
        if doc.tag_name(sib_id).is_some_and(|t| t.eq_ignore_ascii_case(&tag)) {
            return Some(sib_id);
        }
        sibling = previous_element_sibling(doc, sib_id);
    }
    None
}

fn next_of_type(doc: &Document, id: NodeId) -> Option<NodeId> {
    let tag = doc.tag_name(id)?.to_owned();
    let mut sibling = next_element_sibling(doc, id);
    while let Some(sib_id) = sibling {
        if doc.tag_name(sib_id).is_some_and(|t| t.eq_ignore_ascii_case(&tag)) {
            return Some(sib_id);
        }
        sibling = next_element_sibling(doc, sib_id);
    }
    None
}

/// 1-based index of `id` among its element siblings, counted from the
/// end when `from_end` is set.
fn element_index(doc: &Document, id: NodeId, from_end: bool) -> i32 {
    let step = if from_end {
        next_element_sibling
    } else {
        previous_element_sibling
    };
    let mut index = 1;
    let mut current = step(doc, id);
    while let Some(sib_id) = current {
        index += 1;
        current = step(doc, sib_id);
    }
    index
}

/// 1-based index of `id` among element siblings with the same tag name.
fn of_type_index(doc: &Document, id: NodeId, from_end: bool) -> i32 {
    let step = if from_end { next_of_type } else { previous_of_type };
    let mut index = 1;
    let mut current = step(doc, id);
    while let Some(sib_id) = current {
        index += 1;
        current = step(doc, sib_id);
    }
    index
}
