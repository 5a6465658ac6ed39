//! Document-level lifecycle scenarios: handle counting, detachment
//! survival, orphan discard and two-phase teardown.

use arbor_dom::{Document, DomError, NodeType};

fn build_small_tree(doc: &mut Document) -> (arbor_dom::NodeId, arbor_dom::NodeId) {
    let html = doc.create_element("html").unwrap();
    let body = doc.create_element("body").unwrap();
    let doc_node = doc.document_node();
    doc.append_child(doc_node, html).unwrap();
    doc.append_child(html, body).unwrap();
    (html, body)
}

#[test]
fn attach_does_not_change_ref_count() {
    let mut doc = Document::new();
    let (_, body) = build_small_tree(&mut doc);
    let div = doc.create_element("div").unwrap();
    assert_eq!(doc.ref_count(div), Some(1));
    doc.append_child(body, div).unwrap();
    // Parenthood is a flag, not a count.
    assert_eq!(doc.ref_count(div), Some(1));
    doc.acquire(div);
    assert_eq!(doc.ref_count(div), Some(2));
    doc.release(div);
    doc.release(div);
    // Zero handles but still attached: the tree keeps it alive.
    assert_eq!(doc.ref_count(div), Some(0));
    assert!(doc.is_connected(div));
}

#[test]
fn detached_node_survives_while_referenced() {
    let mut doc = Document::new();
    let (_, body) = build_small_tree(&mut doc);
    let div = doc.create_element("div").unwrap();
    doc.append_child(body, div).unwrap();
    doc.remove_child(body, div).unwrap();
    // Still holding the factory handle.
    assert_eq!(doc.ref_count(div), Some(1));
    assert!(!doc.is_connected(div));
    assert_eq!(doc.parent(div), None);
    // Dropping the handle destroys it.
    let before = doc.live_node_count();
    doc.release(div);
    assert_eq!(doc.live_node_count(), before - 1);
    assert_eq!(doc.ref_count(div), None);
}

#[test]
fn removal_cascades_through_unreferenced_subtree() {
    let mut doc = Document::new();
    let (_, body) = build_small_tree(&mut doc);
    let outer = doc.create_element("div").unwrap();
    let inner = doc.create_element("span").unwrap();
    let text = doc.create_text("leaf").unwrap();
    doc.append_child(body, outer).unwrap();
    doc.append_child(outer, inner).unwrap();
    doc.append_child(inner, text).unwrap();
    doc.release(outer);
    doc.release(inner);
    doc.release(text);
    let before = doc.live_node_count();
    doc.remove_child(body, outer).unwrap();
    assert_eq!(doc.live_node_count(), before - 3);
}

#[test]
fn releasing_a_deep_chain_destroys_every_level() {
    let mut doc = Document::new();
    let head = doc.create_element("div").unwrap();
    let mut tail = head;
    for _ in 0..200_000 {
        let next = doc.create_element("div").unwrap();
        doc.append_child(tail, next).unwrap();
        doc.release(next);
        tail = next;
    }
    let before = doc.live_node_count();
    // The cascade must walk the whole chain without recursing per level.
    doc.release(head);
    assert_eq!(doc.live_node_count(), before - 200_001);
    assert_eq!(doc.ref_count(head), None);
    assert_eq!(doc.ref_count(tail), None);
}

#[test]
fn removal_keeps_subtree_when_inner_node_referenced() {
    let mut doc = Document::new();
    let (_, body) = build_small_tree(&mut doc);
    let outer = doc.create_element("div").unwrap();
    let inner = doc.create_element("span").unwrap();
    doc.append_child(body, outer).unwrap();
    doc.append_child(outer, inner).unwrap();
    doc.release(outer);
    // `inner` keeps its factory handle; removing `outer` must not
    // destroy it, and `outer` stays alive as its parent.
    doc.remove_child(body, outer).unwrap();
    assert_eq!(doc.ref_count(inner), Some(1));
    assert_eq!(doc.parent(inner), Some(outer));
    doc.release(inner);
    assert_eq!(doc.ref_count(inner), None);
    assert_eq!(doc.ref_count(outer), None);
}

#[test]
fn stale_handle_is_fenced_after_destroy() {
    let mut doc = Document::new();
    let div = doc.create_element("div").unwrap();
    doc.release(div);
    assert_eq!(doc.node_type(div), None);
    assert_eq!(doc.tag_name(div), None);
    // A new node may reuse the slot; the old handle must not see it.
    let other = doc.create_element("p").unwrap();
    assert_eq!(doc.node_type(div), None);
    assert_eq!(doc.tag_name(other), Some("p"));
    // Acquire/release through the stale handle are no-ops.
    doc.acquire(div);
    doc.release(div);
    assert_eq!(doc.tag_name(other), Some("p"));
}

#[test]
fn double_release_does_not_underflow() {
    let mut doc = Document::new();
    let (_, body) = build_small_tree(&mut doc);
    let div = doc.create_element("div").unwrap();
    doc.append_child(body, div).unwrap();
    doc.release(div);
    // Attached with zero handles; an extra release must not corrupt the
    // parent flag or destroy the node out from under the tree.
    doc.release(div);
    assert!(doc.is_connected(div));
    assert_eq!(doc.ref_count(div), Some(0));
}

#[test]
fn teardown_reclaims_attached_tree_and_orphans() {
    let mut doc = Document::new();
    let (_, body) = build_small_tree(&mut doc);
    let div = doc.create_element("div").unwrap();
    doc.set_attribute(div, "id", "kept").unwrap();
    doc.append_child(body, div).unwrap();
    // An orphan that was created, referenced and never inserted.
    let orphan = doc.create_element("aside").unwrap();
    assert_eq!(doc.ref_count(orphan), Some(1));
    assert!(doc.live_node_count() > 1);
    assert!(doc.region_bytes() > 0);

    doc.release_external();
    assert!(doc.is_torn_down());
    assert_eq!(doc.live_node_count(), 0);
    assert_eq!(doc.region_bytes(), 0);
    assert_eq!(doc.external_ref_count(), 0);
    assert_eq!(doc.get_element_by_id("kept"), None);
    // Both attached and orphan handles are dead.
    assert_eq!(doc.node_type(div), None);
    assert_eq!(doc.node_type(orphan), None);
}

#[test]
fn operations_after_teardown_are_safe() {
    let mut doc = Document::new();
    let (html, body) = build_small_tree(&mut doc);
    doc.release_external();
    assert!(doc.is_torn_down());
    // Releasing old handles, re-releasing the document and attempting
    // mutation must all be harmless.
    doc.release(body);
    doc.release(html);
    doc.release_external();
    assert!(matches!(
        doc.create_element("div"),
        Err(DomError::Allocation)
    ));
    assert!(doc.append_child(html, body).is_err());
    assert!(doc.query_selector("div").unwrap().is_none());
}

#[test]
fn external_handles_delay_teardown() {
    let mut doc = Document::new();
    build_small_tree(&mut doc);
    doc.acquire_external();
    assert_eq!(doc.external_ref_count(), 2);
    doc.release_external();
    assert!(!doc.is_torn_down());
    doc.release_external();
    assert!(doc.is_torn_down());
}

#[test]
fn region_limit_rejects_allocation_without_side_effects() {
    let mut doc = Document::with_region_limit(32);
    let div = doc.create_element("div").unwrap();
    let before_nodes = doc.live_node_count();
    let before_bytes = doc.region_bytes();
    let huge = "x".repeat(64);
    assert!(matches!(
        doc.create_text(&huge),
        Err(DomError::Allocation)
    ));
    assert!(matches!(
        doc.set_attribute(div, "data-big", &huge),
        Err(DomError::Allocation)
    ));
    // Failed allocations leave no partial node or attribute behind.
    assert_eq!(doc.live_node_count(), before_nodes);
    assert_eq!(doc.region_bytes(), before_bytes);
    assert!(!doc.has_attribute(div, "data-big"));
}

/// Deterministic random churn: interleave creation, attachment,
/// detachment and handle drops, then tear down and check nothing leaks.
#[test]
fn random_churn_then_teardown_leaves_nothing() {
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let mut doc = Document::new();
    let (_, body) = build_small_tree(&mut doc);
    let mut handles: Vec<arbor_dom::NodeId> = vec![body];

    for step in 0u32..500 {
        match rng.random_range(0..5) {
            0 | 1 => {
                let tag = ["div", "p", "span"][rng.random_range(0..3)];
                let el = doc.create_element(tag).unwrap();
                if step % 3 == 0 {
                    doc.set_attribute(el, "id", &format!("n{step}")).unwrap();
                }
                handles.push(el);
            }
            2 => {
                let parent = handles[rng.random_range(0..handles.len())];
                let child = handles[rng.random_range(0..handles.len())];
                // Invalid moves (cycles, non-container parents) must
                // fail cleanly and change nothing.
                let _ = doc.append_child(parent, child);
            }
            3 => {
                let node = handles[rng.random_range(0..handles.len())];
                if let Some(parent) = doc.parent(node) {
                    let _ = doc.remove_child(parent, node);
                }
            }
            _ => {
                if handles.len() > 1 {
                    let node = handles.swap_remove(rng.random_range(1..handles.len()));
                    doc.release(node);
                }
            }
        }
        // Index and tree stay mutually consistent throughout.
        if let Some(found) = doc.get_element_by_id(&format!("n{}", step.saturating_sub(1))) {
            assert!(doc.is_connected(found));
        }
    }

    doc.release_external();
    assert!(doc.is_torn_down());
    assert_eq!(doc.live_node_count(), 0);
    assert_eq!(doc.region_bytes(), 0);
}

#[test]
fn node_kinds_report_whatwg_types() {
    let mut doc = Document::new();
    let el = doc.create_element("div").unwrap();
    let text = doc.create_text("t").unwrap();
    let comment = doc.create_comment("c").unwrap();
    let pi = doc.create_processing_instruction("xml", "v").unwrap();
    let frag = doc.create_document_fragment().unwrap();
    let doctype = doc.create_doctype("html", "", "").unwrap();
    assert_eq!(doc.node_type(el), Some(NodeType::Element));
    assert_eq!(doc.node_type(text), Some(NodeType::Text));
    assert_eq!(doc.node_type(comment), Some(NodeType::Comment));
    assert_eq!(
        doc.node_type(pi),
        Some(NodeType::ProcessingInstruction)
    );
    assert_eq!(doc.node_type(frag), Some(NodeType::DocumentFragment));
    assert_eq!(doc.node_type(doctype), Some(NodeType::DocumentType));
    assert_eq!(
        doc.node_type(doc.document_node()),
        Some(NodeType::Document)
    );
}

#[test]
fn doctype_and_pi_payloads_are_readable() {
    let mut doc = Document::new();
    let doctype = doc
        .create_doctype("html", "-//W3C//DTD HTML 4.01//EN", "strict.dtd")
        .unwrap();
    let pi = doc
        .create_processing_instruction("xml-stylesheet", "href=\"a.css\"")
        .unwrap();
    assert_eq!(doc.doctype_name(doctype), Some("html"));
    assert_eq!(
        doc.doctype_public_id(doctype),
        Some("-//W3C//DTD HTML 4.01//EN")
    );
    assert_eq!(doc.doctype_system_id(doctype), Some("strict.dtd"));
    assert_eq!(doc.pi_target(pi), Some("xml-stylesheet"));
    assert_eq!(doc.text_data(pi), Some("href=\"a.css\""));
    // Kind-mismatched accessors stay empty.
    assert_eq!(doc.doctype_name(pi), None);
    assert_eq!(doc.pi_target(doctype), None);
}
