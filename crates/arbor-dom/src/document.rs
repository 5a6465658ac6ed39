//! Document: node arena, region, identity index, lifecycle counters.
//!
//! All nodes for a document live in its slot arena and all their strings
//! in its region. Two independent counters drive teardown: the external
//! handle count (embedding code) and the node handle count (outstanding
//! node references). When the last external handle goes away the document
//! tears down in two phases: release the attached tree cooperatively,
//! then reclaim the whole region in one bulk operation - deliberately
//! discarding orphan nodes that were created but never inserted.

use std::cell::RefCell;
use std::collections::HashMap;

use arbor_selectors::SelectorCache;

use crate::element::{Attr, ElementData};
use crate::error::{DomError, DomResult};
use crate::node::{Node, NodeData, NodeId, NodeType};
use crate::region::Region;

/// One arena slot. The generation bumps each time the slot is freed so
/// stale `NodeId`s never resolve to a newer occupant.
#[derive(Debug)]
struct Slot {
    node: Option<Node>,
    generation: u32,
}

/// An in-memory document owning its node tree, string region, identity
/// index and selector cache.
#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    /// Free slot indices available for reuse.
    free: Vec<u32>,
    region: Region,
    /// id attribute value -> elements carrying it (connected only).
    /// Almost always one entry per id; duplicates are tolerated.
    ids: HashMap<Box<str>, Vec<NodeId>>,
    /// Per-document compiled-selector cache.
    cache: RefCell<SelectorCache>,
    doc_node: NodeId,
    /// Handles held by embedding code.
    external_refs: u32,
    /// Outstanding node references (factory + acquire, minus release).
    node_refs: u64,
    /// Occupied slots, including the document node.
    live_nodes: usize,
    torn_down: bool,
}

impl Document {
    /// Create a document with one external handle and no region limit.
    pub fn new() -> Self {
        Self::build(Region::new())
    }

    /// Create a document whose region refuses to grow past `limit` bytes.
    pub fn with_region_limit(limit: usize) -> Self {
        Self::build(Region::with_limit(limit))
    }

    fn build(region: Region) -> Self {
        let mut document = Self {
            slots: Vec::new(),
            free: Vec::new(),
            region,
            ids: HashMap::new(),
            cache: RefCell::new(SelectorCache::default()),
            doc_node: NodeId::NONE,
            external_refs: 1,
            node_refs: 0,
            live_nodes: 0,
            torn_down: false,
        };
        document.doc_node = document.alloc_node(NodeData::Document);
        // The document node is owned by the document record, not by a
        // caller handle.
        document.node_refs -= 1;
        document
    }

    /// The document node (root of the attached tree).
    pub fn document_node(&self) -> NodeId {
        self.doc_node
    }

    /// The document's single element child, if present.
    pub fn document_element(&self) -> Option<NodeId> {
        let mut child = self.node(self.doc_node)?.first_child;
        while let Some(id) = child.to_option() {
            let node = self.node(id)?;
            if node.is_element() {
                return Some(id);
            }
            child = node.next_sibling;
        }
        None
    }

    // ------------------------------------------------------------------
    // Slot access
    // ------------------------------------------------------------------

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub(crate) fn region(&self) -> &Region {
        &self.region
    }

    pub(crate) fn cache(&self) -> &RefCell<SelectorCache> {
        &self.cache
    }

    fn alloc_node(&mut self, data: NodeData) -> NodeId {
        self.live_nodes += 1;
        self.node_refs += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(Node::new(data));
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                node: Some(Node::new(data)),
                generation: 0,
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    // ------------------------------------------------------------------
    // Node factories
    // ------------------------------------------------------------------

    /// Create a detached element. The tag is copied into the region.
    pub fn create_element(&mut self, tag: &str) -> DomResult<NodeId> {
        self.ensure_live()?;
        validate_name(tag)?;
        let name = self.region.alloc_str(tag)?;
        Ok(self.alloc_node(NodeData::Element(ElementData::new(name))))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: &str) -> DomResult<NodeId> {
        self.ensure_live()?;
        let text = self.region.alloc_str(data)?;
        Ok(self.alloc_node(NodeData::Text(text)))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, data: &str) -> DomResult<NodeId> {
        self.ensure_live()?;
        let text = self.region.alloc_str(data)?;
        Ok(self.alloc_node(NodeData::Comment(text)))
    }

    /// Create a detached processing instruction.
    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> DomResult<NodeId> {
        self.ensure_live()?;
        validate_name(target)?;
        let target = self.region.alloc_str(target)?;
        let data = self.region.alloc_str(data)?;
        Ok(self.alloc_node(NodeData::ProcessingInstruction { target, data }))
    }

    /// Create an empty document fragment.
    pub fn create_document_fragment(&mut self) -> DomResult<NodeId> {
        self.ensure_live()?;
        Ok(self.alloc_node(NodeData::DocumentFragment))
    }

    /// Create a doctype node.
    pub fn create_doctype(
        &mut self,
        name: &str,
        public_id: &str,
        system_id: &str,
    ) -> DomResult<NodeId> {
        self.ensure_live()?;
        validate_name(name)?;
        let name = self.region.alloc_str(name)?;
        let public_id = self.region.alloc_str(public_id)?;
        let system_id = self.region.alloc_str(system_id)?;
        Ok(self.alloc_node(NodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    pub(crate) fn ensure_live(&self) -> DomResult<()> {
        if self.torn_down {
            Err(DomError::Allocation)
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Reference counting
    // ------------------------------------------------------------------

    /// Increment a node's visible reference count.
    pub fn acquire(&mut self, id: NodeId) {
        if self.torn_down {
            return;
        }
        match self.node(id) {
            Some(node) => {
                node.lifecycle.acquire();
                self.node_refs += 1;
            }
            None => tracing::warn!(?id, "acquire on a stale node handle"),
        }
    }

    /// Decrement a node's visible reference count, destroying it when the
    /// count reaches zero with the has-parent bit clear.
    ///
    /// Safe no-op on a torn-down document, a stale handle, or a count
    /// that is already zero.
    pub fn release(&mut self, id: NodeId) {
        if self.torn_down {
            return;
        }
        let Some(node) = self.node(id) else {
            tracing::warn!(?id, "release on a stale node handle");
            return;
        };
        if node.lifecycle.ref_count() == 0 {
            tracing::warn!(?id, "release on a node with zero references");
            return;
        }
        node.lifecycle.release();
        let destroyable = node.lifecycle.is_destroyable();
        self.node_refs -= 1;
        if destroyable {
            self.destroy_node(id);
        }
    }

    /// Current visible reference count of a node, for diagnostics.
    pub fn ref_count(&self, id: NodeId) -> Option<u32> {
        self.node(id).map(|node| node.lifecycle.ref_count())
    }

    /// Run a node's finalizer and return its slot to the free list.
    ///
    /// Children lose their has-parent bit and cascade if unreferenced.
    /// The cascade runs over an explicit worklist so arbitrarily deep
    /// trees never exhaust the call stack. No region memory is returned;
    /// that happens only at teardown.
    pub(crate) fn destroy_node(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(value) = self.element_id_value(id) {
                self.unregister_id(&value, id);
            }
            let Some(node) = self.node_mut(id) else {
                continue;
            };
            let mut child = node.first_child;
            node.first_child = NodeId::NONE;
            node.last_child = NodeId::NONE;
            while let Some(child_id) = child.to_option() {
                let Some(child_node) = self.node_mut(child_id) else {
                    break;
                };
                child = child_node.next_sibling;
                child_node.parent = NodeId::NONE;
                child_node.prev_sibling = NodeId::NONE;
                child_node.next_sibling = NodeId::NONE;
                if child_node.lifecycle.clear_has_parent() == 0 {
                    pending.push(child_id);
                }
            }
            let slot = &mut self.slots[id.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
            self.live_nodes -= 1;
        }
    }

    /// Owned copy of a node's id attribute, if it is an element with one.
    pub(crate) fn element_id_value(&self, id: NodeId) -> Option<String> {
        let element = self.node(id)?.as_element()?;
        element.id(&self.region).map(str::to_owned)
    }

    // ------------------------------------------------------------------
    // Identity index
    // ------------------------------------------------------------------

    /// O(1) lookup of a connected element by its id attribute. With
    /// duplicate ids (pathological), returns the one first in tree order.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let nodes = self.ids.get(id)?;
        match nodes.len() {
            0 => None,
            1 => Some(nodes[0]),
            _ => self.first_in_tree_order(nodes),
        }
    }

    fn first_in_tree_order(&self, candidates: &[NodeId]) -> Option<NodeId> {
        let mut cursor = Some(self.doc_node);
        while let Some(current) = cursor {
            if candidates.contains(&current) {
                return Some(current);
            }
            cursor = self.next_in_tree_order(current, self.doc_node);
        }
        None
    }

    /// Pre-order successor within `root`'s subtree, backtracking through
    /// parent links.
    pub(crate) fn next_in_tree_order(&self, id: NodeId, root: NodeId) -> Option<NodeId> {
        let node = self.node(id)?;
        if let Some(child) = node.first_child.to_option() {
            return Some(child);
        }
        let mut current = id;
        loop {
            if current == root {
                return None;
            }
            let node = self.node(current)?;
            if let Some(sibling) = node.next_sibling.to_option() {
                return Some(sibling);
            }
            current = node.parent.to_option()?;
        }
    }

    /// Connected elements carrying this id, in registration order.
    pub(crate) fn id_index_entry(&self, value: &str) -> Option<&[NodeId]> {
        self.ids.get(value).map(Vec::as_slice)
    }

    pub(crate) fn register_id(&mut self, value: &str, id: NodeId) {
        self.ids.entry(value.into()).or_default().push(id);
    }

    pub(crate) fn unregister_id(&mut self, value: &str, id: NodeId) {
        if let Some(nodes) = self.ids.get_mut(value) {
            nodes.retain(|&n| n != id);
            if nodes.is_empty() {
                self.ids.remove(value);
            }
        }
    }

    /// Whether a node hangs off the document node.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.doc_node {
                return true;
            }
            match self.node(current).map(|n| n.parent) {
                Some(parent) if !parent.is_none() => current = parent,
                _ => return false,
            }
        }
    }

    /// Whether `ancestor` is `node` itself or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent.to_option());
        }
        false
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Set an attribute, copying name and value into the region. Updates
    /// the identity index and class bloom as a side effect of the change.
    pub fn set_attribute(&mut self, el: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.set_attribute_impl(el, None, name, value)
    }

    /// Namespaced variant; replacement matches on namespace + name.
    pub fn set_attribute_ns(
        &mut self,
        el: NodeId,
        namespace: Option<&str>,
        name: &str,
        value: &str,
    ) -> DomResult<()> {
        self.set_attribute_impl(el, namespace, name, value)
    }

    fn set_attribute_impl(
        &mut self,
        el: NodeId,
        namespace: Option<&str>,
        name: &str,
        value: &str,
    ) -> DomResult<()> {
        self.ensure_live()?;
        validate_name(name)?;
        let old_id = if name == "id" {
            self.element_id_value(el)
        } else {
            None
        };
        let connected = self.is_connected(el);

        // Locate the slot to replace before allocating, so an allocation
        // failure leaves the element untouched.
        let existing = {
            let node = self.node(el).ok_or(DomError::NotFound)?;
            let element = node.as_element().ok_or(DomError::NotFound)?;
            find_attr_for_set(element, &self.region, namespace, name)
        };

        let value_id = self.region.alloc_str(value)?;
        let new_name = match existing {
            Some(_) => None,
            None => {
                let name_id = self.region.alloc_str(name)?;
                let ns_id = match namespace {
                    Some(ns) => Some(self.region.alloc_str(ns)?),
                    None => None,
                };
                Some((name_id, ns_id))
            }
        };

        {
            let slots = &mut self.slots;
            let element = slots[el.index as usize]
                .node
                .as_mut()
                .and_then(Node::as_element_mut)
                .ok_or(DomError::NotFound)?;
            match existing {
                Some(index) => {
                    if let Some(attr) = element.attrs.get_mut(index) {
                        attr.value = value_id;
                    }
                }
                None => {
                    let (name_id, ns_id) = new_name.unwrap_or((value_id, None));
                    element.attrs.push(Attr {
                        name: name_id,
                        namespace: ns_id,
                        value: value_id,
                    });
                }
            }
        }

        self.attribute_changed(el, name, old_id.as_deref(), Some(value), connected);
        Ok(())
    }

    /// Value of the first attribute with this qualified name, irrespective
    /// of namespace.
    pub fn get_attribute(&self, el: NodeId, name: &str) -> Option<&str> {
        let element = self.node(el)?.as_element()?;
        element.attr_value(&self.region, name)
    }

    /// Whether the element has an attribute with this qualified name.
    pub fn has_attribute(&self, el: NodeId, name: &str) -> bool {
        self.get_attribute(el, name).is_some()
    }

    /// Remove the first attribute with this qualified name.
    pub fn remove_attribute(&mut self, el: NodeId, name: &str) -> DomResult<()> {
        self.ensure_live()?;
        let old_id = if name == "id" {
            self.element_id_value(el)
        } else {
            None
        };
        let connected = self.is_connected(el);
        let index = {
            let node = self.node(el).ok_or(DomError::NotFound)?;
            let element = node.as_element().ok_or(DomError::NotFound)?;
            element
                .find_attr(&self.region, name)
                .ok_or(DomError::NotFound)?
        };
        {
            let element = self.slots[el.index as usize]
                .node
                .as_mut()
                .and_then(Node::as_element_mut)
                .ok_or(DomError::NotFound)?;
            element.attrs.remove(index);
        }
        self.attribute_changed(el, name, old_id.as_deref(), None, connected);
        Ok(())
    }

    /// Post-mutation hook keeping the identity index and bloom signature
    /// consistent before the mutation API returns.
    fn attribute_changed(
        &mut self,
        el: NodeId,
        name: &str,
        old_id: Option<&str>,
        new_value: Option<&str>,
        connected: bool,
    ) {
        match name {
            "id" => {
                if connected {
                    if let Some(old) = old_id {
                        self.unregister_id(old, el);
                    }
                    if let Some(new) = new_value {
                        self.register_id(new, el);
                    }
                }
            }
            "class" => {
                let region = &self.region;
                if let Some(element) = self.slots[el.index as usize]
                    .node
                    .as_mut()
                    .and_then(Node::as_element_mut)
                {
                    element.recompute_bloom(region);
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Node accessors
    // ------------------------------------------------------------------

    /// Node type discriminant, or `None` for a stale handle.
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.node(id).map(Node::node_type)
    }

    /// Tag name of an element (original case).
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        let element = self.node(id)?.as_element()?;
        Some(element.tag_name(&self.region))
    }

    /// The element's id attribute.
    pub fn id_of(&self, id: NodeId) -> Option<&str> {
        self.node(id)?.as_element()?.id(&self.region)
    }

    /// The element's raw class attribute.
    pub fn class_name(&self, id: NodeId) -> Option<&str> {
        self.node(id)?.as_element()?.class_name(&self.region)
    }

    /// Class tokens of an element, in attribute order.
    pub fn class_list(&self, id: NodeId) -> Vec<&str> {
        self.class_name(id)
            .map(|classes| classes.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// Character data of a text, comment or processing-instruction node.
    pub fn text_data(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Text(text) | NodeData::Comment(text) => Some(self.region.resolve(*text)),
            NodeData::ProcessingInstruction { data, .. } => Some(self.region.resolve(*data)),
            _ => None,
        }
    }

    /// Doctype name.
    pub fn doctype_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Doctype { name, .. } => Some(self.region.resolve(*name)),
            _ => None,
        }
    }

    /// Doctype public identifier (empty string when absent).
    pub fn doctype_public_id(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Doctype { public_id, .. } => Some(self.region.resolve(*public_id)),
            _ => None,
        }
    }

    /// Doctype system identifier (empty string when absent).
    pub fn doctype_system_id(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Doctype { system_id, .. } => Some(self.region.resolve(*system_id)),
            _ => None,
        }
    }

    /// Target of a processing instruction.
    pub fn pi_target(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::ProcessingInstruction { target, .. } => Some(self.region.resolve(*target)),
            _ => None,
        }
    }

    /// Parent node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent.to_option()
    }

    /// First child.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.first_child.to_option()
    }

    /// Last child.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.last_child.to_option()
    }

    /// Previous sibling.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.prev_sibling.to_option()
    }

    /// Next sibling.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.next_sibling.to_option()
    }

    // ------------------------------------------------------------------
    // External handles and teardown
    // ------------------------------------------------------------------

    /// Register one more external handle to this document.
    pub fn acquire_external(&mut self) {
        if !self.torn_down {
            self.external_refs += 1;
        }
    }

    /// Drop one external handle. When the count reaches zero the document
    /// tears down; every later operation on it is a safe no-op.
    pub fn release_external(&mut self) {
        if self.torn_down {
            return;
        }
        self.external_refs = self.external_refs.saturating_sub(1);
        if self.external_refs == 0 {
            self.teardown();
        }
    }

    /// Two-phase teardown.
    fn teardown(&mut self) {
        tracing::debug!(
            live_nodes = self.live_nodes,
            node_refs = self.node_refs,
            "document teardown: releasing attached tree"
        );
        // Phase 1: cooperative release of the attached tree, running
        // finalizers and clearing identity-index entries.
        let doc = self.doc_node;
        loop {
            let Some(child) = self.node(doc).and_then(|n| n.first_child.to_option()) else {
                break;
            };
            self.unlink(child);
            let Some(node) = self.node(child) else {
                break;
            };
            if node.lifecycle.clear_has_parent() == 0 {
                self.destroy_node(child);
            }
        }
        // Phase 2: bulk reclaim, regardless of remaining node handles.
        // Orphans and still-referenced nodes go with the region.
        tracing::debug!(
            orphans = self.live_nodes.saturating_sub(1),
            "document teardown: bulk region reclaim"
        );
        self.slots.clear();
        self.free.clear();
        self.region = Region::new();
        self.ids.clear();
        self.cache.borrow_mut().clear();
        self.live_nodes = 0;
        self.node_refs = 0;
        self.torn_down = true;
    }

    /// Detach `id` from its parent's child list without touching its
    /// lifecycle word.
    pub(crate) fn unlink(&mut self, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        let parent = node.parent;
        let prev = node.prev_sibling;
        let next = node.next_sibling;
        if let Some(prev_id) = prev.to_option() {
            if let Some(prev_node) = self.node_mut(prev_id) {
                prev_node.next_sibling = next;
            }
        } else if let Some(parent_id) = parent.to_option() {
            if let Some(parent_node) = self.node_mut(parent_id) {
                parent_node.first_child = next;
            }
        }
        if let Some(next_id) = next.to_option() {
            if let Some(next_node) = self.node_mut(next_id) {
                next_node.prev_sibling = prev;
            }
        } else if let Some(parent_id) = parent.to_option() {
            if let Some(parent_node) = self.node_mut(parent_id) {
                parent_node.last_child = prev;
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Occupied node slots, including the document node.
    pub fn live_node_count(&self) -> usize {
        self.live_nodes
    }

    /// Outstanding node references.
    pub fn node_ref_count(&self) -> u64 {
        self.node_refs
    }

    /// Outstanding external handles.
    pub fn external_ref_count(&self) -> u32 {
        self.external_refs
    }

    /// Bytes of string data in the region.
    pub fn region_bytes(&self) -> usize {
        self.region.bytes_used()
    }

    /// Whether teardown has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate the attribute a `setAttribute` call replaces. Namespaced sets
/// match on namespace + name; plain sets match the first attribute with
/// the qualified name.
fn find_attr_for_set(
    element: &ElementData,
    region: &Region,
    namespace: Option<&str>,
    name: &str,
) -> Option<usize> {
    match namespace {
        None => element.find_attr(region, name),
        Some(ns) => element.attrs.iter().position(|attr| {
            region.resolve(attr.name) == name
                && attr.namespace.map(|n| region.resolve(n)) == Some(ns)
        }),
    }
}

/// Element and attribute name validation.
fn validate_name(name: &str) -> DomResult<()> {
    let mut bytes = name.bytes();
    let Some(first) = bytes.next() else {
        return Err(DomError::InvalidCharacter(name.to_string()));
    };
    let first_ok = first.is_ascii_alphabetic() || first == b'_' || first == b':' || first >= 0x80;
    if !first_ok {
        return Err(DomError::InvalidCharacter(name.to_string()));
    }
    for b in bytes {
        let ok = b.is_ascii_alphanumeric()
            || matches!(b, b'-' | b'_' | b':' | b'.')
            || b >= 0x80;
        if !ok {
            return Err(DomError::InvalidCharacter(name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_gives_count_of_one() {
        let mut doc = Document::new();
        let el = doc.create_element("div").unwrap();
        assert_eq!(doc.ref_count(el), Some(1));
        assert_eq!(doc.node_ref_count(), 1);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.create_element("not a name"),
            Err(DomError::InvalidCharacter(_))
        ));
        assert!(matches!(
            doc.create_element(""),
            Err(DomError::InvalidCharacter(_))
        ));
        assert!(matches!(
            doc.create_element("1digit"),
            Err(DomError::InvalidCharacter(_))
        ));
        let el = doc.create_element("div").unwrap();
        assert!(matches!(
            doc.set_attribute(el, "bad name", "v"),
            Err(DomError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn test_release_destroys_orphan() {
        let mut doc = Document::new();
        let el = doc.create_element("div").unwrap();
        assert_eq!(doc.live_node_count(), 2);
        doc.release(el);
        assert_eq!(doc.live_node_count(), 1);
        assert!(doc.node(el).is_none());
    }

    #[test]
    fn test_double_release_is_noop() {
        let mut doc = Document::new();
        let el = doc.create_element("div").unwrap();
        doc.release(el);
        doc.release(el);
        assert_eq!(doc.live_node_count(), 1);
        assert_eq!(doc.node_ref_count(), 0);
    }

    #[test]
    fn test_stale_handle_does_not_alias_reused_slot() {
        let mut doc = Document::new();
        let first = doc.create_element("div").unwrap();
        doc.release(first);
        let second = doc.create_element("span").unwrap();
        // The slot was reused but the generation moved on.
        assert_eq!(first.index, second.index);
        assert!(doc.node(first).is_none());
        assert_eq!(doc.tag_name(second), Some("span"));
    }

    #[test]
    fn test_attribute_roundtrip() {
        let mut doc = Document::new();
        let el = doc.create_element("input").unwrap();
        doc.set_attribute(el, "type", "text").unwrap();
        assert_eq!(doc.get_attribute(el, "type"), Some("text"));
        assert!(doc.has_attribute(el, "type"));
        doc.set_attribute(el, "type", "password").unwrap();
        assert_eq!(doc.get_attribute(el, "type"), Some("password"));
        doc.remove_attribute(el, "type").unwrap();
        assert!(!doc.has_attribute(el, "type"));
        assert_eq!(doc.remove_attribute(el, "type"), Err(DomError::NotFound));
    }

    #[test]
    fn test_attribute_value_copied_not_borrowed() {
        let mut doc = Document::new();
        let el = doc.create_element("div").unwrap();
        let transient = String::from("volatile");
        doc.set_attribute(el, "title", &transient).unwrap();
        drop(transient);
        assert_eq!(doc.get_attribute(el, "title"), Some("volatile"));
    }

    #[test]
    fn test_region_limit_propagates_allocation_failure() {
        let mut doc = Document::with_region_limit(8);
        let el = doc.create_element("a").unwrap();
        assert_eq!(
            doc.set_attribute(el, "href", "https://example.com/very-long"),
            Err(DomError::Allocation)
        );
        // Failed mutation left the element unchanged.
        assert!(!doc.has_attribute(el, "href"));
    }

    #[test]
    fn test_text_data() {
        let mut doc = Document::new();
        let text = doc.create_text("hello").unwrap();
        let comment = doc.create_comment("note").unwrap();
        assert_eq!(doc.text_data(text), Some("hello"));
        assert_eq!(doc.text_data(comment), Some("note"));
        assert_eq!(doc.node_type(text), Some(NodeType::Text));
    }

    #[test]
    fn test_release_after_teardown_is_safe() {
        let mut doc = Document::new();
        let el = doc.create_element("div").unwrap();
        doc.release_external();
        assert!(doc.is_torn_down());
        doc.release(el);
        doc.acquire(el);
        assert_eq!(doc.live_node_count(), 0);
    }

    #[test]
    fn test_factories_fail_after_teardown() {
        let mut doc = Document::new();
        doc.release_external();
        assert_eq!(doc.create_element("div"), Err(DomError::Allocation));
    }
}
