//! Tree mutation: appendChild, insertBefore, removeChild, replaceChild.
//!
//! Every operation validates completely before touching a single link;
//! a rejected insertion leaves the tree byte-for-byte unchanged. The
//! identity index is maintained transitively: inserting a subtree
//! registers every id inside it, removing one unregisters them, all
//! before the mutation API returns.

use crate::document::Document;
use crate::error::{DomError, DomResult, HierarchyViolation};
use crate::node::{NodeId, NodeType};

impl Document {
    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference` (or at the end).
    ///
    /// A document-fragment child splices: its children move to `parent`
    /// in order and the fragment is left empty.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.ensure_live()?;
        self.validate_insertion(parent, child, reference, None)?;
        if self.node_type(child) == Some(NodeType::DocumentFragment) {
            self.splice_fragment(parent, child, reference);
        } else {
            self.move_into(parent, child, reference);
        }
        Ok(child)
    }

    /// Remove `child` from `parent`, clearing the has-parent bit and
    /// releasing the parent's implicit reference. The child is destroyed
    /// here if nothing else holds it.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.ensure_live()?;
        let actual_parent = self
            .node(child)
            .map(|n| n.parent)
            .ok_or(DomError::NotFound)?;
        if actual_parent.to_option() != Some(parent) {
            return Err(DomError::NotFound);
        }
        let was_connected = self.is_connected(child);
        if was_connected {
            self.unregister_subtree_ids(child);
        }
        self.unlink(child);
        self.drop_parent_ref(child);
        Ok(())
    }

    /// Replace `old_child` with `new_child` in place.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<()> {
        self.ensure_live()?;
        let actual_parent = self
            .node(old_child)
            .map(|n| n.parent)
            .ok_or(DomError::NotFound)?;
        if actual_parent.to_option() != Some(parent) {
            return Err(DomError::NotFound);
        }
        if new_child == old_child {
            return Ok(());
        }
        self.validate_insertion(parent, new_child, Some(old_child), Some(old_child))?;

        let was_connected = self.is_connected(old_child);
        if was_connected {
            self.unregister_subtree_ids(old_child);
        }
        if self.node_type(new_child) == Some(NodeType::DocumentFragment) {
            self.splice_fragment(parent, new_child, Some(old_child));
        } else {
            self.move_into(parent, new_child, Some(old_child));
        }
        self.unlink(old_child);
        self.drop_parent_ref(old_child);
        Ok(())
    }

    /// Clear the has-parent bit and destroy the node if that leaves the
    /// whole lifecycle word at zero.
    fn drop_parent_ref(&mut self, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        if node.lifecycle.clear_has_parent() == 0 {
            self.destroy_node(id);
        }
    }

    /// Detach `child` from wherever it is and link it under `parent`.
    /// Identity-index bookkeeping included.
    fn move_into(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        // Inserting a node before itself means before its next sibling.
        let reference = if reference == Some(child) {
            self.next_sibling(child)
        } else {
            reference
        };
        let had_parent = self
            .node(child)
            .is_some_and(|node| node.lifecycle.has_parent());
        if had_parent {
            if self.is_connected(child) {
                self.unregister_subtree_ids(child);
            }
            self.unlink(child);
        }
        self.link_child(parent, child, reference);
        if !had_parent {
            if let Some(node) = self.node(child) {
                node.lifecycle.set_has_parent();
            }
        }
        if self.is_connected(parent) {
            self.register_subtree_ids(child);
        }
    }

    /// Move each child of `fragment` under `parent`, in order.
    fn splice_fragment(&mut self, parent: NodeId, fragment: NodeId, reference: Option<NodeId>) {
        loop {
            let Some(next) = self.first_child(fragment) else {
                break;
            };
            // The fragment's implicit reference carries over to the new
            // parent; the has-parent bit stays set across the move.
            self.unlink(next);
            self.link_child(parent, next, reference);
            if self.is_connected(parent) {
                self.register_subtree_ids(next);
            }
        }
    }

    /// Raw sibling-list surgery. `child` must already be detached.
    fn link_child(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        match reference {
            Some(reference) => {
                let prev = self.node(reference).and_then(|n| n.prev_sibling.to_option());
                if let Some(node) = self.node_mut(child) {
                    node.prev_sibling = prev.unwrap_or(NodeId::NONE);
                    node.next_sibling = reference;
                    node.parent = parent;
                }
                if let Some(node) = self.node_mut(reference) {
                    node.prev_sibling = child;
                }
                match prev {
                    Some(prev) => {
                        if let Some(node) = self.node_mut(prev) {
                            node.next_sibling = child;
                        }
                    }
                    None => {
                        if let Some(node) = self.node_mut(parent) {
                            node.first_child = child;
                        }
                    }
                }
            }
            None => {
                let last = self.last_child(parent);
                if let Some(node) = self.node_mut(child) {
                    node.prev_sibling = last.unwrap_or(NodeId::NONE);
                    node.next_sibling = NodeId::NONE;
                    node.parent = parent;
                }
                match last {
                    Some(last) => {
                        if let Some(node) = self.node_mut(last) {
                            node.next_sibling = child;
                        }
                    }
                    None => {
                        if let Some(node) = self.node_mut(parent) {
                            node.first_child = child;
                        }
                    }
                }
                if let Some(node) = self.node_mut(parent) {
                    node.last_child = child;
                }
            }
        }
    }

    /// All checks, before any link changes.
    fn validate_insertion(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
        replacing: Option<NodeId>,
    ) -> DomResult<()> {
        let parent_node = self.node(parent).ok_or(DomError::NotFound)?;
        if !parent_node.can_hold_children() {
            return Err(DomError::Hierarchy(
                HierarchyViolation::ParentCannotHoldChildren,
            ));
        }
        let child_type = self.node_type(child).ok_or(DomError::NotFound)?;
        if child_type == NodeType::Document {
            return Err(DomError::Hierarchy(HierarchyViolation::ChildNotInsertable));
        }
        // Cycle prevention: the new parent must not live inside the
        // subtree being inserted.
        if self.contains(child, parent) {
            return Err(DomError::Hierarchy(HierarchyViolation::Cycle));
        }
        if let Some(reference) = reference {
            let reference_parent = self
                .node(reference)
                .map(|n| n.parent)
                .ok_or(DomError::NotFound)?;
            if reference_parent.to_option() != Some(parent) {
                return Err(DomError::NotFound);
            }
        }
        let parent_type = parent_node.node_type();
        match parent_type {
            NodeType::Document => self.validate_document_child(child, child_type, replacing),
            _ => {
                if child_type == NodeType::DocumentType {
                    return Err(DomError::Hierarchy(HierarchyViolation::KindNotAllowedHere));
                }
                Ok(())
            }
        }
    }

    /// Structural constraints specific to the document node: at most one
    /// element child, at most one doctype, no text children.
    fn validate_document_child(
        &self,
        child: NodeId,
        child_type: NodeType,
        replacing: Option<NodeId>,
    ) -> DomResult<()> {
        match child_type {
            NodeType::Text => Err(DomError::Hierarchy(HierarchyViolation::KindNotAllowedHere)),
            NodeType::Element => {
                if self.document_element().is_some_and(|e| Some(e) != replacing) {
                    Err(DomError::Hierarchy(
                        HierarchyViolation::DocumentElementExists,
                    ))
                } else {
                    Ok(())
                }
            }
            NodeType::DocumentType => {
                if self.document_doctype().is_some_and(|d| Some(d) != replacing) {
                    Err(DomError::Hierarchy(
                        HierarchyViolation::DocumentDoctypeExists,
                    ))
                } else {
                    Ok(())
                }
            }
            NodeType::DocumentFragment => {
                let mut elements = 0usize;
                let mut cursor = self.first_child(child);
                while let Some(id) = cursor {
                    match self.node_type(id) {
                        Some(NodeType::Text) => {
                            return Err(DomError::Hierarchy(
                                HierarchyViolation::KindNotAllowedHere,
                            ));
                        }
                        Some(NodeType::Element) => elements += 1,
                        _ => {}
                    }
                    cursor = self.next_sibling(id);
                }
                let existing = self.document_element().is_some_and(|e| Some(e) != replacing);
                if elements > 1 || (elements == 1 && existing) {
                    return Err(DomError::Hierarchy(
                        HierarchyViolation::DocumentElementExists,
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// The document's doctype child, if any.
    pub fn document_doctype(&self) -> Option<NodeId> {
        let mut cursor = self.first_child(self.document_node());
        while let Some(id) = cursor {
            if self.node_type(id) == Some(NodeType::DocumentType) {
                return Some(id);
            }
            cursor = self.next_sibling(id);
        }
        None
    }

    /// Register the id of every element in `root`'s subtree (inclusive).
    pub(crate) fn register_subtree_ids(&mut self, root: NodeId) {
        for (value, id) in self.collect_subtree_ids(root) {
            self.register_id(&value, id);
        }
    }

    /// Unregister the id of every element in `root`'s subtree (inclusive).
    pub(crate) fn unregister_subtree_ids(&mut self, root: NodeId) {
        for (value, id) in self.collect_subtree_ids(root) {
            self.unregister_id(&value, id);
        }
    }

    fn collect_subtree_ids(&self, root: NodeId) -> Vec<(String, NodeId)> {
        let mut found = Vec::new();
        let mut cursor = Some(root);
        while let Some(id) = cursor {
            if let Some(value) = self.element_id_value(id) {
                found.push((value, id));
            }
            cursor = self.next_in_tree_order(id, root);
        }
        found
    }
}
