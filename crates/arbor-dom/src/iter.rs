//! Element-only depth-first traversal.
//!
//! The iterator backtracks through parent pointers instead of keeping an
//! explicit stack, yields elements in tree (pre-)order, skips every
//! non-element node, and can be restarted. Every non-indexed query path
//! runs on top of it.

use crate::document::Document;
use crate::node::NodeId;

/// Restartable iterator over the element descendants of a root node.
/// The root itself is never yielded.
pub struct ElementIter<'a> {
    doc: &'a Document,
    root: NodeId,
    cursor: Option<NodeId>,
}

impl<'a> ElementIter<'a> {
    /// Iterate the element descendants of `root`.
    pub fn new(doc: &'a Document, root: NodeId) -> Self {
        Self {
            doc,
            root,
            cursor: Some(root),
        }
    }

    /// Rewind to the beginning of the traversal.
    pub fn reset(&mut self) {
        self.cursor = Some(self.root);
    }
}

impl<'a> Iterator for ElementIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let mut current = self.cursor?;
        loop {
            match self.doc.next_in_tree_order(current, self.root) {
                Some(next) => {
                    current = next;
                    if self.doc.node(next).is_some_and(|n| n.is_element()) {
                        self.cursor = Some(next);
                        return Some(next);
                    }
                }
                None => {
                    self.cursor = None;
                    return None;
                }
            }
        }
    }
}
