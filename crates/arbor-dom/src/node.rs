//! DOM node records.
//!
//! Nodes live in the owning document's slot arena and link to each other
//! through `NodeId`s, forming an intrusive, acyclic doubly-linked forest.
//! Each node carries a packed lifecycle word: a reference count plus a
//! has-parent bit, updated atomically so read-only handle sharing across
//! threads never sees a torn value. The bit stands in for the parent's
//! implicit strong reference, keeping the free-check a single load.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::element::ElementData;
use crate::region::StrId;

/// Handle to a node in a document's arena.
///
/// Generational: a slot reused after destruction gets a new generation,
/// so stale handles never alias a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Sentinel for "no node" in intrusive links.
    pub(crate) const NONE: NodeId = NodeId {
        index: u32::MAX,
        generation: 0,
    };

    pub(crate) fn is_none(self) -> bool {
        self.index == u32::MAX
    }

    pub(crate) fn to_option(self) -> Option<NodeId> {
        if self.is_none() { None } else { Some(self) }
    }
}

/// Node type discriminant (WHATWG numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    /// Element node.
    Element = 1,
    /// Text node.
    Text = 3,
    /// Processing instruction.
    ProcessingInstruction = 7,
    /// Comment node.
    Comment = 8,
    /// Document node.
    Document = 9,
    /// Doctype node.
    DocumentType = 10,
    /// Document fragment.
    DocumentFragment = 11,
}

/// Per-kind node payload.
#[derive(Debug)]
pub enum NodeData {
    /// The document node itself.
    Document,
    /// Lightweight container whose children splice on insertion.
    DocumentFragment,
    /// `<!DOCTYPE ...>`
    Doctype {
        /// Doctype name.
        name: StrId,
        /// Public identifier.
        public_id: StrId,
        /// System identifier.
        system_id: StrId,
    },
    /// Element with tag name, attributes and class bloom signature.
    Element(ElementData),
    /// Text content.
    Text(StrId),
    /// Comment content.
    Comment(StrId),
    /// Processing instruction.
    ProcessingInstruction {
        /// Target name.
        target: StrId,
        /// Instruction data.
        data: StrId,
    },
}

impl NodeData {
    /// Discriminant for this payload.
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeData::Document => NodeType::Document,
            NodeData::DocumentFragment => NodeType::DocumentFragment,
            NodeData::Doctype { .. } => NodeType::DocumentType,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
            NodeData::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }
}

/// Packed reference count + has-parent flag.
///
/// Bit 31 is the has-parent bit; the low 31 bits are the visible count.
/// A node is destroyable exactly when the whole word is zero.
#[derive(Debug)]
pub struct Lifecycle(AtomicU32);

const HAS_PARENT: u32 = 1 << 31;
const COUNT_MASK: u32 = HAS_PARENT - 1;

impl Lifecycle {
    /// New lifecycle word with a visible count of one.
    pub fn new() -> Self {
        Self(AtomicU32::new(1))
    }

    /// Increment the visible count.
    pub fn acquire(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement the visible count. Returns the whole word after the
    /// decrement; zero means the node is now destroyable.
    pub fn release(&self) -> u32 {
        self.0.fetch_sub(1, Ordering::AcqRel) - 1
    }

    /// Set the has-parent bit (the parent's implicit strong reference).
    pub fn set_has_parent(&self) {
        self.0.fetch_or(HAS_PARENT, Ordering::AcqRel);
    }

    /// Clear the has-parent bit. Returns the whole word after clearing.
    pub fn clear_has_parent(&self) -> u32 {
        self.0.fetch_and(!HAS_PARENT, Ordering::AcqRel) & !HAS_PARENT
    }

    /// Current visible count.
    pub fn ref_count(&self) -> u32 {
        self.0.load(Ordering::Acquire) & COUNT_MASK
    }

    /// Whether the has-parent bit is set.
    pub fn has_parent(&self) -> bool {
        self.0.load(Ordering::Acquire) & HAS_PARENT != 0
    }

    /// Single atomic read of the free condition.
    pub fn is_destroyable(&self) -> bool {
        self.0.load(Ordering::Acquire) == 0
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// A node record: intrusive tree links plus payload.
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE when detached or root-of-forest).
    pub(crate) parent: NodeId,
    /// First child.
    pub(crate) first_child: NodeId,
    /// Last child (O(1) append).
    pub(crate) last_child: NodeId,
    /// Previous sibling.
    pub(crate) prev_sibling: NodeId,
    /// Next sibling.
    pub(crate) next_sibling: NodeId,
    /// Packed reference count + has-parent bit.
    pub(crate) lifecycle: Lifecycle,
    /// Per-kind payload.
    pub(crate) data: NodeData,
}

impl Node {
    /// New detached node with a reference count of one.
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            lifecycle: Lifecycle::new(),
            data,
        }
    }

    /// Discriminant check before any downcast.
    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.data.node_type()
    }

    /// Whether this is an element node.
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Element payload, if this is an element.
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutable element payload.
    #[inline]
    pub(crate) fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Whether this node kind may hold children.
    pub(crate) fn can_hold_children(&self) -> bool {
        matches!(
            self.data,
            NodeData::Document | NodeData::DocumentFragment | NodeData::Element(_)
        )
    }
}
